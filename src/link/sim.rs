//! Simulated radio for host-side runs and tests.
//!
//! [`SimRadio::pair`] returns two radios tuned to the same channel.  The
//! shared "air" holds at most one packet, mirroring the single-packet
//! FIFO of a LoRa transceiver: a packet that is not polled before the
//! next one arrives is lost.

use std::cell::RefCell;
use std::rc::Rc;

use log::warn;

use super::radio::{ReceivedPacket, Radio};

/// Errors raised by the simulated radio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimRadioError {
    /// Scripted bring-up failure.
    NoResponse,
    /// Scripted transmit failure.
    TxTimeout,
    /// Payload exceeds a single packet.
    PayloadTooLarge,
}

#[derive(Debug, Default)]
struct Air {
    pending: Option<ReceivedPacket>,
    /// Packets overwritten before the receiver polled them.
    overwritten: u32,
}

/// One end of a simulated radio channel.
#[derive(Debug)]
pub struct SimRadio {
    air: Rc<RefCell<Air>>,
    rssi: i16,
    snr: f32,
    /// Remaining scripted `begin` failures; `None` = fail forever.
    begin_failures: Option<u32>,
    begin_calls: u32,
    tx_failures: u32,
    transmitted: u32,
}

impl SimRadio {
    /// Create two radios sharing one channel.  Packets arrive with the
    /// given link quality.
    pub fn pair(rssi: i16, snr: f32) -> (Self, Self) {
        let air = Rc::new(RefCell::new(Air::default()));
        (Self::on_air(air.clone(), rssi, snr), Self::on_air(air, rssi, snr))
    }

    /// A lone radio nobody else is listening to.
    pub fn standalone() -> Self {
        Self::on_air(Rc::new(RefCell::new(Air::default())), 0, 0.0)
    }

    fn on_air(air: Rc<RefCell<Air>>, rssi: i16, snr: f32) -> Self {
        Self {
            air,
            rssi,
            snr,
            begin_failures: Some(0),
            begin_calls: 0,
            tx_failures: 0,
            transmitted: 0,
        }
    }

    /// Fail the next `n` bring-up attempts.
    pub fn failing_begin(mut self, n: u32) -> Self {
        self.begin_failures = Some(n);
        self
    }

    /// Fail every bring-up attempt.
    pub fn dead(mut self) -> Self {
        self.begin_failures = None;
        self
    }

    /// Fail the next `n` transmissions.
    pub fn fail_next_transmits(&mut self, n: u32) {
        self.tx_failures = n;
    }

    /// Change the link quality stamped on packets sent from this end.
    pub fn set_link_quality(&mut self, rssi: i16, snr: f32) {
        self.rssi = rssi;
        self.snr = snr;
    }

    /// How many times `begin` has been called.
    pub fn begin_calls(&self) -> u32 {
        self.begin_calls
    }

    /// Packets successfully put on the air from this end.
    pub fn transmitted(&self) -> u32 {
        self.transmitted
    }

    /// Packets lost because the channel buffer was overwritten.
    pub fn overwritten(&self) -> u32 {
        self.air.borrow().overwritten
    }
}

impl Radio for SimRadio {
    type Error = SimRadioError;

    fn begin(&mut self) -> Result<(), SimRadioError> {
        self.begin_calls += 1;
        match &mut self.begin_failures {
            None => Err(SimRadioError::NoResponse),
            Some(0) => Ok(()),
            Some(n) => {
                *n -= 1;
                Err(SimRadioError::NoResponse)
            }
        }
    }

    fn transmit(&mut self, payload: &[u8]) -> Result<(), SimRadioError> {
        if self.tx_failures > 0 {
            self.tx_failures -= 1;
            return Err(SimRadioError::TxTimeout);
        }
        let packet = ReceivedPacket::new(payload, self.rssi, self.snr)
            .ok_or(SimRadioError::PayloadTooLarge)?;
        let mut air = self.air.borrow_mut();
        if air.pending.replace(packet).is_some() {
            air.overwritten += 1;
            warn!("SIM | unread packet overwritten on air");
        }
        self.transmitted += 1;
        Ok(())
    }

    fn receive(&mut self) -> Option<ReceivedPacket> {
        self.air.borrow_mut().pending.take()
    }
}
