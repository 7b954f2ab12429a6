//! Radio capability: The packet-oriented hop.
//!
//! The physical driver (SX127x or a serial-attached modem) lives outside
//! this crate.  The link adapter only needs three things from it: bring
//! the radio up, send one packet, and hand back the packet sitting in the
//! driver's single-packet receive buffer, if any.

use crate::telemetry::codec::MAX_LINE_LEN;

/// Largest payload a single radio packet can carry.
pub const MAX_PACKET_LEN: usize = MAX_LINE_LEN;

/// Packet payload buffer.
pub type PacketBuf = heapless::Vec<u8, MAX_PACKET_LEN>;

/// A packet delivered by the radio, with the link quality it arrived at.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedPacket {
    pub payload: PacketBuf,
    /// Received signal strength, dBm.
    pub rssi: i16,
    /// Signal-to-noise ratio, dB.
    pub snr: f32,
}

impl ReceivedPacket {
    /// Build a packet from a byte slice.  Returns `None` if `payload`
    /// exceeds [`MAX_PACKET_LEN`].
    pub fn new(payload: &[u8], rssi: i16, snr: f32) -> Option<Self> {
        let mut buf = PacketBuf::new();
        buf.extend_from_slice(payload).ok()?;
        Some(Self {
            payload: buf,
            rssi,
            snr,
        })
    }
}

/// Packet radio driver.
pub trait Radio {
    /// Driver-specific error.
    type Error: core::fmt::Debug;

    /// One bring-up attempt (reset, configure frequency/SF, enter RX).
    fn begin(&mut self) -> Result<(), Self::Error>;

    /// Transmit one packet.  Blocks only for the air time of the packet.
    fn transmit(&mut self, payload: &[u8]) -> Result<(), Self::Error>;

    /// Take the pending received packet, if any.  Non-blocking.
    fn receive(&mut self) -> Option<ReceivedPacket>;
}
