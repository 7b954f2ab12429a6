//! Link adapter bring-up and steady-state behaviour against a scripted radio.

use crate::mock_radio::{MockRadio, RadioCall, RecordingDelay, RecordingSink};

use forestlink::app::events::DiagnosticEvent;
use forestlink::error::LinkError;
use forestlink::link::{LinkAdapter, LinkConfig, LinkRole, LinkState};

fn config(max_retries: u8) -> LinkConfig {
    LinkConfig {
        max_retries,
        retry_delay_ms: 1000,
    }
}

// ── Bring-up ──────────────────────────────────────────────────

#[test]
fn succeeds_when_last_attempt_succeeds() {
    let radio = MockRadio::new(&[false, false, false, false, true]);
    let mut link = LinkAdapter::new(radio, LinkRole::Sender);
    let mut delay = RecordingDelay::default();
    let mut sink = RecordingSink::new();

    assert_eq!(link.initialize(&config(5), &mut delay, &mut sink), Ok(()));
    assert_eq!(link.state(), LinkState::Ready);
    assert_eq!(link.radio().begin_count(), 5);
    // Fixed delay between attempts, none after success.
    assert_eq!(delay.delays_ms, vec![1000; 4]);
}

#[test]
fn always_failing_radio_ends_failed_after_exact_attempts() {
    for retries in 1..=7u8 {
        let mut link = LinkAdapter::new(MockRadio::always_failing(), LinkRole::Receiver);
        let mut delay = RecordingDelay::default();
        let mut sink = RecordingSink::new();

        assert_eq!(
            link.initialize(&config(retries), &mut delay, &mut sink),
            Err(LinkError::InitFailed)
        );
        assert_eq!(link.state(), LinkState::Failed);
        assert_eq!(link.radio().begin_count(), usize::from(retries));
        assert_eq!(delay.delays_ms.len(), usize::from(retries) - 1);
        assert_eq!(
            sink.count(|e| matches!(e, DiagnosticEvent::InitAttemptFailed { .. })),
            usize::from(retries)
        );
    }
}

#[test]
fn failed_is_terminal() {
    let mut link = LinkAdapter::new(MockRadio::always_failing(), LinkRole::Sender);
    let mut sink = RecordingSink::new();
    let _ = link.initialize(&config(3), &mut RecordingDelay::default(), &mut sink);

    // Even if the radio would now come up, the adapter never retries.
    for _ in 0..3 {
        assert_eq!(
            link.initialize(&config(3), &mut RecordingDelay::default(), &mut sink),
            Err(LinkError::InitFailed)
        );
    }
    assert_eq!(link.radio().begin_count(), 3);
    assert_eq!(link.send(b"EVT:A;CONF:0.1\n"), Err(LinkError::NotReady));
    assert_eq!(link.poll_receive(), Err(LinkError::NotReady));
    assert_eq!(link.state(), LinkState::Failed);
}

#[test]
fn every_transition_is_reported() {
    let mut link = LinkAdapter::new(MockRadio::new(&[false, true]), LinkRole::Receiver);
    let mut sink = RecordingSink::new();
    link.initialize(&config(5), &mut RecordingDelay::default(), &mut sink)
        .unwrap();

    let transitions: Vec<(LinkState, LinkState)> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            DiagnosticEvent::LinkStateChanged { from, to, .. } => Some((*from, *to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        transitions,
        vec![
            (LinkState::Uninitialized, LinkState::Initializing),
            (LinkState::Initializing, LinkState::Ready),
        ]
    );
}

// ── Steady state ──────────────────────────────────────────────

#[test]
fn io_before_initialize_is_not_ready() {
    let mut link = LinkAdapter::new(MockRadio::new(&[]), LinkRole::Sender);
    assert_eq!(link.send(b"x"), Err(LinkError::NotReady));
    assert_eq!(link.poll_receive(), Err(LinkError::NotReady));
    assert!(link.radio().calls.is_empty());
}

#[test]
fn poll_receive_drains_one_packet_per_call() {
    let mut link = LinkAdapter::new(MockRadio::new(&[true]), LinkRole::Receiver);
    link.initialize(&config(5), &mut RecordingDelay::default(), &mut RecordingSink::new())
        .unwrap();
    link.radio_mut().deliver(b"EVT:A;CONF:0.10\n", -80, 3.5);
    link.radio_mut().deliver(b"EVT:B;CONF:0.20\n", -81, 3.0);

    let first = link.poll_receive().unwrap().unwrap();
    assert_eq!(first.payload.as_slice(), b"EVT:A;CONF:0.10\n");
    assert_eq!(first.rssi, -80);
    let second = link.poll_receive().unwrap().unwrap();
    assert_eq!(second.snr, 3.0);
    assert_eq!(link.poll_receive(), Ok(None));
    assert_eq!(
        link.radio().calls.iter().filter(|c| **c == RadioCall::Receive).count(),
        3
    );
}
