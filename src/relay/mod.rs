//! Relays: The two ends of the radio hop.
//!
//! ```text
//!   producer ──▶ SenderRelay ──▶ LinkAdapter ~~radio~~ LinkAdapter ──▶ ReceiverRelay ──▶ consumer
//!                                                                          │
//!                                                                          └──▶ EventStore
//! ```
//!
//! Both relays are sequential cooperative loops: every `poll` does one
//! bounded unit of work and returns.

pub mod line;
pub mod receiver;
pub mod sender;

pub use receiver::{ReceiverRelay, ReceiverStats};
pub use sender::{SenderRelay, SenderStats};
