//! Application boundary: Diagnostic events and the port traits.
//!
//! The relay logic never logs or reads the clock directly; it emits
//! [`events::DiagnosticEvent`]s and reads time through the traits in
//! [`ports`], keeping every relay testable without real peripherals.

pub mod events;
pub mod ports;
