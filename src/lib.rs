//! ForestLink relay library.
//!
//! Carries detector events (`EVT:GUNSHOT;CONF:0.91;…`) from a sensor
//! node over a packet radio to a receiver node, and from there into a
//! bounded event store that replays recent history to new observers
//! before streaming live events.
//!
//! Exposes the pure-logic modules for integration testing; the bench
//! binary wires them to stdin/stdout and a simulated radio.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod hub;
pub mod indicator;
pub mod link;
pub mod relay;
pub mod store;
pub mod telemetry;

pub use error::{Error, Result};
