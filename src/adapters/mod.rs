//! Adapters: Concrete implementations of the hexagonal port traits.
//!
//! | Adapter         | Implements       | Connects to                 |
//! |-----------------|------------------|-----------------------------|
//! | `log_sink`      | DiagnosticSink   | `log` facade                |
//! | `log_indicator` | IndicatorPort    | `log` facade (no LED)       |
//! | `stdio`         | Transport        | stdin / stdout / `io::Write`|
//! | `time`          | Clock, DelayNs   | `Instant`, `SystemTime`     |

pub mod log_indicator;
pub mod log_sink;
pub mod stdio;
pub mod time;
