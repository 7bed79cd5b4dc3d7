//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! bridge / filters / handlers produce:
//!     → logging.rs (tracing events, Logger capability)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Prometheus scrape endpoint (optional)
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{ConsoleLogger, Logger, TracingLogger, init_tracing};
