//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! push::links / push::redirect / memory loading:
//!     → tracing events (structured fields: path, status, error)
//!     → metrics.rs counters (outcome labels)
//!
//! Consumers (installed by the host application):
//!     → tracing subscriber
//!     → metrics recorder / exporter
//! ```
//!
//! # Design Decisions
//! - Nothing here is fatal; a failed push or unreadable cookie is logged
//!   and the response still goes out
//! - Push failures log at `warn`, expected conditions (unsupported
//!   transport, stale cookie) at `debug`

pub mod metrics;
