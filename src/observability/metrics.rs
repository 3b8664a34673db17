//! Push metrics.
//!
//! # Metrics
//! - `server_push_links_total` (counter): Link candidates by outcome
//!   (`pushed`, `skipped`, `unsupported`, `failed`)
//! - `server_push_redirects_total` (counter): redirect pushes by outcome
//!   (`pushed`, `unsupported`, `failed`)
//! - `server_push_memory_total` (counter): push memory events
//!   (`loaded`, `reset`, `decode_failed`, `saved`, `encode_failed`)
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; the host application installs
//!   the exporter, and without one every call is a no-op
//! - Labels are static strings only

/// Record the outcome of one Link push candidate.
pub fn record_link(outcome: &'static str) {
    metrics::counter!("server_push_links_total", "outcome" => outcome).increment(1);
}

/// Record the outcome of one redirect push.
pub fn record_redirect(outcome: &'static str) {
    metrics::counter!("server_push_redirects_total", "outcome" => outcome).increment(1);
}

/// Record a push memory load/save event.
pub fn record_memory(event: &'static str) {
    metrics::counter!("server_push_memory_total", "event" => event).increment(1);
}
