//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files,
//! and every field has a default so an empty file is a valid config.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::memory::estimate_parameters;

/// Default name of the push memory cookie.
pub const DEFAULT_COOKIE_NAME: &str = "X-H2-Push";

/// Default lifetime of the push memory cookie (90 days).
pub const DEFAULT_MAX_AGE_SECS: u64 = 90 * 24 * 60 * 60;

/// Root configuration for server push.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PushConfig {
    /// Push memory (bloom filter) sizing.
    pub memory: MemoryConfig,

    /// Push memory cookie attributes.
    pub cookie: CookieConfig,

    /// Extra headers sent on every push sub-request.
    pub push_headers: BTreeMap<String, String>,

    /// Informational response header listing pushed resources.
    pub pushed_header: Option<String>,

    /// Redirect push settings.
    pub redirects: RedirectConfig,
}

/// Push memory sizing.
///
/// Explicit `bits`/`rounds` take precedence over the estimate derived from
/// `expected_resources` and `false_positive_rate`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Expected number of distinct pushed resources per origin.
    pub expected_resources: u64,

    /// Target false-positive rate once `expected_resources` are remembered.
    pub false_positive_rate: f64,

    /// Explicit filter size in bits.
    pub bits: Option<u64>,

    /// Explicit number of hash rounds.
    pub rounds: Option<u32>,
}

impl MemoryConfig {
    /// Resolve the `(bits, rounds)` pair to use.
    pub fn parameters(&self) -> (u64, u32) {
        let (bits, rounds) = estimate_parameters(self.expected_resources, self.false_positive_rate);
        (self.bits.unwrap_or(bits), self.rounds.unwrap_or(rounds))
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            expected_resources: 128,
            false_positive_rate: 0.01,
            bits: None,
            rounds: None,
        }
    }
}

/// Push memory cookie attributes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CookieConfig {
    /// Cookie name.
    pub name: String,

    /// `Max-Age` in seconds.
    pub max_age_secs: u64,

    /// Set the `Secure` attribute.
    pub secure: bool,

    /// Set the `HttpOnly` attribute.
    pub http_only: bool,

    /// `Path` attribute; `None` leaves it to the client's default.
    pub path: Option<String>,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_COOKIE_NAME.to_string(),
            max_age_secs: DEFAULT_MAX_AGE_SECS,
            secure: true,
            http_only: true,
            path: Some("/".to_string()),
        }
    }
}

/// Redirect push configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RedirectConfig {
    /// Push the `Location` target of same-origin redirects.
    pub enabled: bool,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}
