//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (rates in (0, 1), sizes within cookie limits)
//! - Check header names and values parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: PushConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use axum::http::{HeaderName, HeaderValue};

use crate::config::schema::{CookieConfig, MemoryConfig, PushConfig};
use crate::memory::{estimate_parameters, MAX_BITS, MAX_ROUNDS};
use crate::push::PushOptions;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("memory.expected_resources must be greater than zero")]
    NoExpectedResources,

    #[error("memory.false_positive_rate must be in (0, 1), got {0}")]
    FalsePositiveRate(f64),

    #[error("memory.bits must be in 1..={max}, got {got}")]
    Bits { got: u64, max: u64 },

    #[error("memory.rounds must be in 1..={max}, got {got}")]
    Rounds { got: u32, max: u32 },

    #[error("cookie.name {0:?} is not a valid cookie name")]
    CookieName(String),

    #[error("cookie.max_age_secs must be greater than zero")]
    CookieMaxAge,

    #[error("invalid header name {0:?}")]
    HeaderName(String),

    #[error("invalid value for header {0:?}")]
    HeaderValue(String),
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &PushConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_memory(&config.memory, &mut errors);
    validate_cookie(&config.cookie, &mut errors);

    for (name, value) in &config.push_headers {
        if let Err(e) = parse_header(name, value) {
            errors.push(e);
        }
    }
    if let Some(name) = &config.pushed_header {
        if let Err(e) = parse_header_name(name) {
            errors.push(e);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_memory(memory: &MemoryConfig, errors: &mut Vec<ValidationError>) {
    // The estimate is only computed, and only range checked, from valid inputs
    let mut estimate = None;
    if memory.bits.is_none() || memory.rounds.is_none() {
        let p = memory.false_positive_rate;
        let rate_ok = p > 0.0 && p < 1.0;
        if memory.expected_resources == 0 {
            errors.push(ValidationError::NoExpectedResources);
        }
        if !rate_ok {
            errors.push(ValidationError::FalsePositiveRate(p));
        }
        if memory.expected_resources > 0 && rate_ok {
            estimate = Some(estimate_parameters(memory.expected_resources, p));
        }
    }

    if let Some(bits) = memory.bits.or(estimate.map(|(bits, _)| bits)) {
        if bits == 0 || bits > MAX_BITS {
            errors.push(ValidationError::Bits {
                got: bits,
                max: MAX_BITS,
            });
        }
    }
    if let Some(rounds) = memory.rounds.or(estimate.map(|(_, rounds)| rounds)) {
        if rounds == 0 || rounds > MAX_ROUNDS {
            errors.push(ValidationError::Rounds {
                got: rounds,
                max: MAX_ROUNDS,
            });
        }
    }
}

fn validate_cookie(cookie: &CookieConfig, errors: &mut Vec<ValidationError>) {
    if !is_cookie_name(&cookie.name) {
        errors.push(ValidationError::CookieName(cookie.name.clone()));
    }
    if cookie.max_age_secs == 0 {
        errors.push(ValidationError::CookieMaxAge);
    }
}

/// RFC 6265 cookie-name: an RFC 7230 token.
fn is_cookie_name(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
        })
}

pub(crate) fn parse_header_name(name: &str) -> Result<HeaderName, ValidationError> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| ValidationError::HeaderName(name.to_string()))
}

pub(crate) fn parse_header(
    name: &str,
    value: &str,
) -> Result<(HeaderName, HeaderValue), ValidationError> {
    let name = parse_header_name(name)?;
    let value = HeaderValue::from_str(value)
        .map_err(|_| ValidationError::HeaderValue(name.to_string()))?;
    Ok((name, value))
}

/// Build the configured push sub-request headers.
pub(crate) fn push_options(config: &PushConfig) -> Result<PushOptions, ValidationError> {
    let mut options = PushOptions::new();
    for (name, value) in &config.push_headers {
        let (name, value) = parse_header(name, value)?;
        options = options.with_header(name, value);
    }
    Ok(options)
}
