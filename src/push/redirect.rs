//! Redirect push.
//!
//! Pushes the target of a same-origin redirect alongside the 3xx response.
//! There is no push memory here; every eligible redirect pushes.

use std::sync::Arc;

use axum::http::header::LOCATION;
use axum::http::{HeaderMap, StatusCode};

use crate::config::loader::ConfigError;
use crate::config::schema::PushConfig;
use crate::config::validation::{push_options, validate_config};
use crate::http::writer::ResponseWriter;
use crate::observability::metrics;
use crate::push::decorator::{CommitHook, Decorated};
use crate::push::options::{is_push_headers, PushOptions};
use crate::push::pusher::PushError;

/// A response writer decorated with redirect push.
pub type RedirectWriter<W> = Decorated<W, RedirectPushHook>;

/// Shared redirect push settings.
#[derive(Debug)]
pub struct RedirectPush {
    options: PushOptions,
    enabled: bool,
}

impl RedirectPush {
    pub fn new() -> Self {
        Self {
            options: PushOptions::new(),
            enabled: true,
        }
    }

    pub fn with_options(mut self, options: PushOptions) -> Self {
        self.options = options;
        self
    }

    pub fn from_config(config: &PushConfig) -> Result<Self, ConfigError> {
        validate_config(config).map_err(ConfigError::Validation)?;
        let options = push_options(config).map_err(|e| ConfigError::Validation(vec![e]))?;
        Ok(Self {
            options,
            enabled: config.redirects.enabled,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Decorate `writer` for a request with `request` headers.
    ///
    /// Hands the writer back unchanged if redirect push is disabled, the
    /// writer cannot push, or the request is itself a push.
    pub fn decorate<W: ResponseWriter>(
        self: &Arc<Self>,
        writer: W,
        request: &HeaderMap,
    ) -> Result<RedirectWriter<W>, W> {
        if !self.enabled || writer.pusher().is_none() || is_push_headers(request) {
            return Err(writer);
        }

        let hook = RedirectPushHook {
            push_headers: self.options.merge(request),
            pushed: None,
        };
        Ok(Decorated::new(writer, hook))
    }
}

impl Default for RedirectPush {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-response redirect push state.
#[derive(Debug)]
pub struct RedirectPushHook {
    push_headers: HeaderMap,
    pushed: Option<String>,
}

impl RedirectPushHook {
    /// The redirect target that was pushed, if any.
    pub fn pushed(&self) -> Option<&str> {
        self.pushed.as_deref()
    }
}

impl CommitHook for RedirectPushHook {
    fn on_commit<W: ResponseWriter + ?Sized>(&mut self, status: StatusCode, writer: &mut W) {
        if !status.is_redirection() {
            return;
        }
        let Some(target) = redirect_target(writer.headers()) else {
            return;
        };
        let Some(pusher) = writer.pusher() else {
            return;
        };

        match pusher.push(&target, &self.push_headers) {
            Ok(()) => {
                metrics::record_redirect("pushed");
                self.pushed = Some(target);
            }
            Err(PushError::Unsupported) => {
                tracing::debug!(path = %target, "Redirect push unsupported");
                metrics::record_redirect("unsupported");
            }
            Err(e) => {
                tracing::warn!(path = %target, error = %e, "Redirect push failed");
                metrics::record_redirect("failed");
            }
        }
    }
}

/// The single root-relative `Location` of a response, if it has one.
fn redirect_target(headers: &HeaderMap) -> Option<String> {
    let mut locations = headers.get_all(LOCATION).iter();
    let location = locations.next()?;
    if locations.next().is_some() {
        return None;
    }

    let location = location.to_str().ok()?;
    if location.starts_with('/') && !location.starts_with("//") {
        Some(location.to_string())
    } else {
        None
    }
}
