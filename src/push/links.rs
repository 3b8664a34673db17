//! Link header driven push.
//!
//! # Responsibilities
//! - Decorate a response writer so push runs once, right before commit
//! - Push every eligible `rel=preload` link the client has not seen yet
//! - Rewrite the outgoing `Link` header to what was not pushed
//! - Persist the updated push memory in a cookie
//!
//! # Design Decisions
//! - Push memory is loaded lazily, at the first eligible candidate
//! - Links already in memory are dropped from the header without a push
//! - Non-candidates (including `nopush`) are retained verbatim
//! - The cookie is only written when at least one push succeeded

use std::sync::Arc;

use axum::http::header::{COOKIE, LINK, SET_COOKIE};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use cookie::Cookie;

use crate::config::loader::ConfigError;
use crate::config::schema::{CookieConfig, PushConfig};
use crate::config::validation::{parse_header_name, push_options, validate_config};
use crate::http::writer::ResponseWriter;
use crate::link::{parse_link, split_fields};
use crate::memory::{PushMemory, StateCodec};
use crate::observability::metrics;
use crate::push::decorator::{CommitHook, Decorated};
use crate::push::options::{is_push_headers, PushOptions};
use crate::push::pusher::{PushError, Pusher};

/// A response writer decorated with Link push.
pub type PushWriter<W> = Decorated<W, LinkPushHook>;

/// Shared Link push settings and codec state.
#[derive(Debug)]
pub struct ServerPush {
    bits: u64,
    rounds: u32,
    cookie: CookieConfig,
    options: PushOptions,
    pushed_header: Option<HeaderName>,
    codec: StateCodec,
}

impl ServerPush {
    /// Push with a memory of `bits` bits and `rounds` hash rounds, clamped
    /// to what a client cookie may carry.
    pub fn new(bits: u64, rounds: u32) -> Self {
        let sizing = PushMemory::new(bits, rounds);
        Self {
            bits: sizing.bits(),
            rounds: sizing.rounds(),
            cookie: CookieConfig::default(),
            options: PushOptions::new(),
            pushed_header: None,
            codec: StateCodec::new(),
        }
    }

    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie.name = name.into();
        self
    }

    pub fn with_cookie(mut self, cookie: CookieConfig) -> Self {
        self.cookie = cookie;
        self
    }

    pub fn with_options(mut self, options: PushOptions) -> Self {
        self.options = options;
        self
    }

    /// List pushed resources in `name` on the response.
    pub fn with_pushed_header(mut self, name: HeaderName) -> Self {
        self.pushed_header = Some(name);
        self
    }

    /// Build from a configuration, validating it first.
    pub fn from_config(config: &PushConfig) -> Result<Self, ConfigError> {
        validate_config(config).map_err(ConfigError::Validation)?;

        let (bits, rounds) = config.memory.parameters();
        let options = push_options(config).map_err(|e| ConfigError::Validation(vec![e]))?;
        let mut push = Self::new(bits, rounds)
            .with_cookie(config.cookie.clone())
            .with_options(options);
        if let Some(name) = &config.pushed_header {
            let name = parse_header_name(name).map_err(|e| ConfigError::Validation(vec![e]))?;
            push = push.with_pushed_header(name);
        }
        Ok(push)
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie.name
    }

    /// The `(bits, rounds)` of every push memory this instance creates.
    pub fn parameters(&self) -> (u64, u32) {
        (self.bits, self.rounds)
    }

    pub fn codec(&self) -> &StateCodec {
        &self.codec
    }

    /// Decorate `writer` for a request with `request` headers.
    ///
    /// Hands the writer back unchanged if it cannot push or the request is
    /// itself a push.
    pub fn decorate<W: ResponseWriter>(
        self: &Arc<Self>,
        writer: W,
        request: &HeaderMap,
    ) -> Result<PushWriter<W>, W> {
        if writer.pusher().is_none() || is_push_headers(request) {
            return Err(writer);
        }

        let hook = LinkPushHook {
            push: Arc::clone(self),
            push_headers: self.options.merge(request),
            cookie: self.memory_cookie(request),
            memory: None,
            outcome: PushOutcome::default(),
        };
        Ok(Decorated::new(writer, hook))
    }

    fn memory_cookie(&self, request: &HeaderMap) -> Option<String> {
        request
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| Cookie::split_parse(value))
            .filter_map(Result::ok)
            .find(|c| c.name() == self.cookie.name)
            .map(|c| c.value().to_string())
    }

    fn load_memory(&self, cookie: Option<&str>) -> PushMemory {
        let Some(value) = cookie.filter(|v| !v.is_empty()) else {
            return PushMemory::new(self.bits, self.rounds);
        };

        match self.codec.decode(value) {
            Ok(memory) if memory.bits() == self.bits && memory.rounds() == self.rounds => {
                metrics::record_memory("loaded");
                memory
            }
            Ok(memory) => {
                tracing::debug!(
                    bits = memory.bits(),
                    rounds = memory.rounds(),
                    "Push memory parameters changed, starting fresh"
                );
                metrics::record_memory("reset");
                PushMemory::new(self.bits, self.rounds)
            }
            Err(e) => {
                tracing::debug!(error = %e, "Unreadable push memory cookie, starting fresh");
                metrics::record_memory("decode_failed");
                PushMemory::new(self.bits, self.rounds)
            }
        }
    }

    fn build_cookie(&self, value: String) -> Cookie<'static> {
        let max_age = i64::try_from(self.cookie.max_age_secs).unwrap_or(i64::MAX);
        let mut builder = Cookie::build((self.cookie.name.clone(), value))
            .max_age(cookie::time::Duration::seconds(max_age))
            .secure(self.cookie.secure)
            .http_only(self.cookie.http_only);
        if let Some(path) = &self.cookie.path {
            builder = builder.path(path.clone());
        }
        builder.build()
    }
}

/// What push did for one response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushOutcome {
    /// Paths pushed, in header order.
    pub pushed: Vec<String>,
    /// The transport reported push as unsupported.
    pub halted: bool,
    /// The memory cookie was written.
    pub saved_memory: bool,
}

enum Disposition {
    Keep,
    Drop,
}

/// Per-response Link push state.
#[derive(Debug)]
pub struct LinkPushHook {
    push: Arc<ServerPush>,
    push_headers: HeaderMap,
    cookie: Option<String>,
    memory: Option<PushMemory>,
    outcome: PushOutcome,
}

impl LinkPushHook {
    pub fn outcome(&self) -> &PushOutcome {
        &self.outcome
    }

    fn memory(&mut self) -> &mut PushMemory {
        let push = &self.push;
        let cookie = self.cookie.as_deref();
        self.memory.get_or_insert_with(|| push.load_memory(cookie))
    }

    /// Push the candidates in `values`. Returns the rewritten header values
    /// if any field was dropped.
    fn push_links(
        &mut self,
        pusher: &dyn Pusher,
        values: &[HeaderValue],
    ) -> Option<Vec<HeaderValue>> {
        let mut changed = false;
        let mut survivors = Vec::with_capacity(values.len());

        for value in values {
            let text = match value.to_str() {
                Ok(text) if !self.outcome.halted => text,
                _ => {
                    survivors.push(value.clone());
                    continue;
                }
            };

            let mut kept = Vec::new();
            let mut dropped = false;
            for field in split_fields(text) {
                if self.outcome.halted {
                    kept.push(field);
                    continue;
                }
                match self.try_push(pusher, field) {
                    Disposition::Keep => kept.push(field),
                    Disposition::Drop => dropped = true,
                }
            }

            if !dropped {
                survivors.push(value.clone());
                continue;
            }
            changed = true;
            if kept.is_empty() {
                continue;
            }
            match HeaderValue::from_str(&kept.join(", ")) {
                Ok(rewritten) => survivors.push(rewritten),
                Err(_) => survivors.push(value.clone()),
            }
        }

        changed.then_some(survivors)
    }

    fn try_push(&mut self, pusher: &dyn Pusher, field: &str) -> Disposition {
        let Some(link) = parse_link(field) else {
            return Disposition::Keep;
        };
        if !link.is_push_candidate() {
            return Disposition::Keep;
        }
        let path = link.path;

        if self.memory().test(path) {
            tracing::trace!(path = %path, "Already pushed to this client");
            metrics::record_link("skipped");
            return Disposition::Drop;
        }

        match pusher.push(path, &self.push_headers) {
            Ok(()) => {
                self.memory().add(path);
                self.outcome.pushed.push(path.to_string());
                metrics::record_link("pushed");
                Disposition::Drop
            }
            Err(PushError::Unsupported) => {
                tracing::debug!(path = %path, "Push unsupported, keeping remaining links");
                self.outcome.halted = true;
                metrics::record_link("unsupported");
                Disposition::Keep
            }
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "Push failed");
                metrics::record_link("failed");
                Disposition::Keep
            }
        }
    }

    fn announce_pushed<W: ResponseWriter + ?Sized>(&self, writer: &mut W) {
        let Some(name) = &self.push.pushed_header else {
            return;
        };
        let listed = self
            .outcome
            .pushed
            .iter()
            .map(|path| format!("<{path}>"))
            .collect::<Vec<_>>()
            .join(", ");
        match HeaderValue::from_str(&listed) {
            Ok(value) => {
                writer.headers_mut().append(name.clone(), value);
            }
            Err(e) => tracing::warn!(header = %name, error = %e, "Invalid pushed header"),
        }
    }

    fn save_memory<W: ResponseWriter + ?Sized>(&mut self, writer: &mut W) {
        let Some(memory) = &self.memory else {
            return;
        };
        let encoded = match self.push.codec.encode(memory) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode push memory");
                metrics::record_memory("encode_failed");
                return;
            }
        };

        let cookie = self.push.build_cookie(encoded);
        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => {
                writer.headers_mut().append(SET_COOKIE, value);
                self.outcome.saved_memory = true;
                metrics::record_memory("saved");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to set push memory cookie");
                metrics::record_memory("encode_failed");
            }
        }
    }
}

impl CommitHook for LinkPushHook {
    fn on_commit<W: ResponseWriter + ?Sized>(&mut self, status: StatusCode, writer: &mut W) {
        if status == StatusCode::NOT_MODIFIED || !writer.headers().contains_key(LINK) {
            return;
        }

        let values: Vec<HeaderValue> = writer.headers().get_all(LINK).iter().cloned().collect();
        let rewritten = match writer.pusher() {
            Some(pusher) => self.push_links(pusher, &values),
            None => return,
        };

        if let Some(survivors) = rewritten {
            let headers = writer.headers_mut();
            headers.remove(LINK);
            for value in survivors {
                headers.append(LINK, value);
            }
        }

        if !self.outcome.pushed.is_empty() {
            self.announce_pushed(writer);
            self.save_memory(writer);
        }
    }
}
