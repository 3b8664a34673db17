//! The transport push capability.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use axum::http::HeaderMap;

/// Errors returned by a [`Pusher`].
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// The connection or stream cannot push (any more).
    #[error("server push is not supported on this connection")]
    Unsupported,

    /// Pushing this particular resource failed.
    #[error("push failed: {0}")]
    Failed(#[source] Box<dyn StdError + Send + Sync>),
}

impl PushError {
    /// Wrap any error as a push failure.
    pub fn failed(err: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        PushError::Failed(err.into())
    }

    /// Returns true for [`PushError::Unsupported`].
    pub fn is_unsupported(&self) -> bool {
        matches!(self, PushError::Unsupported)
    }
}

/// Initiates a server push of `path` on the current stream.
///
/// Implementations are provided by the host HTTP stack. `headers` are the
/// request headers of the synthesized push request.
pub trait Pusher: Send + Sync {
    fn push(&self, path: &str, headers: &HeaderMap) -> Result<(), PushError>;
}

impl<P: Pusher + ?Sized> Pusher for Arc<P> {
    fn push(&self, path: &str, headers: &HeaderMap) -> Result<(), PushError> {
        (**self).push(path, headers)
    }
}

/// Cloneable handle to the push capability of one connection.
///
/// The host inserts this into request extensions for connections that can
/// push; requests without it are passed through undecorated.
#[derive(Clone)]
pub struct PushHandle(Arc<dyn Pusher>);

impl PushHandle {
    pub fn new(pusher: impl Pusher + 'static) -> Self {
        Self(Arc::new(pusher))
    }

    pub fn from_arc(pusher: Arc<dyn Pusher>) -> Self {
        Self(pusher)
    }
}

impl Pusher for PushHandle {
    fn push(&self, path: &str, headers: &HeaderMap) -> Result<(), PushError> {
        self.0.push(path, headers)
    }
}

impl fmt::Debug for PushHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushHandle").finish_non_exhaustive()
    }
}
