//! Capability-preserving response decoration.
//!
//! [`Decorated`] wraps a [`ResponseWriter`] and runs a [`CommitHook`]
//! exactly once, immediately before the first header commit. The optional
//! capabilities of the wrapped writer are probed when the decorator is built
//! and re-exposed unchanged; flushes and string writes are routed through
//! the decorator so they cannot commit headers behind the hook's back.

use std::io;

use axum::http::{HeaderMap, StatusCode};

use crate::http::writer::{Capabilities, CloseNotify, Flush, ResponseWriter, WriteStr};
use crate::push::Pusher;

/// Work performed once, right before headers are committed.
pub trait CommitHook {
    fn on_commit<W: ResponseWriter + ?Sized>(&mut self, status: StatusCode, writer: &mut W);
}

/// A response writer decorated with a [`CommitHook`].
#[derive(Debug)]
pub struct Decorated<W, H> {
    inner: W,
    hook: H,
    capabilities: Capabilities,
    committed: bool,
}

impl<W: ResponseWriter, H: CommitHook> Decorated<W, H> {
    pub fn new(mut inner: W, hook: H) -> Self {
        let capabilities = Capabilities::probe(&mut inner);
        Self {
            inner,
            hook,
            capabilities,
            committed: false,
        }
    }

    /// The capability set probed from the wrapped writer.
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    pub fn hook(&self) -> &H {
        &self.hook
    }

    pub fn inner(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    fn commit_if_needed(&mut self) {
        if !self.committed {
            self.write_header(StatusCode::OK);
        }
    }
}

impl<W: ResponseWriter, H: CommitHook> ResponseWriter for Decorated<W, H> {
    fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    fn write_header(&mut self, status: StatusCode) {
        if !self.committed {
            self.committed = true;
            self.hook.on_commit(status, &mut self.inner);
        }
        self.inner.write_header(status);
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.commit_if_needed();
        self.inner.write(buf)
    }

    fn pusher(&self) -> Option<&dyn Pusher> {
        self.inner.pusher()
    }

    fn as_flush(&mut self) -> Option<&mut dyn Flush> {
        if self.capabilities.flush {
            Some(self)
        } else {
            None
        }
    }

    fn as_close_notify(&self) -> Option<&dyn CloseNotify> {
        if self.capabilities.close_notify {
            self.inner.as_close_notify()
        } else {
            None
        }
    }

    fn as_write_str(&mut self) -> Option<&mut dyn WriteStr> {
        if self.capabilities.write_str {
            Some(self)
        } else {
            None
        }
    }
}

impl<W: ResponseWriter, H: CommitHook> Flush for Decorated<W, H> {
    fn flush(&mut self) -> io::Result<()> {
        self.commit_if_needed();
        match self.inner.as_flush() {
            Some(inner) => inner.flush(),
            None => Ok(()),
        }
    }
}

impl<W: ResponseWriter, H: CommitHook> WriteStr for Decorated<W, H> {
    fn write_str(&mut self, s: &str) -> io::Result<usize> {
        self.commit_if_needed();
        match self.inner.as_write_str() {
            Some(inner) => inner.write_str(s),
            None => self.inner.write(s.as_bytes()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::recorder::BufferedResponse;

    #[derive(Default)]
    struct CountingHook {
        calls: Vec<StatusCode>,
    }

    impl CommitHook for CountingHook {
        fn on_commit<W: ResponseWriter + ?Sized>(&mut self, status: StatusCode, writer: &mut W) {
            self.calls.push(status);
            writer
                .headers_mut()
                .insert("x-hooked", status.as_str().parse().unwrap());
        }
    }

    /// A writer with no optional capabilities.
    #[derive(Default)]
    struct BareWriter {
        headers: HeaderMap,
        status: Option<StatusCode>,
        body: Vec<u8>,
    }

    impl ResponseWriter for BareWriter {
        fn headers(&self) -> &HeaderMap {
            &self.headers
        }

        fn headers_mut(&mut self) -> &mut HeaderMap {
            &mut self.headers
        }

        fn write_header(&mut self, status: StatusCode) {
            self.status.get_or_insert(status);
        }

        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.write_header(StatusCode::OK);
            self.body.extend_from_slice(buf);
            Ok(buf.len())
        }
    }

    #[test]
    fn test_hook_runs_once() {
        let mut w = Decorated::new(BufferedResponse::new(), CountingHook::default());
        w.write_header(StatusCode::CREATED);
        w.write_header(StatusCode::OK);
        w.write(b"body").unwrap();

        assert_eq!(w.hook().calls, vec![StatusCode::CREATED]);
        let inner = w.into_inner();
        assert_eq!(inner.status(), StatusCode::CREATED);
        assert_eq!(inner.headers()["x-hooked"], "201");
    }

    #[test]
    fn test_write_commits_through_hook() {
        let mut w = Decorated::new(BufferedResponse::new(), CountingHook::default());
        w.write(b"implicit").unwrap();
        assert!(w.is_committed());
        assert_eq!(w.hook().calls, vec![StatusCode::OK]);
    }

    #[test]
    fn test_flush_commits_through_hook() {
        let mut w = Decorated::new(BufferedResponse::new(), CountingHook::default());
        w.as_flush().unwrap().flush().unwrap();
        assert_eq!(w.hook().calls, vec![StatusCode::OK]);
        assert_eq!(w.inner().flushes(), 1);
    }

    #[test]
    fn test_preserves_exact_capabilities() {
        let mut full = Decorated::new(BufferedResponse::new(), CountingHook::default());
        assert!(full.as_flush().is_some());
        assert!(full.as_write_str().is_some());
        assert!(full.as_close_notify().is_none());

        let mut bare = Decorated::new(BareWriter::default(), CountingHook::default());
        assert_eq!(bare.capabilities(), Capabilities::default());
        assert!(bare.as_flush().is_none());
        assert!(bare.as_write_str().is_none());
        assert!(bare.as_close_notify().is_none());

        // Direct string writes still work, falling back to byte writes
        bare.write_str("text").unwrap();
        assert_eq!(bare.inner().body, b"text");
        assert_eq!(bare.hook().calls, vec![StatusCode::OK]);
    }

    #[test]
    fn test_close_notify_is_forwarded() {
        let (_tx, rx) = tokio::sync::watch::channel(false);
        let w = Decorated::new(
            BufferedResponse::new().with_close_signal(rx),
            CountingHook::default(),
        );
        assert!(w.capabilities().close_notify);
        assert!(w.as_close_notify().is_some());
    }

    #[test]
    fn test_decorates_borrowed_writer() {
        let mut buffered = BufferedResponse::new();
        {
            let mut w = Decorated::new(&mut buffered, CountingHook::default());
            w.write_header(StatusCode::ACCEPTED);
        }
        assert_eq!(buffered.status(), StatusCode::ACCEPTED);
        assert_eq!(buffered.headers()["x-hooked"], "202");
    }
}
