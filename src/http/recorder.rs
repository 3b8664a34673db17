//! In-memory response writer.

use std::io;

use axum::body::Body;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use tokio::sync::watch;

use crate::http::writer::{CloseNotify, Flush, ResponseWriter, WriteStr};
use crate::push::{PushHandle, Pusher};

/// A [`ResponseWriter`] that buffers the response head and body.
///
/// Used to replay axum responses through the push decorators, and
/// directly by callers that produce responses in writer style.
#[derive(Debug)]
pub struct BufferedResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    committed: bool,
    flushes: usize,
    pusher: Option<PushHandle>,
    closed: Option<watch::Receiver<bool>>,
}

impl BufferedResponse {
    pub fn new() -> Self {
        Self::from_head(StatusCode::OK, HeaderMap::new())
    }

    /// Start from an existing (uncommitted) response head.
    pub fn from_head(status: StatusCode, headers: HeaderMap) -> Self {
        Self {
            status,
            headers,
            body: Vec::new(),
            committed: false,
            flushes: 0,
            pusher: None,
            closed: None,
        }
    }

    /// Attach the connection's push capability.
    pub fn with_pusher(mut self, pusher: PushHandle) -> Self {
        self.pusher = Some(pusher);
        self
    }

    /// Attach a connection-closed signal, enabling [`CloseNotify`].
    pub fn with_close_signal(mut self, closed: watch::Receiver<bool>) -> Self {
        self.closed = Some(closed);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Number of times the response was flushed.
    pub fn flushes(&self) -> usize {
        self.flushes
    }

    /// Split into the committed status and headers.
    pub fn into_head(self) -> (StatusCode, HeaderMap) {
        (self.status, self.headers)
    }

    pub fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl Default for BufferedResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseWriter for BufferedResponse {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_header(&mut self, status: StatusCode) {
        if self.committed {
            tracing::debug!(status = %status, "Superfluous write_header call ignored");
            return;
        }
        self.status = status;
        self.committed = true;
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.committed {
            self.write_header(StatusCode::OK);
        }
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn pusher(&self) -> Option<&dyn Pusher> {
        self.pusher.as_ref().map(|p| p as &dyn Pusher)
    }

    fn as_flush(&mut self) -> Option<&mut dyn Flush> {
        Some(self)
    }

    fn as_close_notify(&self) -> Option<&dyn CloseNotify> {
        if self.closed.is_some() {
            Some(self)
        } else {
            None
        }
    }

    fn as_write_str(&mut self) -> Option<&mut dyn WriteStr> {
        Some(self)
    }
}

impl Flush for BufferedResponse {
    fn flush(&mut self) -> io::Result<()> {
        if !self.committed {
            self.write_header(StatusCode::OK);
        }
        self.flushes += 1;
        Ok(())
    }
}

impl WriteStr for BufferedResponse {
    fn write_str(&mut self, s: &str) -> io::Result<usize> {
        self.write(s.as_bytes())
    }
}

impl CloseNotify for BufferedResponse {
    fn close_notify(&self) -> watch::Receiver<bool> {
        match &self.closed {
            Some(closed) => closed.clone(),
            // Never closes
            None => watch::channel(false).1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::writer::Capabilities;

    #[test]
    fn test_first_commit_wins() {
        let mut w = BufferedResponse::new();
        w.write_header(StatusCode::NOT_FOUND);
        w.write_header(StatusCode::OK);
        assert_eq!(w.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_write_commits_ok() {
        let mut w = BufferedResponse::new();
        w.write(b"hello").unwrap();
        w.write_str(" world").unwrap();
        assert!(w.is_committed());
        assert_eq!(w.status(), StatusCode::OK);
        assert_eq!(w.body(), b"hello world");
    }

    #[test]
    fn test_capabilities() {
        let mut plain = BufferedResponse::new();
        assert_eq!(
            Capabilities::probe(&mut plain),
            Capabilities {
                flush: true,
                close_notify: false,
                write_str: true,
            }
        );

        let (_tx, rx) = watch::channel(false);
        let mut notifying = BufferedResponse::new().with_close_signal(rx);
        assert!(Capabilities::probe(&mut notifying).close_notify);
    }

    #[tokio::test]
    async fn test_close_notify() {
        let (tx, rx) = watch::channel(false);
        let w = BufferedResponse::new().with_close_signal(rx);
        let mut closed = w.as_close_notify().unwrap().close_notify();
        tx.send(true).unwrap();
        closed.changed().await.unwrap();
        assert!(*closed.borrow());
    }
}
