//! Response writer abstraction and its optional capabilities.
//!
//! A [`ResponseWriter`] is the outgoing side of one response: mutable
//! headers, a one-time header commit and a body sink. Optional capabilities
//! are discovered through the `as_*` probes so that wrappers can forward
//! exactly what the wrapped writer supports.

use std::io;

use axum::http::{HeaderMap, StatusCode};
use tokio::sync::watch;

use crate::push::Pusher;

/// The outgoing half of a single HTTP response.
pub trait ResponseWriter {
    fn headers(&self) -> &HeaderMap;

    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Commit the status line and headers.
    fn write_header(&mut self, status: StatusCode);

    /// Write body bytes, committing `200 OK` first if needed.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// The push capability of the underlying connection, if any.
    fn pusher(&self) -> Option<&dyn Pusher> {
        None
    }

    fn as_flush(&mut self) -> Option<&mut dyn Flush> {
        None
    }

    fn as_close_notify(&self) -> Option<&dyn CloseNotify> {
        None
    }

    fn as_write_str(&mut self) -> Option<&mut dyn WriteStr> {
        None
    }
}

/// Flushes buffered body data to the client.
pub trait Flush {
    fn flush(&mut self) -> io::Result<()>;
}

/// Signals when the client connection goes away.
pub trait CloseNotify {
    /// Receiver that flips to `true` once the connection is closed.
    fn close_notify(&self) -> watch::Receiver<bool>;
}

/// Writes string data without an intermediate byte conversion.
pub trait WriteStr {
    fn write_str(&mut self, s: &str) -> io::Result<usize>;
}

/// The optional capabilities a writer exposes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub flush: bool,
    pub close_notify: bool,
    pub write_str: bool,
}

impl Capabilities {
    /// Probe `writer` for each optional capability independently.
    pub fn probe<W: ResponseWriter + ?Sized>(writer: &mut W) -> Self {
        Self {
            flush: writer.as_flush().is_some(),
            close_notify: writer.as_close_notify().is_some(),
            write_str: writer.as_write_str().is_some(),
        }
    }
}

impl<W: ResponseWriter + ?Sized> ResponseWriter for &mut W {
    fn headers(&self) -> &HeaderMap {
        (**self).headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        (**self).headers_mut()
    }

    fn write_header(&mut self, status: StatusCode) {
        (**self).write_header(status)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (**self).write(buf)
    }

    fn pusher(&self) -> Option<&dyn Pusher> {
        (**self).pusher()
    }

    fn as_flush(&mut self) -> Option<&mut dyn Flush> {
        (**self).as_flush()
    }

    fn as_close_notify(&self) -> Option<&dyn CloseNotify> {
        (**self).as_close_notify()
    }

    fn as_write_str(&mut self) -> Option<&mut dyn WriteStr> {
        (**self).as_write_str()
    }
}

impl<W: ResponseWriter + ?Sized> ResponseWriter for Box<W> {
    fn headers(&self) -> &HeaderMap {
        (**self).headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        (**self).headers_mut()
    }

    fn write_header(&mut self, status: StatusCode) {
        (**self).write_header(status)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (**self).write(buf)
    }

    fn pusher(&self) -> Option<&dyn Pusher> {
        (**self).pusher()
    }

    fn as_flush(&mut self) -> Option<&mut dyn Flush> {
        (**self).as_flush()
    }

    fn as_close_notify(&self) -> Option<&dyn CloseNotify> {
        (**self).as_close_notify()
    }

    fn as_write_str(&mut self) -> Option<&mut dyn WriteStr> {
        (**self).as_write_str()
    }
}
