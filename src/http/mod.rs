//! HTTP binding subsystem.
//!
//! # Data Flow
//! ```text
//! axum handler response
//!     → middleware.rs (split head from body)
//!     → recorder.rs BufferedResponse (head as a ResponseWriter)
//!     → push decorators (commit once)
//!     → middleware.rs (reassemble head + original body)
//!     → Send to client
//! ```

pub mod middleware;
pub mod recorder;
pub mod writer;

pub use middleware::{redirect_push_middleware, server_push_middleware};
pub use recorder::BufferedResponse;
pub use writer::{Capabilities, CloseNotify, Flush, ResponseWriter, WriteStr};
