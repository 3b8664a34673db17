//! Server push decorators.
//!
//! # Data Flow
//! ```text
//! Response head (status + headers)
//!     → decorator.rs Decorated (first commit only)
//!         → links.rs LinkPushHook: Link candidates → memory → Pusher
//!         → redirect.rs RedirectPushHook: 3xx Location → Pusher
//!     → rewritten head committed to the wrapped writer
//! ```
//!
//! # Design Decisions
//! - The push capability is an injected [`Pusher`]; writers without one
//!   are never decorated
//! - Requests carrying the sentinel header are never decorated
//! - Push failures never fail the response

pub mod decorator;
pub mod links;
pub mod options;
pub mod pusher;
pub mod redirect;

pub use decorator::{CommitHook, Decorated};
pub use links::{LinkPushHook, PushOutcome, PushWriter, ServerPush};
pub use options::{is_push, is_push_headers, PushOptions, PROXIED_HEADERS, SENTINEL_HEADER};
pub use pusher::{PushError, PushHandle, Pusher};
pub use redirect::{RedirectPush, RedirectPushHook, RedirectWriter};
