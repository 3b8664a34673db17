//! HTTP/2 server push driven by `Link` preload headers.
//!
//! Responses are decorated so that, right before their headers are
//! committed, every root-relative `rel=preload` link the client has not
//! already received is pushed. What was pushed is remembered client-side in
//! a compressed bloom filter cookie. A sibling decorator pushes the target
//! of same-origin redirects.

pub mod config;
pub mod http;
pub mod link;
pub mod memory;
pub mod observability;
pub mod push;

pub use config::schema::PushConfig;
pub use http::{redirect_push_middleware, server_push_middleware, BufferedResponse, ResponseWriter};
pub use memory::{estimate_parameters, PushMemory, StateCodec};
pub use push::{is_push, PushError, PushHandle, Pusher, RedirectPush, ServerPush};
