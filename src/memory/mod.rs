//! Client-side push memory.
//!
//! # Data Flow
//! ```text
//! Request Cookie header
//!     → codec.rs decode (base64 → inflate → raw filter)
//!     → bloom.rs PushMemory (test / add during one response)
//!     → codec.rs encode (raw filter → deflate → base64)
//!     → Set-Cookie on the response
//! ```
//!
//! # Design Decisions
//! - The memory is best-effort: any decode failure yields a fresh filter
//! - Append-only; a path is never removed once added
//! - Compressor/decompressor state is pooled across requests, never the
//!   memory itself

pub mod bloom;
pub mod codec;
pub mod pool;

pub use bloom::{estimate_parameters, PushMemory, MAX_BITS, MAX_ROUNDS};
pub use codec::{CodecError, StateCodec};
pub use pool::{Pooled, Scratch, ScratchPool};
