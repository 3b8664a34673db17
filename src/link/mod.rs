//! `Link` header handling.
//!
//! # Data Flow
//! ```text
//! Response Link header value(s)
//!     → parser.rs split_fields (comma separated)
//!     → parser.rs parse_link (path + attributes)
//!     → push candidates (rel=preload, no nopush)
//! ```
//!
//! # Design Decisions
//! - Only root-relative paths are candidates; absolute and protocol-relative
//!   URLs are never pushed
//! - Attribute matching is exact and case-sensitive
//! - Parsing borrows from the header text; nothing is allocated per link

pub mod parser;

pub use parser::{parse_link, split_fields, Link};
