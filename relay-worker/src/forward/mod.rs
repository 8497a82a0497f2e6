//! Email forwarding module.
//!
//! ## Processing Flow
//!
//! ```text
//! InboundEmailEvent → drain(raw_content) → POST webhook → ForwardOutcome → log
//! ```

pub mod forwarder;
pub mod outcome;

pub use forwarder::{EmailForwarder, ORIGIN_MARKER_HEADER, RFC822_CONTENT_TYPE};
pub use outcome::ForwardOutcome;
