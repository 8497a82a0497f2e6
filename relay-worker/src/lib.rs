//! MailRelay - Inbound email to webhook relay.
//!
//! This library provides the modules used by the `mailrelay` binary:
//! - `event`: the inbound email event and its single-use raw content stream
//! - `stream`: draining raw content into one buffer
//! - `forward`: posting the buffer to the webhook and classifying the outcome
//! - `web`: the HTTP listener that turns requests into events
//!
//! ## Architecture
//!
//! ```text
//! POST /inbound → InboundEmailEvent → drain → POST webhook → log outcome
//! ```

pub mod config;
pub mod event;
pub mod forward;
pub mod stream;
pub mod web;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use config::{Config, ConfigError};
pub use event::{InboundEmailEvent, MessageHeaders, RawContent};
pub use forward::{EmailForwarder, ForwardOutcome};
pub use stream::{drain, StreamReadError};
pub use web::AppState;
