//! Inbound email event types.
//!
//! An [`InboundEmailEvent`] is built by the host for each received message and
//! lives only as long as the invocation that handles it. Its raw content is a
//! single-consumption byte stream: [`RawContent`] is move-only, so once it has
//! been handed to [`crate::stream::drain`] it cannot be read again.

use std::collections::HashMap;
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::stream::{self, BoxStream, Stream, StreamExt};

/// Boxed error yielded by a raw-content stream.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// =============================================================================
// Raw Content
// =============================================================================

/// Readable, non-seekable stream of raw RFC 822 bytes.
pub struct RawContent {
    inner: BoxStream<'static, Result<Bytes, BoxError>>,
}

impl RawContent {
    /// Wrap any chunked byte stream whose error type can be boxed.
    pub fn new<S, E>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<BoxError>,
    {
        Self {
            inner: stream.map(|chunk| chunk.map_err(Into::into)).boxed(),
        }
    }

    /// A stream that yields the given bytes as one chunk.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        let chunk: Result<Bytes, BoxError> = Ok(bytes.into());
        Self {
            inner: stream::once(async move { chunk }).boxed(),
        }
    }

    /// A stream that ends immediately.
    pub fn empty() -> Self {
        Self {
            inner: stream::empty::<Result<Bytes, BoxError>>().boxed(),
        }
    }
}

impl Stream for RawContent {
    type Item = Result<Bytes, BoxError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl fmt::Debug for RawContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawContent").finish_non_exhaustive()
    }
}

// =============================================================================
// Message Headers
// =============================================================================

/// Message header map with case-insensitive lookup.
///
/// Repeated headers are folded into a single value joined with `", "`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageHeaders {
    entries: HashMap<String, String>,
}

impl MessageHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header value, joining it onto any existing value for the same name.
    pub fn append(&mut self, name: &str, value: &str) {
        self.entries
            .entry(name.trim().to_ascii_lowercase())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }

    /// Look up a header by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.trim().to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for MessageHeaders {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = MessageHeaders::new();
        for (name, value) in iter {
            headers.append(name.as_ref(), value.as_ref());
        }
        headers
    }
}

// =============================================================================
// Inbound Email Event
// =============================================================================

/// One received email, as handed to the forwarder.
#[derive(Debug)]
pub struct InboundEmailEvent {
    /// Envelope sender address
    pub from: String,
    /// Envelope recipient address
    pub to: String,
    /// Message headers
    pub headers: MessageHeaders,
    /// Raw message bytes, readable exactly once
    pub raw_content: RawContent,
}

impl InboundEmailEvent {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        headers: MessageHeaders,
        raw_content: RawContent,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            headers,
            raw_content,
        }
    }

    /// The `Subject` header, if present.
    pub fn subject(&self) -> Option<&str> {
        self.headers.get("subject")
    }
}
