//! Draining a raw-content stream into one contiguous buffer.

use bytes::{BufMut, Bytes, BytesMut};
use futures::StreamExt;
use thiserror::Error;
use tracing::debug;

use crate::event::{BoxError, RawContent};

/// The raw-content stream failed before reaching end-of-stream.
#[derive(Debug, Error)]
#[error("failed to read raw email stream after {chunks_read} chunk(s): {source}")]
pub struct StreamReadError {
    /// Chunks successfully read before the failure
    pub chunks_read: usize,
    #[source]
    pub source: BoxError,
}

/// Consume `raw` to completion and return its bytes as a single buffer.
///
/// Chunks are collected in arrival order, then copied into one allocation sized
/// to their total length. If the stream yields an error, no partial buffer is
/// returned.
pub async fn drain(mut raw: RawContent) -> Result<Bytes, StreamReadError> {
    let mut chunks: Vec<Bytes> = Vec::new();

    while let Some(next) = raw.next().await {
        match next {
            Ok(chunk) => chunks.push(chunk),
            Err(source) => {
                return Err(StreamReadError {
                    chunks_read: chunks.len(),
                    source,
                })
            }
        }
    }

    let total_length: usize = chunks.iter().map(Bytes::len).sum();

    let mut buffer = BytesMut::with_capacity(total_length);
    for chunk in &chunks {
        buffer.put_slice(chunk);
    }

    debug!(
        chunk_count = chunks.len(),
        total_length = total_length,
        "raw_stream_drained"
    );

    Ok(buffer.freeze())
}
