//! Message header extraction for inbound requests.
//!
//! The host needs the message headers (for the subject line and envelope
//! fallbacks) before the body has been drained. We read just enough chunks to
//! cover the header block, parse it, and then replay those chunks in front of
//! the remaining stream so the drainer still sees every byte once, in order.

use bytes::{Bytes, BytesMut};
use futures::stream::{self, StreamExt};
use mailparse::{addrparse, parse_headers, MailAddr};
use tracing::{debug, warn};

use crate::event::{BoxError, MessageHeaders, RawContent};

/// Read the header block from the front of `raw`.
///
/// Returns the parsed headers and a stream equivalent to the original one. At
/// most `max_peek` bytes (rounded up to a chunk) are buffered; if the header
/// block does not end within that, the headers are left empty. A read error is
/// replayed after the peeked chunks rather than reported here.
pub async fn split_headers(mut raw: RawContent, max_peek: usize) -> (MessageHeaders, RawContent) {
    let mut peeked: Vec<Bytes> = Vec::new();
    let mut window = BytesMut::new();
    let mut failure: Option<BoxError> = None;
    let mut exhausted = false;
    let mut found_end = false;

    while window.len() < max_peek {
        match raw.next().await {
            Some(Ok(chunk)) => {
                // A separator can straddle the previous chunk boundary.
                let search_from = window.len().saturating_sub(3);
                window.extend_from_slice(&chunk);
                peeked.push(chunk);

                if find_header_end(&window, search_from).is_some() {
                    found_end = true;
                    break;
                }
            }
            Some(Err(e)) => {
                failure = Some(e);
                break;
            }
            None => {
                exhausted = true;
                break;
            }
        }
    }

    let headers = if found_end || exhausted {
        parse_header_block(&window)
    } else {
        if failure.is_none() {
            warn!(
                peeked_bytes = window.len(),
                max_peek = max_peek,
                "inbound_header_block_too_large"
            );
        }
        MessageHeaders::new()
    };

    debug!(
        peeked_chunks = peeked.len(),
        peeked_bytes = window.len(),
        header_count = headers.len(),
        "inbound_headers_split"
    );

    let prefix = stream::iter(peeked.into_iter().map(Ok::<Bytes, BoxError>));

    let replay = match failure {
        Some(e) => RawContent::new(prefix.chain(stream::once(async move { Err::<Bytes, BoxError>(e) }))),
        None if exhausted => RawContent::new(prefix),
        None => RawContent::new(prefix.chain(raw)),
    };

    (headers, replay)
}

/// Position just past the blank line ending the header block, searching from `from`.
///
/// Accepts both CRLF and bare LF line endings. A message that starts with a
/// blank line has an empty header block.
fn find_header_end(buf: &[u8], from: usize) -> Option<usize> {
    if buf.starts_with(b"\r\n") {
        return Some(2);
    }
    if buf.starts_with(b"\n") {
        return Some(1);
    }

    let mut i = from;
    while i + 1 < buf.len() {
        if buf[i] == b'\n' {
            if buf[i + 1] == b'\n' {
                return Some(i + 2);
            }
            if buf[i + 1] == b'\r' && i + 2 < buf.len() && buf[i + 2] == b'\n' {
                return Some(i + 3);
            }
        }
        i += 1;
    }
    None
}

fn parse_header_block(block: &[u8]) -> MessageHeaders {
    match parse_headers(block) {
        Ok((parsed, _body_offset)) => parsed
            .iter()
            .map(|h| (h.get_key(), h.get_value()))
            .collect(),
        Err(e) => {
            warn!(error = %e, "inbound_header_parse_failed");
            MessageHeaders::new()
        }
    }
}

/// First mailbox address in an address-list header value such as `From`.
pub fn first_address(value: &str) -> Option<String> {
    let list = addrparse(value).ok()?;
    list.iter().find_map(|addr| match addr {
        MailAddr::Single(info) => Some(info.addr.clone()),
        MailAddr::Group(group) => group.addrs.first().map(|info| info.addr.clone()),
    })
}
