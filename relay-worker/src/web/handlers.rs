//! Inbound endpoint handlers.
//!
//! The inbound handler turns one HTTP request into an [`InboundEmailEvent`],
//! runs it through the forwarder, and acknowledges it. The forward outcome is
//! logged, not returned: the sender only learns that the message was taken.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::event::{InboundEmailEvent, MessageHeaders, RawContent};
use crate::forward::EmailForwarder;
use crate::web::headers::{first_address, split_headers};
use crate::Config;

/// Request header carrying the envelope sender.
pub const ENVELOPE_FROM_HEADER: &str = "X-Envelope-From";

/// Request header carrying the envelope recipient.
pub const ENVELOPE_TO_HEADER: &str = "X-Envelope-To";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Arc<EmailForwarder>,
    pub max_header_peek_bytes: usize,
}

impl AppState {
    pub fn new(config: &Config, forwarder: EmailForwarder) -> Self {
        Self {
            forwarder: Arc::new(forwarder),
            max_header_peek_bytes: config.max_header_peek_bytes,
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Inbound Email
// =============================================================================

/// Inbound response.
#[derive(Serialize)]
pub struct InboundResponse {
    pub status: &'static str,
}

/// Inbound email endpoint.
///
/// The request body is the raw RFC 822 message. Envelope addresses come from
/// the `X-Envelope-From` / `X-Envelope-To` request headers, falling back to the
/// message's own `From` / `To` headers.
pub async fn inbound_email(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> impl IntoResponse {
    let raw = RawContent::new(body.into_data_stream());
    let (message_headers, raw) = split_headers(raw, state.max_header_peek_bytes).await;

    let from = envelope_address(&headers, ENVELOPE_FROM_HEADER, &message_headers, "from");
    let to = envelope_address(&headers, ENVELOPE_TO_HEADER, &message_headers, "to");

    info!(
        from = %from,
        to = %to,
        header_count = message_headers.len(),
        "inbound_email_accepted"
    );

    let event = InboundEmailEvent::new(from, to, message_headers, raw);
    state.forwarder.handle(event).await;

    (
        StatusCode::ACCEPTED,
        Json(InboundResponse { status: "accepted" }),
    )
}

/// Resolve an envelope address from the request header, then the message header.
fn envelope_address(
    request_headers: &HeaderMap,
    request_header: &str,
    message_headers: &MessageHeaders,
    message_header: &str,
) -> String {
    request_headers
        .get(request_header)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| message_headers.get(message_header).and_then(first_address))
        .unwrap_or_default()
}
