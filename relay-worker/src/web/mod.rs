//! Web server module for receiving inbound email.
//!
//! This module provides a thin web server that:
//! - Accepts one raw RFC 822 message per `POST /inbound`
//! - Extracts headers and envelope addresses
//! - Forwards the message to the configured webhook
//! - Acknowledges the request regardless of the forward outcome

pub mod handlers;
pub mod headers;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use handlers::{
    health, inbound_email, AppState, HealthResponse, InboundResponse, ENVELOPE_FROM_HEADER,
    ENVELOPE_TO_HEADER,
};
pub use headers::{first_address, split_headers};

/// Build the inbound router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/inbound", post(inbound_email))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
