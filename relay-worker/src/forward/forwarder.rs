//! Forwarding a drained email to the configured webhook.

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::Value;
use tracing::info;
use url::Url;

use super::outcome::ForwardOutcome;
use crate::config::{check_webhook_scheme, ConfigError};
use crate::event::InboundEmailEvent;
use crate::stream::drain;

/// Content type of the forwarded request body.
pub const RFC822_CONTENT_TYPE: &str = "message/rfc822";

/// Header marking a request as sent by this relay.
pub const ORIGIN_MARKER_HEADER: &str = "X-Email-Relay";

/// Forwards raw emails to a single webhook endpoint.
///
/// Cloning is cheap: the HTTP client shares its connection pool and the URL is
/// read-only.
#[derive(Debug, Clone)]
pub struct EmailForwarder {
    client: Client,
    webhook_url: Url,
}

impl EmailForwarder {
    /// Create a forwarder posting to `webhook_url` through `client`.
    ///
    /// Fails with [`ConfigError::UnsupportedScheme`] unless the URL is http(s).
    pub fn new(client: Client, webhook_url: Url) -> Result<Self, ConfigError> {
        check_webhook_scheme(&webhook_url)?;
        Ok(Self {
            client,
            webhook_url,
        })
    }

    /// Forward one email and return what happened.
    ///
    /// The raw content is drained in full before any request is made, then sent
    /// as the literal body of a single POST. This never panics and never returns
    /// an error; failures are variants of [`ForwardOutcome`].
    pub async fn forward(&self, event: InboundEmailEvent) -> ForwardOutcome {
        let InboundEmailEvent {
            from,
            to,
            headers,
            raw_content,
        } = event;

        info!(
            from = %from,
            to = %to,
            subject = ?headers.get("subject"),
            "email_received"
        );

        let raw_email = match drain(raw_content).await {
            Ok(bytes) => bytes,
            Err(e) => return ForwardOutcome::StreamFailed(e),
        };

        info!(
            to = %to,
            raw_email_length = raw_email.len(),
            webhook_host = ?self.webhook_url.host_str(),
            "email_forward_starting"
        );

        let response = match self
            .client
            .post(self.webhook_url.clone())
            .header(CONTENT_TYPE, RFC822_CONTENT_TYPE)
            .header(ORIGIN_MARKER_HEADER, "true")
            .body(raw_email)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => return ForwardOutcome::TransportFailed(e),
        };

        let status = response.status();

        if status.is_success() {
            let body = match response.bytes().await {
                Ok(body) => body,
                Err(e) => return ForwardOutcome::TransportFailed(e),
            };

            match serde_json::from_slice::<Value>(&body) {
                Ok(acknowledgment) => ForwardOutcome::Delivered {
                    status: status.as_u16(),
                    acknowledgment,
                },
                Err(error) => ForwardOutcome::MalformedAcknowledgment {
                    status: status.as_u16(),
                    body: String::from_utf8_lossy(&body).into_owned(),
                    error,
                },
            }
        } else {
            let status_text = status.canonical_reason().unwrap_or("").to_string();

            match response.text().await {
                Ok(body) => ForwardOutcome::Rejected {
                    status: status.as_u16(),
                    status_text,
                    body,
                },
                Err(e) => ForwardOutcome::TransportFailed(e),
            }
        }
    }

    /// Per-event entry point: forward the email and log the outcome.
    ///
    /// Nothing is returned to the caller; the platform only needs to know the
    /// event was taken.
    pub async fn handle(&self, event: InboundEmailEvent) {
        let to = event.to.clone();
        let outcome = self.forward(event).await;
        outcome.report(&to);
    }
}
