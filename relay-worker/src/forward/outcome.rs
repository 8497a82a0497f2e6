//! Outcome of forwarding one email, and how each outcome is logged.

use serde_json::Value;
use tracing::{error, info};

use crate::stream::StreamReadError;

/// Longest slice of an unparseable acknowledgment body that is logged.
const MAX_BODY_PREVIEW_CHARS: usize = 500;

/// Result of a single forward attempt.
///
/// Every path through [`EmailForwarder::forward`](super::EmailForwarder::forward)
/// ends in exactly one of these; none of them is propagated to the event source.
#[derive(Debug)]
pub enum ForwardOutcome {
    /// Webhook answered 2xx with a JSON acknowledgment.
    Delivered {
        status: u16,
        acknowledgment: Value,
    },
    /// Webhook answered with a non-2xx status.
    Rejected {
        status: u16,
        status_text: String,
        body: String,
    },
    /// Webhook answered 2xx but the body was not valid JSON.
    MalformedAcknowledgment {
        status: u16,
        body: String,
        error: serde_json::Error,
    },
    /// The request could not be completed (connect, timeout, reset, body read).
    TransportFailed(reqwest::Error),
    /// The raw email could not be drained; no request was sent.
    StreamFailed(StreamReadError),
}

impl ForwardOutcome {
    /// Short, stable name of the variant, logged as the `outcome` field.
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardOutcome::Delivered { .. } => "delivered",
            ForwardOutcome::Rejected { .. } => "rejected",
            ForwardOutcome::MalformedAcknowledgment { .. } => "malformed_acknowledgment",
            ForwardOutcome::TransportFailed(_) => "transport_failed",
            ForwardOutcome::StreamFailed(_) => "stream_failed",
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, ForwardOutcome::Delivered { .. })
    }

    /// Emit the log entry for this outcome.
    pub fn report(&self, to: &str) {
        let outcome = self.kind();
        match self {
            ForwardOutcome::Delivered {
                status,
                acknowledgment,
            } => {
                info!(
                    outcome,
                    to = %to,
                    status_code = status,
                    acknowledgment = %acknowledgment,
                    "email_forward_delivered"
                );
            }
            ForwardOutcome::Rejected {
                status,
                status_text,
                body,
            } => {
                error!(
                    outcome,
                    to = %to,
                    status_code = status,
                    status_text = %status_text,
                    error_details = %body,
                    "email_forward_rejected"
                );
            }
            ForwardOutcome::MalformedAcknowledgment {
                status,
                body,
                error,
            } => {
                error!(
                    outcome,
                    to = %to,
                    status_code = status,
                    error = %error,
                    body_length = body.len(),
                    body_preview = preview(body),
                    "email_forward_ack_malformed"
                );
            }
            ForwardOutcome::TransportFailed(e) => {
                error!(
                    outcome,
                    to = %to,
                    error = %e,
                    is_connect = e.is_connect(),
                    is_timeout = e.is_timeout(),
                    detail = ?e,
                    "email_forward_transport_error"
                );
            }
            ForwardOutcome::StreamFailed(e) => {
                error!(
                    outcome,
                    to = %to,
                    error = %e,
                    chunks_read = e.chunks_read,
                    detail = ?e.source,
                    "email_stream_read_failed"
                );
            }
        }
    }
}

/// Leading characters of `text`, cut on a char boundary.
fn preview(text: &str) -> &str {
    match text.char_indices().nth(MAX_BODY_PREVIEW_CHARS) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use reqwest::Client;

    use super::*;
    use crate::testing::{unreachable_url, CapturedLogs};

    fn malformed(body: &str) -> ForwardOutcome {
        let error = serde_json::from_str::<Value>(body).unwrap_err();
        ForwardOutcome::MalformedAcknowledgment {
            status: 200,
            body: body.to_string(),
            error,
        }
    }

    #[test]
    fn test_kind() {
        let delivered = ForwardOutcome::Delivered {
            status: 201,
            acknowledgment: serde_json::json!({"status": "ok"}),
        };
        assert_eq!(delivered.kind(), "delivered");
        assert!(delivered.is_delivered());

        let rejected = ForwardOutcome::Rejected {
            status: 503,
            status_text: "Service Unavailable".to_string(),
            body: "down".to_string(),
        };
        assert_eq!(rejected.kind(), "rejected");
        assert!(!rejected.is_delivered());

        let bad_ack = malformed("not json");
        assert_eq!(bad_ack.kind(), "malformed_acknowledgment");
        assert!(!bad_ack.is_delivered());

        let stream_failed = ForwardOutcome::StreamFailed(StreamReadError {
            chunks_read: 3,
            source: Box::new(io::Error::new(io::ErrorKind::BrokenPipe, "gone")),
        });
        assert_eq!(stream_failed.kind(), "stream_failed");
    }

    #[test]
    fn test_report_delivered_logs_acknowledgment() {
        let logs = CapturedLogs::default();
        let outcome = ForwardOutcome::Delivered {
            status: 200,
            acknowledgment: serde_json::json!({"status": "ok"}),
        };

        logs.capture(|| outcome.report("inbox@example.com"));

        let event = logs.event("email_forward_delivered").unwrap();
        assert_eq!(event["level"], "INFO");
        assert_eq!(event["outcome"], "delivered");
        assert_eq!(event["to"], "inbox@example.com");
        assert_eq!(event["status_code"], 200);
        let acknowledgment: Value =
            serde_json::from_str(event["acknowledgment"].as_str().unwrap()).unwrap();
        assert_eq!(acknowledgment, serde_json::json!({"status": "ok"}));
    }

    #[test]
    fn test_report_rejected_logs_status_and_body() {
        let logs = CapturedLogs::default();
        let outcome = ForwardOutcome::Rejected {
            status: 500,
            status_text: "Internal Server Error".to_string(),
            body: "internal error".to_string(),
        };

        logs.capture(|| outcome.report("inbox@example.com"));

        let event = logs.event("email_forward_rejected").unwrap();
        assert_eq!(event["level"], "ERROR");
        assert_eq!(event["outcome"], "rejected");
        assert_eq!(event["status_code"], 500);
        assert_eq!(event["status_text"], "Internal Server Error");
        assert_eq!(event["error_details"], "internal error");
    }

    #[test]
    fn test_report_malformed_logs_bounded_preview() {
        let logs = CapturedLogs::default();
        let outcome = malformed(&"x".repeat(2000));

        logs.capture(|| outcome.report("inbox@example.com"));

        let event = logs.event("email_forward_ack_malformed").unwrap();
        assert_eq!(event["level"], "ERROR");
        assert_eq!(event["outcome"], "malformed_acknowledgment");
        assert_eq!(event["body_length"], 2000);
        assert_eq!(
            event["body_preview"].as_str().unwrap().len(),
            MAX_BODY_PREVIEW_CHARS
        );
    }

    #[tokio::test]
    async fn test_report_transport_error() {
        let error = Client::new()
            .post(unreachable_url().await)
            .body("Subject: x\r\n\r\n")
            .send()
            .await
            .unwrap_err();
        let logs = CapturedLogs::default();
        let outcome = ForwardOutcome::TransportFailed(error);

        logs.capture(|| outcome.report("inbox@example.com"));

        let event = logs.event("email_forward_transport_error").unwrap();
        assert_eq!(event["level"], "ERROR");
        assert_eq!(event["outcome"], "transport_failed");
        assert_eq!(event["is_connect"], true);
        assert_eq!(event["is_timeout"], false);
        assert!(!event["error"].as_str().unwrap().is_empty());
    }

    #[test]
    fn test_report_stream_failure() {
        let logs = CapturedLogs::default();
        let outcome = ForwardOutcome::StreamFailed(StreamReadError {
            chunks_read: 2,
            source: "boom".into(),
        });

        logs.capture(|| outcome.report("inbox@example.com"));

        let event = logs.event("email_stream_read_failed").unwrap();
        assert_eq!(event["outcome"], "stream_failed");
        assert_eq!(event["chunks_read"], 2);
        assert!(event["error"].as_str().unwrap().contains("boom"));
    }

    #[test]
    fn test_preview_limits_length() {
        let long = "a".repeat(MAX_BODY_PREVIEW_CHARS + 10);
        assert_eq!(preview(&long).len(), MAX_BODY_PREVIEW_CHARS);
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn test_preview_multibyte_boundary() {
        let text = "é".repeat(MAX_BODY_PREVIEW_CHARS + 1);
        let cut = preview(&text);
        assert_eq!(cut.chars().count(), MAX_BODY_PREVIEW_CHARS);
    }
}
