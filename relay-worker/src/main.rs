//! MailRelay - Inbound email relay server.
//!
//! This binary provides a thin web server that:
//! - Receives raw RFC 822 messages on `POST /inbound`
//! - Forwards each one, byte for byte, to the configured webhook
//! - Logs the outcome and acknowledges the sender
//!
//! There is no queue and no retry: each message results in at most one
//! outbound request.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use reqwest::Client;
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mailrelay::web::{router, AppState};
use mailrelay::{Config, EmailForwarder};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("relay_starting");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        port = config.port,
        webhook_host = ?config.webhook_url.host_str(),
        webhook_scheme = config.webhook_url.scheme(),
        max_header_peek_bytes = config.max_header_peek_bytes,
        "config_loaded"
    );

    // Shared HTTP client; no explicit timeout, transport defaults apply
    let client = Client::builder()
        .build()
        .context("Failed to create HTTP client")?;

    let forwarder = EmailForwarder::new(client, config.webhook_url.clone())
        .context("Failed to create email forwarder")?;
    let state = AppState::new(&config, forwarder);
    let app = router(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("relay_shutdown_complete");

    Ok(())
}

/// Resolve on SIGINT or SIGTERM, whichever comes first.
///
/// Requests already inside `/inbound` keep running until their forward
/// attempt has been logged; axum stops accepting new connections.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "sigint_handler_unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "sigterm_handler_unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let received = tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    };

    info!(signal = received, "relay_draining_inflight_emails");
}
