//! Test helpers: an in-process webhook that records what it receives, and a
//! log sink for asserting on emitted events.

use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

/// A request captured by [`MockWebhook`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    body: &'static str,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// Webhook endpoint answering every POST with a fixed status and body.
pub struct MockWebhook {
    pub url: Url,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    server: JoinHandle<()>,
}

impl MockWebhook {
    pub async fn start(status: StatusCode, body: &'static str) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            status,
            body,
            requests: Arc::clone(&requests),
        };

        let app = Router::new()
            .route("/webhook/email", post(record))
            .with_state(state);

        let (addr, server) = serve(app).await;
        let url = Url::parse(&format!("http://{}/webhook/email", addr)).unwrap();

        Self {
            url,
            requests,
            server,
        }
    }

    /// Requests received so far, in arrival order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for MockWebhook {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn record(
    State(state): State<MockState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    state
        .requests
        .lock()
        .unwrap()
        .push(RecordedRequest { headers, body });
    (state.status, state.body)
}

/// Serve `app` on an ephemeral loopback port.
pub async fn serve(app: Router) -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, server)
}

/// A loopback URL with nothing listening behind it.
pub async fn unreachable_url() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    Url::parse(&format!("http://{}/webhook/email", addr)).unwrap()
}

/// JSON log lines written while [`CapturedLogs::capture`] runs.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl CapturedLogs {
    /// Run `f` with a JSON subscriber (same shape as the binary's) writing here.
    pub fn capture<R>(&self, f: impl FnOnce() -> R) -> R {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .flatten_event(true)
            .with_max_level(tracing::Level::TRACE)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f)
    }

    /// Every captured event, one JSON object per line.
    pub fn events(&self) -> Vec<serde_json::Value> {
        let raw = self.0.lock().unwrap().clone();
        String::from_utf8(raw)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    /// The first event whose message is `name`.
    pub fn event(&self, name: &str) -> Option<serde_json::Value> {
        self.events().into_iter().find(|e| e["message"] == name)
    }
}
