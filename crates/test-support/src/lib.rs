use anyhow::Context as _;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Pick an unused TCP port on localhost.
///
/// Note: this does not reserve the port; it's still possible for another process to bind it
/// before you do.
///
/// # Errors
///
/// Returns an error if binding an ephemeral localhost port fails or if the bound socket's
/// local address cannot be read.
pub fn pick_unused_port() -> anyhow::Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0").context("bind ephemeral port")?;
    Ok(listener.local_addr()?.port())
}

/// Canned response served by [`MockUpstream`] for every request.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl MockResponse {
    #[must_use]
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: Some("application/json".to_string()),
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[must_use]
    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: Some("text/plain".to_string()),
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// A request as seen by [`MockUpstream`].
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    /// Header names are lowercase.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

struct MockState {
    response: MockResponse,
    captured: mpsc::UnboundedSender<CapturedRequest>,
}

/// Local HTTP server that records every request it receives and answers with a fixed response.
pub struct MockUpstream {
    base_url: String,
    requests: mpsc::UnboundedReceiver<CapturedRequest>,
    shutdown: Option<oneshot::Sender<()>>,
    server: Option<JoinHandle<std::io::Result<()>>>,
}

impl MockUpstream {
    /// Bind an ephemeral localhost port and start serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start(response: MockResponse) -> anyhow::Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let state = Arc::new(MockState {
            response,
            captured: tx,
        });

        let app = Router::new()
            .route("/", any(capture))
            .route("/{*path}", any(capture))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind mock upstream")?;
        let addr = listener.local_addr().context("mock upstream local_addr")?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        });
        let server = tokio::spawn(async move { server.await });

        Ok(Self {
            base_url: format!("http://{addr}"),
            requests: rx,
            shutdown: Some(shutdown_tx),
            server: Some(server),
        })
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Wait for the next captured request.
    ///
    /// # Errors
    ///
    /// Returns an error if no request arrives within five seconds.
    pub async fn next_request(&mut self) -> anyhow::Result<CapturedRequest> {
        tokio::time::timeout(Duration::from_secs(5), self.requests.recv())
            .await
            .context("timeout waiting for upstream request")?
            .context("mock upstream stopped")
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.server.take() {
            handle.abort();
        }
    }
}

async fn capture(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let headers = headers
        .iter()
        .map(|(k, v)| {
            (
                k.as_str().to_string(),
                String::from_utf8_lossy(v.as_bytes()).into_owned(),
            )
        })
        .collect();
    let _ = state.captured.send(CapturedRequest {
        method: method.as_str().to_string(),
        path: uri.path().to_string(),
        headers,
        body: body.to_vec(),
    });

    let spec = &state.response;
    let status = StatusCode::from_u16(spec.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = (status, spec.body.clone()).into_response();

    let out = response.headers_mut();
    out.remove(axum::http::header::CONTENT_TYPE);
    if let Some(ct) = &spec.content_type
        && let Ok(v) = HeaderValue::from_str(ct)
    {
        out.insert(axum::http::header::CONTENT_TYPE, v);
    }
    for (name, value) in &spec.headers {
        if let (Ok(n), Ok(v)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            out.append(n, v);
        }
    }

    response
}
