use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use streamd_parser::parse_cmd;
use streamd_tree::{Node, Session};
use streamd_types::{ControlError, ControlResult, ReturnCode};

use crate::config::HttpConfig;
use crate::envelope::envelope;
use crate::ipc::Ipc;
use crate::pool::WorkerPool;

const CORS_HEADERS: [(&str, &str); 3] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Headers", "origin,range,content-type"),
    ("Access-Control-Allow-Methods", "PUT, GET, POST, DELETE"),
];

#[derive(Clone)]
struct AppState {
    session: Arc<Session>,
    pool: Arc<WorkerPool>,
}

struct Active {
    local_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    pool: Arc<WorkerPool>,
    task: JoinHandle<std::io::Result<()>>,
}

/// The HTTP/JSON REST server.
///
/// Methods map onto the CRUD verbs (§GET→read, POST→create, PUT→update,
/// DELETE→delete); `GET /health` and `GET /pipelines/status` bypass the
/// worker pool and run inline on the accept task. All other requests are
/// handed to the bounded pool, and the worker completes the exchange
/// through a reply channel; a full pool answers 503 without touching the
/// session.
pub struct HttpServer {
    config: HttpConfig,
    session: Arc<Session>,
    active: Mutex<Option<Active>>,
}

impl HttpServer {
    pub fn new(config: HttpConfig, session: Arc<Session>) -> Self {
        Self {
            config,
            session,
            active: Mutex::new(None),
        }
    }

    /// The bound address while running.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.active.lock().await.as_ref().map(|a| a.local_addr)
    }

    async fn stop_active(active: Active) {
        // Drain queued and in-flight work before releasing the server;
        // tearing the server down first would orphan replies mid-write.
        let pool = active.pool.clone();
        let _ = tokio::task::spawn_blocking(move || pool.shutdown()).await;
        let _ = active.shutdown.send(());
        let _ = active.task.await;
    }
}

#[async_trait]
impl Ipc for HttpServer {
    async fn start(&self) -> ControlResult<()> {
        let mut slot = self.active.lock().await;
        if let Some(active) = slot.take() {
            Self::stop_active(active).await;
        }

        let bind_to = format!("{}:{}", self.config.address, self.config.port);
        let listener = TcpListener::bind(&bind_to).await.map_err(|err| {
            ControlError::NoConnection(format!("HTTP bind to {bind_to} failed: {err}"))
        })?;
        let local_addr = listener
            .local_addr()
            .map_err(|err| ControlError::NoConnection(err.to_string()))?;

        let pool = Arc::new(WorkerPool::new(self.config.max_threads as i64));
        let router = build_router(self.session.clone(), pool.clone());
        let (shutdown, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        *slot = Some(Active {
            local_addr,
            shutdown,
            pool,
            task,
        });
        info!(address = %local_addr, "HTTP protocol listening");
        Ok(())
    }

    async fn stop(&self) -> ControlResult<()> {
        let Some(active) = self.active.lock().await.take() else {
            return Ok(());
        };
        Self::stop_active(active).await;
        info!("HTTP protocol stopped");
        Ok(())
    }
}

pub(crate) fn build_router(session: Arc<Session>, pool: Arc<WorkerPool>) -> Router {
    // A single handler serves every path, as the verb mapping applies to
    // arbitrary tree paths; the two fast-path endpoints are recognized
    // inside it, ahead of the pool hand-off.
    Router::new()
        .fallback(dispatch)
        .with_state(AppState { session, pool })
}

fn with_cors(mut builder: axum::http::response::Builder) -> axum::http::response::Builder {
    for (name, value) in CORS_HEADERS {
        builder = builder.header(name, value);
    }
    builder
}

fn respond(code: ReturnCode, output: Option<&str>) -> Response {
    let status = StatusCode::from_u16(code.http_status()).expect("status from fixed table");
    let builder = with_cors(Response::builder().status(status));
    // A 204 must not carry a body; the status alone signals the code.
    if status == StatusCode::NO_CONTENT {
        return builder.body(Body::empty()).expect("static response");
    }
    builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(envelope(code, output)))
        .expect("static response")
}

fn respond_result(result: &ControlResult<Option<String>>) -> Response {
    match result {
        Ok(output) => respond(ReturnCode::Ok, output.as_deref()),
        Err(err) => respond(err.code(), None),
    }
}

fn service_unavailable() -> Response {
    with_cors(Response::builder().status(StatusCode::SERVICE_UNAVAILABLE))
        .body(Body::empty())
        .expect("static response")
}

fn fast_path(body: String) -> Response {
    with_cors(Response::builder().status(StatusCode::OK))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .expect("static response")
}

/// Liveness probe. Never calls into the engine.
fn health() -> Response {
    fast_path(r#"{"code":0,"description":"OK","response":{"status":"healthy"}}"#.to_string())
}

/// Lightweight pipeline listing. The snapshot is taken under the container
/// lock and every entry is a counted handle, so a concurrent delete cannot
/// invalidate the state queries.
fn pipelines_status(state: &AppState) -> Response {
    let snapshot = state.session.pipelines().list();
    let entries: Vec<Value> = snapshot
        .iter()
        .map(|pipeline| {
            json!({
                "name": pipeline.name(),
                "state": pipeline.current_state().as_str(),
            })
        })
        .collect();
    let body = json!({
        "code": 0,
        "description": "OK",
        "response": { "pipelines": entries, "count": entries.len() },
    });
    fast_path(body.to_string())
}

/// Extract `name`/`description` from a JSON body when the content type
/// declares one.
fn parse_json_body(headers: &HeaderMap, body: &Bytes) -> (Option<String>, Option<String>) {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("application/json"))
        .unwrap_or(false);
    if !is_json || body.is_empty() {
        return (None, None);
    }
    let Ok(Value::Object(object)) = serde_json::from_slice::<Value>(body) else {
        return (None, None);
    };
    let member = |key: &str| {
        object
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    (member("name"), member("description"))
}

fn build_command(
    method: &Method,
    path: &str,
    name: Option<String>,
    description: Option<String>,
) -> Result<String, ReturnCode> {
    match *method {
        Method::GET => Ok(format!("read {path}")),
        Method::POST => {
            let name = name.ok_or(ReturnCode::BadValue)?;
            Ok(match description {
                Some(description) => format!("create {path} {name} {description}"),
                None => format!("create {path} {name}"),
            })
        }
        Method::PUT => {
            let name = name.ok_or(ReturnCode::BadValue)?;
            Ok(format!("update {path} {name}"))
        }
        Method::DELETE => {
            let name = name.ok_or(ReturnCode::BadValue)?;
            Ok(format!("delete {path} {name}"))
        }
        _ => Err(ReturnCode::BadCommand),
    }
}

async fn dispatch(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    if method == Method::OPTIONS {
        return respond(ReturnCode::Ok, None);
    }

    let path = uri.path().to_string();
    // Fast paths run inline on the accept task, bypassing pool and parser.
    if method == Method::GET {
        if path == "/health" {
            return health();
        }
        if path == "/pipelines/status" {
            return pipelines_status(&state);
        }
    }

    let (mut name, mut description) = parse_json_body(&headers, &body);
    // Query-string values fill whatever the body left unset.
    if name.is_none() {
        name = query.get("name").cloned();
    }
    if description.is_none() {
        description = query.get("description").cloned();
    }

    let command = match build_command(&method, &path, name, description) {
        Ok(command) => command,
        Err(code) => return respond(code, None),
    };
    debug!(%method, path = %path, command = %command, "dispatching request");

    let (reply, reply_rx) = oneshot::channel();
    let session = state.session.clone();
    let job = Box::new(move || {
        let result = parse_cmd(&session, &command);
        let _ = reply.send(result);
    });
    if let Err(err) = state.pool.submit(job) {
        // The refused job drops here, releasing the reply channel and the
        // captured session reference.
        warn!(error = %err, "request rejected, worker pool unavailable");
        return service_unavailable();
    }

    match reply_rx.await {
        Ok(result) => respond_result(&result),
        Err(_) => service_unavailable(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    use streamd_engine::SimEngine;

    async fn start_server(max_threads: usize) -> (HttpServer, SocketAddr, Arc<Session>) {
        let session = Session::standalone("http-test", Arc::new(SimEngine::new()));
        let config = HttpConfig {
            port: 0,
            max_threads,
            ..HttpConfig::default()
        };
        let server = HttpServer::new(config, session.clone());
        server.start().await.unwrap();
        let addr = server.local_addr().await.unwrap();
        (server, addr, session)
    }

    /// Minimal HTTP/1.1 exchange over a raw socket; returns the status code
    /// and the full response text (headers and body).
    async fn http_request(
        addr: SocketAddr,
        method: &str,
        path: &str,
        content_type: Option<&str>,
        body: Option<&str>,
    ) -> (u16, String) {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let body = body.unwrap_or("");
        let mut request =
            format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
        if let Some(content_type) = content_type {
            request.push_str(&format!("Content-Type: {content_type}\r\n"));
        }
        request.push_str(&format!("Content-Length: {}\r\n\r\n{body}", body.len()));
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        let text = String::from_utf8_lossy(&response).into_owned();
        let status = text
            .split_whitespace()
            .nth(1)
            .and_then(|token| token.parse().ok())
            .expect("status line");
        (status, text)
    }

    async fn http_get(addr: SocketAddr, path: &str) -> (u16, String) {
        http_request(addr, "GET", path, None, None).await
    }

    fn body_of(response: &str) -> &str {
        response
            .split_once("\r\n\r\n")
            .map(|(_, body)| body)
            .unwrap_or("")
    }

    #[tokio::test]
    async fn health_fast_path() {
        let (server, addr, _session) = start_server(4).await;
        let (status, response) = http_get(addr, "/health").await;
        assert_eq!(status, 200);
        assert_eq!(
            body_of(&response),
            r#"{"code":0,"description":"OK","response":{"status":"healthy"}}"#
        );
        server.stop().await.unwrap();
    }

    #[tokio::test]
    async fn pipelines_status_fast_path() {
        let (server, addr, session) = start_server(4).await;
        parse_cmd(&session, "pipeline_create status_pipe fakesrc ! fakesink").unwrap();

        let (status, response) = http_get(addr, "/pipelines/status").await;
        assert_eq!(status, 200);
        let body = body_of(&response);
        assert!(body.contains("status_pipe"));
        assert!(body.contains("\"count\":1"));
        server.stop().await.unwrap();
    }

    #[tokio::test]
    async fn create_via_json_body() {
        let (server, addr, session) = start_server(4).await;
        let (status, response) = http_request(
            addr,
            "POST",
            "/pipelines",
            Some("application/json"),
            Some(r#"{"name":"p0","description":"fakesrc ! fakesink"}"#),
        )
        .await;
        assert_eq!(status, 200);
        assert!(body_of(&response).contains("\"code\":0"));
        assert!(session.pipelines().get("p0").is_some());
        server.stop().await.unwrap();
    }

    #[tokio::test]
    async fn create_with_empty_body_is_bad_value() {
        let (server, addr, session) = start_server(4).await;
        let (status, _response) = http_request(
            addr,
            "POST",
            "/pipelines",
            Some("application/json"),
            Some("{}"),
        )
        .await;
        assert_eq!(status, 204);
        assert!(session.pipelines().is_empty());
        server.stop().await.unwrap();
    }

    #[tokio::test]
    async fn create_via_query_string() {
        let (server, addr, session) = start_server(4).await;
        let (status, _) = http_request(
            addr,
            "POST",
            "/pipelines?name=q0&description=fakesrc%20!%20fakesink",
            None,
            None,
        )
        .await;
        assert_eq!(status, 200);
        assert!(session.pipelines().get("q0").is_some());
        server.stop().await.unwrap();
    }

    #[tokio::test]
    async fn put_drives_state_updates() {
        let (server, addr, session) = start_server(4).await;
        parse_cmd(&session, "pipeline_create put_pipe fakesrc ! fakesink").unwrap();

        let (status, _) =
            http_request(addr, "PUT", "/pipelines/put_pipe/state?name=playing", None, None).await;
        assert_eq!(status, 200);

        let (status, response) = http_get(addr, "/pipelines/put_pipe/state").await;
        assert_eq!(status, 200);
        assert!(body_of(&response).contains("playing"));

        let (status, _) =
            http_request(addr, "PUT", "/pipelines/put_pipe/state?name=null", None, None).await;
        assert_eq!(status, 200);
        server.stop().await.unwrap();
    }

    #[tokio::test]
    async fn delete_removes_pipeline() {
        let (server, addr, session) = start_server(4).await;
        parse_cmd(&session, "pipeline_create del_pipe fakesrc ! fakesink").unwrap();

        let (status, _) = http_request(addr, "DELETE", "/pipelines?name=del_pipe", None, None).await;
        assert_eq!(status, 200);
        assert!(session.pipelines().is_empty());
        server.stop().await.unwrap();
    }

    #[tokio::test]
    async fn unknown_path_is_404() {
        let (server, addr, _session) = start_server(4).await;
        let (status, _) = http_get(addr, "/nonexistent/path/here").await;
        assert_eq!(status, 404);
        server.stop().await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_create_is_conflict() {
        let (server, addr, _session) = start_server(4).await;
        let body = r#"{"name":"dup","description":"fakesrc ! fakesink"}"#;
        let (status, _) = http_request(
            addr,
            "POST",
            "/pipelines",
            Some("application/json"),
            Some(body),
        )
        .await;
        assert_eq!(status, 200);
        let (status, _) = http_request(
            addr,
            "POST",
            "/pipelines",
            Some("application/json"),
            Some(body),
        )
        .await;
        assert_eq!(status, 409);
        server.stop().await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_conflicting_creates() {
        let (server, addr, _session) = start_server(8).await;
        let body = r#"{"name":"race","description":"fakesrc ! fakesink"}"#;
        let first = tokio::spawn(async move {
            http_request(addr, "POST", "/pipelines", Some("application/json"), Some(body)).await
        });
        let second = tokio::spawn(async move {
            http_request(addr, "POST", "/pipelines", Some("application/json"), Some(body)).await
        });
        let mut statuses = vec![first.await.unwrap().0, second.await.unwrap().0];
        statuses.sort_unstable();
        assert_eq!(statuses, vec![200, 409]);
        server.stop().await.unwrap();
    }

    #[tokio::test]
    async fn options_returns_cors_headers_repeatably() {
        let (server, addr, _session) = start_server(4).await;
        let (status, first) = http_request(addr, "OPTIONS", "/pipelines", None, None).await;
        assert_eq!(status, 200);
        let lower = first.to_lowercase();
        assert!(lower.contains("access-control-allow-origin: *"));
        assert!(lower.contains("access-control-allow-headers: origin,range,content-type"));
        assert!(lower.contains("access-control-allow-methods: put, get, post, delete"));

        let (status, second) = http_request(addr, "OPTIONS", "/pipelines", None, None).await;
        assert_eq!(status, 200);
        // Same CORS headers and body on every repetition (the date header
        // is the only thing allowed to differ).
        let cors_lines = |text: &str| -> Vec<String> {
            text.to_lowercase()
                .lines()
                .filter(|line| line.starts_with("access-control-"))
                .map(str::to_string)
                .collect()
        };
        assert_eq!(cors_lines(&second), cors_lines(&first));
        assert_eq!(body_of(&second), body_of(&first));
        server.stop().await.unwrap();
    }

    #[tokio::test]
    async fn cors_headers_on_regular_responses() {
        let (server, addr, _session) = start_server(4).await;
        let (_, response) = http_get(addr, "/pipelines").await;
        assert!(response
            .to_lowercase()
            .contains("access-control-allow-origin: *"));
        server.stop().await.unwrap();
    }

    #[tokio::test]
    async fn pool_overflow_returns_503_and_health_stays_responsive() {
        let (server, addr, session) = start_server(2).await;
        parse_cmd(&session, "pipeline_create ov fakesrc ! fakesink").unwrap();
        parse_cmd(&session, "bus_timeout ov 500").unwrap();

        // Three slow bus reads against a pool of two.
        let slow: Vec<_> = (0..3)
            .map(|_| tokio::spawn(async move { http_get(addr, "/pipelines/ov/bus/message").await }))
            .collect();

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        let (health_status, _) = http_get(addr, "/health").await;
        assert_eq!(health_status, 200);

        let mut statuses: Vec<u16> = Vec::new();
        for task in slow {
            statuses.push(task.await.unwrap().0);
        }
        statuses.sort_unstable();
        // Two time out at the bus (mapped to 400), one is refused outright.
        assert_eq!(statuses, vec![400, 400, 503]);
        server.stop().await.unwrap();
    }

    #[tokio::test]
    async fn restart_and_idempotent_stop() {
        let (server, addr, _session) = start_server(4).await;
        let (status, _) = http_get(addr, "/health").await;
        assert_eq!(status, 200);

        server.stop().await.unwrap();
        server.stop().await.unwrap();

        server.start().await.unwrap();
        let addr = server.local_addr().await.unwrap();
        let (status, _) = http_get(addr, "/health").await;
        assert_eq!(status, 200);
        server.stop().await.unwrap();
    }

    #[tokio::test]
    async fn bind_failure_is_no_connection() {
        let session = Session::standalone("http-bind-test", Arc::new(SimEngine::new()));
        let config = HttpConfig {
            address: "203.0.113.1".to_string(),
            port: 1,
            ..HttpConfig::default()
        };
        let server = HttpServer::new(config, session);
        let err = server.start().await.unwrap_err();
        assert!(matches!(err, ControlError::NoConnection(_)));
    }
}
