//! HTTP transport implementation.
//!
//! Session-based MCP over HTTP. Every client session owns a
//! [`SessionTransport`] looked up by the `mcp-session-id` header:
//!
//! - `POST` carries JSON-RPC messages; a header-less `initialize` request
//!   opens a new session and the response returns its id.
//! - `GET` opens the session's server-to-client SSE notification stream.
//! - `DELETE` terminates the session.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::get,
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, instrument, warn};

use super::jsonrpc::{IncomingMessage, is_initialize_request};
use super::{TransportConfig, TransportError, TransportResult, config::HttpConfig};
use crate::core::McpServer;
use crate::core::config::Config;
use crate::core::session::{SessionError, SessionRegistry, SessionTransport, spawn_idle_sweeper};
use crate::domains::prompts::PromptGateway;

/// Header carrying the session id in both directions.
pub const SESSION_HEADER: &str = "mcp-session-id";

const INVALID_SESSION_TEXT: &str = "Invalid or missing session ID";

/// HTTP transport handler.
pub struct HttpTransport {
    config: HttpConfig,
}

/// Application state shared across HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Configuration handed to every session's server.
    config: Arc<Config>,
    /// Gateway shared by all sessions.
    gateway: Arc<PromptGateway>,
    /// Live sessions.
    registry: Arc<SessionRegistry>,
    /// Path of the MCP endpoint, reported by the root handler.
    rpc_path: String,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        gateway: Arc<PromptGateway>,
        registry: Arc<SessionRegistry>,
        rpc_path: impl Into<String>,
    ) -> Self {
        Self {
            config,
            gateway,
            registry,
            rpc_path: rpc_path.into(),
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    fn new_session(&self) -> Arc<SessionTransport> {
        let server = McpServer::new(self.config.clone(), self.gateway.clone());
        self.registry.create(server)
    }
}

impl HttpTransport {
    /// Create a new HTTP transport with the given config.
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    /// Create from TransportConfig (extracts HTTP config).
    pub fn from_transport_config(config: &TransportConfig) -> Option<Self> {
        match config {
            TransportConfig::Http(http_config) => Some(Self::new(http_config.clone())),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        self.config.address()
    }

    /// Run the HTTP transport until Ctrl-C.
    pub async fn run(self, config: Arc<Config>, gateway: Arc<PromptGateway>) -> TransportResult<()> {
        let addr = self.address();

        let registry = Arc::new(SessionRegistry::new(self.config.max_sessions));
        let sweeper = spawn_idle_sweeper(
            &registry,
            Duration::from_secs(self.config.session_idle_secs),
        );

        let state = AppState::new(config, gateway, registry.clone(), &self.config.rpc_path);
        let app = router(state, &self.config);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        let cors_status = if self.config.enable_cors {
            "enabled"
        } else {
            "disabled"
        };
        info!(
            "Ready - listening on {} (MCP over HTTP, CORS {}, max {} sessions)",
            addr, cors_status, self.config.max_sessions
        );
        info!("  → MCP:    POST/GET/DELETE {}", self.config.rpc_path);
        info!("  → Health: GET /health");

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(registry.clone()))
            .await;

        sweeper.abort();
        registry.close_all();
        served.map_err(|e| TransportError::http(e.to_string()))?;

        info!("HTTP transport finished");
        Ok(())
    }
}

/// Resolve on Ctrl-C, closing every session so open streams end.
async fn shutdown_signal(registry: Arc<SessionRegistry>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
    registry.close_all();
}

/// Build the axum router for the given state.
pub fn router(state: AppState, config: &HttpConfig) -> Router {
    let mut app = Router::new()
        .route(
            &config.rpc_path,
            get(handle_get).post(handle_post).delete(handle_delete),
        )
        .route("/health", get(health_check))
        .route("/", get(root_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers([axum::http::HeaderName::from_static(SESSION_HEADER)]);
        app = app.layer(cors);
    }
    app
}

/// Root handler - provides endpoint info.
async fn root_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "name": state.config.server.name,
        "version": state.config.server.version,
        "transport": "HTTP",
        "endpoints": {
            "mcp": state.rpc_path,
            "health": "/health"
        },
        "protocol": "MCP over HTTP (JSON-RPC 2.0)",
        "documentation": format!(
            "POST an initialize request to {} without {} to open a session",
            state.rpc_path, SESSION_HEADER
        )
    }))
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "sessions": state.registry.len(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

fn session_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
}

fn json_rpc_error(status: StatusCode, code: i32, message: impl Into<String>) -> Response {
    let body = json!({
        "jsonrpc": "2.0",
        "id": null,
        "error": { "code": code, "message": message.into() }
    });
    (status, Json(body)).into_response()
}

fn invalid_session() -> Response {
    (StatusCode::BAD_REQUEST, INVALID_SESSION_TEXT).into_response()
}

/// Map a session failure on POST to an HTTP response.
fn post_rejection(error: SessionError) -> Response {
    match error {
        SessionError::InvalidSession
        | SessionError::MalformedInitialization
        | SessionError::Closed => json_rpc_error(
            StatusCode::BAD_REQUEST,
            -32000,
            SessionError::MalformedInitialization.to_string(),
        ),
        SessionError::AlreadyInitialized => {
            json_rpc_error(StatusCode::BAD_REQUEST, -32600, error.to_string())
        }
        SessionError::CapacityExceeded(_) => {
            json_rpc_error(StatusCode::SERVICE_UNAVAILABLE, -32000, error.to_string())
        }
        SessionError::StreamConflict => {
            json_rpc_error(StatusCode::CONFLICT, -32000, error.to_string())
        }
        SessionError::DuplicateSession(_) => {
            json_rpc_error(StatusCode::INTERNAL_SERVER_ERROR, -32603, error.to_string())
        }
    }
}

/// Handle client-to-server messages.
#[instrument(skip_all, fields(session))]
async fn handle_post(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let body: Value = match serde_json::from_slice(&body) {
        Ok(body) => body,
        Err(e) => {
            warn!("Unparseable request body: {}", e);
            return json_rpc_error(StatusCode::BAD_REQUEST, -32700, format!("Parse error: {e}"));
        }
    };

    let transport = match session_id(&headers) {
        Some(id) => {
            tracing::Span::current().record("session", id);
            match state.registry.lookup(id) {
                Some(transport) => transport,
                None => {
                    warn!("Unknown session {}", id);
                    return post_rejection(SessionError::InvalidSession);
                }
            }
        }
        None if is_initialize_request(&body) => {
            info!("Opening new session");
            state.new_session()
        }
        None => {
            warn!("Rejecting session-less request that is not initialize");
            return post_rejection(SessionError::MalformedInitialization);
        }
    };

    let message = match IncomingMessage::parse(body) {
        Ok(message) => message,
        Err(e) => {
            return json_rpc_error(StatusCode::BAD_REQUEST, -32600, format!("Invalid Request: {e}"));
        }
    };
    debug!("Received {:?}", message.method());

    match transport.handle_message(message).await {
        Ok(Some(response)) => {
            let mut http_response = (StatusCode::OK, Json(response)).into_response();
            if let Some(id) = transport.session_id()
                && let Ok(value) = HeaderValue::from_str(id)
            {
                http_response.headers_mut().insert(SESSION_HEADER, value);
            }
            http_response
        }
        Ok(None) => StatusCode::ACCEPTED.into_response(),
        Err(e) => {
            warn!("Session rejected message: {}", e);
            post_rejection(e)
        }
    }
}

/// Open the server-to-client notification stream.
#[instrument(skip_all)]
async fn handle_get(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(transport) = session_id(&headers).and_then(|id| state.registry.lookup(id)) else {
        return invalid_session();
    };

    match transport.subscribe() {
        Ok(stream) => {
            info!("Notification stream opened for {:?}", transport.session_id());
            let events = futures::stream::unfold(stream, |mut stream| async move {
                let message = stream.next().await?;
                let event = Event::default().event("message").json_data(message);
                Some((event, stream))
            });
            Sse::new(events)
                .keep_alive(KeepAlive::default())
                .into_response()
        }
        Err(SessionError::StreamConflict) => (
            StatusCode::CONFLICT,
            SessionError::StreamConflict.to_string(),
        )
            .into_response(),
        Err(e) => {
            debug!("Stream refused: {}", e);
            invalid_session()
        }
    }
}

/// Terminate a session.
#[instrument(skip_all)]
async fn handle_delete(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(transport) = session_id(&headers).and_then(|id| state.registry.lookup(id)) else {
        return invalid_session();
    };

    info!("Terminating session {:?}", transport.session_id());
    transport.close();
    StatusCode::OK.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::prompts::upstream::testing::StaticPromptSource;
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request, header};
    use tower::ServiceExt;

    fn app_with(max_sessions: usize) -> (Router, Arc<SessionRegistry>) {
        let gateway = Arc::new(PromptGateway::new(Arc::new(
            StaticPromptSource::new().with_text("greet", "Hello {{name}}"),
        )));
        let registry = Arc::new(SessionRegistry::new(max_sessions));
        let config = HttpConfig::default();
        let state = AppState::new(
            Arc::new(Config::default()),
            gateway,
            registry.clone(),
            &config.rpc_path,
        );
        (router(state, &config), registry)
    }

    fn app() -> (Router, Arc<SessionRegistry>) {
        app_with(16)
    }

    fn initialize_body() -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": "2025-03-26",
                "capabilities": {},
                "clientInfo": { "name": "test", "version": "1.0" }
            }
        })
    }

    fn post(session: Option<&str>, body: &Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/mcp")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json, text/event-stream");
        if let Some(id) = session {
            builder = builder.header(SESSION_HEADER, id);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn bare(method: Method, session: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri("/mcp");
        if let Some(id) = session {
            builder = builder.header(SESSION_HEADER, id);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn open_session(app: &Router) -> String {
        let response = app
            .clone()
            .oneshot(post(None, &initialize_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        response
            .headers()
            .get(SESSION_HEADER)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_initialize_returns_session_id() {
        let (app, registry) = app();
        let response = app.oneshot(post(None, &initialize_body())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let id = response.headers().get(SESSION_HEADER).unwrap().to_str().unwrap().to_string();
        assert!(registry.lookup(&id).is_some());

        let body = body_json(response).await;
        assert_eq!(body["id"], 1);
        assert_eq!(body["result"]["protocolVersion"], "2025-03-26");
        assert_eq!(body["result"]["serverInfo"]["name"], "langfuse-prompts");
    }

    #[tokio::test]
    async fn test_session_is_reused() {
        let (app, registry) = app();
        let id = open_session(&app).await;
        let transport = registry.lookup(&id).unwrap();

        let request = json!({ "jsonrpc": "2.0", "id": 2, "method": "prompts/list" });
        let response = app.clone().oneshot(post(Some(&id), &request)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["result"]["prompts"][0]["name"], "greet");

        assert_eq!(registry.len(), 1);
        assert!(Arc::ptr_eq(&registry.lookup(&id).unwrap(), &transport));
    }

    #[tokio::test]
    async fn test_reinitialize_on_existing_session_is_rejected() {
        let (app, _) = app();
        let id = open_session(&app).await;

        let response = app.oneshot(post(Some(&id), &initialize_body())).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], -32600);
    }

    #[tokio::test]
    async fn test_post_without_session_rejected() {
        let (app, registry) = app();
        let request = json!({ "jsonrpc": "2.0", "id": 1, "method": "prompts/list" });

        let response = app.oneshot(post(None, &request)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({
                "jsonrpc": "2.0",
                "id": null,
                "error": { "code": -32000, "message": "Bad Request: No valid session ID provided" }
            })
        );
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_post_with_unknown_or_empty_session_rejected() {
        let (app, registry) = app();
        let request = json!({ "jsonrpc": "2.0", "id": 1, "method": "ping" });

        let response = app.clone().oneshot(post(Some("nope"), &request)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // An empty header counts as absent, so only initialize may pass.
        let response = app.oneshot(post(Some(""), &request)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_initialize_with_unknown_session_rejected() {
        let (app, registry) = app();
        let response = app.oneshot(post(Some("stale"), &initialize_body())).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let (app, _) = app();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/mcp")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], -32700);
    }

    #[tokio::test]
    async fn test_notification_is_accepted() {
        let (app, registry) = app();
        let id = open_session(&app).await;

        let notification = json!({ "jsonrpc": "2.0", "method": "notifications/initialized" });
        let response = app.oneshot(post(Some(&id), &notification)).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(body_text(response).await.is_empty());
        assert_eq!(
            registry.lookup(&id).unwrap().state(),
            crate::core::session::SessionState::Active
        );
    }

    #[tokio::test]
    async fn test_get_and_delete_require_session() {
        let (app, _) = app();
        for method in [Method::GET, Method::DELETE] {
            let response = app.clone().oneshot(bare(method.clone(), None)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(body_text(response).await, "Invalid or missing session ID");

            let response = app.clone().oneshot(bare(method, Some("nope"))).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn test_delete_closes_session() {
        let (app, registry) = app();
        let id = open_session(&app).await;

        let response = app.clone().oneshot(bare(Method::DELETE, Some(&id))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(registry.lookup(&id).is_none());

        let request = json!({ "jsonrpc": "2.0", "id": 3, "method": "ping" });
        let response = app.clone().oneshot(post(Some(&id), &request)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app.oneshot(bare(Method::GET, Some(&id))).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_single_sse_stream_per_session() {
        let (app, _) = app();
        let id = open_session(&app).await;

        let first = app.clone().oneshot(bare(Method::GET, Some(&id))).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(
            first.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/event-stream"
        );

        let second = app.clone().oneshot(bare(Method::GET, Some(&id))).await.unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);

        drop(first);
        let third = app.oneshot(bare(Method::GET, Some(&id))).await.unwrap();
        assert_eq!(third.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_capacity_limit() {
        let (app, registry) = app_with(1);
        open_session(&app).await;

        let response = app.oneshot(post(None, &initialize_body())).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_health_and_root() {
        let (app, _) = app();
        open_session(&app).await;

        let response = app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["sessions"], 1);

        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["endpoints"]["mcp"], "/mcp");
    }
}
