//! Per-session transport.
//!
//! A `SessionTransport` owns one `McpServer` for the lifetime of one client
//! session. It assigns the session id when `initialize` arrives, serializes
//! the session's requests and fans server notifications out to the client's
//! SSE stream.

use parking_lot::Mutex;
use rmcp::ServerHandler;
use rmcp::model::LoggingLevel;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::dispatch::dispatch;
use super::error::SessionError;
use crate::core::McpServer;
use crate::core::transport::jsonrpc::{
    IncomingMessage, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
};

/// Protocol versions this server speaks, newest first.
pub const SUPPORTED_PROTOCOL_VERSIONS: [&str; 3] = ["2025-06-18", "2025-03-26", "2024-11-05"];

/// Buffered notifications per session before slow streams start lagging.
const NOTIFICATION_BUFFER: usize = 64;

/// Produces a fresh session id.
pub type SessionIdGenerator = Box<dyn Fn() -> String + Send + Sync>;

/// Runs once the session id is assigned; an error aborts initialization.
pub type SessionInitializedHook =
    Box<dyn FnOnce(&str, Arc<SessionTransport>) -> Result<(), SessionError> + Send>;

/// Runs once when an initialized session is closed.
pub type SessionCloseHook = Box<dyn FnOnce(&str) + Send>;

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created; `initialize` not yet acknowledged by the client.
    Initializing,
    /// The client sent `notifications/initialized`.
    Active,
    /// Terminated; no further messages are accepted.
    Closed,
}

/// Pick the protocol version to answer an `initialize` with.
///
/// A supported requested version is echoed back, anything else gets the
/// newest version this server speaks.
pub fn negotiate_protocol_version(requested: &str) -> &'static str {
    SUPPORTED_PROTOCOL_VERSIONS
        .iter()
        .find(|v| **v == requested)
        .copied()
        .unwrap_or(SUPPORTED_PROTOCOL_VERSIONS[0])
}

/// Builder for [`SessionTransport`].
pub struct SessionTransportBuilder {
    server: McpServer,
    id_generator: SessionIdGenerator,
    on_initialized: Option<SessionInitializedHook>,
    on_close: Option<SessionCloseHook>,
}

impl SessionTransportBuilder {
    /// Session ids default to random UUIDs.
    pub fn new(server: McpServer) -> Self {
        Self {
            server,
            id_generator: Box::new(|| uuid::Uuid::new_v4().to_string()),
            on_initialized: None,
            on_close: None,
        }
    }

    pub fn session_id_generator(mut self, generator: impl Fn() -> String + Send + Sync + 'static) -> Self {
        self.id_generator = Box::new(generator);
        self
    }

    pub fn on_session_initialized(
        mut self,
        hook: impl FnOnce(&str, Arc<SessionTransport>) -> Result<(), SessionError> + Send + 'static,
    ) -> Self {
        self.on_initialized = Some(Box::new(hook));
        self
    }

    pub fn on_close(mut self, hook: impl FnOnce(&str) + Send + 'static) -> Self {
        self.on_close = Some(Box::new(hook));
        self
    }

    pub fn build(self) -> Arc<SessionTransport> {
        let (sender, _) = broadcast::channel(NOTIFICATION_BUFFER);
        Arc::new(SessionTransport {
            server: self.server,
            id_generator: self.id_generator,
            session_id: OnceLock::new(),
            state: Mutex::new(SessionState::Initializing),
            on_initialized: Mutex::new(self.on_initialized),
            on_close: Mutex::new(self.on_close),
            dispatch_lock: tokio::sync::Mutex::new(()),
            last_activity: Mutex::new(Instant::now()),
            notifications: Mutex::new(Some(sender)),
            stream_open: Arc::new(AtomicBool::new(false)),
        })
    }
}

/// Transport bound to a single client session.
pub struct SessionTransport {
    server: McpServer,
    id_generator: SessionIdGenerator,
    session_id: OnceLock<String>,
    state: Mutex<SessionState>,
    on_initialized: Mutex<Option<SessionInitializedHook>>,
    on_close: Mutex<Option<SessionCloseHook>>,
    /// Serializes message handling within the session.
    dispatch_lock: tokio::sync::Mutex<()>,
    last_activity: Mutex<Instant>,
    /// Dropped on close, which ends every open stream.
    notifications: Mutex<Option<broadcast::Sender<Value>>>,
    stream_open: Arc<AtomicBool>,
}

impl std::fmt::Debug for SessionTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTransport")
            .field("session_id", &self.session_id.get())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl SessionTransport {
    pub fn builder(server: McpServer) -> SessionTransportBuilder {
        SessionTransportBuilder::new(server)
    }

    /// Assigned session id, once `initialize` succeeded.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.get().map(String::as_str)
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    pub fn server(&self) -> &McpServer {
        &self.server
    }

    /// Time since the last message or stream subscription.
    ///
    /// Idle sweeping also checks [`has_open_stream`](Self::has_open_stream).
    pub fn idle_for(&self) -> Duration {
        self.last_activity.lock().elapsed()
    }

    /// Whether the client currently holds the notification stream.
    pub fn has_open_stream(&self) -> bool {
        self.stream_open.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        *self.last_activity.lock() = Instant::now();
    }

    /// Handle one client message.
    ///
    /// Requests produce a response; notifications and responses produce
    /// nothing.
    pub async fn handle_message(
        self: &Arc<Self>,
        message: IncomingMessage,
    ) -> Result<Option<JsonRpcResponse>, SessionError> {
        let _guard = self.dispatch_lock.lock().await;
        if self.state() == SessionState::Closed {
            return Err(SessionError::Closed);
        }
        self.touch();

        match message {
            IncomingMessage::Request(request) if request.method == "initialize" => {
                self.initialize(request).map(Some)
            }
            IncomingMessage::Request(request) => Ok(Some(dispatch(self, request).await)),
            IncomingMessage::Notification(notification) => {
                self.handle_notification(&notification);
                Ok(None)
            }
            IncomingMessage::Response(response) => {
                debug!("Ignoring client response: {}", response);
                Ok(None)
            }
        }
    }

    fn initialize(self: &Arc<Self>, request: JsonRpcRequest) -> Result<JsonRpcResponse, SessionError> {
        if self.session_id.get().is_some() {
            return Err(SessionError::AlreadyInitialized);
        }
        let requested = request
            .params
            .as_ref()
            .and_then(|p| p.get("protocolVersion"))
            .and_then(Value::as_str)
            .ok_or(SessionError::MalformedInitialization)?;
        let version = negotiate_protocol_version(requested);

        let session_id = (self.id_generator)();
        self.session_id
            .set(session_id.clone())
            .map_err(|_| SessionError::AlreadyInitialized)?;

        let hook = self.on_initialized.lock().take();
        if let Some(hook) = hook {
            hook(&session_id, Arc::clone(self))?;
        }

        info!(
            "Session {} initialized (protocol {}, requested {})",
            session_id, version, requested
        );

        let response = match serde_json::to_value(self.server.get_info()) {
            Ok(mut info) => {
                info["protocolVersion"] = json!(version);
                JsonRpcResponse::success(request.id, info)
            }
            Err(e) => JsonRpcResponse::internal_error(request.id, e.to_string()),
        };
        Ok(response)
    }

    fn handle_notification(&self, notification: &JsonRpcNotification) {
        match notification.method.as_str() {
            "notifications/initialized" => {
                let mut state = self.state.lock();
                if *state == SessionState::Initializing {
                    *state = SessionState::Active;
                    info!("Session {:?} is active", self.session_id());
                }
            }
            method => debug!("Received notification: {}", method),
        }
    }

    /// Open the session's notification stream.
    ///
    /// Only one stream may be open at a time.
    pub fn subscribe(&self) -> Result<NotificationStream, SessionError> {
        if self.stream_open.swap(true, Ordering::SeqCst) {
            return Err(SessionError::StreamConflict);
        }
        let guard = StreamGuard(Arc::clone(&self.stream_open));

        let receiver = self
            .notifications
            .lock()
            .as_ref()
            .map(broadcast::Sender::subscribe)
            .ok_or(SessionError::Closed)?;
        self.touch();

        Ok(NotificationStream {
            receiver,
            _guard: guard,
        })
    }

    /// Publish a notification to the open stream, if any.
    pub fn notify(&self, method: &str, params: Value) {
        let message = match serde_json::to_value(JsonRpcNotification::new(method, params)) {
            Ok(message) => message,
            Err(e) => {
                warn!("Failed to serialize notification {}: {}", method, e);
                return;
            }
        };

        if let Some(sender) = self.notifications.lock().as_ref()
            && sender.send(message).is_err()
        {
            debug!("No stream open for {} notification", method);
        }
    }

    /// Publish a log message if `level` passes the client's threshold.
    pub fn log(&self, level: LoggingLevel, data: Value) {
        let Some(params) = self.server.log_level().message(level, data) else {
            return;
        };
        match serde_json::to_value(params) {
            Ok(params) => self.notify("notifications/message", params),
            Err(e) => warn!("Failed to serialize log notification: {}", e),
        }
    }

    pub fn set_log_level(&self, level: LoggingLevel) {
        self.server.log_level().set(level);
    }

    /// Close the session. Idempotent.
    ///
    /// Ends the notification stream and runs the close hook. Must not be
    /// called while holding the registry lock.
    pub fn close(&self) {
        {
            let mut state = self.state.lock();
            if *state == SessionState::Closed {
                return;
            }
            *state = SessionState::Closed;
        }

        self.notifications.lock().take();

        let hook = self.on_close.lock().take();
        if let (Some(hook), Some(id)) = (hook, self.session_id.get()) {
            hook(id);
        }
        info!("Session {:?} closed", self.session_id());
    }
}

/// Clears the single-stream flag when the stream is dropped.
#[derive(Debug)]
struct StreamGuard(Arc<AtomicBool>);

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Receiving half of a session's notifications.
#[derive(Debug)]
pub struct NotificationStream {
    receiver: broadcast::Receiver<Value>,
    _guard: StreamGuard,
}

impl NotificationStream {
    /// Next notification, or `None` once the session is closed.
    pub async fn next(&mut self) -> Option<Value> {
        loop {
            match self.receiver.recv().await {
                Ok(message) => return Some(message),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Notification stream lagged, {} messages dropped", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
