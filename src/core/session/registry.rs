//! Registry of live HTTP sessions.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::error::SessionError;
use super::transport::SessionTransport;
use crate::core::McpServer;

/// Live sessions keyed by session id.
///
/// The lock is never held across an await or while a transport closes.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<SessionTransport>>>,
    max_sessions: usize,
}

impl SessionRegistry {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions,
        }
    }

    /// Create an unregistered transport for `server`.
    ///
    /// The transport registers itself once `initialize` assigns its id and
    /// removes itself when closed.
    pub fn create(self: &Arc<Self>, server: McpServer) -> Arc<SessionTransport> {
        let on_init = Arc::downgrade(self);
        let on_close = Arc::downgrade(self);

        SessionTransport::builder(server)
            .on_session_initialized(move |id, transport| match on_init.upgrade() {
                Some(registry) => registry.insert(id, transport),
                None => Err(SessionError::Closed),
            })
            .on_close(move |id| {
                if let Some(registry) = on_close.upgrade() {
                    registry.remove(id);
                }
            })
            .build()
    }

    /// Register a transport under `id`.
    pub fn insert(&self, id: &str, transport: Arc<SessionTransport>) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write();
        if sessions.len() >= self.max_sessions {
            return Err(SessionError::CapacityExceeded(self.max_sessions));
        }
        if sessions.contains_key(id) {
            return Err(SessionError::DuplicateSession(id.to_string()));
        }
        sessions.insert(id.to_string(), transport);
        debug!("Registered session {} ({} live)", id, sessions.len());
        Ok(())
    }

    pub fn lookup(&self, id: &str) -> Option<Arc<SessionTransport>> {
        self.sessions.read().get(id).cloned()
    }

    pub fn remove(&self, id: &str) -> Option<Arc<SessionTransport>> {
        let removed = self.sessions.write().remove(id);
        if removed.is_some() {
            debug!("Removed session {}", id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Sessions without activity for at least `max_idle`.
    ///
    /// A session whose client holds the notification stream open is never idle.
    pub fn idle_sessions(&self, max_idle: Duration) -> Vec<Arc<SessionTransport>> {
        self.sessions
            .read()
            .values()
            .filter(|t| !t.has_open_stream() && t.idle_for() >= max_idle)
            .cloned()
            .collect()
    }

    /// Close and forget every session.
    pub fn close_all(&self) {
        let drained: Vec<_> = self.sessions.write().drain().map(|(_, t)| t).collect();
        if !drained.is_empty() {
            info!("Closing {} session(s)", drained.len());
        }
        for transport in drained {
            transport.close();
        }
    }
}

/// Periodically close sessions idle for longer than `max_idle`.
///
/// The task stops once the registry is dropped.
pub fn spawn_idle_sweeper(registry: &Arc<SessionRegistry>, max_idle: Duration) -> JoinHandle<()> {
    let registry = Arc::downgrade(registry);
    let period = (max_idle / 4).clamp(Duration::from_millis(100), Duration::from_secs(60));

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let Some(registry) = Weak::upgrade(&registry) else {
                break;
            };
            for transport in registry.idle_sessions(max_idle) {
                info!("Closing idle session {:?}", transport.session_id());
                transport.close();
            }
        }
    })
}
