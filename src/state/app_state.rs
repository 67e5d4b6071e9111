// Application state management
// Holds the session registry and the shared HTTP client

use crate::config::Config;
use crate::table::DataFrame;
use std::collections::HashMap;
use uuid::Uuid;

/// Unique identifier for an upload session
pub type SessionId = String;

/// Main application state
///
/// Sessions live for the process lifetime; there is no eviction. All access
/// goes through the `Arc<RwLock<AppState>>` the router is built with, so
/// concurrent requests touching the same session serialize on the lock.
#[derive(Debug)]
pub struct AppState {
    /// Registry of in-memory tables (session id -> table)
    sessions: HashMap<SessionId, DataFrame>,
    /// Shared HTTP client (connection pooling for LLM and hub calls)
    pub http_client: reqwest::Client,
    /// Application configuration snapshot
    pub config: Config,
}

impl AppState {
    /// Create application state from a configuration snapshot.
    ///
    /// The HTTP client carries the larger of the two outbound timeouts; both
    /// the cleaner and hub clients share it for connection pooling.
    pub fn new(config: Config) -> Self {
        let timeout_secs = config.cleaner.timeout_secs.max(config.hub.timeout_secs);
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            sessions: HashMap::new(),
            http_client,
            config,
        }
    }

    /// Generate a new unique session id (UUID v4)
    pub fn generate_session_id() -> SessionId {
        Uuid::new_v4().to_string()
    }

    /// Register a table under a fresh session id and return the id
    pub fn insert_session(&mut self, df: DataFrame) -> SessionId {
        let id = Self::generate_session_id();
        self.sessions.insert(id.clone(), df);
        id
    }

    /// Get a clone of a session's table
    pub fn session(&self, id: &str) -> Option<DataFrame> {
        self.sessions.get(id).cloned()
    }

    /// True if the session id is registered
    #[allow(dead_code)] // Convenience for tests and future handlers
    pub fn contains_session(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    /// Replace a session's table (after cleaning)
    /// Returns false if the session id is unknown
    pub fn replace_session(&mut self, id: &str, df: DataFrame) -> bool {
        match self.sessions.get_mut(id) {
            Some(slot) => {
                *slot = df;
                true
            }
            None => false,
        }
    }

    /// Number of live sessions
    #[allow(dead_code)] // Will be used for a sessions statistics endpoint
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}
