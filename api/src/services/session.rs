//! Per-client request state carried between requests.

use std::time::Duration;

use async_trait::async_trait;
use mini_moka::sync::Cache;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::helpers::SESSION_COOKIE_MAX_AGE_SECS;
use crate::services::resolver::DEFAULT_USER_INPUT;
use crate::services::temperatures::{Units, DEFAULT_NUM_HOURS};

/// Preferences remembered for a client between requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RequestState {
    pub units: Units,
    /// Last input that resolved successfully (or the default input).
    pub user_input: String,
    pub num_hours: i64,
}

impl Default for RequestState {
    fn default() -> Self {
        Self {
            units: Units::default(),
            user_input: DEFAULT_USER_INPUT.to_string(),
            num_hours: DEFAULT_NUM_HOURS,
        }
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, client_id: Uuid) -> Option<RequestState>;
    async fn save(&self, client_id: Uuid, state: RequestState);
}

/// Upper bound on sessions held at once.
const MAX_SESSIONS: u64 = 100_000;

/// Process-local session store.
///
/// Sessions idle for longer than the cookie lifetime are dropped, and the
/// least recently used ones are evicted past [`MAX_SESSIONS`]. Clones share
/// the same cache.
#[derive(Clone)]
pub struct MemorySessionStore {
    sessions: Cache<Uuid, RequestState>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::with_limits(
            MAX_SESSIONS,
            Duration::from_secs(SESSION_COOKIE_MAX_AGE_SECS as u64),
        )
    }

    pub fn with_limits(max_sessions: u64, idle: Duration) -> Self {
        let sessions = Cache::builder()
            .max_capacity(max_sessions)
            .time_to_idle(idle)
            .build();
        Self { sessions }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, client_id: Uuid) -> Option<RequestState> {
        self.sessions.get(&client_id)
    }

    async fn save(&self, client_id: Uuid, state: RequestState) {
        self.sessions.insert(client_id, state);
    }
}
