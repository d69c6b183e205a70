use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The per-session state the admin gate reads and writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub logged_in: bool,
}

/// A server-side session as stored in Redis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    /// The gate state.
    pub context: SessionContext,
    /// The timestamp when the session was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the session expires.
    pub expires_at: DateTime<Utc>,
}
