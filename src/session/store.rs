use crate::ids::SessionId;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// One persisted session.
///
/// Mirrors the `sessions` table: id, owning user, client address and agent, the serialized
/// attribute bag and the unix time of the last read or write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: SessionId,
    pub user_id: Option<i64>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    /// JSON object text.
    pub payload: String,
    pub last_activity: u64,
}

impl SessionRecord {
    /// `true` once `now - last_activity` exceeds `max_lifetime`.
    #[must_use]
    pub fn is_expired(&self, now: u64, max_lifetime: Duration) -> bool {
        now.saturating_sub(self.last_activity) > max_lifetime.as_secs()
    }
}

/// Persistence boundary for sessions.
///
/// Implementations are shared by every request coroutine. Writes are keyed upserts; concurrent
/// requests on the same session resolve as last writer wins.
pub trait SessionStore: Send + Sync {
    /// Fetch a record and refresh its `last_activity`.
    fn read(&self, id: &SessionId) -> Result<Option<SessionRecord>>;

    /// Insert or replace the record with the same id.
    fn write(&self, record: SessionRecord) -> Result<()>;

    fn destroy(&self, id: &SessionId) -> Result<()>;

    /// Remove records idle for longer than `max_lifetime`; returns how many were removed.
    fn gc(&self, max_lifetime: Duration) -> Result<usize>;

    /// Every record owned by `user_id`.
    fn sessions_for_user(&self, user_id: i64) -> Result<Vec<SessionRecord>>;
}

/// Current unix time in seconds.
#[must_use]
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
