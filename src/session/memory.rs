use super::store::{unix_now, SessionRecord, SessionStore};
use crate::ids::SessionId;
use anyhow::Result;
use dashmap::DashMap;
use std::time::Duration;

/// Process-local [`SessionStore`] backed by a concurrent map. Sessions do not survive a restart.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    records: DashMap<SessionId, SessionRecord>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Read without touching `last_activity`.
    #[must_use]
    pub fn peek(&self, id: &SessionId) -> Option<SessionRecord> {
        self.records.get(id).map(|r| r.value().clone())
    }
}

impl SessionStore for MemorySessionStore {
    fn read(&self, id: &SessionId) -> Result<Option<SessionRecord>> {
        Ok(self.records.get_mut(id).map(|mut record| {
            record.last_activity = unix_now();
            record.clone()
        }))
    }

    fn write(&self, record: SessionRecord) -> Result<()> {
        self.records.insert(record.id, record);
        Ok(())
    }

    fn destroy(&self, id: &SessionId) -> Result<()> {
        self.records.remove(id);
        Ok(())
    }

    fn gc(&self, max_lifetime: Duration) -> Result<usize> {
        let now = unix_now();
        let before = self.records.len();
        self.records
            .retain(|_, record| !record.is_expired(now, max_lifetime));
        Ok(before.saturating_sub(self.records.len()))
    }

    fn sessions_for_user(&self, user_id: i64) -> Result<Vec<SessionRecord>> {
        let mut out: Vec<SessionRecord> = self
            .records
            .iter()
            .filter(|r| r.user_id == Some(user_id))
            .map(|r| r.value().clone())
            .collect();
        out.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
        Ok(out)
    }
}
