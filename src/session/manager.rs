use super::session::Session;
use super::store::{unix_now, SessionRecord, SessionStore};
use crate::config::SessionConfig;
use crate::dispatcher::HandlerResponse;
use crate::ids::SessionId;
use anyhow::Result;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Client details recorded alongside the session payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientInfo<'a> {
    pub ip_address: Option<&'a str>,
    pub user_agent: Option<&'a str>,
}

/// Loads sessions at the start of a request and persists them at the end.
///
/// Ids are strict: a cookie naming an id the store does not know gets a brand-new id rather
/// than adopting the client's value. Store failures are logged and never fail the request.
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    config: SessionConfig,
    finished: AtomicU64,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, config: SessionConfig) -> Self {
        Self {
            store,
            config,
            finished: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.config.cookie_name
    }

    /// Resolve the session named by the request cookie.
    #[must_use]
    pub fn start(&self, cookie: Option<&str>) -> Session {
        let Some(raw) = cookie.filter(|c| !c.is_empty()) else {
            return Session::fresh();
        };
        let Ok(id) = raw.parse::<SessionId>() else {
            debug!("Malformed session cookie ignored");
            return Session::replacing(None);
        };

        match self.store.read(&id) {
            Ok(Some(record)) => match serde_json::from_str::<Map<String, Value>>(&record.payload) {
                Ok(attributes) => {
                    debug!(session_id = %id, "Session resumed");
                    Session::restored(id, attributes)
                }
                Err(e) => {
                    warn!(session_id = %id, error = %e, "Corrupt session payload; starting over");
                    Session::replacing(Some(id))
                }
            },
            Ok(None) => {
                debug!(session_id = %id, "Unknown session id; issuing a new one");
                Session::replacing(Some(id))
            }
            Err(e) => {
                warn!(session_id = %id, error = %e, "Session store read failed");
                Session::replacing(Some(id))
            }
        }
    }

    /// Persist `session` and add the cookie headers the client needs.
    ///
    /// A session is written when it holds data or already existed in the store. `Set-Cookie`
    /// is sent whenever the id the client holds differs from the one written; a client whose
    /// id was retired and not replaced gets an expiring cookie.
    pub fn finish(&self, session: &mut Session, client: ClientInfo<'_>, res: &mut HandlerResponse) {
        for stale in session.take_stale_ids() {
            if let Err(e) = self.store.destroy(&stale) {
                warn!(session_id = %stale, error = %e, "Failed to delete retired session");
            }
        }

        if !session.is_empty() || session.is_persisted() {
            match serde_json::to_string(session.all()) {
                Ok(payload) => {
                    let record = SessionRecord {
                        id: session.id(),
                        user_id: session.user_id(),
                        ip_address: client.ip_address.map(str::to_string),
                        user_agent: client.user_agent.map(str::to_string),
                        payload,
                        last_activity: unix_now(),
                    };
                    if let Err(e) = self.store.write(record) {
                        warn!(session_id = %session.id(), error = %e, "Session store write failed");
                    }
                }
                Err(e) => {
                    warn!(session_id = %session.id(), error = %e, "Session payload not serializable");
                }
            }
            if session.client_id() != Some(session.id()) {
                res.append_header("Set-Cookie", self.cookie_header(&session.id()));
            }
        } else if session.client_id().is_some() {
            res.append_header("Set-Cookie", self.expired_cookie_header());
        }

        self.maybe_collect_garbage();
    }

    fn maybe_collect_garbage(&self) {
        let every = self.config.gc_every;
        if every == 0 {
            return;
        }
        let n = self.finished.fetch_add(1, Ordering::Relaxed) + 1;
        if n % every == 0 {
            let _ = self.collect_garbage();
        }
    }

    /// Delete sessions idle for longer than the configured lifetime.
    pub fn collect_garbage(&self) -> usize {
        match self.store.gc(self.config.lifetime()) {
            Ok(removed) => {
                if removed > 0 {
                    info!(removed = removed, "Expired sessions collected");
                }
                removed
            }
            Err(e) => {
                warn!(error = %e, "Session garbage collection failed");
                0
            }
        }
    }

    /// Sessions owned by `user_id`, most recently active first.
    pub fn active_sessions(&self, user_id: i64) -> Result<Vec<SessionRecord>> {
        self.store.sessions_for_user(user_id)
    }

    /// Sign `user_id` out everywhere except `keep`. Returns the number of sessions removed.
    pub fn destroy_other_sessions(&self, user_id: i64, keep: &SessionId) -> Result<usize> {
        let mut removed = 0;
        for record in self.store.sessions_for_user(user_id)? {
            if record.id != *keep {
                self.store.destroy(&record.id)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn cookie_attributes(&self) -> String {
        let mut attrs = format!("; Path=/; HttpOnly; SameSite={}", self.config.same_site);
        if self.config.secure {
            attrs.push_str("; Secure");
        }
        attrs
    }

    #[must_use]
    pub fn cookie_header(&self, id: &SessionId) -> String {
        format!(
            "{}={}{}",
            self.config.cookie_name,
            id,
            self.cookie_attributes()
        )
    }

    #[must_use]
    pub fn expired_cookie_header(&self) -> String {
        format!(
            "{}=; Max-Age=0{}",
            self.config.cookie_name,
            self.cookie_attributes()
        )
    }
}
