use crate::auth::{InMemoryUsers, UserProvider};
use crate::config::AppConfig;
use crate::session::{MemorySessionStore, SessionManager, SessionStore};
use crate::view::Views;
use anyhow::Result;
use std::sync::Arc;

/// Read-only application state shared by every request.
///
/// Built once at startup and handed to each [`HandlerRequest`](crate::dispatcher::HandlerRequest)
/// behind an `Arc`. The session store inside `sessions` is the only part that mutates.
pub struct AppContext {
    pub config: AppConfig,
    pub views: Views,
    pub users: Arc<dyn UserProvider>,
    pub sessions: SessionManager,
}

impl AppContext {
    pub fn new(
        config: AppConfig,
        users: Arc<dyn UserProvider>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        let views = Views::from_config(&config);
        let sessions = SessionManager::new(store, config.session.clone());
        Self {
            config,
            views,
            users,
            sessions,
        }
    }

    /// In-memory sessions and the demo users, hashed at `auth.password_cost`.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let users = InMemoryUsers::with_demo_users(config.auth.cost())?;
        Ok(Self::new(
            config,
            Arc::new(users),
            Arc::new(MemorySessionStore::new()),
        ))
    }

    /// Default configuration with the cheapest password hashing.
    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        let mut config = AppConfig::default();
        config.auth.password_cost = 4;
        Self::from_config(config).expect("demo users hash at cost 4")
    }
}
