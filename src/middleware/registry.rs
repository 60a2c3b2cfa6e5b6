use super::core::Middleware;
use super::{AdminMiddleware, AuthMiddleware, CorsMiddleware, GuestMiddleware};
use crate::config::AppConfig;
use crate::error::DispatchError;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Creates one middleware unit.
pub type MiddlewareFactory = Arc<dyn Fn() -> Box<dyn Middleware> + Send + Sync>;

/// Name → factory table consulted by the pipeline. Immutable once the dispatcher is built.
#[derive(Clone, Default)]
pub struct MiddlewareRegistry {
    factories: HashMap<String, MiddlewareFactory>,
}

impl std::fmt::Debug for MiddlewareRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareRegistry")
            .field("names", &self.names())
            .finish()
    }
}

impl MiddlewareRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in set: `auth`, `guest`, `admin` and `cors`.
    #[must_use]
    pub fn with_defaults(config: &AppConfig) -> Self {
        let mut registry = Self::new();
        registry.register_default::<AuthMiddleware>("auth");
        registry.register_default::<GuestMiddleware>("guest");
        registry.register_default::<AdminMiddleware>("admin");
        let cors = config.cors.clone();
        registry.register("cors", move || CorsMiddleware::new(cors.clone()));
        registry
    }

    /// Register `factory` under `name`, replacing any previous registration.
    pub fn register<F, M>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn() -> M + Send + Sync + 'static,
        M: Middleware + 'static,
    {
        let factory: MiddlewareFactory = Arc::new(move || Box::new(factory()) as Box<dyn Middleware>);
        if self.factories.insert(name.to_string(), factory).is_some() {
            warn!(middleware = %name, "Middleware registration replaced");
        } else {
            debug!(middleware = %name, "Middleware registered");
        }
        self
    }

    pub fn register_default<M>(&mut self, name: &str) -> &mut Self
    where
        M: Middleware + Default + 'static,
    {
        self.register(name, M::default)
    }

    /// A fresh unit for `name`.
    pub fn resolve(&self, name: &str) -> Result<Box<dyn Middleware>, DispatchError> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| DispatchError::MiddlewareNotFound(name.to_string()))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
