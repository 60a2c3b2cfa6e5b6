//! Startup wiring: config → route table → registries → dispatcher → server.

use crate::config::AppConfig;
use crate::context::AppContext;
use crate::controller::ControllerTable;
use crate::dispatcher::Dispatcher;
use crate::middleware::MiddlewareRegistry;
use crate::registry::controller_table;
use crate::router::{load_routes_dir, RouteRegistrar, Router};
use crate::server::{AppService, HttpServerWithHeaders, ServerHandle, MAX_REQUEST_HEADERS};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// A fully assembled application, ready to serve.
pub struct Application {
    dispatcher: Arc<Dispatcher>,
}

impl Application {
    /// Load the route files from `paths.routes` and assemble with the bundled controllers and
    /// middleware.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let mut registrar = RouteRegistrar::new();
        load_routes_dir(&config.paths.routes_dir(), &mut registrar)?;
        Self::with_registrar(config, registrar)
    }

    /// Assemble from routes registered in code.
    pub fn with_registrar(config: AppConfig, registrar: RouteRegistrar) -> Result<Self> {
        let router = registrar.build().context("invalid route table")?;
        let middleware = MiddlewareRegistry::with_defaults(&config);
        let app = Arc::new(AppContext::from_config(config)?);
        Ok(Self::assemble(app, router, controller_table(), middleware))
    }

    /// Assemble from explicit parts.
    pub fn assemble(
        app: Arc<AppContext>,
        router: Router,
        controllers: ControllerTable,
        middleware: MiddlewareRegistry,
    ) -> Self {
        info!(
            routes = router.len(),
            controllers = controllers.controller_names().len(),
            middleware = ?middleware.names(),
            "Application assembled"
        );
        let dispatcher = Dispatcher::new(
            Arc::new(router),
            Arc::new(middleware),
            Arc::new(controllers),
            app,
        );
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.dispatcher.app().config
    }

    /// Problems that would surface at dispatch time; empty when every route resolves.
    #[must_use]
    pub fn check(&self) -> Vec<String> {
        self.dispatcher.unresolved()
    }

    /// The HTTP service. Static files are served from `paths.public` when it exists.
    #[must_use]
    pub fn service(&self) -> AppService {
        let public = self.config().paths.public_dir();
        let static_dir = public.is_dir().then_some(public);
        AppService::new(Arc::clone(&self.dispatcher), static_dir)
    }

    /// Serve on `server.addr`.
    pub fn serve(&self) -> Result<ServerHandle> {
        let addr = self.config().server.addr.clone();
        self.serve_on(&addr)
    }

    /// Serve on `addr`. The socket is listening when this returns; port 0 picks a free port.
    pub fn serve_on(&self, addr: &str) -> Result<ServerHandle> {
        let handle = HttpServerWithHeaders::<_, MAX_REQUEST_HEADERS>(self.service())
            .start(addr)
            .with_context(|| format!("failed to bind {addr}"))?;
        info!(addr = %handle.addr(), "Server listening");
        Ok(handle)
    }
}
