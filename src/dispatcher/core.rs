//! Dispatcher core: route → session → middleware pipeline → action → response.

use super::request::HandlerRequest;
use super::response::HandlerResponse;
use crate::context::AppContext;
use crate::controller::{ActionInvoker, ControllerTable};
use crate::error::DispatchError;
use crate::middleware::{build_pipeline, MiddlewareRegistry, Next};
use crate::router::{RouteMatch, RouteMeta, Router};
use http::Method;
use serde_json::{json, Value};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn};

const GENERIC_500: &str = "Internal Server Error";

/// Turns one [`HandlerRequest`] into one [`HandlerResponse`].
///
/// Everything it holds is immutable after startup, so a single `Dispatcher` behind an `Arc`
/// serves every connection coroutine.
pub struct Dispatcher {
    router: Arc<Router>,
    middleware: Arc<MiddlewareRegistry>,
    invoker: ActionInvoker,
    app: Arc<AppContext>,
}

impl Dispatcher {
    pub fn new(
        router: Arc<Router>,
        middleware: Arc<MiddlewareRegistry>,
        controllers: Arc<ControllerTable>,
        app: Arc<AppContext>,
    ) -> Self {
        let invoker = ActionInvoker::new(controllers, app.config.paths.root.clone());
        Self {
            router,
            middleware,
            invoker,
            app,
        }
    }

    #[must_use]
    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    #[must_use]
    pub fn middleware(&self) -> &Arc<MiddlewareRegistry> {
        &self.middleware
    }

    #[must_use]
    pub fn invoker(&self) -> &ActionInvoker {
        &self.invoker
    }

    #[must_use]
    pub fn app(&self) -> &Arc<AppContext> {
        &self.app
    }

    /// A blank request bound to this dispatcher's application context.
    #[must_use]
    pub fn request(&self, method: Method, path: &str) -> HandlerRequest {
        HandlerRequest::new(Arc::clone(&self.app), method, path)
    }

    /// Every handler or middleware name in the route table that would fail at dispatch time.
    #[must_use]
    pub fn unresolved(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for route in self.router.routes() {
            if let Err(e) = self.invoker.check(&route.handler) {
                problems.push(format!("{} {}: {e}", route.method, route.pattern));
            }
            for name in &route.middleware {
                if !self.middleware.contains(name) {
                    problems.push(format!(
                        "{} {}: {}",
                        route.method,
                        route.pattern,
                        DispatchError::MiddlewareNotFound(name.clone())
                    ));
                }
            }
        }
        problems
    }

    /// Dispatch one request. Never fails: errors and panics become 5xx responses.
    pub fn dispatch(&self, mut req: HandlerRequest) -> HandlerResponse {
        let span = info_span!(
            "request",
            request_id = %req.request_id,
            method = %req.method,
            path = %req.path
        );
        let _entered = span.enter();
        let start = Instant::now();

        let mut res = match self.router.route(&req.method, &req.path) {
            RouteMatch::Found { route, path_params } => {
                req.path_params = path_params;
                self.run_route(&route, &mut req)
            }
            RouteMatch::NotFound => self.not_found(&req),
            RouteMatch::MethodNotAllowed { allowed } => Self::method_not_allowed(&allowed),
        };

        res.set_header("X-Request-Id", req.request_id.to_string());
        if req.method == Method::HEAD {
            res.body = Value::Null;
        }

        info!(
            status = res.status,
            latency_ms = start.elapsed().as_millis() as u64,
            "Request complete"
        );
        res
    }

    fn run_route(&self, route: &RouteMeta, req: &mut HandlerRequest) -> HandlerResponse {
        let sessions = &self.app.sessions;
        let cookie = req.get_cookie(sessions.cookie_name()).map(str::to_string);
        req.session = sessions.start(cookie.as_deref());

        debug!(
            handler = %route.handler,
            middleware = ?route.middleware,
            session_id = %req.session.id(),
            "Running pipeline"
        );

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let invoker = &self.invoker;
            let handler = &route.handler;
            let terminal = Next::new(move |req: &mut HandlerRequest| invoker.invoke(handler, req));
            build_pipeline(&self.middleware, &route.middleware, terminal).run(req)
        }));

        let mut res = match outcome {
            Ok(Ok(res)) => res,
            Ok(Err(err)) => self.error_response(req, &err),
            Err(panic) => self.panic_response(req, panic.as_ref()),
        };

        req.apply_queued_headers(&mut res);
        let mut session = std::mem::take(&mut req.session);
        sessions.finish(&mut session, req.client_info(), &mut res);
        req.session = session;
        res
    }

    fn error_response(&self, req: &HandlerRequest, err: &DispatchError) -> HandlerResponse {
        if let DispatchError::AuthenticationRequired = err {
            debug!(wants_json = req.wants_json(), "Authentication required");
            return if req.wants_json() {
                HandlerResponse::error(401, "Unauthorized")
            } else {
                HandlerResponse::redirect("/login")
            };
        }

        let trace = err.chain();
        error!(error = %err, trace = ?trace, "Request failed");
        self.server_error(req, &err.to_string(), &trace)
    }

    fn panic_response(&self, req: &HandlerRequest, panic: &(dyn Any + Send)) -> HandlerResponse {
        let message = panic
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        let backtrace = std::backtrace::Backtrace::capture();
        error!(
            panic_message = %message,
            backtrace = %backtrace,
            "Handler panicked - CRITICAL"
        );
        let message = format!("Handler panicked: {message}");
        self.server_error(req, &message, std::slice::from_ref(&message))
    }

    /// 500 body: message and trace only in debug mode.
    fn server_error(&self, req: &HandlerRequest, message: &str, trace: &[String]) -> HandlerResponse {
        let debug = self.app.config.debug;
        if req.wants_json() {
            return if debug {
                HandlerResponse::json(500, json!({ "error": message, "trace": trace }))
            } else {
                HandlerResponse::error(500, GENERIC_500)
            };
        }

        let views = &self.app.views;
        if views.exists("errors/500") {
            let ctx = if debug {
                json!({ "debug": true, "message": message, "trace": trace })
            } else {
                json!({ "debug": false })
            };
            match views.render("errors/500", ctx) {
                Ok(html) => return HandlerResponse::html(500, html),
                Err(e) => warn!(error = %e, "errors/500 view failed to render"),
            }
        }

        if debug {
            HandlerResponse::text(500, format!("{GENERIC_500}: {message}\n\n{}", trace.join("\n")))
        } else {
            HandlerResponse::text(500, GENERIC_500)
        }
    }

    fn not_found(&self, req: &HandlerRequest) -> HandlerResponse {
        if req.wants_json() {
            return HandlerResponse::error(404, "Not Found");
        }
        let views = &self.app.views;
        if views.exists("errors/404") {
            match views.render("errors/404", json!({ "path": req.path })) {
                Ok(html) => return HandlerResponse::html(404, html),
                Err(e) => warn!(error = %e, "errors/404 view failed to render"),
            }
        }
        HandlerResponse::text(404, "404 Not Found")
    }

    fn method_not_allowed(allowed: &[Method]) -> HandlerResponse {
        let allow = allowed
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        HandlerResponse::text(405, "405 Method Not Allowed").with_header("Allow", allow)
    }
}
