use super::core::{HandlerRef, RouteError, RouteMeta, Router, ROUTABLE_METHODS};
use http::Method;
use tracing::warn;

/// Options applied to every route registered inside a [`RouteRegistrar::group`] callback.
///
/// Inside a nested group, each option that is set replaces the enclosing group's value and
/// each option left as `None` is inherited.
#[derive(Debug, Clone, Default)]
pub struct GroupOptions {
    pub prefix: Option<String>,
    pub middleware: Option<Vec<String>>,
}

impl GroupOptions {
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            middleware: None,
        }
    }

    #[must_use]
    pub fn middleware<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.middleware
            .get_or_insert_with(Vec::new)
            .extend(names.into_iter().map(Into::into));
        self
    }
}

/// Effective options of the innermost open group.
#[derive(Debug, Clone, Default)]
struct GroupFrame {
    prefix: String,
    middleware: Vec<String>,
}

impl GroupFrame {
    fn merged(&self, options: GroupOptions) -> Self {
        Self {
            prefix: options.prefix.unwrap_or_else(|| self.prefix.clone()),
            middleware: options
                .middleware
                .unwrap_or_else(|| self.middleware.clone()),
        }
    }
}

/// Collects routes at startup.
///
/// ```rust,ignore
/// let mut r = RouteRegistrar::new();
/// r.get("/", ("HomeController", "index"));
/// r.group(GroupOptions::prefix("/admin").middleware(["auth", "admin"]), |r| {
///     r.get("/dashboard", ("AdminController", "dashboard"));
/// });
/// r.middleware(["guest"]).get("/login", ("AuthController", "show_login_form"));
/// let router = r.build()?;
/// ```
#[derive(Debug, Default)]
pub struct RouteRegistrar {
    routes: Vec<RouteMeta>,
    groups: Vec<GroupFrame>,
    pending_middleware: Vec<String>,
}

impl RouteRegistrar {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one route under the current group prefix.
    ///
    /// The route's middleware is the current group middleware followed by whatever
    /// [`middleware`](Self::middleware) declared since the previous registration.
    pub fn register(
        &mut self,
        method: Method,
        uri: &str,
        handler: impl Into<HandlerRef>,
    ) -> &mut Self {
        let route_middleware = std::mem::take(&mut self.pending_middleware);
        if !ROUTABLE_METHODS.contains(&method) {
            warn!(method = %method, uri = %uri, "Ignoring route with unsupported method");
            return self;
        }

        let (pattern, middleware) = match self.groups.last() {
            Some(group) => (
                join_prefix(&group.prefix, uri),
                group
                    .middleware
                    .iter()
                    .cloned()
                    .chain(route_middleware)
                    .collect(),
            ),
            None => (join_prefix("", uri), route_middleware),
        };

        self.routes.push(RouteMeta {
            method,
            pattern,
            handler: handler.into(),
            middleware,
        });
        self
    }

    pub fn get(&mut self, uri: &str, handler: impl Into<HandlerRef>) -> &mut Self {
        self.register(Method::GET, uri, handler)
    }

    pub fn post(&mut self, uri: &str, handler: impl Into<HandlerRef>) -> &mut Self {
        self.register(Method::POST, uri, handler)
    }

    pub fn put(&mut self, uri: &str, handler: impl Into<HandlerRef>) -> &mut Self {
        self.register(Method::PUT, uri, handler)
    }

    pub fn patch(&mut self, uri: &str, handler: impl Into<HandlerRef>) -> &mut Self {
        self.register(Method::PATCH, uri, handler)
    }

    pub fn delete(&mut self, uri: &str, handler: impl Into<HandlerRef>) -> &mut Self {
        self.register(Method::DELETE, uri, handler)
    }

    pub fn options(&mut self, uri: &str, handler: impl Into<HandlerRef>) -> &mut Self {
        self.register(Method::OPTIONS, uri, handler)
    }

    /// Declare middleware for the next registered route only.
    pub fn middleware<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pending_middleware
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Register routes with a prefix and middleware; the previous group state is restored when
    /// `routes` returns. A nested group's options are merged over the enclosing ones: a given
    /// prefix or middleware list replaces the outer value, an omitted one is inherited.
    pub fn group<F>(&mut self, options: GroupOptions, routes: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        let frame = self
            .groups
            .last()
            .cloned()
            .unwrap_or_default()
            .merged(options);
        self.groups.push(frame);
        routes(self);
        self.groups.pop();
        self
    }

    /// Routes collected so far, in registration order.
    #[must_use]
    pub fn routes(&self) -> &[RouteMeta] {
        &self.routes
    }

    pub fn build(self) -> Result<Router, RouteError> {
        if !self.pending_middleware.is_empty() {
            warn!(
                middleware = ?self.pending_middleware,
                "middleware() was called without a following route"
            );
        }
        Router::new(self.routes)
    }
}

/// `'/' + trim(prefix, '/') + '/' + ltrim(uri, '/')`, trailing slash stripped, root kept.
#[must_use]
pub fn join_prefix(prefix: &str, uri: &str) -> String {
    let prefix = prefix.trim_matches('/');
    let uri = uri.trim_start_matches('/');
    let joined = if prefix.is_empty() {
        format!("/{uri}")
    } else {
        format!("/{prefix}/{uri}")
    };
    let trimmed = joined.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}
