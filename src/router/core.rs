//! Router core module - hot path for request routing.

use http::Method;
use regex::Regex;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Maximum number of path/query parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Parameter storage for the hot path.
///
/// Names are `Arc<str>` shared with the route table; values are per-request strings.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Methods a route may be registered for. `HEAD` is answered by `GET` routes.
pub const ROUTABLE_METHODS: [Method; 6] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
];

/// What a route runs once its middleware lets the request through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerRef {
    /// A template file under the application root, rendered with the path variables.
    FileInclude(PathBuf),
    /// An action in the controller table.
    ControllerMethod { controller: String, method: String },
}

impl HandlerRef {
    pub fn action(controller: impl Into<String>, method: impl Into<String>) -> Self {
        HandlerRef::ControllerMethod {
            controller: controller.into(),
            method: method.into(),
        }
    }

    /// Reference an action of a `#[controller]` type without spelling its name.
    pub fn of<C: crate::controller::Controller>(method: impl Into<String>) -> Self {
        Self::action(C::NAME, method)
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        HandlerRef::FileInclude(path.into())
    }
}

impl From<(&str, &str)> for HandlerRef {
    fn from((controller, method): (&str, &str)) -> Self {
        HandlerRef::action(controller, method)
    }
}

impl fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerRef::FileInclude(path) => write!(f, "file:{}", path.display()),
            HandlerRef::ControllerMethod { controller, method } => {
                write!(f, "{controller}@{method}")
            }
        }
    }
}

impl FromStr for HandlerRef {
    type Err = RouteError;

    /// Parses `Controller@method`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('@') {
            Some((controller, method)) if !controller.is_empty() && !method.is_empty() => {
                Ok(HandlerRef::action(controller.trim(), method.trim()))
            }
            _ => Err(RouteError::InvalidHandler(s.to_string())),
        }
    }
}

/// One entry of the route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMeta {
    pub method: Method,
    /// Normalized pattern: leading `/`, no trailing `/` except for the root.
    pub pattern: String,
    pub handler: HandlerRef,
    /// Middleware names in execution order (group middleware first).
    pub middleware: Vec<String>,
}

impl RouteMeta {
    pub fn new(method: Method, pattern: &str, handler: HandlerRef) -> Self {
        Self {
            method,
            pattern: normalize_path(pattern).into_owned(),
            handler,
            middleware: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_middleware<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.middleware.extend(names.into_iter().map(Into::into));
        self
    }
}

/// Problems found while building the route table.
#[derive(Debug)]
pub enum RouteError {
    InvalidPattern { pattern: String, reason: String },
    InvalidHandler(String),
    UnsupportedMethod(String),
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::InvalidPattern { pattern, reason } => {
                write!(f, "invalid route pattern {pattern:?}: {reason}")
            }
            RouteError::InvalidHandler(handler) => {
                write!(f, "invalid handler {handler:?}, expected \"Controller@method\"")
            }
            RouteError::UnsupportedMethod(method) => {
                write!(f, "unsupported route method {method:?}")
            }
        }
    }
}

impl std::error::Error for RouteError {}

/// Outcome of matching a request against the route table.
#[derive(Debug, Clone)]
pub enum RouteMatch {
    Found {
        route: Arc<RouteMeta>,
        path_params: ParamVec,
    },
    NotFound,
    /// The path exists for other methods, listed in registration order.
    MethodNotAllowed { allowed: Vec<Method> },
}

impl RouteMatch {
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, RouteMatch::Found { .. })
    }

    /// Look up a captured path variable (last occurrence wins).
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        match self {
            RouteMatch::Found { path_params, .. } => path_params
                .iter()
                .rfind(|(k, _)| k.as_ref() == name)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
enum PathMatcher {
    Exact,
    Pattern {
        regex: Regex,
        param_names: Vec<Arc<str>>,
    },
}

#[derive(Debug, Clone)]
struct RouteEntry {
    route: Arc<RouteMeta>,
    matcher: PathMatcher,
}

impl RouteEntry {
    fn capture(&self, path: &str) -> Option<ParamVec> {
        match &self.matcher {
            PathMatcher::Exact => (self.route.pattern == path).then(ParamVec::new),
            PathMatcher::Pattern { regex, param_names } => {
                let caps = regex.captures(path)?;
                let mut params = ParamVec::new();
                for (i, name) in param_names.iter().enumerate() {
                    if let Some(value) = caps.get(i + 1) {
                        params.push((Arc::clone(name), value.as_str().to_string()));
                    }
                }
                Some(params)
            }
        }
    }
}

/// Immutable route table.
///
/// Placeholder-free routes are looked up by exact path first; placeholder routes are then tried
/// in registration order. The first match wins.
#[derive(Debug, Clone, Default)]
pub struct Router {
    entries: Vec<RouteEntry>,
    static_index: HashMap<Method, HashMap<String, usize>>,
    dynamic_index: HashMap<Method, Vec<usize>>,
}

impl Router {
    /// Build the table. A later route with the same method and pattern as an earlier one is
    /// ignored with a warning.
    pub fn new(routes: Vec<RouteMeta>) -> Result<Self, RouteError> {
        let mut router = Router::default();

        for mut route in routes {
            if !ROUTABLE_METHODS.contains(&route.method) {
                return Err(RouteError::UnsupportedMethod(route.method.to_string()));
            }
            route.pattern = normalize_path(&route.pattern).into_owned();

            let duplicate = router
                .entries
                .iter()
                .any(|e| e.route.method == route.method && e.route.pattern == route.pattern);
            if duplicate {
                warn!(
                    method = %route.method,
                    pattern = %route.pattern,
                    handler = %route.handler,
                    "Duplicate route ignored; the first registration wins"
                );
                continue;
            }

            let idx = router.entries.len();
            let matcher = if route.pattern.contains('{') {
                let (regex, names) = Self::path_to_regex(&route.pattern)?;
                router
                    .dynamic_index
                    .entry(route.method.clone())
                    .or_default()
                    .push(idx);
                PathMatcher::Pattern {
                    regex,
                    param_names: names.into_iter().map(Arc::from).collect(),
                }
            } else {
                router
                    .static_index
                    .entry(route.method.clone())
                    .or_default()
                    .insert(route.pattern.clone(), idx);
                PathMatcher::Exact
            };
            router.entries.push(RouteEntry {
                route: Arc::new(route),
                matcher,
            });
        }

        info!(
            routes_count = router.entries.len(),
            static_routes = router.static_index.values().map(HashMap::len).sum::<usize>(),
            "Routing table loaded"
        );
        Ok(router)
    }

    /// All routes in registration order.
    pub fn routes(&self) -> impl Iterator<Item = &Arc<RouteMeta>> {
        self.entries.iter().map(|e| &e.route)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn find(&self, method: &Method, path: &str) -> Option<(Arc<RouteMeta>, ParamVec)> {
        if let Some(&idx) = self.static_index.get(method).and_then(|m| m.get(path)) {
            return Some((Arc::clone(&self.entries[idx].route), ParamVec::new()));
        }
        self.dynamic_index.get(method)?.iter().find_map(|&idx| {
            let entry = &self.entries[idx];
            entry
                .capture(path)
                .map(|params| (Arc::clone(&entry.route), params))
        })
    }

    /// Match `method` + `path`.
    ///
    /// The path is percent-decoded and stripped of trailing slashes first. `HEAD` falls back
    /// to `GET` routes. When no route of the method matches but routes of other methods do,
    /// the result is `MethodNotAllowed`.
    #[must_use]
    pub fn route(&self, method: &Method, path: &str) -> RouteMatch {
        let decoded = decode_path(path);
        let path = normalize_path(&decoded);

        debug!(method = %method, path = %path, "Route match attempt");

        let found = self.find(method, &path).or_else(|| {
            if *method == Method::HEAD {
                self.find(&Method::GET, &path)
            } else {
                None
            }
        });

        if let Some((route, path_params)) = found {
            debug!(
                method = %method,
                path = %path,
                route_pattern = %route.pattern,
                handler = %route.handler,
                path_params = ?path_params,
                "Route matched"
            );
            return RouteMatch::Found { route, path_params };
        }

        let mut allowed: Vec<Method> = Vec::new();
        for entry in &self.entries {
            if entry.route.method != *method
                && !allowed.contains(&entry.route.method)
                && entry.capture(&path).is_some()
            {
                allowed.push(entry.route.method.clone());
            }
        }

        if allowed.is_empty() {
            debug!(method = %method, path = %path, "No route matched");
            RouteMatch::NotFound
        } else {
            debug!(method = %method, path = %path, allowed = ?allowed, "Method not allowed");
            RouteMatch::MethodNotAllowed { allowed }
        }
    }

    /// Convert a route pattern to an anchored regex and its ordered placeholder names.
    ///
    /// `{name}` may appear anywhere inside a segment and matches one or more non-`/`
    /// characters. Literal text is escaped.
    ///
    /// ```rust,ignore
    /// let (regex, params) = Router::path_to_regex("/users/{id}")?;
    /// assert_eq!(params, vec!["id"]);
    /// assert!(regex.is_match("/users/123"));
    /// ```
    pub(crate) fn path_to_regex(path: &str) -> Result<(Regex, Vec<String>), RouteError> {
        let invalid = |reason: &str| RouteError::InvalidPattern {
            pattern: path.to_string(),
            reason: reason.to_string(),
        };

        let mut pattern = String::with_capacity(path.len() + 16);
        pattern.push('^');
        let mut param_names = Vec::with_capacity(path.matches('{').count());

        let mut rest = path;
        while let Some(open) = rest.find('{') {
            pattern.push_str(&regex::escape(&rest[..open]));
            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| invalid("unclosed `{`"))?;
            let name = after[..close].trim();
            if name.is_empty() || name.contains('/') || name.contains('{') {
                return Err(invalid("placeholder names must be non-empty and single-segment"));
            }
            if param_names.iter().any(|n| n == name) {
                return Err(invalid("placeholder names must be unique"));
            }
            pattern.push_str("([^/]+)");
            param_names.push(name.to_string());
            rest = &after[close + 1..];
        }
        if rest.contains('}') {
            return Err(invalid("unmatched `}`"));
        }
        pattern.push_str(&regex::escape(rest));
        pattern.push('$');

        let regex = Regex::new(&pattern).map_err(|e| invalid(&e.to_string()))?;
        Ok((regex, param_names))
    }
}

/// Percent-decode a request path. Invalid UTF-8 leaves the path untouched.
pub fn decode_path(path: &str) -> Cow<'_, str> {
    if !path.contains('%') {
        return Cow::Borrowed(path);
    }
    urlencoding::decode(path).unwrap_or(Cow::Borrowed(path))
}

/// Ensure a leading `/` and strip trailing slashes, keeping the root as `/`.
pub fn normalize_path(path: &str) -> Cow<'_, str> {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return Cow::Borrowed("/");
    }
    if trimmed.starts_with('/') {
        Cow::Borrowed(trimmed)
    } else {
        Cow::Owned(format!("/{trimmed}"))
    }
}
