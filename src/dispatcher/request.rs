use super::response::{HandlerResponse, HeaderVec};
use crate::auth::Auth;
use crate::context::AppContext;
use crate::error::DispatchResult;
use crate::ids::RequestId;
use crate::router::ParamVec;
use crate::session::{ClientInfo, Session};
use http::Method;
use serde_json::Value;
use std::sync::Arc;

/// Everything a middleware unit or controller action sees about one request.
///
/// Created by the server per request and dropped once the response is written. The session is
/// loaded by the dispatcher after routing and persisted after the pipeline returns.
#[derive(Clone)]
pub struct HandlerRequest {
    /// Unique request ID for tracing and correlation
    pub request_id: RequestId,
    pub method: Method,
    /// Request path, without the query string
    pub path: String,
    /// Path variables captured by the matched route
    pub path_params: ParamVec,
    pub query_params: ParamVec,
    /// `application/x-www-form-urlencoded` body fields
    pub form_params: ParamVec,
    pub headers: HeaderVec,
    /// Cookies parsed from the Cookie header
    pub cookies: HeaderVec,
    /// Request body parsed as JSON (if present)
    pub body: Option<Value>,
    pub client_addr: Option<String>,
    pub session: Session,
    pub app: Arc<AppContext>,
    queued_headers: Vec<(String, String)>,
}

impl std::fmt::Debug for HandlerRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRequest")
            .field("request_id", &self.request_id)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("path_params", &self.path_params)
            .field("query_params", &self.query_params)
            .field("session", &self.session.id())
            .finish_non_exhaustive()
    }
}

impl HandlerRequest {
    #[must_use]
    pub fn new(app: Arc<AppContext>, method: Method, path: impl Into<String>) -> Self {
        Self {
            request_id: RequestId::new(),
            method,
            path: path.into(),
            path_params: ParamVec::new(),
            query_params: ParamVec::new(),
            form_params: ParamVec::new(),
            headers: HeaderVec::new(),
            cookies: HeaderVec::new(),
            body: None,
            client_addr: None,
            session: Session::fresh(),
            app,
            queued_headers: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((Arc::from(name), value.into()));
        self
    }

    #[must_use]
    pub fn with_cookie(mut self, name: &str, value: impl Into<String>) -> Self {
        self.cookies.push((Arc::from(name), value.into()));
        self
    }

    #[must_use]
    pub fn with_query(mut self, name: &str, value: impl Into<String>) -> Self {
        self.query_params.push((Arc::from(name), value.into()));
        self
    }

    #[must_use]
    pub fn with_form(mut self, name: &str, value: impl Into<String>) -> Self {
        self.form_params.push((Arc::from(name), value.into()));
        self
    }

    #[must_use]
    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Get a path parameter by name (last occurrence wins)
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a query parameter by name (last occurrence wins)
    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    #[inline]
    #[must_use]
    pub fn get_form_param(&self, name: &str) -> Option<&str> {
        self.form_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[inline]
    #[must_use]
    pub fn get_cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// A submitted value: form field, then JSON body string field, then query parameter.
    #[must_use]
    pub fn input(&self, key: &str) -> Option<&str> {
        self.get_form_param(key)
            .or_else(|| {
                self.body
                    .as_ref()
                    .and_then(|b| b.get(key))
                    .and_then(Value::as_str)
            })
            .or_else(|| self.get_query_param(key))
    }

    /// The client asked for, or sent, JSON.
    #[must_use]
    pub fn wants_json(&self) -> bool {
        ["accept", "content-type"].iter().any(|h| {
            self.get_header(h)
                .is_some_and(|v| v.to_ascii_lowercase().contains("application/json"))
        })
    }

    #[must_use]
    pub fn client_info(&self) -> ClientInfo<'_> {
        ClientInfo {
            ip_address: self.client_addr.as_deref(),
            user_agent: self.get_header("user-agent"),
        }
    }

    pub fn auth(&mut self) -> Auth<'_> {
        Auth::new(self)
    }

    /// Render `name` as a `200 text/html` response.
    pub fn view(&self, name: &str, ctx: Value) -> DispatchResult {
        let html = self.app.views.render(name, ctx)?;
        Ok(HandlerResponse::html(200, html))
    }

    /// Redirect to the `Referer`, or `/` without one.
    #[must_use]
    pub fn redirect_back(&self) -> HandlerResponse {
        HandlerResponse::redirect(self.get_header("referer").unwrap_or("/"))
    }

    /// Add a `Set-Cookie` value to whatever response this request ends with.
    pub fn queue_cookie(&mut self, cookie: impl Into<String>) {
        self.queue_header("Set-Cookie", cookie);
    }

    /// Set a header on whatever response this request ends with, error responses included.
    pub fn queue_header(&mut self, name: &str, value: impl Into<String>) {
        self.queued_headers.push((name.to_string(), value.into()));
    }

    /// Queued headers onto `res`. `Set-Cookie` lines accumulate; other names replace.
    pub(crate) fn apply_queued_headers(&mut self, res: &mut HandlerResponse) {
        for (name, value) in std::mem::take(&mut self.queued_headers) {
            if name.eq_ignore_ascii_case("set-cookie") {
                res.append_header(&name, value);
            } else {
                res.set_header(&name, value);
            }
        }
    }
}
