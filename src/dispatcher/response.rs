use serde::Serialize;
use serde_json::Value;
use smallvec::SmallVec;
use std::sync::Arc;

/// Maximum inline headers/cookies before heap allocation
pub const MAX_INLINE_HEADERS: usize = 16;

/// Header/cookie storage. Names are `Arc<str>`, values are per-request strings.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// What a middleware unit or controller action hands back to the dispatcher.
///
/// The body is a JSON value: `Value::String` bodies are written verbatim (HTML, plain text),
/// `Value::Null` writes no body, anything else is serialized as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct HandlerResponse {
    pub status: u16,
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    pub body: Value,
}

impl HandlerResponse {
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    fn with_content_type(status: u16, content_type: &str, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), content_type.to_string()));
        Self {
            status,
            headers,
            body,
        }
    }

    /// `application/json` response.
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        Self::with_content_type(status, "application/json", body)
    }

    /// `{"error": message}` as JSON.
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": message }))
    }

    /// Rendered markup.
    #[must_use]
    pub fn html(status: u16, body: impl Into<String>) -> Self {
        Self::with_content_type(status, "text/html; charset=utf-8", Value::String(body.into()))
    }

    #[must_use]
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::with_content_type(status, "text/plain; charset=utf-8", Value::String(body.into()))
    }

    /// `302 Found` to `location`.
    #[must_use]
    pub fn redirect(location: impl Into<String>) -> Self {
        Self::redirect_with_status(location, 302)
    }

    #[must_use]
    pub fn redirect_with_status(location: impl Into<String>, status: u16) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("location"), location.into()));
        Self {
            status,
            headers,
            body: Value::Null,
        }
    }

    /// Status only, no body.
    #[must_use]
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            headers: HeaderVec::new(),
            body: Value::Null,
        }
    }

    #[must_use]
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status) && self.get_header("location").is_some()
    }

    /// Get a header by name (case-insensitive)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Replace every header named `name` with a single value.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value.into()));
    }

    /// Add a header without touching existing ones (`Set-Cookie`).
    pub fn append_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.push((Arc::from(name), value.into()));
    }

    /// Builder form of [`set_header`](Self::set_header).
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_redirect() {
        let res = HandlerResponse::redirect("/login");
        assert_eq!(res.status, 302);
        assert_eq!(res.get_header("Location"), Some("/login"));
        assert!(res.body.is_null());
        assert!(res.is_redirect());
    }

    #[test]
    fn test_set_and_append_header() {
        let mut res = HandlerResponse::json(200, json!({}));
        res.set_header("Content-Type", "application/problem+json");
        assert_eq!(res.get_header("content-type"), Some("application/problem+json"));
        assert_eq!(
            res.headers
                .iter()
                .filter(|(k, _)| k.eq_ignore_ascii_case("content-type"))
                .count(),
            1
        );

        res.append_header("Set-Cookie", "a=1");
        res.append_header("Set-Cookie", "b=2");
        assert_eq!(
            res.headers
                .iter()
                .filter(|(k, _)| k.as_ref() == "Set-Cookie")
                .count(),
            2
        );
    }

    #[test]
    fn test_html_and_error_bodies() {
        let res = HandlerResponse::html(200, "<h1>Hi</h1>");
        assert_eq!(res.body, json!("<h1>Hi</h1>"));
        assert!(res.get_header("content-type").unwrap().starts_with("text/html"));

        let res = HandlerResponse::error(400, "Name parameter is required");
        assert_eq!(res.body, json!({"error": "Name parameter is required"}));
    }
}
