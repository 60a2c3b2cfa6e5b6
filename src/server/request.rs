use crate::context::AppContext;
use crate::dispatcher::{HandlerRequest, HeaderVec};
use crate::ids::RequestId;
use crate::router::ParamVec;
use http::Method;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info};

/// A request as read off the wire. Borrows the connection buffer.
#[derive(Debug, Clone, Copy)]
pub struct Request<'a> {
    method: &'a str,
    path: &'a str,
    version: u8,
    headers: &'a [httparse::Header<'a>],
    body: &'a [u8],
    peer: Option<SocketAddr>,
}

impl<'a> Request<'a> {
    #[must_use]
    pub fn new(
        method: &'a str,
        path: &'a str,
        version: u8,
        headers: &'a [httparse::Header<'a>],
        body: &'a [u8],
    ) -> Self {
        Self {
            method,
            path,
            version,
            headers,
            body,
            peer: None,
        }
    }

    #[must_use]
    pub fn with_peer(mut self, peer: Option<SocketAddr>) -> Self {
        self.peer = peer;
        self
    }

    #[must_use]
    pub fn method(&self) -> &'a str {
        self.method
    }

    /// Request target including the query string.
    #[must_use]
    pub fn path(&self) -> &'a str {
        self.path
    }

    /// Minor HTTP version: 0 for HTTP/1.0, 1 for HTTP/1.1.
    #[must_use]
    pub fn version(&self) -> u8 {
        self.version
    }

    #[must_use]
    pub fn headers(&self) -> &'a [httparse::Header<'a>] {
        self.headers
    }

    #[must_use]
    pub fn body(&self) -> &'a [u8] {
        self.body
    }

    /// Address of the connected socket.
    #[must_use]
    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }
}

/// Parsed HTTP request data used by `AppService`.
#[derive(Debug, Default, PartialEq)]
pub struct ParsedRequest {
    /// HTTP method as sent (GET, POST, etc.)
    pub method: String,
    /// Request path without the query string
    pub path: String,
    /// HTTP headers (lowercase names)
    pub headers: HeaderVec,
    /// Parsed cookies from the Cookie header
    pub cookies: HeaderVec,
    pub query_params: ParamVec,
    /// Fields of an `application/x-www-form-urlencoded` body
    pub form_params: ParamVec,
    /// Parsed JSON body (if the body is JSON)
    pub body: Option<Value>,
    /// Socket peer, used when no proxy header names the client
    pub peer_addr: Option<String>,
}

impl ParsedRequest {
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Client address as reported by a fronting proxy, else the socket peer.
    #[must_use]
    pub fn client_addr(&self) -> Option<String> {
        self.get_header("x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .or_else(|| self.get_header("x-real-ip"))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .or_else(|| self.peer_addr.clone())
    }

    /// `None` when the method is not a valid HTTP token.
    #[must_use]
    pub fn into_handler_request(self, app: Arc<AppContext>) -> Option<HandlerRequest> {
        let method = Method::from_bytes(self.method.as_bytes()).ok()?;
        let request_id = RequestId::from_header_or_new(self.get_header("x-request-id"));
        let client_addr = self.client_addr();

        let mut req = HandlerRequest::new(app, method, self.path);
        req.request_id = request_id;
        req.headers = self.headers;
        req.cookies = self.cookies;
        req.query_params = self.query_params;
        req.form_params = self.form_params;
        req.body = self.body;
        req.client_addr = client_addr;
        Some(req)
    }
}

/// Split a `Cookie` header into name/value pairs.
#[must_use]
pub fn parse_cookies(header: &str) -> HeaderVec {
    header
        .split(';')
        .filter_map(|pair| {
            let mut parts = pair.trim().splitn(2, '=');
            let name = parts.next()?.trim();
            if name.is_empty() {
                return None;
            }
            let value = parts.next().unwrap_or("").trim();
            Some((Arc::from(name), value.to_string()))
        })
        .collect()
}

/// Parse query string parameters from a URL path
///
/// Extracts everything after the `?` character and URL-decodes parameter names and values.
#[must_use]
pub fn parse_query_params(path: &str) -> ParamVec {
    match path.split_once('?') {
        Some((_, query)) => parse_urlencoded(query),
        None => ParamVec::new(),
    }
}

/// Decode `a=1&b=two` pairs.
#[must_use]
pub fn parse_urlencoded(text: &str) -> ParamVec {
    url::form_urlencoded::parse(text.as_bytes())
        .map(|(k, v)| (Arc::from(k.as_ref()), v.into_owned()))
        .collect()
}

/// Interpret a request body by content type: JSON, form fields, or ignored.
///
/// A body without a recognised content type is still tried as JSON.
#[must_use]
pub fn parse_body(content_type: &str, body: &str) -> (Option<Value>, ParamVec) {
    if body.is_empty() {
        return (None, ParamVec::new());
    }
    let content_type = content_type.to_ascii_lowercase();
    if content_type.starts_with("application/x-www-form-urlencoded") {
        return (None, parse_urlencoded(body));
    }
    if content_type.is_empty() || content_type.contains("json") {
        return (serde_json::from_str(body).ok(), ParamVec::new());
    }
    (None, ParamVec::new())
}

/// Parse an incoming HTTP request into a `ParsedRequest`
pub fn parse_request(req: Request<'_>) -> ParsedRequest {
    let method = req.method().to_string();
    let raw_path = req.path().to_string();
    let path = raw_path.split('?').next().unwrap_or("/").to_string();

    let headers: HeaderVec = req
        .headers()
        .iter()
        .map(|h| {
            (
                Arc::from(h.name.to_ascii_lowercase().as_str()),
                String::from_utf8_lossy(h.value).to_string(),
            )
        })
        .collect();
    debug!(header_count = headers.len(), "Headers extracted");

    let cookies = headers
        .iter()
        .find(|(k, _)| k.as_ref() == "cookie")
        .map(|(_, v)| parse_cookies(v))
        .unwrap_or_default();
    debug!(
        cookie_names = ?cookies.iter().map(|(k, _)| k.as_ref()).collect::<Vec<_>>(),
        "Cookies extracted"
    );

    let query_params = parse_query_params(&raw_path);

    let content_type = headers
        .iter()
        .find(|(k, _)| k.as_ref() == "content-type")
        .map(|(_, v)| v.clone())
        .unwrap_or_default();

    let raw_body = req.body();
    let (body, form_params) = if raw_body.is_empty() {
        (None, ParamVec::new())
    } else {
        debug!(
            content_length = raw_body.len(),
            content_type = %content_type,
            "Request body read"
        );
        parse_body(&content_type, &String::from_utf8_lossy(raw_body))
    };

    info!(
        method = %method,
        path = %path,
        query_count = query_params.len(),
        form_count = form_params.len(),
        json_body = body.is_some(),
        "HTTP request parsed"
    );

    ParsedRequest {
        method,
        path,
        headers,
        cookies,
        query_params,
        form_params,
        body,
        peer_addr: req.peer().map(|addr| addr.ip().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_cookies() {
        let cookies = parse_cookies("a=b; c=d; =skip; flag");
        assert_eq!(cookies.len(), 3);
        assert_eq!(cookies[0].0.as_ref(), "a");
        assert_eq!(cookies[1].1, "d");
        assert_eq!(cookies[2].1, "");
    }

    #[test]
    fn test_parse_query_params() {
        let q = parse_query_params("/p?x=1&y=hello%20world");
        assert_eq!(q[0], (Arc::from("x"), "1".to_string()));
        assert_eq!(q[1].1, "hello world");
        assert!(parse_query_params("/p").is_empty());
    }

    #[test]
    fn test_parse_body() {
        let (json_body, form) = parse_body("application/json", r#"{"name":"alice"}"#);
        assert_eq!(json_body, Some(json!({"name": "alice"})));
        assert!(form.is_empty());

        let (json_body, form) =
            parse_body("application/x-www-form-urlencoded", "email=a%40b.c&password=x");
        assert!(json_body.is_none());
        assert_eq!(form[0].1, "a@b.c");

        assert_eq!(parse_body("text/plain", "hi"), (None, ParamVec::new()));
    }

    #[test]
    fn test_parse_request_from_wire() {
        let headers = [
            httparse::Header {
                name: "Content-Type",
                value: b"application/x-www-form-urlencoded",
            },
            httparse::Header {
                name: "Cookie",
                value: b"routeshim_session=abc; theme=dark",
            },
        ];
        let peer: SocketAddr = "192.0.2.7:5000".parse().unwrap();
        let req = Request::new("POST", "/login?next=%2Fdashboard", 1, &headers, b"email=a%40b.c")
            .with_peer(Some(peer));
        let parsed = parse_request(req);
        assert_eq!(parsed.client_addr().as_deref(), Some("192.0.2.7"));
        assert_eq!(parsed.path, "/login");
        assert_eq!(parsed.get_header("content-type"), Some("application/x-www-form-urlencoded"));
        assert_eq!(parsed.cookies.len(), 2);
        assert_eq!(parsed.query_params[0].1, "/dashboard");
        assert_eq!(parsed.form_params[0].1, "a@b.c");
        assert!(parsed.body.is_none());
    }

    #[test]
    fn test_into_handler_request() {
        let mut parsed = ParsedRequest {
            method: "POST".into(),
            path: "/login".into(),
            ..ParsedRequest::default()
        };
        parsed
            .headers
            .push((Arc::from("x-forwarded-for"), "10.1.1.1, 10.0.0.1".into()));
        let app = Arc::new(AppContext::for_tests());
        let req = parsed.into_handler_request(Arc::clone(&app)).unwrap();
        assert_eq!(req.method, Method::POST);
        assert_eq!(req.client_addr.as_deref(), Some("10.1.1.1"));

        let bad = ParsedRequest {
            method: "BAD METHOD".into(),
            ..ParsedRequest::default()
        };
        assert!(bad.into_handler_request(app).is_none());
    }
}
