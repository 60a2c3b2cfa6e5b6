use crate::dispatcher::HandlerResponse;
use bytes::BytesMut;
use serde_json::Value;

pub fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        413 => "Payload Too Large",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        431 => "Request Header Fields Too Large",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "OK",
    }
}

/// A response on its way to the wire. Header lines are owned and dropped with it.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }
}

impl Response {
    /// Plain-text response carrying only the status reason.
    pub(crate) fn rejection(status: u16) -> Self {
        let mut res = Self::default();
        res.status_code(status)
            .header("Content-Type", "text/plain; charset=utf-8");
        res.body_vec(status_reason(status).as_bytes().to_vec());
        res
    }

    pub fn status_code(&mut self, status: u16) -> &mut Self {
        self.status = status;
        self
    }

    /// Append a header. CR and LF are stripped so a value cannot start a new line.
    pub fn header(&mut self, name: &str, value: &str) -> &mut Self {
        let clean = |s: &str| s.chars().filter(|c| *c != '\r' && *c != '\n').collect();
        self.headers.push((clean(name), clean(value)));
        self
    }

    pub fn body_vec(&mut self, body: Vec<u8>) {
        self.body = body;
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Serialize as an HTTP/1.1 message. `Content-Length` always reflects the body.
    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        let length = self.body.len().to_string();
        buf.extend_from_slice(b"HTTP/1.1 ");
        buf.extend_from_slice(self.status.to_string().as_bytes());
        buf.extend_from_slice(b" ");
        buf.extend_from_slice(status_reason(self.status).as_bytes());
        buf.extend_from_slice(b"\r\nServer: routeshim\r\nContent-Length: ");
        buf.extend_from_slice(length.as_bytes());
        for (name, value) in &self.headers {
            buf.extend_from_slice(b"\r\n");
            buf.extend_from_slice(name.as_bytes());
            buf.extend_from_slice(b": ");
            buf.extend_from_slice(value.as_bytes());
        }
        buf.extend_from_slice(b"\r\n\r\n");
        buf.extend_from_slice(&self.body);
    }
}

/// Serialize the body: strings verbatim, `null` as nothing, everything else as JSON.
#[must_use]
pub fn body_bytes(body: Value) -> (Vec<u8>, Option<&'static str>) {
    match body {
        Value::Null => (Vec::new(), None),
        Value::String(s) => (s.into_bytes(), Some("text/plain; charset=utf-8")),
        other => (
            serde_json::to_vec(&other).unwrap_or_else(|_| b"null".to_vec()),
            Some("application/json"),
        ),
    }
}

pub fn write_handler_response(res: &mut Response, hr: HandlerResponse) {
    res.status_code(hr.status);

    let mut has_content_type = false;
    for (name, value) in &hr.headers {
        if name.eq_ignore_ascii_case("content-length") {
            continue;
        }
        if name.eq_ignore_ascii_case("content-type") {
            has_content_type = true;
        }
        res.header(name, value);
    }

    let (bytes, default_type) = body_bytes(hr.body);
    if let (false, Some(content_type)) = (has_content_type, default_type) {
        res.header("Content-Type", content_type);
    }
    res.body_vec(bytes);
}

pub fn write_json_error(res: &mut Response, status: u16, body: Value) {
    res.status_code(status)
        .header("Content-Type", "application/json");
    res.body_vec(body.to_string().into_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn encoded(res: &Response) -> String {
        let mut buf = BytesMut::new();
        res.encode(&mut buf);
        String::from_utf8(buf.to_vec()).unwrap()
    }

    #[test]
    fn test_status_reason() {
        assert_eq!(status_reason(200), "OK");
        assert_eq!(status_reason(302), "Found");
        assert_eq!(status_reason(405), "Method Not Allowed");
        assert_eq!(status_reason(431), "Request Header Fields Too Large");
    }

    #[test]
    fn test_header_values_are_sanitized() {
        let mut res = Response::default();
        res.header("Location", "/x\r\nSet-Cookie: evil");
        assert_eq!(res.get_header("location"), Some("/xSet-Cookie: evil"));
        assert!(!encoded(&res).contains("\r\nSet-Cookie"));
    }

    #[test]
    fn test_per_request_values_stay_with_their_response() {
        let mut first = Response::default();
        first.header("X-Request-Id", "01J0000000000000000000000A");
        let mut second = Response::default();
        second.header("X-Request-Id", "01J0000000000000000000000B");
        assert!(encoded(&first).contains("X-Request-Id: 01J0000000000000000000000A\r\n"));
        assert!(encoded(&second).contains("X-Request-Id: 01J0000000000000000000000B\r\n"));
        drop(first);
        assert_eq!(second.headers().len(), 1);
    }

    #[test]
    fn test_many_headers_are_all_written() {
        let mut hr = HandlerResponse::html(200, "ok");
        for i in 0..40 {
            hr.append_header("Set-Cookie", format!("c{i}=v"));
        }
        let mut res = Response::default();
        write_handler_response(&mut res, hr);
        let text = encoded(&res);
        assert_eq!(text.matches("\r\nSet-Cookie: ").count(), 40);
        assert!(text.contains("\r\nContent-Length: 2\r\n"));
        assert!(text.ends_with("\r\n\r\nok"));
    }

    #[test]
    fn test_default_content_type_and_length() {
        let mut res = Response::default();
        let mut hr = HandlerResponse::json(201, json!({"a": 1}));
        hr.set_header("Content-Length", "999".to_string());
        write_handler_response(&mut res, hr);
        assert_eq!(res.status(), 201);
        assert_eq!(res.get_header("content-type"), Some("application/json"));
        assert!(res.get_header("content-length").is_none());
        assert!(encoded(&res).starts_with("HTTP/1.1 201 Created\r\nServer: routeshim\r\nContent-Length: 7\r\n"));
    }

    #[test]
    fn test_body_bytes() {
        assert_eq!(body_bytes(Value::Null), (Vec::new(), None));
        assert_eq!(body_bytes(json!("hi")).0, b"hi".to_vec());
        assert_eq!(
            body_bytes(json!({"a": 1})),
            (br#"{"a":1}"#.to_vec(), Some("application/json"))
        );
    }
}
