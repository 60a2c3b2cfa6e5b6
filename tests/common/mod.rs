#![allow(dead_code)]

use routeshim::bootstrap::Application;
use routeshim::config::AppConfig;
use routeshim::dispatcher::{HandlerRequest, HandlerResponse};
use std::path::PathBuf;

/// Configuration rooted at the crate directory, so the bundled views and route files load.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.paths.root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    config.session.gc_every = 0;
    config.auth.password_cost = 4;
    config
}

pub fn application() -> Application {
    Application::from_config(test_config()).expect("bundled routes load")
}

/// A small browser: carries the session cookie from one response to the next request.
pub struct Client {
    pub app: Application,
    session: Option<String>,
}

impl Client {
    pub fn new() -> Self {
        Self::with_app(application())
    }

    pub fn with_app(app: Application) -> Self {
        Self { app, session: None }
    }

    pub fn request(&self, method: http::Method, path: &str) -> HandlerRequest {
        let req = self.app.dispatcher().request(method, path);
        match &self.session {
            Some(id) => {
                let name = self.app.config().session.cookie_name.clone();
                req.with_cookie(&name, id.clone())
            }
            None => req,
        }
    }

    pub fn send(&mut self, req: HandlerRequest) -> HandlerResponse {
        let res = self.app.dispatcher().dispatch(req);
        let name = self.app.config().session.cookie_name.clone();
        for cookie in set_cookies(&res) {
            if let Some((key, value)) = cookie_pair(cookie) {
                if key == name {
                    self.session = if value.is_empty() {
                        None
                    } else {
                        Some(value.to_string())
                    };
                }
            }
        }
        res
    }

    pub fn get(&mut self, path: &str) -> HandlerResponse {
        let req = self.request(http::Method::GET, path);
        self.send(req)
    }

    pub fn post_form(&mut self, path: &str, fields: &[(&str, &str)]) -> HandlerResponse {
        let mut req = self.request(http::Method::POST, path);
        for (k, v) in fields {
            req = req.with_form(k, *v);
        }
        self.send(req)
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session.as_deref()
    }

    pub fn login_as(&mut self, email: &str) -> HandlerResponse {
        self.post_form("/login", &[("email", email), ("password", "password")])
    }
}

pub fn set_cookies(res: &HandlerResponse) -> Vec<&str> {
    res.headers
        .iter()
        .filter(|(k, _)| k.eq_ignore_ascii_case("set-cookie"))
        .map(|(_, v)| v.as_str())
        .collect()
}

/// `name=value` from a Set-Cookie line.
pub fn cookie_pair(line: &str) -> Option<(&str, &str)> {
    line.split(';').next()?.trim().split_once('=')
}

pub fn body_text(res: &HandlerResponse) -> &str {
    res.body.as_str().unwrap_or_default()
}

pub mod test_server {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpStream};
    use std::sync::Once;
    use std::time::Duration;

    /// Ensures May coroutines are configured only once
    static MAY_INIT: Once = Once::new();

    pub fn setup_may_runtime() {
        MAY_INIT.call_once(|| {
            may::config().set_stack_size(0x8000);
        });
    }

    /// Send a raw HTTP/1.1 request and read the response until the server closes or
    /// `Content-Length` bytes have arrived. Returns (status, headers, body).
    pub fn send_raw(addr: SocketAddr, raw: &str) -> (u16, Vec<(String, String)>, String) {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        stream.write_all(raw.as_bytes()).unwrap();

        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            match stream.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    buf.extend_from_slice(&chunk[..n]);
                    if response_complete(&buf) {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
        parse_response(&String::from_utf8_lossy(&buf))
    }

    fn response_complete(buf: &[u8]) -> bool {
        let text = String::from_utf8_lossy(buf);
        let Some(split) = text.find("\r\n\r\n") else {
            return false;
        };
        let head = &text[..split];
        let length = head
            .lines()
            .find_map(|l| {
                let (k, v) = l.split_once(':')?;
                k.trim()
                    .eq_ignore_ascii_case("content-length")
                    .then(|| v.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        buf.len() >= split + 4 + length
    }

    fn parse_response(text: &str) -> (u16, Vec<(String, String)>, String) {
        let (head, body) = text.split_once("\r\n\r\n").unwrap_or((text, ""));
        let mut lines = head.lines();
        let status = lines
            .next()
            .and_then(|l| l.split_whitespace().nth(1))
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        let headers = lines
            .filter_map(|l| {
                let (k, v) = l.split_once(':')?;
                Some((k.trim().to_ascii_lowercase(), v.trim().to_string()))
            })
            .collect();
        (status, headers, body.to_string())
    }

    pub fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}
