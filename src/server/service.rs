use super::http_server::HttpService;
use super::request::{parse_request, Request};
use super::response::{write_handler_response, write_json_error, Response};
use crate::dispatcher::Dispatcher;
use crate::static_files::StaticFiles;
use serde_json::json;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// The HTTP service: static files first, then the dispatcher.
///
/// Cloned once per connection; everything inside is shared.
#[derive(Clone)]
pub struct AppService {
    pub dispatcher: Arc<Dispatcher>,
    pub static_files: Option<Arc<StaticFiles>>,
}

impl AppService {
    pub fn new(dispatcher: Arc<Dispatcher>, static_dir: Option<PathBuf>) -> Self {
        Self {
            dispatcher,
            static_files: static_dir.map(|dir| Arc::new(StaticFiles::new(dir))),
        }
    }

    fn serve_static(&self, method: &str, path: &str, res: &mut Response) -> bool {
        if method != "GET" && method != "HEAD" {
            return false;
        }
        let Some(sf) = &self.static_files else {
            return false;
        };
        if !sf.contains(path) {
            return false;
        }
        match sf.load(path) {
            Ok((bytes, content_type)) => {
                debug!(path = %path, content_type = content_type, "Static file served");
                res.status_code(200).header("Content-Type", content_type);
                if method == "GET" {
                    res.body_vec(bytes);
                }
                true
            }
            Err(e) => {
                warn!(path = %path, error = %e, "Static file read failed");
                false
            }
        }
    }
}

impl HttpService for AppService {
    fn call(&mut self, req: Request<'_>, res: &mut Response) -> io::Result<()> {
        let parsed = parse_request(req);

        if self.serve_static(&parsed.method, &parsed.path, res) {
            return Ok(());
        }

        let method = parsed.method.clone();
        match parsed.into_handler_request(Arc::clone(self.dispatcher.app())) {
            Some(handler_request) => {
                let response = self.dispatcher.dispatch(handler_request);
                write_handler_response(res, response);
            }
            None => {
                warn!(method = %method, "Rejected request with invalid method");
                write_json_error(res, 400, json!({ "error": "Invalid HTTP method" }));
            }
        }
        Ok(())
    }
}
