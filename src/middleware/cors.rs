use super::core::{Flow, Middleware};
use crate::config::CorsConfig;
use crate::dispatcher::{HandlerRequest, HandlerResponse};
use crate::error::DispatchError;
use http::Method;

/// `cors`: adds `Access-Control-Allow-*` headers and answers preflight requests.
///
/// `OPTIONS` requests stop here with an empty 200. Other requests continue with the headers
/// queued on the request, so they also land on error and panic responses further in.
#[derive(Debug, Clone, Default)]
pub struct CorsMiddleware {
    config: CorsConfig,
}

impl CorsMiddleware {
    #[must_use]
    pub fn new(config: CorsConfig) -> Self {
        Self { config }
    }

    fn headers(&self) -> [(&'static str, &str); 3] {
        [
            ("Access-Control-Allow-Origin", self.config.allow_origin.as_str()),
            ("Access-Control-Allow-Methods", self.config.allow_methods.as_str()),
            ("Access-Control-Allow-Headers", self.config.allow_headers.as_str()),
        ]
    }
}

impl Middleware for CorsMiddleware {
    fn before(&mut self, req: &mut HandlerRequest) -> Result<Flow, DispatchError> {
        if req.method == Method::OPTIONS {
            let mut res = HandlerResponse::empty(200);
            for (name, value) in self.headers() {
                res.set_header(name, value);
            }
            return Ok(Flow::Respond(res));
        }
        for (name, value) in self.headers() {
            req.queue_header(name, value);
        }
        Ok(Flow::Continue)
    }
}
