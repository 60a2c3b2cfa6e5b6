use super::core::{Flow, Middleware};
use crate::dispatcher::{HandlerRequest, HandlerResponse};
use crate::error::DispatchError;

/// `guest`: signed-in users are sent to `/dashboard`.
#[derive(Debug, Default)]
pub struct GuestMiddleware;

impl Middleware for GuestMiddleware {
    fn before(&mut self, req: &mut HandlerRequest) -> Result<Flow, DispatchError> {
        if req.auth().check()? {
            Ok(Flow::Respond(HandlerResponse::redirect("/dashboard")))
        } else {
            Ok(Flow::Continue)
        }
    }
}
