use super::core::{Flow, Middleware};
use crate::dispatcher::HandlerRequest;
use crate::error::DispatchError;

/// `auth`: the request must belong to a signed-in user.
///
/// Raises `AuthenticationRequired`; the dispatcher turns that into a redirect to `/login`
/// or a 401 JSON body depending on what the client accepts.
#[derive(Debug, Default)]
pub struct AuthMiddleware;

impl Middleware for AuthMiddleware {
    fn before(&mut self, req: &mut HandlerRequest) -> Result<Flow, DispatchError> {
        if req.auth().check()? {
            Ok(Flow::Continue)
        } else {
            Err(DispatchError::AuthenticationRequired)
        }
    }
}
