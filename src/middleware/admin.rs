use super::core::{Flow, Middleware};
use crate::dispatcher::{HandlerRequest, HandlerResponse};
use crate::error::DispatchError;
use tracing::warn;

pub const ADMIN_DENIED_MESSAGE: &str = "Access denied. Admin privileges required.";

/// `admin`: 403 unless the signed-in user is an administrator.
#[derive(Debug, Default)]
pub struct AdminMiddleware;

impl Middleware for AdminMiddleware {
    fn before(&mut self, req: &mut HandlerRequest) -> Result<Flow, DispatchError> {
        match req.auth().user()? {
            Some(user) if user.is_admin => Ok(Flow::Continue),
            user => {
                warn!(
                    user_id = ?user.map(|u| u.id),
                    path = %req.path,
                    "Admin route denied"
                );
                Ok(Flow::Respond(HandlerResponse::error(403, ADMIN_DENIED_MESSAGE)))
            }
        }
    }
}
