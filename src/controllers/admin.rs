use crate::controller::{controller, ActionResult};
use crate::dispatcher::HandlerRequest;
use serde_json::json;

/// Pages behind the `auth` and `admin` middleware.
#[derive(Debug, Default)]
pub struct AdminController;

#[controller]
impl AdminController {
    pub fn dashboard(&mut self, req: &mut HandlerRequest) -> ActionResult {
        req.view(
            "admin/dashboard",
            json!({
                "title": "Admin Dashboard",
                "stats": { "users": 150, "posts": 89, "views": 1234 },
            }),
        )
    }

    pub fn settings(&mut self, req: &mut HandlerRequest) -> ActionResult {
        req.view("admin/settings", json!({ "title": "Admin Settings" }))
    }
}
