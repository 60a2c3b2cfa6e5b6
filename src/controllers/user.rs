use crate::controller::{controller, ActionResult};
use crate::dispatcher::{HandlerRequest, HandlerResponse};
use http::Method;
use serde_json::{json, Value};

#[derive(Debug, Default)]
pub struct UserController;

/// Sample profile data until users come from storage.
fn user_data(name: &str) -> Value {
    json!({
        "name": name,
        "email": format!("{}@example.com", name.to_lowercase()),
        "joined": "2024-01-01",
        "bio": format!("This is a sample user bio for {name}"),
    })
}

#[controller]
impl UserController {
    pub fn profile(
        &mut self,
        req: &mut HandlerRequest,
        #[param(default = "")] name: String,
    ) -> ActionResult {
        let title = format!("User Profile - {}", req.app.config.name);
        req.view(
            "user/profile",
            json!({
                "title": title,
                "name": name,
                "user_data": user_data(&name),
            }),
        )
    }

    pub fn api_get_user(&mut self, #[param(default = "")] name: String) -> HandlerResponse {
        if name.is_empty() {
            return HandlerResponse::error(400, "Name parameter is required");
        }
        HandlerResponse::json(
            200,
            json!({
                "status": "success",
                "user": user_data(&name),
            }),
        )
    }

    pub fn api_create_user(&mut self, req: &mut HandlerRequest) -> HandlerResponse {
        if req.method != Method::POST {
            return HandlerResponse::error(405, "POST method required");
        }

        let name = req.input("name").unwrap_or_default();
        let email = req.input("email").unwrap_or_default();
        if name.is_empty() || email.is_empty() {
            return HandlerResponse::error(400, "Name and email are required");
        }

        HandlerResponse::json(
            200,
            json!({
                "status": "success",
                "message": "User created successfully",
                "user": { "name": name, "email": email },
            }),
        )
    }
}
