use crate::controller::{controller, ActionResult};
use crate::dispatcher::HandlerRequest;
use serde_json::json;

/// Mounts the React SPA. The shell loads scripts from the Vite dev server in `dev`, from the
/// build directory otherwise.
#[derive(Debug, Default)]
pub struct AppController;

#[controller]
impl AppController {
    pub fn index(&mut self, req: &mut HandlerRequest) -> ActionResult {
        req.view("template/react_shell", json!({ "title": "React App" }))
    }
}
