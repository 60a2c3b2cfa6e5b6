use crate::controller::{controller, ActionResult};
use crate::dispatcher::{HandlerRequest, HandlerResponse};
use crate::session::unix_now;
use serde_json::json;

#[derive(Debug, Default)]
pub struct HomeController;

/// Capitalize the first character, as page titles do.
fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[controller]
impl HomeController {
    pub fn index(&mut self, req: &mut HandlerRequest) -> ActionResult {
        let name = req.app.config.name.clone();
        req.view(
            "index",
            json!({
                "title": format!("Home - {name}"),
                "message": format!("Welcome to {name}"),
            }),
        )
    }

    /// A page named by the URL. Unknown pages render the 404 view with status 404.
    pub fn page(
        &mut self,
        req: &mut HandlerRequest,
        #[param(default = "home")] page: String,
    ) -> ActionResult {
        let name = req.app.config.name.clone();
        let ctx = json!({
            "title": format!("{} - {name}", title_case(&page)),
            "page": page,
        });

        let valid = !page.is_empty()
            && page
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid && req.app.views.exists(&page) {
            return req.view(&page, ctx);
        }

        let html = req.app.views.render("errors/404", ctx)?;
        Ok(HandlerResponse::html(404, html))
    }

    pub fn api(&mut self) -> HandlerResponse {
        HandlerResponse::json(
            200,
            json!({
                "status": "success",
                "message": "API is working",
                "timestamp": unix_now(),
                "data": [],
            }),
        )
    }
}
