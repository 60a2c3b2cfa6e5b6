use crate::controller::{controller, ActionResult};
use crate::dispatcher::{HandlerRequest, HandlerResponse};
use serde_json::{json, Value};

#[derive(Debug, Default)]
pub struct AuthController;

/// Loose shape check: something before and after a single `@`, with a dot in the domain.
fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

/// Flash `key` and send the client back where it came from.
fn redirect_back_with(req: &mut HandlerRequest, key: &str, value: Value) -> HandlerResponse {
    req.session.flash(key, value);
    req.redirect_back()
}

#[controller]
impl AuthController {
    pub fn show_login_form(&mut self, req: &mut HandlerRequest) -> ActionResult {
        if req.auth().check()? {
            return Ok(HandlerResponse::redirect("/dashboard"));
        }
        let error = req.session.get_flash("error");
        let old_email = req.session.get_flash("email");
        req.view(
            "auth/login",
            json!({ "title": "Login", "error": error, "email": old_email }),
        )
    }

    pub fn login(&mut self, req: &mut HandlerRequest) -> ActionResult {
        let email = req.input("email").unwrap_or_default().trim().to_string();
        let password = req.input("password").unwrap_or_default().to_string();
        let remember = req.input("remember").is_some();

        if email.is_empty() || password.is_empty() {
            return Ok(redirect_back_with(
                req,
                "error",
                json!("Email and password are required"),
            ));
        }

        if req.auth().attempt(&email, &password, remember)? {
            return Ok(HandlerResponse::redirect("/dashboard"));
        }

        req.session.flash("email", email);
        Ok(redirect_back_with(req, "error", json!("Invalid credentials")))
    }

    pub fn show_register_form(&mut self, req: &mut HandlerRequest) -> ActionResult {
        if req.auth().check()? {
            return Ok(HandlerResponse::redirect("/dashboard"));
        }
        let errors = req.session.get_flash("errors");
        req.view("auth/register", json!({ "title": "Register", "errors": errors }))
    }

    pub fn register(&mut self, req: &mut HandlerRequest) -> ActionResult {
        let name = req.input("name").unwrap_or_default().trim().to_string();
        let email = req.input("email").unwrap_or_default().trim().to_string();
        let password = req.input("password").unwrap_or_default().to_string();
        let confirmation = req
            .input("password_confirmation")
            .unwrap_or_default()
            .to_string();

        let mut errors: Vec<&str> = Vec::new();
        if name.is_empty() {
            errors.push("Name is required");
        }
        if !is_valid_email(&email) {
            errors.push("Valid email is required");
        }
        if password.chars().count() < 6 {
            errors.push("Password must be at least 6 characters");
        }
        if password != confirmation {
            errors.push("Password confirmation does not match");
        }
        if !email.is_empty() && req.app.users.find_by_email(&email)?.is_some() {
            errors.push("Email already exists");
        }
        if !errors.is_empty() {
            return Ok(redirect_back_with(req, "errors", json!(errors)));
        }

        let user = req.app.users.create(&name, &email, &password)?;
        req.auth().login(&user, false)?;
        Ok(HandlerResponse::redirect("/dashboard"))
    }

    pub fn logout(&mut self, req: &mut HandlerRequest) -> ActionResult {
        req.auth().logout()?;
        Ok(HandlerResponse::redirect("/"))
    }

    pub fn dashboard(&mut self, req: &mut HandlerRequest) -> ActionResult {
        let user = req.auth().require_auth()?;
        req.view("dashboard", json!({ "title": "Dashboard", "user": user }))
    }
}
