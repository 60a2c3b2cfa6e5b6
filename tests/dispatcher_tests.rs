//! End-to-end dispatch tests against the bundled route files, controllers and views.
//!
//! Requests go straight to [`Dispatcher::dispatch`](routeshim::dispatcher::Dispatcher), skipping
//! the socket; `server_tests.rs` covers the wire.

mod common;

use common::{body_text, set_cookies, Client};
use http::Method;
use serde_json::json;

#[test]
fn test_home_page_renders() {
    let mut client = Client::new();
    let res = client.get("/");
    assert_eq!(res.status, 200);
    assert!(res
        .get_header("content-type")
        .unwrap()
        .starts_with("text/html"));
    assert!(body_text(&res).contains("Welcome to Tool Site"));
    assert!(res.get_header("x-request-id").is_some());
}

#[test]
fn test_trailing_slash_and_percent_encoding() {
    let mut client = Client::new();
    assert_eq!(client.get("/user/alice/").status, 200);
    let res = client.get("/user/Jane%20Doe");
    assert_eq!(res.status, 200);
    assert!(body_text(&res).contains("jane doe@example.com"));
}

#[test]
fn test_page_action_defaults_and_unknown_pages() {
    let mut client = Client::new();
    let res = client.get("/page/about");
    assert_eq!(res.status, 200);
    assert!(body_text(&res).contains("About Tool Site"));

    let res = client.get("/page/does-not-exist");
    assert_eq!(res.status, 404);
    assert!(body_text(&res).contains("404 Not Found"));
}

#[test]
fn test_file_include_route() {
    let mut client = Client::new();
    let res = client.get("/about");
    assert_eq!(res.status, 200);
    assert!(body_text(&res).contains("About Tool Site"));
}

#[test]
fn test_not_found_and_method_not_allowed() {
    let mut client = Client::new();
    let res = client.get("/nothing/here");
    assert_eq!(res.status, 404);

    let req = client
        .request(Method::GET, "/nothing/here")
        .with_header("accept", "application/json");
    let res = client.send(req);
    assert_eq!(res.status, 404);
    assert_eq!(res.body, json!({"error": "Not Found"}));

    let req = client.request(Method::DELETE, "/");
    let res = client.send(req);
    assert_eq!(res.status, 405);
    assert_eq!(body_text(&res), "405 Method Not Allowed");
    assert!(res.get_header("allow").unwrap().contains("GET"));
}

#[test]
fn test_head_uses_get_route_without_body() {
    let mut client = Client::new();
    let req = client.request(Method::HEAD, "/");
    let res = client.send(req);
    assert_eq!(res.status, 200);
    assert!(res.body.is_null());
}

#[test]
fn test_json_api() {
    let mut client = Client::new();
    let res = client.get("/api");
    assert_eq!(res.status, 200);
    assert_eq!(res.body["status"], "success");
    assert_eq!(res.get_header("access-control-allow-origin"), Some("*"));

    let res = client.get("/api/user/Bob");
    assert_eq!(res.body["user"]["email"], "bob@example.com");
}

#[test]
fn test_api_create_user() {
    let mut client = Client::new();
    let res = client.post_form("/api/users", &[("name", "Ann"), ("email", "ann@example.com")]);
    assert_eq!(res.status, 200);
    assert_eq!(res.body["user"]["name"], "Ann");

    let req = client
        .request(Method::POST, "/api/users")
        .with_json(json!({ "name": "Ann" }));
    let res = client.send(req);
    assert_eq!(res.status, 400);
    assert_eq!(res.body, json!({"error": "Name and email are required"}));
}

#[test]
fn test_cors_preflight_short_circuits() {
    let mut client = Client::new();
    let req = client.request(Method::OPTIONS, "/api/users");
    let res = client.send(req);
    assert_eq!(res.status, 200);
    assert!(res.body.is_null());
    assert_eq!(
        res.get_header("access-control-allow-methods"),
        Some("GET, POST, PUT, DELETE, OPTIONS")
    );
}

#[test]
fn test_dashboard_requires_login() {
    let mut client = Client::new();
    let res = client.get("/dashboard");
    assert_eq!(res.status, 302);
    assert_eq!(res.get_header("location"), Some("/login"));

    let req = client
        .request(Method::GET, "/dashboard")
        .with_header("accept", "application/json");
    let res = client.send(req);
    assert_eq!(res.status, 401);
    assert_eq!(res.body, json!({"error": "Unauthorized"}));
}

#[test]
fn test_login_flow() {
    let mut client = Client::new();
    let res = client.login_as("user@example.com");
    assert_eq!(res.status, 302);
    assert_eq!(res.get_header("location"), Some("/dashboard"));
    assert!(client.session_id().is_some());

    let res = client.get("/dashboard");
    assert_eq!(res.status, 200);
    assert!(body_text(&res).contains("Welcome, Demo User"));

    // guest-only pages bounce signed-in users
    let res = client.get("/login");
    assert_eq!(res.status, 302);
    assert_eq!(res.get_header("location"), Some("/dashboard"));

    let res = client.post_form("/logout", &[]);
    assert_eq!(res.status, 302);
    assert_eq!(res.get_header("location"), Some("/"));
    assert_eq!(client.get("/dashboard").status, 302);
}

#[test]
fn test_login_rotates_session_id() {
    let mut client = Client::new();
    let res = client.get("/login");
    assert_eq!(res.status, 200);

    // Seed a session so the client holds an id before logging in.
    client.post_form("/login", &[("email", "nobody@example.com"), ("password", "x")]);
    let before = client.session_id().map(str::to_string);
    assert!(before.is_some());

    client.login_as("user@example.com");
    let after = client.session_id().map(str::to_string);
    assert!(after.is_some());
    assert_ne!(before, after);
}

#[test]
fn test_failed_login_flashes_error_once() {
    let mut client = Client::new();
    let req = client
        .request(Method::POST, "/login")
        .with_header("referer", "/login")
        .with_form("email", "user@example.com")
        .with_form("password", "wrong");
    let res = client.send(req);
    assert_eq!(res.status, 302);
    assert_eq!(res.get_header("location"), Some("/login"));

    let res = client.get("/login");
    let html = body_text(&res);
    assert!(html.contains("Invalid credentials"));
    assert!(html.contains("value=\"user@example.com\""));

    let res = client.get("/login");
    assert!(!body_text(&res).contains("Invalid credentials"));
}

#[test]
fn test_remember_me_cookie() {
    let mut client = Client::new();
    let res = client.post_form(
        "/login",
        &[
            ("email", "user@example.com"),
            ("password", "password"),
            ("remember", "1"),
        ],
    );
    let remember = set_cookies(&res)
        .into_iter()
        .find(|c| c.starts_with("remember_token="))
        .expect("remember cookie set");
    let token = common::cookie_pair(remember).unwrap().1.to_string();

    // A new browser with only the remember cookie is signed back in.
    let mut other = Client::with_app(client.app);
    let req = other
        .request(Method::GET, "/dashboard")
        .with_cookie("remember_token", token);
    let res = other.send(req);
    assert_eq!(res.status, 200);
    assert!(other.session_id().is_some());
}

#[test]
fn test_admin_area() {
    let mut client = Client::new();
    client.login_as("user@example.com");
    let res = client.get("/admin/dashboard");
    assert_eq!(res.status, 403);
    assert_eq!(
        res.body,
        json!({"error": "Access denied. Admin privileges required."})
    );

    let mut admin = Client::new();
    admin.login_as("admin@example.com");
    let res = admin.get("/admin/dashboard");
    assert_eq!(res.status, 200);
    assert!(body_text(&res).contains("Users: 150"));
    assert_eq!(admin.get("/admin/settings").status, 200);
}

#[test]
fn test_register_creates_account_and_signs_in() {
    let mut client = Client::new();
    let res = client.post_form(
        "/register",
        &[
            ("name", "New Person"),
            ("email", "new@example.com"),
            ("password", "secret1"),
            ("password_confirmation", "secret1"),
        ],
    );
    assert_eq!(res.status, 302);
    assert_eq!(res.get_header("location"), Some("/dashboard"));
    let res = client.get("/dashboard");
    assert!(body_text(&res).contains("Welcome, New Person"));
}

#[test]
fn test_register_validation_errors() {
    let mut client = Client::new();
    let req = client
        .request(Method::POST, "/register")
        .with_header("referer", "/register")
        .with_form("name", "")
        .with_form("email", "user@example.com")
        .with_form("password", "123")
        .with_form("password_confirmation", "456");
    let res = client.send(req);
    assert_eq!(res.get_header("location"), Some("/register"));

    let html = body_text(&client.get("/register")).to_string();
    assert!(html.contains("Name is required"));
    assert!(html.contains("Password must be at least 6 characters"));
    assert!(html.contains("Password confirmation does not match"));
    assert!(html.contains("Email already exists"));
}

#[test]
fn test_react_shell_uses_build_assets_outside_dev() {
    let mut client = Client::new();
    let res = client.get("/app");
    assert_eq!(res.status, 200);
    assert!(body_text(&res).contains("/build/assets/index.js"));
}
