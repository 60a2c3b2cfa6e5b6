//! `#[controller]` action tables: name-based binding, defaults, conversion errors, and the
//! ways an action can fail.

mod common;

use common::test_config;
use http::Method;
use routeshim::bootstrap::Application;
use routeshim::controller::{controller, ActionResult, Controller, ControllerTable};
use routeshim::dispatcher::{HandlerRequest, HandlerResponse};
use routeshim::middleware::MiddlewareRegistry;
use routeshim::router::RouteRegistrar;
use routeshim::{AppContext, DispatchError};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Default)]
struct MathController {
    calls: u32,
}

#[controller]
impl MathController {
    /// Arguments bind by name, so `{b}/{a}` in the pattern does not swap them.
    pub fn sub(&mut self, a: i64, b: i64) -> HandlerResponse {
        self.bump();
        HandlerResponse::json(200, json!({ "result": a - b, "calls": self.calls }))
    }

    pub fn greet(&mut self, #[param(default = "world")] who: String) -> HandlerResponse {
        HandlerResponse::text(200, format!("hello {who}"))
    }

    pub fn by_id(&mut self, #[param(name = "id")] user_id: u32) -> HandlerResponse {
        HandlerResponse::json(200, json!({ "user_id": user_id }))
    }

    pub fn echo_path(&mut self, req: &HandlerRequest) -> HandlerResponse {
        HandlerResponse::text(200, req.path.clone())
    }

    pub fn fails(&mut self) -> ActionResult {
        Err(DispatchError::Internal(anyhow::anyhow!("database unavailable")))
    }

    pub fn explodes(&mut self) -> HandlerResponse {
        panic!("kaboom")
    }

    fn bump(&mut self) {
        self.calls += 1;
    }
}

#[derive(Debug, Default)]
struct Unnamed;

#[controller(name = "Reports")]
impl Unnamed {
    pub fn index(&mut self) -> HandlerResponse {
        HandlerResponse::text(200, "reports")
    }
}

fn app(debug: bool) -> Application {
    let mut r = RouteRegistrar::new();
    r.get("/sub/{b}/{a}", ("MathController", "sub"));
    r.get("/greet", ("MathController", "greet"));
    r.get("/greet/{who}", ("MathController", "greet"));
    r.get("/users/{id}", ("MathController", "by_id"));
    r.get("/echo", ("MathController", "echo_path"));
    r.get("/fails", ("MathController", "fails"));
    r.get("/explodes", ("MathController", "explodes"));
    r.get("/reports", ("Reports", "index"));
    r.get("/helper", ("MathController", "bump"));

    let mut table = ControllerTable::new();
    table.register::<MathController>().register::<Unnamed>();

    let mut config = test_config();
    config.debug = debug;
    let middleware = MiddlewareRegistry::with_defaults(&config);
    Application::assemble(
        Arc::new(AppContext::from_config(config).unwrap()),
        r.build().unwrap(),
        table,
        middleware,
    )
}

fn get(app: &Application, path: &str) -> HandlerResponse {
    let req = app.dispatcher().request(Method::GET, path);
    app.dispatcher().dispatch(req)
}

fn get_json(app: &Application, path: &str) -> HandlerResponse {
    let req = app
        .dispatcher()
        .request(Method::GET, path)
        .with_header("accept", "application/json");
    app.dispatcher().dispatch(req)
}

#[test]
fn test_generated_table() {
    assert_eq!(MathController::NAME, "MathController");
    assert_eq!(Unnamed::NAME, "Reports");
    let names: Vec<&str> = MathController::actions().iter().map(|a| a.name()).collect();
    assert_eq!(
        names,
        vec!["sub", "greet", "by_id", "echo_path", "fails", "explodes"]
    );
}

#[test]
fn test_binds_by_name_not_position() {
    let app = app(false);
    let res = get(&app, "/sub/3/10");
    assert_eq!(res.status, 200);
    assert_eq!(res.body["result"], 7);
}

#[test]
fn test_fresh_controller_per_request() {
    let app = app(false);
    assert_eq!(get(&app, "/sub/1/2").body["calls"], 1);
    assert_eq!(get(&app, "/sub/1/2").body["calls"], 1);
}

#[test]
fn test_default_and_renamed_params() {
    let app = app(false);
    assert_eq!(get(&app, "/greet").body, json!("hello world"));
    assert_eq!(get(&app, "/greet/ann").body, json!("hello ann"));
    assert_eq!(get(&app, "/users/42").body, json!({ "user_id": 42 }));
}

#[test]
fn test_request_argument() {
    let app = app(false);
    assert_eq!(get(&app, "/echo").body, json!("/echo"));
}

#[test]
fn test_named_controller() {
    let app = app(false);
    assert_eq!(get(&app, "/reports").body, json!("reports"));
}

#[test]
fn test_private_methods_are_not_actions() {
    let app = app(true);
    let res = get_json(&app, "/helper");
    assert_eq!(res.status, 500);
    assert_eq!(res.body["error"], "Method bump not found in MathController");
}

#[test]
fn test_invalid_parameter_is_a_server_error() {
    let app = app(true);
    let res = get_json(&app, "/users/abc");
    assert_eq!(res.status, 500);
    assert!(res.body["error"].as_str().unwrap().contains("id"));
}

#[test]
fn test_errors_hide_details_without_debug() {
    let app = app(false);
    let res = get_json(&app, "/fails");
    assert_eq!(res.status, 500);
    assert_eq!(res.body, json!({ "error": "Internal Server Error" }));
}

#[test]
fn test_errors_show_details_in_debug() {
    let app = app(true);
    let res = get_json(&app, "/fails");
    assert_eq!(res.status, 500);
    assert!(res.body["error"]
        .as_str()
        .unwrap()
        .contains("database unavailable"));
    assert!(res.body["trace"].is_array());
}

#[test]
fn test_panics_become_500() {
    let app = app(true);
    let res = get_json(&app, "/explodes");
    assert_eq!(res.status, 500);
    assert!(res.body["error"].as_str().unwrap().contains("kaboom"));

    // the dispatcher keeps serving afterwards
    assert_eq!(get(&app, "/greet").status, 200);
}
