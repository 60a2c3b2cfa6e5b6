use super::{HandlerRef, RouteMatch, RouteMeta, RouteRegistrar, Router};
use http::Method;

fn sample_router() -> Router {
    let mut r = RouteRegistrar::new();
    r.get("/", ("HomeController", "index"));
    r.get("/user/{name}", ("UserController", "profile"));
    r.get("/user/settings", ("UserController", "settings"));
    r.get("/login", ("AuthController", "show_login_form"));
    r.post("/login", ("AuthController", "login"));
    r.get("/{page}", ("HomeController", "page"));
    r.build().unwrap()
}

#[test]
fn test_root_path() {
    let (re, params) = Router::path_to_regex("/").unwrap();
    assert!(re.is_match("/"));
    assert!(params.is_empty());
}

#[test]
fn test_parameterized_path() {
    let (re, params) = Router::path_to_regex("/items/{id}").unwrap();
    assert!(re.is_match("/items/123"));
    assert!(!re.is_match("/items/123/extra"));
    assert!(!re.is_match("/items/"));
    assert_eq!(params, vec!["id"]);
}

#[test]
fn test_inline_placeholder_and_escaping() {
    let (re, params) = Router::path_to_regex("/files/{name}.txt").unwrap();
    assert!(re.is_match("/files/report.txt"));
    assert!(!re.is_match("/files/reportXtxt"));
    assert_eq!(params, vec!["name"]);
}

#[test]
fn test_bad_patterns_rejected() {
    assert!(Router::path_to_regex("/a/{id").is_err());
    assert!(Router::path_to_regex("/a/{}").is_err());
    assert!(Router::path_to_regex("/a/{id}/{id}").is_err());
    assert!(Router::path_to_regex("/a/id}").is_err());
}

#[test]
fn test_static_route_beats_earlier_placeholder() {
    let router = sample_router();
    match router.route(&Method::GET, "/user/settings") {
        RouteMatch::Found { route, path_params } => {
            assert_eq!(route.handler, HandlerRef::action("UserController", "settings"));
            assert!(path_params.is_empty());
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_placeholder_binding() {
    let router = sample_router();
    let m = router.route(&Method::GET, "/user/alice");
    assert_eq!(m.get_path_param("name"), Some("alice"));
}

#[test]
fn test_registration_order_for_placeholders() {
    let router = sample_router();
    let m = router.route(&Method::GET, "/about");
    match m {
        RouteMatch::Found { route, .. } => assert_eq!(route.pattern, "/{page}"),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_not_found_and_method_not_allowed() {
    let router = sample_router();
    assert!(matches!(
        router.route(&Method::GET, "/a/b/c"),
        RouteMatch::NotFound
    ));
    match router.route(&Method::DELETE, "/login") {
        RouteMatch::MethodNotAllowed { allowed } => {
            assert_eq!(allowed, vec![Method::GET, Method::POST]);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_head_falls_back_to_get() {
    let router = sample_router();
    assert!(router.route(&Method::HEAD, "/").is_found());
}

#[test]
fn test_trailing_slash_and_percent_decoding() {
    let router = sample_router();
    assert!(router.route(&Method::GET, "/login/").is_found());
    let m = router.route(&Method::GET, "/user/J%C3%BCrgen");
    assert_eq!(m.get_path_param("name"), Some("Jürgen"));
}

#[test]
fn test_duplicate_registration_keeps_first() {
    let router = Router::new(vec![
        RouteMeta::new(Method::GET, "/x", HandlerRef::action("A", "first")),
        RouteMeta::new(Method::GET, "/x/", HandlerRef::action("B", "second")),
    ])
    .unwrap();
    assert_eq!(router.len(), 1);
    match router.route(&Method::GET, "/x") {
        RouteMatch::Found { route, .. } => {
            assert_eq!(route.handler, HandlerRef::action("A", "first"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_matching_is_idempotent() {
    let router = sample_router();
    let a = router.route(&Method::GET, "/user/bob");
    let b = router.route(&Method::GET, "/user/bob");
    assert_eq!(a.get_path_param("name"), b.get_path_param("name"));
}

#[test]
fn test_handler_ref_parse() {
    assert_eq!(
        "UserController@profile".parse::<HandlerRef>().unwrap(),
        HandlerRef::action("UserController", "profile")
    );
    assert!("UserController".parse::<HandlerRef>().is_err());
    assert!("@profile".parse::<HandlerRef>().is_err());
}
