//! YAML route files.
//!
//! Every `*.yaml` / `*.yml` file in the routes directory is applied in lexical filename order.
//! Paths with `{placeholders}` must be quoted inside flow mappings.
//!
//! ```yaml
//! routes:
//!   - { method: GET, path: /, handler: HomeController@index }
//!   - { method: GET, path: "/user/{name}", handler: UserController@profile }
//!   - { method: GET, path: /about, file: views/about.html }
//!   - method: GET
//!     path: /login
//!     handler: AuthController@show_login_form
//!     middleware: [guest]
//!   - prefix: /admin
//!     middleware: [auth, admin]
//!     routes:
//!       - { method: GET, path: /dashboard, handler: AdminController@dashboard }
//! ```

use super::core::{HandlerRef, RouteError};
use super::registrar::{GroupOptions, RouteRegistrar};
use anyhow::{bail, Context, Result};
use http::Method;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RouteFile {
    #[serde(default)]
    routes: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Entry {
    Group(GroupDef),
    Route(RouteDef),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GroupDef {
    #[serde(default)]
    prefix: Option<String>,
    #[serde(default)]
    middleware: Option<Vec<String>>,
    routes: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RouteDef {
    method: String,
    path: String,
    #[serde(default)]
    handler: Option<String>,
    #[serde(default)]
    file: Option<PathBuf>,
    #[serde(default)]
    middleware: Vec<String>,
}

impl RouteDef {
    fn handler_ref(&self) -> Result<HandlerRef, RouteError> {
        match (&self.handler, &self.file) {
            (Some(handler), None) => handler.parse(),
            (None, Some(file)) => Ok(HandlerRef::FileInclude(file.clone())),
            _ => Err(RouteError::InvalidHandler(format!(
                "{} {}: exactly one of `handler` or `file` is required",
                self.method, self.path
            ))),
        }
    }

    fn method(&self) -> Result<Method, RouteError> {
        Method::from_bytes(self.method.trim().to_ascii_uppercase().as_bytes())
            .map_err(|_| RouteError::UnsupportedMethod(self.method.clone()))
    }
}

fn apply(entries: Vec<Entry>, registrar: &mut RouteRegistrar) -> Result<(), RouteError> {
    for entry in entries {
        match entry {
            Entry::Route(def) => {
                let method = def.method()?;
                let handler = def.handler_ref()?;
                registrar
                    .middleware(def.middleware)
                    .register(method, &def.path, handler);
            }
            Entry::Group(group) => {
                let options = GroupOptions {
                    prefix: group.prefix,
                    middleware: group.middleware,
                };
                let mut result = Ok(());
                registrar.group(options, |r| result = apply(group.routes, r));
                result?;
            }
        }
    }
    Ok(())
}

/// Apply one YAML document to `registrar`. Returns the number of routes added.
pub fn load_routes_str(text: &str, registrar: &mut RouteRegistrar) -> Result<usize> {
    let before = registrar.routes().len();
    let file: RouteFile = serde_yaml::from_str(text).context("malformed route file")?;
    apply(file.routes, registrar)?;
    Ok(registrar.routes().len() - before)
}

/// Route files in `dir`, sorted by file name.
pub fn route_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("routes directory {} does not exist", dir.display());
    }
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("failed to read routes directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && matches!(
                    path.extension().and_then(|e| e.to_str()),
                    Some("yaml") | Some("yml")
                )
        })
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Load every route file in `dir` into `registrar`.
pub fn load_routes_dir(dir: &Path, registrar: &mut RouteRegistrar) -> Result<usize> {
    let mut total = 0;
    for path in route_files(dir)? {
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read route file {}", path.display()))?;
        let added = load_routes_str(&text, registrar)
            .with_context(|| format!("failed to load route file {}", path.display()))?;
        debug!(file = %path.display(), routes = added, "Route file loaded");
        total += added;
    }
    info!(dir = %dir.display(), routes = total, "Route files loaded");
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_routes_with_groups() {
        let yaml = r#"
routes:
  - { method: get, path: /, handler: HomeController@index }
  - method: GET
    path: /login
    handler: AuthController@show_login_form
    middleware: [guest]
  - prefix: /admin
    middleware: [auth, admin]
    routes:
      - { method: GET, path: /dashboard, handler: AdminController@dashboard }
      - { method: GET, path: /about, file: views/about.html }
"#;
        let mut r = RouteRegistrar::new();
        assert_eq!(load_routes_str(yaml, &mut r).unwrap(), 4);
        let routes = r.routes();
        assert_eq!(routes[0].method, Method::GET);
        assert_eq!(routes[1].middleware, vec!["guest"]);
        assert_eq!(routes[2].pattern, "/admin/dashboard");
        assert_eq!(routes[2].middleware, vec!["auth", "admin"]);
        assert_eq!(
            routes[3].handler,
            HandlerRef::FileInclude(PathBuf::from("views/about.html"))
        );
    }

    #[test]
    fn test_flow_entry_with_placeholder() {
        let yaml = r#"
routes:
  - { method: GET, path: "/user/{name}", handler: UserController@profile }
  - prefix: /api
    routes:
      - { method: GET, path: "/posts/{id}/comments/{comment}", handler: PostController@comment }
"#;
        let mut r = RouteRegistrar::new();
        assert_eq!(load_routes_str(yaml, &mut r).unwrap(), 2);
        assert_eq!(r.routes()[0].pattern, "/user/{name}");
        assert_eq!(r.routes()[1].pattern, "/api/posts/{id}/comments/{comment}");

        let router = r.build().unwrap();
        assert!(router.route(&Method::GET, "/user/alice").is_found());
    }

    #[test]
    fn test_unquoted_placeholder_in_flow_entry_is_rejected() {
        let mut r = RouteRegistrar::new();
        let err = load_routes_str(
            "routes:\n  - { method: GET, path: /user/{name}, handler: A@b }\n",
            &mut r,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("malformed route file"));
    }

    #[test]
    fn test_bundled_route_files_load() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("routes");
        let mut r = RouteRegistrar::new();
        assert!(load_routes_dir(&dir, &mut r).unwrap() > 0);
        let patterns: Vec<&str> = r.routes().iter().map(|m| m.pattern.as_str()).collect();
        assert!(patterns.contains(&"/page/{page}"));
        assert!(patterns.contains(&"/user/{name}"));
        assert!(patterns.contains(&"/api/user/{name}"));
        assert!(r.build().is_ok());
    }

    #[test]
    fn test_nested_group_merges_over_outer_group() {
        let yaml = r#"
routes:
  - prefix: /api
    middleware: [cors]
    routes:
      - prefix: /v1
        routes:
          - { method: GET, path: /status, handler: HomeController@api }
      - middleware: [cors, auth]
        routes:
          - { method: GET, path: /me, handler: UserController@api_get_user }
"#;
        let mut r = RouteRegistrar::new();
        assert_eq!(load_routes_str(yaml, &mut r).unwrap(), 2);
        assert_eq!(r.routes()[0].pattern, "/v1/status");
        assert_eq!(r.routes()[0].middleware, vec!["cors"]);
        assert_eq!(r.routes()[1].pattern, "/api/me");
        assert_eq!(r.routes()[1].middleware, vec!["cors", "auth"]);
    }

    #[test]
    fn test_rejects_bad_handler() {
        let mut r = RouteRegistrar::new();
        let err = load_routes_str(
            "routes:\n  - { method: GET, path: /, handler: HomeController }\n",
            &mut r,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("Controller@method"));
    }

    #[test]
    fn test_rejects_both_handler_and_file() {
        let mut r = RouteRegistrar::new();
        assert!(load_routes_str(
            "routes:\n  - { method: GET, path: /, handler: A@b, file: x.html }\n",
            &mut r,
        )
        .is_err());
    }

    #[test]
    fn test_files_load_in_lexical_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("20_second.yaml"),
            "routes:\n  - { method: GET, path: /x, handler: B@second }\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("10_first.yml"),
            "routes:\n  - { method: GET, path: /x, handler: A@first }\n",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut r = RouteRegistrar::new();
        assert_eq!(load_routes_dir(dir.path(), &mut r).unwrap(), 2);
        assert_eq!(r.routes()[0].handler, HandlerRef::action("A", "first"));

        let router = r.build().unwrap();
        assert_eq!(router.len(), 1);
    }

    #[test]
    fn test_missing_dir_is_error() {
        let mut r = RouteRegistrar::new();
        assert!(load_routes_dir(Path::new("/definitely/not/here"), &mut r).is_err());
    }
}
