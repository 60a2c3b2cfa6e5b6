//! # Router Module
//!
//! Route registration and path matching.
//!
//! Routes are declared at startup, either through the [`RouteRegistrar`] builder or from YAML
//! route files ([`load_routes_dir`]), and frozen into an immutable [`Router`] shared behind
//! `Arc`. Matching is pure: the same method and path against the same table always produce the
//! same [`RouteMatch`].
//!
//! ## Matching
//!
//! 1. The path is percent-decoded and trailing slashes are stripped (the root stays `/`).
//! 2. Placeholder-free routes of the method are looked up by exact path.
//! 3. Placeholder routes of the method are tried in registration order; `{name}` matches one
//!    or more characters other than `/`.
//! 4. `HEAD` retries steps 2-3 with `GET`.
//! 5. If another method's route matches the path the result is
//!    [`RouteMatch::MethodNotAllowed`], otherwise [`RouteMatch::NotFound`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use routeshim::router::{RouteMatch, RouteRegistrar};
//! use http::Method;
//!
//! let mut r = RouteRegistrar::new();
//! r.get("/user/{name}", ("UserController", "profile"));
//! let router = r.build()?;
//!
//! if let RouteMatch::Found { route, path_params } = router.route(&Method::GET, "/user/alice") {
//!     println!("{} {:?}", route.handler, path_params);
//! }
//! ```

mod core;
mod loader;
mod registrar;
#[cfg(test)]
mod tests;

pub use self::core::{
    decode_path, normalize_path, HandlerRef, ParamVec, RouteError, RouteMatch, RouteMeta, Router,
    MAX_INLINE_PARAMS, ROUTABLE_METHODS,
};
pub use loader::{load_routes_dir, load_routes_str, route_files};
pub use registrar::{join_prefix, GroupOptions, RouteRegistrar};
