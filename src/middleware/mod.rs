//! # Middleware Module
//!
//! Named middleware units and the chain builder that threads a request through them.
//!
//! Routes list middleware by name. At dispatch time [`build_pipeline`] folds those names into
//! one callable that ends in the action invoker; each link asks the [`MiddlewareRegistry`]
//! for a fresh unit when it runs.
//!
//! ## Built-in middleware
//!
//! | name    | unit                  | effect                                                   |
//! |---------|-----------------------|----------------------------------------------------------|
//! | `auth`  | [`AuthMiddleware`]    | `AuthenticationRequired` unless signed in                |
//! | `guest` | [`GuestMiddleware`]   | redirect to `/dashboard` when signed in                  |
//! | `admin` | [`AdminMiddleware`]   | 403 JSON unless the user is an admin                     |
//! | `cors`  | [`CorsMiddleware`]    | `Access-Control-Allow-*` headers, 200 for `OPTIONS`      |

mod admin;
mod auth;
mod core;
mod cors;
mod guest;
mod pipeline;
mod registry;

pub use admin::{AdminMiddleware, ADMIN_DENIED_MESSAGE};
pub use auth::AuthMiddleware;
pub use self::core::{Flow, Middleware, Next};
pub use cors::CorsMiddleware;
pub use guest::GuestMiddleware;
pub use pipeline::build_pipeline;
pub use registry::{MiddlewareFactory, MiddlewareRegistry};
