//! Demo controllers wired up by the bundled route files.
//!
//! Each controller is registered into the [`ControllerTable`](crate::controller::ControllerTable)
//! by [`registry::register_all`](crate::registry::register_all).

mod admin;
mod app;
mod auth;
mod home;
mod user;

pub use admin::AdminController;
pub use app::AppController;
pub use auth::AuthController;
pub use home::HomeController;
pub use user::UserController;
