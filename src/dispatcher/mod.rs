//! # Dispatcher Module
//!
//! The dispatcher drives one request from the matcher to the response:
//!
//! ```text
//! Received ──► NotFound (404) | MethodNotAllowed (405)
//!    │
//!    ▼
//! Matched ──► session start ──► middleware pipeline ──► action ──► session persisted ──► sent
//!                                   │                      │
//!                                   └──── error / panic ───┴──► 401/redirect or 500
//! ```
//!
//! - [`HandlerRequest`] carries everything a middleware unit or action may read: params,
//!   headers, cookies, body, the session and the shared [`AppContext`](crate::AppContext)
//! - [`HandlerResponse`] is what they return; constructors cover JSON, HTML, text and
//!   redirects
//! - [`Dispatcher`] catches every error and panic at one boundary. In debug mode 500 bodies
//!   carry the error message and its cause chain; otherwise a generic message
//!
//! Every response gets an `X-Request-Id` header. `HEAD` responses have their body removed.

mod core;
mod request;
mod response;

pub use self::core::Dispatcher;
pub use request::HandlerRequest;
pub use response::{HandlerResponse, HeaderVec, MAX_INLINE_HEADERS};
