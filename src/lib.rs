//! # routeshim
//!
//! **routeshim** is a small MVC request-routing kernel served by coroutines: a declarative route
//! table, a named middleware pipeline, controller actions bound by parameter name, session-based
//! authentication and server-rendered views.
//!
//! ## Architecture
//!
//! - **[`router`]** - route registration (builder API and YAML route files) and path matching
//! - **[`middleware`]** - the `Middleware` contract, the name → factory registry and the chain
//!   builder
//! - **[`controller`]** - compile-time action tables generated by [`macro@controller`] and the
//!   action invoker
//! - **[`dispatcher`]** - request/response types and the dispatch state machine
//! - **[`session`]** - the session bag, the session manager and the `SessionStore` boundary
//! - **[`auth`]** - session authentication on top of a `UserProvider`
//! - **[`view`]** - `minijinja` templates loaded from the views directory
//! - **[`server`]** - the HTTP/1.1 connection loop, the application service and the server handle
//! - **[`config`]** / **[`logging`]** - startup configuration and structured logging
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Server as AppService<br/>(may coroutine)
//!     participant Router
//!     participant Dispatcher
//!     participant Pipeline as Middleware Pipeline
//!     participant Invoker as ActionInvoker
//!
//!     Client->>Server: GET /user/alice
//!     Server->>Server: static file? (public/)
//!     Server->>Dispatcher: dispatch(HandlerRequest)
//!     Dispatcher->>Router: route(GET, "/user/alice")
//!     alt NotFound / MethodNotAllowed
//!         Dispatcher-->>Client: 404 / 405
//!     end
//!     Router-->>Dispatcher: Found { route, {name: alice} }
//!     Dispatcher->>Dispatcher: start session
//!     Dispatcher->>Pipeline: run(middleware names)
//!     Pipeline->>Invoker: next(req)
//!     Invoker->>Invoker: bind params by name, call action
//!     Invoker-->>Pipeline: HandlerResponse
//!     Pipeline-->>Dispatcher: HandlerResponse
//!     Dispatcher->>Dispatcher: persist session, X-Request-Id
//!     Dispatcher-->>Client: 200 text/html
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use routeshim::bootstrap::Application;
//! use routeshim::config::AppConfig;
//!
//! let config = AppConfig::load(Some("config/app.yaml".as_ref()), Some(".env".as_ref()))?;
//! let app = Application::from_config(config)?;
//! let handle = app.serve()?;
//! handle.join().ok();
//! ```
//!
//! ## Runtime Considerations
//!
//! Requests are served by the `may` coroutine runtime. Each request is handled start to finish
//! on one coroutine; the router, registries and views are immutable after startup and shared
//! behind `Arc`. The coroutine stack size is configurable with `APP_STACK_SIZE`.

extern crate self as routeshim;

pub mod auth;
pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod context;
pub mod controller;
pub mod controllers;
pub mod dispatcher;
pub mod error;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod registry;
pub mod runtime_config;
pub mod router;
pub mod server;
pub mod session;
pub mod static_files;
pub mod view;

pub use context::AppContext;
pub use error::{DispatchError, DispatchResult, HandlerNotFound};
pub use routeshim_macros::controller;
