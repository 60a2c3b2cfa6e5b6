//! # Server Module
//!
//! HTTP plumbing on `may` coroutines: the connection loop in [`http_server`], request parsing
//! into a [`HandlerRequest`](crate::dispatcher::HandlerRequest), response writing, and the
//! [`AppService`] that ties static files and the dispatcher together.

pub mod http_server;
pub mod request;
pub mod response;
pub mod service;

pub use http_server::{HttpServerWithHeaders, HttpService, ServerHandle, MAX_REQUEST_HEADERS};
pub use request::{
    parse_body, parse_cookies, parse_query_params, parse_request, ParsedRequest, Request,
};
pub use response::{status_reason, write_handler_response, Response};
pub use service::AppService;
