//! # Session Module
//!
//! Server-side sessions keyed by a cookie holding a [`SessionId`](crate::ids::SessionId).
//!
//! - [`Session`] is the per-request attribute bag (including flash data)
//! - [`SessionManager`] resolves the cookie at the start of a request and persists the bag at
//!   the end, issuing or expiring the cookie as needed
//! - [`SessionStore`] is the persistence boundary; [`MemorySessionStore`] keeps records in a
//!   concurrent map
//!
//! Garbage collection runs every `session.gc_every` finished requests and removes records
//! whose `last_activity` is older than `session.lifetime_secs`.

mod manager;
mod memory;
#[allow(clippy::module_inception)]
mod session;
mod store;

pub use manager::{ClientInfo, SessionManager};
pub use memory::MemorySessionStore;
pub use session::Session;
pub use store::{unix_now, SessionRecord, SessionStore};
