//! # Auth Module
//!
//! Session-based authentication. A request is signed in when its session carries a `user_id`,
//! or when it presents a valid `remember_token` cookie (which signs it in again).
//!
//! User lookup sits behind [`UserProvider`]; [`InMemoryUsers`] is the bundled implementation
//! used by the demo controllers and the tests. It keeps salted bcrypt password hashes and only
//! the SHA-256 digest of each remember token.

use crate::config::AuthConfig;
use crate::dispatcher::HandlerRequest;
use crate::error::DispatchError;
use anyhow::{Context, Result};
use dashmap::DashMap;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::{debug, info};
use ulid::Ulid;

/// Name of the long-lived sign-in cookie.
pub const REMEMBER_COOKIE: &str = "remember_token";

/// Seven days.
pub const REMEMBER_LIFETIME_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}

/// Where users come from.
pub trait UserProvider: Send + Sync {
    fn find(&self, id: i64) -> Result<Option<User>>;

    fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    fn verify_password(&self, user: &User, password: &str) -> Result<bool>;

    fn find_by_remember_token(&self, token: &str) -> Result<Option<User>>;

    /// Store (or clear, with `None`) the user's remember token.
    fn update_remember_token(&self, user_id: i64, token: Option<&str>) -> Result<()>;

    /// Register a regular (non-admin) user.
    fn create(&self, name: &str, email: &str, password: &str) -> Result<User>;
}

/// Lowercase hex SHA-256 of `input`.
#[must_use]
pub fn sha256_hex(input: &str) -> String {
    Sha256::digest(input.as_bytes())
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// A random 64-character token.
#[must_use]
pub fn new_remember_token() -> String {
    sha256_hex(&format!("{}{}", Ulid::new(), Ulid::new()))
}

#[derive(Debug, Clone)]
struct StoredUser {
    user: User,
    password_hash: String,
    remember_digest: Option<String>,
}

/// Users held in memory.
#[derive(Debug)]
pub struct InMemoryUsers {
    users: DashMap<i64, StoredUser>,
    next_id: AtomicI64,
    cost: u32,
}

impl Default for InMemoryUsers {
    fn default() -> Self {
        Self::with_cost(AuthConfig::default().cost())
    }
}

impl InMemoryUsers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash passwords with bcrypt work factor `cost`.
    #[must_use]
    pub fn with_cost(cost: u32) -> Self {
        Self {
            users: DashMap::new(),
            next_id: AtomicI64::new(1),
            cost,
        }
    }

    /// `admin@example.com` (admin) and `user@example.com`, both with password `password`.
    pub fn with_demo_users(cost: u32) -> Result<Self> {
        let users = Self::with_cost(cost);
        users.add("Admin", "admin@example.com", "password", true)?;
        users.add("Demo User", "user@example.com", "password", false)?;
        Ok(users)
    }

    pub fn add(&self, name: &str, email: &str, password: &str, is_admin: bool) -> Result<User> {
        let password_hash = bcrypt::hash(password, self.cost).context("failed to hash password")?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let user = User {
            id,
            name: name.to_string(),
            email: email.to_ascii_lowercase(),
            is_admin,
        };
        self.users.insert(
            id,
            StoredUser {
                user: user.clone(),
                password_hash,
                remember_digest: None,
            },
        );
        Ok(user)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl UserProvider for InMemoryUsers {
    fn find(&self, id: i64) -> Result<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.user.clone()))
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = email.trim().to_ascii_lowercase();
        Ok(self
            .users
            .iter()
            .find(|u| u.user.email == email)
            .map(|u| u.user.clone()))
    }

    fn verify_password(&self, user: &User, password: &str) -> Result<bool> {
        // Clone out of the map so the shard lock is not held while bcrypt runs.
        let Some(hash) = self.users.get(&user.id).map(|u| u.password_hash.clone()) else {
            return Ok(false);
        };
        bcrypt::verify(password, &hash).context("stored password hash is malformed")
    }

    fn find_by_remember_token(&self, token: &str) -> Result<Option<User>> {
        if token.is_empty() {
            return Ok(None);
        }
        let digest = sha256_hex(token);
        Ok(self
            .users
            .iter()
            .find(|u| u.remember_digest.as_deref() == Some(digest.as_str()))
            .map(|u| u.user.clone()))
    }

    fn update_remember_token(&self, user_id: i64, token: Option<&str>) -> Result<()> {
        if let Some(mut stored) = self.users.get_mut(&user_id) {
            stored.remember_digest = token.map(sha256_hex);
        }
        Ok(())
    }

    fn create(&self, name: &str, email: &str, password: &str) -> Result<User> {
        if self.find_by_email(email)?.is_some() {
            anyhow::bail!("a user with email {email} already exists");
        }
        self.add(name, email, password, false)
    }
}

/// Authentication helpers bound to one request. Obtained from [`HandlerRequest::auth`].
pub struct Auth<'a> {
    req: &'a mut HandlerRequest,
}

impl<'a> Auth<'a> {
    pub(crate) fn new(req: &'a mut HandlerRequest) -> Self {
        Self { req }
    }

    /// The signed-in user, falling back to the remember-me cookie.
    pub fn user(&mut self) -> Result<Option<User>, DispatchError> {
        let users = &self.req.app.users;
        if let Some(id) = self.req.session.user_id() {
            if let Some(user) = users.find(id)? {
                return Ok(Some(user));
            }
        }

        let Some(token) = self.req.get_cookie(REMEMBER_COOKIE).map(str::to_string) else {
            return Ok(None);
        };
        match users.find_by_remember_token(&token)? {
            Some(user) => {
                debug!(user_id = user.id, "Signed in from remember token");
                self.login(&user, false)?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    pub fn check(&mut self) -> Result<bool, DispatchError> {
        Ok(self.user()?.is_some())
    }

    pub fn guest(&mut self) -> Result<bool, DispatchError> {
        Ok(!self.check()?)
    }

    pub fn id(&mut self) -> Result<Option<i64>, DispatchError> {
        Ok(self.user()?.map(|u| u.id))
    }

    /// `AuthenticationRequired` unless a user is signed in.
    pub fn require_auth(&mut self) -> Result<User, DispatchError> {
        self.user()?.ok_or(DispatchError::AuthenticationRequired)
    }

    /// Verify credentials and sign in on success.
    pub fn attempt(
        &mut self,
        email: &str,
        password: &str,
        remember: bool,
    ) -> Result<bool, DispatchError> {
        let users = &self.req.app.users;
        let Some(user) = users.find_by_email(email)? else {
            return Ok(false);
        };
        if !users.verify_password(&user, password)? {
            return Ok(false);
        }
        self.login(&user, remember)?;
        Ok(true)
    }

    /// Sign `user` in under a fresh session id.
    pub fn login(&mut self, user: &User, remember: bool) -> Result<(), DispatchError> {
        self.req.session.regenerate();
        self.req.session.put("user_id", user.id);

        if remember {
            let token = new_remember_token();
            self.req
                .app
                .users
                .update_remember_token(user.id, Some(&token))?;
            let cookie = self.remember_cookie(&token, REMEMBER_LIFETIME_SECS);
            self.req.queue_cookie(cookie);
        }
        info!(user_id = user.id, remember = remember, "User signed in");
        Ok(())
    }

    /// Clear the remember token, destroy the session and expire the cookie.
    pub fn logout(&mut self) -> Result<(), DispatchError> {
        if let Some(id) = self.req.session.user_id() {
            self.req.app.users.update_remember_token(id, None)?;
            info!(user_id = id, "User signed out");
        }
        self.req.session.destroy();
        let cookie = self.remember_cookie("", 0);
        self.req.queue_cookie(cookie);
        Ok(())
    }

    fn remember_cookie(&self, token: &str, max_age: u64) -> String {
        let session = &self.req.app.config.session;
        let mut cookie = format!(
            "{REMEMBER_COOKIE}={token}; Path=/; Max-Age={max_age}; HttpOnly; SameSite={}",
            session.same_site
        );
        if session.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}
