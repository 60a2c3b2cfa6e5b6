//! # Application Configuration
//!
//! `AppConfig` is loaded once at startup and is immutable afterwards. Sources, lowest precedence
//! first:
//!
//! 1. built-in defaults
//! 2. an optional YAML file (`config/app.yaml`)
//! 3. an optional `.env` file
//! 4. the process environment
//!
//! | Key | Field |
//! |-----|-------|
//! | `APP_NAME` | `name` |
//! | `APP_ENV` | `env` |
//! | `APP_DEBUG` | `debug` (only `true` enables it) |
//! | `APP_URL` | `url` |
//! | `APP_TIMEZONE` | `timezone` |
//! | `APP_ADDR` | `server.addr` |
//! | `APP_ROOT` | `paths.root` |
//! | `SESSION_COOKIE` | `session.cookie_name` |
//! | `SESSION_LIFETIME` | `session.lifetime_secs` |
//! | `SESSION_SECURE` | `session.secure` |
//! | `AUTH_PASSWORD_COST` | `auth.password_cost` (bcrypt cost, clamped to 4..=31) |
//! | `CORS_ALLOW_ORIGIN` | `cors.allow_origin` |
//! | `VITE_DEV_SERVER` | `frontend.dev_server` |

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Top-level application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub name: String,
    /// `dev` or `prod`; `dev` switches the SPA shell to the Vite dev server.
    pub env: String,
    /// Include error messages and cause chains in 500 responses.
    pub debug: bool,
    pub url: String,
    pub timezone: String,
    pub paths: PathsConfig,
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub auth: AuthConfig,
    pub cors: CorsConfig,
    pub frontend: FrontendConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "Tool Site".to_string(),
            env: "prod".to_string(),
            debug: false,
            url: "http://localhost".to_string(),
            timezone: "UTC".to_string(),
            paths: PathsConfig::default(),
            server: ServerConfig::default(),
            session: SessionConfig::default(),
            auth: AuthConfig::default(),
            cors: CorsConfig::default(),
            frontend: FrontendConfig::default(),
        }
    }
}

/// Directories, relative to `root` unless absolute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub root: PathBuf,
    pub views: PathBuf,
    pub routes: PathBuf,
    pub public: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            views: PathBuf::from("views"),
            routes: PathBuf::from("routes"),
            public: PathBuf::from("public"),
        }
    }
}

impl PathsConfig {
    /// Resolve `path` against `root`.
    #[must_use]
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    #[must_use]
    pub fn views_dir(&self) -> PathBuf {
        self.resolve(&self.views)
    }

    #[must_use]
    pub fn routes_dir(&self) -> PathBuf {
        self.resolve(&self.routes)
    }

    #[must_use]
    pub fn public_dir(&self) -> PathBuf {
        self.resolve(&self.public)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub cookie_name: String,
    /// Idle lifetime; records older than this are garbage collected.
    pub lifetime_secs: u64,
    /// Run store garbage collection once every this many finished sessions. `0` disables it.
    pub gc_every: u64,
    pub secure: bool,
    pub same_site: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "routeshim_session".to_string(),
            lifetime_secs: 3600,
            gc_every: 100,
            secure: false,
            same_site: "Lax".to_string(),
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn lifetime(&self) -> Duration {
        Duration::from_secs(self.lifetime_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// bcrypt work factor for stored passwords.
    pub password_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { password_cost: 10 }
    }
}

impl AuthConfig {
    /// `password_cost` within the range bcrypt accepts.
    #[must_use]
    pub fn cost(&self) -> u32 {
        self.password_cost.clamp(4, 31)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allow_origin: String,
    pub allow_methods: String,
    pub allow_headers: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origin: "*".to_string(),
            allow_methods: "GET, POST, PUT, DELETE, OPTIONS".to_string(),
            allow_headers: "Content-Type, Authorization".to_string(),
        }
    }
}

/// Where the SPA shell loads its scripts from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontendConfig {
    pub dev_server: String,
    pub build_path: String,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            dev_server: "http://localhost:3000".to_string(),
            build_path: "/build".to_string(),
        }
    }
}

impl AppConfig {
    /// Load defaults, then `config_file`, then `env_file`, then the process environment.
    ///
    /// Missing files are skipped; unreadable or malformed files are errors.
    pub fn load(config_file: Option<&Path>, env_file: Option<&Path>) -> Result<Self> {
        let mut config = match config_file {
            Some(path) if path.exists() => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("failed to read config file {}", path.display()))?;
                Self::from_yaml_str(&text)
                    .with_context(|| format!("failed to parse config file {}", path.display()))?
            }
            _ => Self::default(),
        };

        let dotenv = match env_file {
            Some(path) if path.exists() => load_dotenv(path)?,
            _ => HashMap::new(),
        };

        config.apply_env(|key| std::env::var(key).ok().or_else(|| dotenv.get(key).cloned()));
        debug!(
            name = %config.name,
            env = %config.env,
            debug = config.debug,
            "Configuration loaded"
        );
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Override fields from a key lookup (process env, `.env` map, or a test closure).
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("APP_NAME") {
            self.name = v;
        }
        if let Some(v) = lookup("APP_ENV") {
            self.env = v;
        }
        if let Some(v) = lookup("APP_DEBUG") {
            self.debug = v.trim() == "true";
        }
        if let Some(v) = lookup("APP_URL") {
            self.url = v;
        }
        if let Some(v) = lookup("APP_TIMEZONE") {
            self.timezone = v;
        }
        if let Some(v) = lookup("APP_ADDR") {
            self.server.addr = v;
        }
        if let Some(v) = lookup("APP_ROOT") {
            self.paths.root = PathBuf::from(v);
        }
        if let Some(v) = lookup("SESSION_COOKIE") {
            self.session.cookie_name = v;
        }
        if let Some(secs) = lookup("SESSION_LIFETIME").and_then(|v| v.trim().parse().ok()) {
            self.session.lifetime_secs = secs;
        }
        if let Some(v) = lookup("SESSION_SECURE") {
            self.session.secure = v.trim() == "true";
        }
        if let Some(cost) = lookup("AUTH_PASSWORD_COST").and_then(|v| v.trim().parse().ok()) {
            self.auth.password_cost = cost;
        }
        if let Some(v) = lookup("CORS_ALLOW_ORIGIN") {
            self.cors.allow_origin = v;
        }
        if let Some(v) = lookup("VITE_DEV_SERVER") {
            self.frontend.dev_server = v;
        }
    }

    #[must_use]
    pub fn is_dev(&self) -> bool {
        self.env == "dev"
    }
}

/// Parse `.env` text: `KEY=value` lines, `#` comments, blank lines, optional `export ` prefix,
/// and values wrapped in matching single or double quotes.
#[must_use]
pub fn parse_dotenv(text: &str) -> Vec<(String, String)> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), unquote(value.trim()).to_string()))
        })
        .collect()
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Read and parse a `.env` file. Later duplicates win.
pub fn load_dotenv(path: &Path) -> Result<HashMap<String, String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read env file {}", path.display()))?;
    Ok(parse_dotenv(&text).into_iter().collect())
}
