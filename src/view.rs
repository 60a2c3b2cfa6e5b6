//! Server-rendered views.
//!
//! Templates live under the configured views directory and are addressed without their
//! extension: `user/profile` loads `views/user/profile.html`. Every template sees two
//! globals, `app` (name, url, env, debug) and `frontend` (dev server and build path).
//!
//! `.html` templates are auto-escaped. URL globals come from trusted configuration and are
//! marked safe so they land in `src`/`href` attributes verbatim.

use crate::config::AppConfig;
use crate::error::{DispatchError, HandlerNotFound};
use minijinja::{context, path_loader, Environment, ErrorKind, Value};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug)]
pub struct Views {
    env: Environment<'static>,
    dir: PathBuf,
}

impl Views {
    /// Templates under `dir`, no globals.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let mut env = Environment::new();
        env.set_loader(path_loader(&dir));
        Self { env, dir }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let mut views = Self::new(config.paths.views_dir());
        views.env.add_global(
            "app",
            context! {
                name => config.name.clone(),
                url => Value::from_safe_string(config.url.clone()),
                env => config.env.clone(),
                debug => config.debug,
            },
        );
        views.env.add_global(
            "frontend",
            context! {
                dev => config.is_dev(),
                dev_server => Value::from_safe_string(config.frontend.dev_server.clone()),
                build_path => Value::from_safe_string(config.frontend.build_path.clone()),
            },
        );
        views
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn template_name(name: &str) -> String {
        let name = name.trim_start_matches('/');
        if Path::new(name).extension().is_some() {
            name.to_string()
        } else {
            format!("{name}.html")
        }
    }

    /// Whether `name` resolves to a loadable template.
    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.env.get_template(&Self::template_name(name)).is_ok()
    }

    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String, DispatchError> {
        let template_name = Self::template_name(name);
        let template = self.env.get_template(&template_name).map_err(|e| {
            if e.kind() == ErrorKind::TemplateNotFound {
                debug!(template = %template_name, "View not found");
            }
            DispatchError::View(e)
        })?;
        Ok(template.render(ctx)?)
    }

    /// Render a file outside the views directory (file-include routes). Globals still apply.
    pub fn render_file<S: Serialize>(&self, path: &Path, ctx: S) -> Result<String, DispatchError> {
        let source = fs::read_to_string(path)
            .map_err(|_| HandlerNotFound::File(path.to_path_buf()))?;
        Ok(self.env.render_str(&source, ctx)?)
    }
}
