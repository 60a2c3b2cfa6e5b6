use super::{ActionResult, ControllerTable};
use crate::dispatcher::{HandlerRequest, HandlerResponse};
use crate::error::HandlerNotFound;
use crate::router::HandlerRef;
use serde_json::{Map, Value};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Runs the terminal handler of a matched route.
#[derive(Debug, Clone)]
pub struct ActionInvoker {
    controllers: Arc<ControllerTable>,
    root: PathBuf,
}

impl ActionInvoker {
    /// `root` anchors file-include handlers.
    pub fn new(controllers: Arc<ControllerTable>, root: impl Into<PathBuf>) -> Self {
        Self {
            controllers,
            root: root.into(),
        }
    }

    #[must_use]
    pub fn controllers(&self) -> &Arc<ControllerTable> {
        &self.controllers
    }

    /// Fail with `HandlerNotFound` the same way [`invoke`](Self::invoke) would, without
    /// running anything.
    pub fn check(&self, handler: &HandlerRef) -> Result<(), HandlerNotFound> {
        match handler {
            HandlerRef::FileInclude(path) => self.resolve_file(path).map(|_| ()),
            HandlerRef::ControllerMethod { controller, method } => {
                self.controllers.action(controller, method).map(|_| ())
            }
        }
    }

    pub fn invoke(&self, handler: &HandlerRef, req: &mut HandlerRequest) -> ActionResult {
        match handler {
            HandlerRef::FileInclude(path) => {
                let file = self.resolve_file(path)?;
                debug!(file = %file.display(), "Rendering file handler");
                let bindings: Map<String, Value> = req
                    .path_params
                    .iter()
                    .map(|(k, v)| (k.to_string(), Value::String(v.clone())))
                    .collect();
                let html = req.app.views.render_file(&file, Value::Object(bindings))?;
                Ok(HandlerResponse::html(200, html))
            }
            HandlerRef::ControllerMethod { controller, method } => {
                let action = self.controllers.action(controller, method)?;
                debug!(controller = %controller, action = %method, "Invoking action");
                action.invoke(req)
            }
        }
    }

    /// `root`-relative path of an existing file. Absolute paths and `..` are rejected.
    fn resolve_file(&self, path: &Path) -> Result<PathBuf, HandlerNotFound> {
        let mut resolved = self.root.clone();
        for component in path.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => return Err(HandlerNotFound::File(path.to_path_buf())),
            }
        }
        if resolved.is_file() {
            Ok(resolved)
        } else {
            Err(HandlerNotFound::File(path.to_path_buf()))
        }
    }
}
