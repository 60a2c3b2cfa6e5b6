//! # Controller Module
//!
//! Controllers are plain structs whose `#[controller]` impl block generates an action table at
//! compile time. The table records, for each action, its parameter names and defaults so the
//! [`ActionInvoker`] can bind path variables by *name* and pass them positionally.
//!
//! ```rust,ignore
//! #[derive(Default)]
//! pub struct HomeController;
//!
//! #[controller]
//! impl HomeController {
//!     pub fn page(&mut self, req: &mut HandlerRequest, #[param(default = "home")] page: String) -> ActionResult {
//!         req.view(&format!("pages/{page}"), json!({}))
//!     }
//! }
//!
//! let mut table = ControllerTable::new();
//! table.register::<HomeController>();
//! ```

mod invoker;

pub use invoker::ActionInvoker;
pub use routeshim_macros::controller;

use crate::dispatcher::{HandlerRequest, HandlerResponse};
use crate::error::{DispatchError, DispatchResult, HandlerNotFound};
use crate::router::ParamVec;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// What every action returns.
pub type ActionResult = DispatchResult;

/// Generated wrapper: converts bound arguments and calls the action on a fresh controller.
pub type ActionFn = fn(&mut HandlerRequest, &BoundArgs) -> ActionResult;

/// One declared action parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub default: Option<&'static str>,
}

/// Argument values in declaration order, still as strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundArgs {
    values: Vec<(&'static str, String)>,
}

impl BoundArgs {
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Convert argument `idx` with `FromStr`.
    pub fn parse<T>(&self, idx: usize) -> Result<T, DispatchError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let (name, value) = self.values.get(idx).ok_or_else(|| {
            DispatchError::MissingRequiredParameter {
                name: format!("#{idx}"),
            }
        })?;
        value.parse::<T>().map_err(|e| DispatchError::InvalidParameter {
            name: (*name).to_string(),
            value: value.clone(),
            reason: e.to_string(),
        })
    }
}

/// One entry of a controller's action table.
#[derive(Clone)]
pub struct Action {
    name: &'static str,
    params: Vec<ParamSpec>,
    func: ActionFn,
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl Action {
    #[must_use]
    pub fn new(name: &'static str, params: Vec<ParamSpec>, func: ActionFn) -> Self {
        Self { name, params, func }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Each parameter takes the path variable of the same name (last occurrence), else its
    /// default, else the binding fails with `MissingRequiredParameter`.
    pub fn bind(&self, path_params: &ParamVec) -> Result<BoundArgs, DispatchError> {
        let mut values = Vec::with_capacity(self.params.len());
        for spec in &self.params {
            let value = path_params
                .iter()
                .rfind(|(k, _)| k.as_ref() == spec.name)
                .map(|(_, v)| v.clone())
                .or_else(|| spec.default.map(str::to_string))
                .ok_or_else(|| DispatchError::MissingRequiredParameter {
                    name: spec.name.to_string(),
                })?;
            values.push((spec.name, value));
        }
        Ok(BoundArgs { values })
    }

    pub fn invoke(&self, req: &mut HandlerRequest) -> ActionResult {
        let args = self.bind(&req.path_params)?;
        (self.func)(req, &args)
    }
}

/// Implemented by `#[controller]`.
pub trait Controller: Default + 'static {
    /// Name used in `Controller@method` handler strings.
    const NAME: &'static str;

    fn actions() -> Vec<Action>;
}

/// Return types an action may have.
pub trait IntoActionResult {
    fn into_action_result(self) -> ActionResult;
}

impl IntoActionResult for HandlerResponse {
    fn into_action_result(self) -> ActionResult {
        Ok(self)
    }
}

impl<E> IntoActionResult for Result<HandlerResponse, E>
where
    E: Into<DispatchError>,
{
    fn into_action_result(self) -> ActionResult {
        self.map_err(Into::into)
    }
}

/// Controller name → action name → [`Action`]. Built at startup, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct ControllerTable {
    controllers: HashMap<&'static str, HashMap<&'static str, Action>>,
}

impl ControllerTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<C: Controller>(&mut self) -> &mut Self {
        let actions: HashMap<&'static str, Action> =
            C::actions().into_iter().map(|a| (a.name, a)).collect();
        debug!(controller = C::NAME, actions = actions.len(), "Controller registered");
        if self.controllers.insert(C::NAME, actions).is_some() {
            warn!(controller = C::NAME, "Controller registered twice; keeping the latest");
        }
        self
    }

    #[must_use]
    pub fn contains(&self, controller: &str) -> bool {
        self.controllers.contains_key(controller)
    }

    /// Registered controller names, sorted.
    #[must_use]
    pub fn controller_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.controllers.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn action(&self, controller: &str, method: &str) -> Result<&Action, HandlerNotFound> {
        let actions = self
            .controllers
            .get(controller)
            .ok_or_else(|| HandlerNotFound::Controller(controller.to_string()))?;
        actions.get(method).ok_or_else(|| HandlerNotFound::Method {
            controller: controller.to_string(),
            method: method.to_string(),
        })
    }
}
