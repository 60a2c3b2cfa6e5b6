use crate::dispatcher::HandlerResponse;
use std::fmt;
use std::path::PathBuf;

/// Which part of a handler reference failed to resolve.
#[derive(Debug)]
pub enum HandlerNotFound {
    /// No controller with this name is registered in the action table.
    Controller(String),
    /// The controller exists but has no action with this name.
    Method { controller: String, method: String },
    /// A file-include handler points at a missing file (or outside the application root).
    File(PathBuf),
}

impl fmt::Display for HandlerNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerNotFound::Controller(name) => write!(f, "Controller not found: {name}"),
            HandlerNotFound::Method { controller, method } => {
                write!(f, "Method {method} not found in {controller}")
            }
            HandlerNotFound::File(path) => {
                write!(f, "Handler file not found: {}", path.display())
            }
        }
    }
}

/// Errors raised while a matched request travels through the middleware pipeline and the
/// action invoker.
///
/// Route-level outcomes (404, 405) are not errors; the dispatcher renders them inline.
/// `AuthenticationRequired` becomes a redirect or a 401; every other variant becomes a 500.
#[derive(Debug)]
pub enum DispatchError {
    /// A route names middleware that is not in the registry.
    MiddlewareNotFound(String),
    HandlerNotFound(HandlerNotFound),
    /// An action parameter has no path variable and no declared default.
    MissingRequiredParameter { name: String },
    /// A bound value could not be converted to the action parameter's type.
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },
    /// Template lookup or rendering failed.
    View(minijinja::Error),
    /// The request needs a signed-in user.
    AuthenticationRequired,
    /// Anything else a controller propagates with `?`.
    Internal(anyhow::Error),
}

/// Result of running a pipeline link or an action.
pub type DispatchResult = Result<HandlerResponse, DispatchError>;

impl DispatchError {
    /// HTTP status this error maps to at the dispatch boundary.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            DispatchError::AuthenticationRequired => 401,
            _ => 500,
        }
    }

    /// Message plus every `source()` below it, outermost first.
    #[must_use]
    pub fn chain(&self) -> Vec<String> {
        let mut out = vec![self.to_string()];
        match self {
            DispatchError::Internal(err) => {
                out.extend(err.chain().skip(1).map(|e| e.to_string()));
            }
            _ => {
                let mut source = std::error::Error::source(self);
                while let Some(err) = source {
                    out.push(err.to_string());
                    source = err.source();
                }
            }
        }
        out
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::MiddlewareNotFound(name) => write!(f, "Middleware not found: {name}"),
            DispatchError::HandlerNotFound(inner) => write!(f, "{inner}"),
            DispatchError::MissingRequiredParameter { name } => {
                write!(f, "Required parameter {name} not found in route")
            }
            DispatchError::InvalidParameter {
                name,
                value,
                reason,
            } => write!(f, "Invalid value {value:?} for parameter {name}: {reason}"),
            DispatchError::View(err) => write!(f, "View error: {err}"),
            DispatchError::AuthenticationRequired => write!(f, "Authentication required"),
            DispatchError::Internal(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchError::View(err) => Some(err),
            DispatchError::Internal(err) => Some(&**err),
            _ => None,
        }
    }
}

impl From<HandlerNotFound> for DispatchError {
    fn from(err: HandlerNotFound) -> Self {
        DispatchError::HandlerNotFound(err)
    }
}

impl From<minijinja::Error> for DispatchError {
    fn from(err: minijinja::Error) -> Self {
        DispatchError::View(err)
    }
}

impl From<anyhow::Error> for DispatchError {
    fn from(err: anyhow::Error) -> Self {
        DispatchError::Internal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_messages_match_handler_kinds() {
        let err = DispatchError::from(HandlerNotFound::Method {
            controller: "UserController".into(),
            method: "missing".into(),
        });
        assert_eq!(err.to_string(), "Method missing not found in UserController");
        assert_eq!(err.status(), 500);

        let err = DispatchError::MiddlewareNotFound("nope".into());
        assert_eq!(err.to_string(), "Middleware not found: nope");
    }

    #[test]
    fn test_authentication_required_is_401() {
        assert_eq!(DispatchError::AuthenticationRequired.status(), 401);
    }

    #[test]
    fn test_chain_includes_anyhow_context() {
        let inner: anyhow::Result<()> = Err(anyhow::anyhow!("disk full"));
        let err = DispatchError::from(inner.context("saving profile").unwrap_err());
        assert_eq!(err.chain(), vec!["saving profile", "disk full"]);
    }
}
