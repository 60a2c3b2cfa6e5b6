use crate::dispatcher::{HandlerRequest, HandlerResponse};
use crate::error::{DispatchError, DispatchResult};

/// What the `before` half of a middleware unit decided.
#[derive(Debug)]
pub enum Flow {
    /// Run the rest of the pipeline.
    Continue,
    /// Stop here and answer with this response.
    Respond(HandlerResponse),
}

/// The remainder of the pipeline, ending in the action invoker.
///
/// Consumed by [`run`](Self::run), so a unit calls it at most once.
pub struct Next<'a> {
    inner: Box<dyn FnOnce(&mut HandlerRequest) -> DispatchResult + 'a>,
}

impl<'a> Next<'a> {
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(&mut HandlerRequest) -> DispatchResult + 'a,
    {
        Self { inner: Box::new(f) }
    }

    pub fn run(self, req: &mut HandlerRequest) -> DispatchResult {
        (self.inner)(req)
    }
}

/// One link of the request pipeline.
///
/// A fresh unit is created from its factory for every request, so `&mut self` state never
/// leaks between requests. Implement either [`handle`](Self::handle) directly, or the split
/// [`before`](Self::before) / [`after`](Self::after) pair that the default `handle` drives.
pub trait Middleware: Send {
    fn handle(&mut self, req: &mut HandlerRequest, next: Next<'_>) -> DispatchResult {
        match self.before(req)? {
            Flow::Respond(res) => Ok(res),
            Flow::Continue => {
                let mut res = next.run(req)?;
                self.after(req, &mut res);
                Ok(res)
            }
        }
    }

    fn before(&mut self, _req: &mut HandlerRequest) -> Result<Flow, DispatchError> {
        Ok(Flow::Continue)
    }

    /// Runs only when the rest of the pipeline produced a response.
    fn after(&mut self, _req: &HandlerRequest, _res: &mut HandlerResponse) {}
}
