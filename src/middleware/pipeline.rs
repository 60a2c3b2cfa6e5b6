use super::core::Next;
use super::registry::MiddlewareRegistry;
use tracing::debug;

/// Compose `names` around `terminal`.
///
/// The list is folded from last to first, so the first name runs first and its `next` is the
/// second name, down to `terminal`. Each unit is resolved from `registry` only when its link
/// executes; an unknown name fails with `MiddlewareNotFound` at that point, after the units
/// before it have already run.
pub fn build_pipeline<'a>(
    registry: &'a MiddlewareRegistry,
    names: &'a [String],
    terminal: Next<'a>,
) -> Next<'a> {
    names.iter().rev().fold(terminal, |next, name| {
        Next::new(move |req| {
            let mut unit = registry.resolve(name)?;
            debug!(middleware = %name, "Middleware enter");
            unit.handle(req, next)
        })
    })
}
