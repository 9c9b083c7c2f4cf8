//! Closure-backed step.

use crate::step::{Step, StepContext};

/// A step running an arbitrary closure. The workhorse for glue logic and
/// tests; anything with ports deserves a named `Step` type instead.
pub struct FnStep {
    name: String,
    op: Box<dyn FnMut(&mut StepContext<'_>) + Send>,
}

impl FnStep {
    pub fn new(
        name: impl Into<String>,
        op: impl FnMut(&mut StepContext<'_>) + Send + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            op: Box::new(op),
        }
    }
}

impl Step for FnStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&mut self, ctx: &mut StepContext<'_>) {
        (self.op)(ctx)
    }
}
