//! Conditional step decorator.

use crate::port::PortBinding;
use crate::step::{Step, StepContext};

/// Wraps a step and runs it only while a predicate holds. Wiring and
/// lifecycle hooks always reach the inner step; only `run` is gated.
pub struct GateStep<S> {
    inner: S,
    condition: Box<dyn Fn() -> bool + Send + Sync>,
}

impl<S: Step> GateStep<S> {
    pub fn new(inner: S, condition: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        Self {
            inner,
            condition: Box::new(condition),
        }
    }
}

impl<S: Step> Step for GateStep<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn ports(&mut self) -> Vec<&mut dyn PortBinding> {
        self.inner.ports()
    }

    fn on_initialize(&mut self) {
        self.inner.on_initialize();
    }

    fn run(&mut self, ctx: &mut StepContext<'_>) {
        if (self.condition)() {
            self.inner.run(ctx);
        }
    }

    fn on_finalize(&mut self) {
        self.inner.on_finalize();
    }
}
