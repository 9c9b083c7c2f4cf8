//! Channel-to-channel value movement.

use crate::port::{Port, PortBinding};
use crate::step::{Step, StepContext};

/// Copies one channel's value into another each time it runs. A no-op when
/// both names resolve to the same storage (aliased channels).
pub struct PassValueStep<T> {
    from: Port<T>,
    to: Port<T>,
}

impl<T: Clone + Send + 'static> PassValueStep<T> {
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: Port::new(from),
            to: Port::new(to),
        }
    }
}

impl<T: Clone + Send + 'static> Step for PassValueStep<T> {
    fn name(&self) -> &str {
        "pass_value"
    }

    fn ports(&mut self) -> Vec<&mut dyn PortBinding> {
        vec![&mut self.from, &mut self.to]
    }

    fn run(&mut self, _ctx: &mut StepContext<'_>) {
        if self.from.shares_storage(&self.to) {
            return;
        }
        let value = self.from.get();
        self.to.set(value);
    }
}

/// Swaps two channels' values each time it runs. A no-op when both names
/// resolve to the same storage.
pub struct SwapValueStep<T> {
    first: Port<T>,
    second: Port<T>,
}

impl<T: Send + 'static> SwapValueStep<T> {
    pub fn new(first: &str, second: &str) -> Self {
        Self {
            first: Port::new(first),
            second: Port::new(second),
        }
    }
}

impl<T: Send + 'static> Step for SwapValueStep<T> {
    fn name(&self) -> &str {
        "swap_value"
    }

    fn ports(&mut self) -> Vec<&mut dyn PortBinding> {
        vec![&mut self.first, &mut self.second]
    }

    fn run(&mut self, _ctx: &mut StepContext<'_>) {
        if self.first.shares_storage(&self.second) {
            return;
        }
        self.first
            .with(|a| self.second.with(|b| std::mem::swap(a, b)));
    }
}
