//! Workflow suspension and wake-up steps.

use crate::runtime::Runtime;
use crate::step::{Step, StepContext};
use crate::workflow::WorkflowHandle;

/// Parks the owning workflow in the global runtime's waiting zone. The
/// workflow stays suspended until something awakens it by identity
/// ([`AwakeStep`] or [`Runtime::awake`]), then resumes at the next step.
pub struct WaitStep;

impl Step for WaitStep {
    fn name(&self) -> &str {
        "wait"
    }

    fn run(&mut self, ctx: &mut StepContext<'_>) {
        ctx.wait();
    }
}

/// Awakens a target workflow from the global runtime's waiting zone. If
/// the target has not suspended yet, the wake-up is recorded and its next
/// suspension returns immediately.
pub struct AwakeStep {
    target: WorkflowHandle,
}

impl AwakeStep {
    pub fn new(target: WorkflowHandle) -> Self {
        Self { target }
    }
}

impl Step for AwakeStep {
    fn name(&self) -> &str {
        "awake"
    }

    fn run(&mut self, _ctx: &mut StepContext<'_>) {
        if let Err(error) = Runtime::global().awake(&self.target) {
            tracing::warn!(workflow = %self.target.name(), %error, "wake-up failed");
        }
    }
}
