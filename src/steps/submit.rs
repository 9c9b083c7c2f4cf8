//! Nested workflow submission.

use crate::runtime::Runtime;
use crate::step::{Step, StepContext};
use crate::workflow::WorkflowHandle;

/// Submits a child workflow to this step's own executor.
///
/// In the default synchronous mode the parent parks in the waiting zone
/// and the child's loop-end awakens it, so the parent resumes only after
/// the child's run ends — without blocking any executor thread in
/// between. In detached mode the parent continues immediately.
pub struct SubmitWorkflowStep {
    child: WorkflowHandle,
    synchronous: bool,
    awake_wired: bool,
}

impl SubmitWorkflowStep {
    /// Synchronous mode: the parent waits for the child's run to end.
    pub fn new(child: WorkflowHandle) -> Self {
        Self {
            child,
            synchronous: true,
            awake_wired: false,
        }
    }

    /// Detached mode: fire and forget.
    pub fn detached(child: WorkflowHandle) -> Self {
        Self {
            child,
            synchronous: false,
            awake_wired: false,
        }
    }
}

impl Step for SubmitWorkflowStep {
    fn name(&self) -> &str {
        "submit_workflow"
    }

    fn run(&mut self, ctx: &mut StepContext<'_>) {
        if self.synchronous && !self.awake_wired {
            // The parent handle is only known at dispatch time.
            let parent = ctx.workflow();
            self.child.set_on_loop_end(move || {
                if let Err(error) = Runtime::global().awake(&parent) {
                    tracing::warn!(%error, "failed to awaken parent workflow");
                }
            });
            self.awake_wired = true;
        }

        if let Err(error) = ctx.executor().submit(self.child.clone()) {
            tracing::error!(child = %self.child.name(), %error, "child submission failed");
            return;
        }
        if self.synchronous {
            ctx.wait();
        }
    }
}
