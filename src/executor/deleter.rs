//! Deleter executor: a sink for one-shot workflows.
//!
//! Submitting a workflow finalizes it (on-finalize callback, then step
//! hooks in reverse order) and drops the handle. Useful as the last
//! hand-off target of an ephemeral workflow so its teardown runs eagerly
//! instead of whenever the final reference happens to drop.

use crate::error::Result;
use crate::workflow::WorkflowHandle;

pub struct DeleterExecutor;

impl DeleterExecutor {
    pub(crate) fn submit(&self, workflow: WorkflowHandle) -> Result<()> {
        tracing::debug!(workflow = %workflow.name(), "finalizing workflow");
        workflow.finalize();
        Ok(())
    }
}
