//! Realtime executor: immediate, threadless dispatch.
//!
//! `submit` drives the workflow's advance algorithm on the caller's thread
//! until it yields no further context. Hand-offs to other realtime
//! executors continue inline (iteratively, so long same-thread chains do
//! not grow the stack); a hand-off to any threaded executor ends the
//! inline drive.
//!
//! Because it borrows the caller's thread, this executor is only suitable
//! for trivial, non-blocking steps.

use crate::error::Result;
use crate::executor::Executor;
use crate::workflow::WorkflowHandle;

pub struct RealtimeExecutor;

impl RealtimeExecutor {
    pub(crate) fn submit(&self, workflow: WorkflowHandle) -> Result<()> {
        loop {
            match workflow.advance()? {
                None => return Ok(()),
                Some(next) => match next.as_ref() {
                    // Any realtime target runs on the calling thread anyway.
                    Executor::Realtime(_) => continue,
                    _ => return next.submit(workflow),
                },
            }
        }
    }
}
