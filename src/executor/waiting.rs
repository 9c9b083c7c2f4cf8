//! Waiting zone: cooperative suspend/resume without condition variables.
//!
//! A suspended workflow is simply *not resubmitted* by its last dispatch;
//! it lives here until awoken by identity. Two identity-keyed maps are
//! held under one mutex:
//!
//! - *waiting* — suspended workflows whose wake-up has not arrived;
//! - *awoken* — wake-ups that arrived before the workflow did.
//!
//! Whichever of `submit`/`awake` observes the other side's record performs
//! the resumption, so the suspend/wake race resolves to exactly one
//! resumption in either arrival order, and a workflow identity is never in
//! both maps at once. Resumption itself happens with the mutex released.

use crate::error::Result;
use crate::executor::dispatch;
use crate::workflow::WorkflowHandle;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Workflow identity: the allocation behind its handle.
fn identity(workflow: &WorkflowHandle) -> usize {
    Arc::as_ptr(workflow) as usize
}

#[derive(Default)]
struct WaitSets {
    waiting: HashMap<usize, WorkflowHandle>,
    awoken: HashMap<usize, WorkflowHandle>,
}

pub struct WaitingExecutor {
    sets: Mutex<WaitSets>,
}

impl WaitingExecutor {
    pub fn new() -> Self {
        Self {
            sets: Mutex::new(WaitSets::default()),
        }
    }

    /// Park `workflow` — unless its wake-up already arrived, in which case
    /// it resumes immediately on the calling thread.
    pub(crate) fn submit(&self, workflow: WorkflowHandle) -> Result<()> {
        let resume = {
            let mut sets = self.lock();
            let key = identity(&workflow);
            if sets.awoken.remove(&key).is_some() {
                true
            } else {
                tracing::trace!(workflow = %workflow.name(), "workflow parked");
                sets.waiting.insert(key, workflow.clone());
                false
            }
        };
        if resume {
            tracing::trace!(workflow = %workflow.name(), "wake-up arrived first; resuming");
            dispatch(&workflow)?;
        }
        Ok(())
    }

    /// Wake `workflow`: if parked, resubmit it to the executor its next
    /// step designates; otherwise record the wake-up so the upcoming
    /// `submit` resumes instead of parking.
    pub fn awake(&self, workflow: &WorkflowHandle) -> Result<()> {
        let parked = {
            let mut sets = self.lock();
            let key = identity(workflow);
            match sets.waiting.remove(&key) {
                Some(parked) => Some(parked),
                None => {
                    sets.awoken.insert(key, workflow.clone());
                    None
                }
            }
        };
        match parked {
            Some(parked) => {
                tracing::trace!(workflow = %parked.name(), "resuming parked workflow");
                let target = parked.current_executor()?;
                target.submit(parked)
            }
            None => Ok(()),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        let sets = self.lock();
        sets.waiting.is_empty() && sets.awoken.is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, WaitSets> {
        self.sets.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for WaitingExecutor {
    fn default() -> Self {
        Self::new()
    }
}
