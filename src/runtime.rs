//! Runtime registry: the fixed service executors plus coordinated shutdown.
//!
//! A [`Runtime`] owns the three threadless service executors every
//! pipeline may rely on — realtime, deleter, waiting zone — and a set of
//! registered executors that [`stop_all`](Runtime::stop_all) can stop
//! together. Construct one explicitly and pass it around, or use the
//! lazily-initialized process-wide instance from [`Runtime::global`]
//! (created once on first access, never torn down before process exit).

use crate::error::Result;
use crate::executor::{Executor, ExecutorHandle, WaitingExecutor};
use crate::workflow::WorkflowHandle;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

pub struct Runtime {
    realtime: ExecutorHandle,
    deleter: ExecutorHandle,
    waiting_zone: ExecutorHandle,
    managed: RwLock<HashMap<usize, ExecutorHandle>>,
}

static GLOBAL: OnceLock<Runtime> = OnceLock::new();

impl Runtime {
    pub fn new() -> Self {
        Self {
            realtime: Executor::realtime(),
            deleter: Executor::deleter(),
            waiting_zone: Executor::waiting(),
            managed: RwLock::new(HashMap::new()),
        }
    }

    /// The process-wide runtime, created on first access.
    pub fn global() -> &'static Runtime {
        GLOBAL.get_or_init(Runtime::new)
    }

    /// The immediate executor: drives workflows on the submitting thread.
    pub fn realtime(&self) -> &ExecutorHandle {
        &self.realtime
    }

    /// The sink executor for one-shot workflows.
    pub fn deleter(&self) -> &ExecutorHandle {
        &self.deleter
    }

    /// The suspend/resume coordinator.
    pub fn waiting_zone(&self) -> &ExecutorHandle {
        &self.waiting_zone
    }

    /// Wake a workflow parked in (or headed for) this runtime's waiting
    /// zone.
    pub fn awake(&self, workflow: &WorkflowHandle) -> Result<()> {
        self.zone().awake(workflow)
    }

    /// Register executors for coordinated shutdown via
    /// [`stop_all`](Runtime::stop_all).
    pub fn register(&self, executors: &[ExecutorHandle]) {
        let mut managed = self.managed.write().unwrap_or_else(PoisonError::into_inner);
        for executor in executors {
            managed.insert(Arc::as_ptr(executor) as usize, executor.clone());
        }
    }

    /// Remove executors from the coordinated-shutdown set.
    pub fn unregister(&self, executors: &[ExecutorHandle]) {
        let mut managed = self.managed.write().unwrap_or_else(PoisonError::into_inner);
        for executor in executors {
            managed.remove(&(Arc::as_ptr(executor) as usize));
        }
    }

    /// Request stop on every registered executor. Does not join them;
    /// callers join separately.
    pub fn stop_all(&self) {
        let managed = self.managed.read().unwrap_or_else(PoisonError::into_inner);
        tracing::info!(executors = managed.len(), "stopping registered executors");
        for executor in managed.values() {
            executor.request_stop();
        }
    }

    fn zone(&self) -> &WaitingExecutor {
        match self.waiting_zone.as_waiting() {
            Some(zone) => zone,
            // The field is only ever constructed as the waiting variant.
            None => unreachable!("runtime waiting zone is always the waiting variant"),
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
