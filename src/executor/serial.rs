//! Serial executor: one worker thread, one lock-free queue.
//!
//! The worker drains the queue completely on each wake — every dequeued
//! workflow gets exactly one dispatch and is handed off — then yields the
//! CPU when nothing is pending.

use super::worker::{ErrorSink, WorkerCore};
use crate::error::{FlowError, Result};
use crate::executor::dispatch;
use crate::workflow::WorkflowHandle;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::Arc;

pub struct SerialExecutor {
    core: WorkerCore,
    queue_tx: Sender<WorkflowHandle>,
    queue_rx: Receiver<WorkflowHandle>,
    errors: Arc<ErrorSink>,
}

impl SerialExecutor {
    pub fn new() -> Self {
        let (queue_tx, queue_rx) = unbounded();
        Self {
            core: WorkerCore::new(),
            queue_tx,
            queue_rx,
            errors: Arc::new(ErrorSink::new()),
        }
    }

    /// A serial executor pre-configured to pin its worker to the first
    /// available CPU in `cpus`.
    pub fn with_affinity(cpus: &[usize]) -> Self {
        let executor = Self::new();
        executor.core.set_cpu_affinity(cpus);
        executor
    }

    pub(crate) fn submit(&self, workflow: WorkflowHandle) -> Result<()> {
        // The executor owns the receiver, so the queue can never be
        // disconnected while `self` is alive.
        let _ = self.queue_tx.send(workflow);
        Ok(())
    }

    pub(crate) fn start(&self) {
        let queue = self.queue_rx.clone();
        let errors = Arc::clone(&self.errors);
        self.core.start("serial", move || {
            let mut drained = 0usize;
            while let Ok(workflow) = queue.try_recv() {
                drained += 1;
                if let Err(e) = dispatch(&workflow) {
                    errors.report(e);
                }
            }
            if drained == 0 {
                std::thread::yield_now();
            }
        });
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queue_rx.is_empty()
    }

    pub(crate) fn core(&self) -> &WorkerCore {
        &self.core
    }

    pub(crate) fn set_error_sink(&self, sink: Sender<FlowError>) {
        self.errors.set(sink);
    }
}

impl Default for SerialExecutor {
    fn default() -> Self {
        Self::new()
    }
}
