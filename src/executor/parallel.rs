//! Parallel executor: double-buffered batch dispatch.
//!
//! Submissions land in a mutex-guarded *waiting* list. The orchestrator
//! thread processes a *working* list: when it is non-empty, every workflow
//! in it is dispatched concurrently across the thread pool and the list is
//! cleared; when it is empty, the two lists are swapped under the waiting
//! mutex. Submitters therefore only ever contend on the swap, never on an
//! in-flight batch, and a batch's workflows run in parallel while any
//! single workflow's steps stay strictly sequential.

use super::worker::{ErrorSink, WorkerCore};
use crate::error::{FlowError, Result};
use crate::executor::dispatch;
use crate::workflow::WorkflowHandle;
use crossbeam_channel::Sender;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// The two buffers plus emptiness flags readable without a lock.
struct BatchQueues {
    waiting: Mutex<Vec<WorkflowHandle>>,
    working: Mutex<Vec<WorkflowHandle>>,
    waiting_empty: AtomicBool,
    working_empty: AtomicBool,
}

pub struct ParallelExecutor {
    core: WorkerCore,
    queues: Arc<BatchQueues>,
    errors: Arc<ErrorSink>,
}

impl ParallelExecutor {
    pub fn new() -> Self {
        Self {
            core: WorkerCore::new(),
            queues: Arc::new(BatchQueues {
                waiting: Mutex::new(Vec::new()),
                working: Mutex::new(Vec::new()),
                waiting_empty: AtomicBool::new(true),
                working_empty: AtomicBool::new(true),
            }),
            errors: Arc::new(ErrorSink::new()),
        }
    }

    pub(crate) fn submit(&self, workflow: WorkflowHandle) -> Result<()> {
        let mut waiting = self
            .queues
            .waiting
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        waiting.push(workflow);
        self.queues.waiting_empty.store(false, Ordering::SeqCst);
        Ok(())
    }

    pub(crate) fn start(&self) {
        let queues = Arc::clone(&self.queues);
        let errors = Arc::clone(&self.errors);
        self.core.start("parallel", move || {
            let mut working = queues
                .working
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if !working.is_empty() {
                working.par_iter().for_each(|workflow| {
                    if let Err(e) = dispatch(workflow) {
                        errors.report(e);
                    }
                });
                working.clear();
                queues.working_empty.store(true, Ordering::SeqCst);
            } else {
                {
                    let mut waiting = queues
                        .waiting
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner);
                    if !waiting.is_empty() {
                        std::mem::swap(&mut *working, &mut *waiting);
                        queues.working_empty.store(false, Ordering::SeqCst);
                        queues.waiting_empty.store(true, Ordering::SeqCst);
                    }
                }
                if working.is_empty() {
                    drop(working);
                    std::thread::yield_now();
                }
            }
        });
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queues.waiting_empty.load(Ordering::SeqCst)
            && self.queues.working_empty.load(Ordering::SeqCst)
    }

    pub(crate) fn core(&self) -> &WorkerCore {
        &self.core
    }

    pub(crate) fn set_error_sink(&self, sink: Sender<FlowError>) {
        self.errors.set(sink);
    }
}

impl Default for ParallelExecutor {
    fn default() -> Self {
        Self::new()
    }
}
