//! Executors: pluggable schedulers that accept and dispatch workflows.
//!
//! Five variants behind one closed enum:
//!
//! - [`SerialExecutor`] — one worker thread, lock-free queue, dispatches
//!   workflows one at a time in submission order.
//! - [`ParallelExecutor`] — one orchestrator thread over a double-buffered
//!   queue; each batch fans out across a thread pool.
//! - [`RealtimeExecutor`] — no thread; `submit` drives the workflow on the
//!   caller's thread. Only for trivial, non-blocking steps.
//! - [`DeleterExecutor`] — finalizes and drops submitted workflows.
//! - [`WaitingExecutor`] — race-free suspend/resume coordinator.
//!
//! Each dispatch runs exactly one pending step of a workflow and then
//! resubmits it to whatever executor the next step designates. The
//! hand-off may land on the same executor (queue re-entry) or a different
//! one (cross-thread hop); no worker ever blocks waiting for another
//! workflow's progress.

mod deleter;
mod parallel;
mod realtime;
mod serial;
mod waiting;
mod worker;

pub use deleter::DeleterExecutor;
pub use parallel::ParallelExecutor;
pub use realtime::RealtimeExecutor;
pub use serial::SerialExecutor;
pub use waiting::WaitingExecutor;

use crate::error::{FlowError, Result};
use crate::workflow::WorkflowHandle;
use crossbeam_channel::Sender;
use std::sync::{Arc, PoisonError, RwLock};

/// Shared handle to an executor.
pub type ExecutorHandle = Arc<Executor>;

/// The closed set of executor variants.
pub enum Executor {
    Serial(SerialExecutor),
    Parallel(ParallelExecutor),
    Realtime(RealtimeExecutor),
    Deleter(DeleterExecutor),
    Waiting(WaitingExecutor),
}

impl Executor {
    // ── Constructors ──

    pub fn serial() -> ExecutorHandle {
        Arc::new(Executor::Serial(SerialExecutor::new()))
    }

    /// A serial executor whose worker thread is pinned to the first
    /// available CPU in `cpus`.
    pub fn serial_pinned(cpus: &[usize]) -> ExecutorHandle {
        Arc::new(Executor::Serial(SerialExecutor::with_affinity(cpus)))
    }

    pub fn parallel() -> ExecutorHandle {
        Arc::new(Executor::Parallel(ParallelExecutor::new()))
    }

    pub fn realtime() -> ExecutorHandle {
        Arc::new(Executor::Realtime(RealtimeExecutor))
    }

    pub fn deleter() -> ExecutorHandle {
        Arc::new(Executor::Deleter(DeleterExecutor))
    }

    pub fn waiting() -> ExecutorHandle {
        Arc::new(Executor::Waiting(WaitingExecutor::new()))
    }

    // ── Workflow interaction ──

    /// Accept a workflow for execution. Threaded variants enqueue it; the
    /// realtime variant drives it on the calling thread; the deleter
    /// finalizes it; the waiting zone parks or resumes it.
    pub fn submit(&self, workflow: WorkflowHandle) -> Result<()> {
        match self {
            Executor::Serial(e) => e.submit(workflow),
            Executor::Parallel(e) => e.submit(workflow),
            Executor::Realtime(e) => e.submit(workflow),
            Executor::Deleter(e) => e.submit(workflow),
            Executor::Waiting(e) => e.submit(workflow),
        }
    }

    /// Whether no submitted workflow is pending. Threadless variants are
    /// always empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Executor::Serial(e) => e.is_empty(),
            Executor::Parallel(e) => e.is_empty(),
            Executor::Waiting(e) => e.is_empty(),
            Executor::Realtime(_) | Executor::Deleter(_) => true,
        }
    }

    // ── Thread control ──

    /// Start the worker thread. No-op if already running, and on
    /// threadless variants. Restarting a joined executor is allowed.
    pub fn start(&self) {
        match self {
            Executor::Serial(e) => e.start(),
            Executor::Parallel(e) => e.start(),
            _ => {}
        }
    }

    /// Ask the worker to stop after its current dispatch. Returns
    /// immediately; pair with [`join`](Self::join).
    pub fn request_stop(&self) {
        match self {
            Executor::Serial(e) => e.core().request_stop(),
            Executor::Parallel(e) => e.core().request_stop(),
            _ => {}
        }
    }

    /// Block until the worker thread has exited.
    pub fn join(&self) {
        match self {
            Executor::Serial(e) => e.core().join(),
            Executor::Parallel(e) => e.core().join(),
            _ => {}
        }
    }

    /// Whether the worker thread is running. Threadless variants are
    /// always ready and report `true`.
    pub fn is_working(&self) -> bool {
        match self {
            Executor::Serial(e) => e.core().is_working(),
            Executor::Parallel(e) => e.core().is_working(),
            _ => true,
        }
    }

    // ── Thread properties ──

    /// Pin the worker thread to the first available CPU in `cpus`.
    /// Effective before or after start (applied by the worker itself).
    pub fn set_cpu_affinity(&self, cpus: &[usize]) {
        match self {
            Executor::Serial(e) => e.core().set_cpu_affinity(cpus),
            Executor::Parallel(e) => e.core().set_cpu_affinity(cpus),
            _ => {}
        }
    }

    /// Extra stop predicate checked by the worker between dispatches; the
    /// loop ends when the liveness flag clears or the predicate holds.
    pub fn set_stop_condition(&self, predicate: impl Fn() -> bool + Send + Sync + 'static) {
        match self {
            Executor::Serial(e) => e.core().set_stop_condition(predicate),
            Executor::Parallel(e) => e.core().set_stop_condition(predicate),
            _ => {}
        }
    }

    /// Disable the stop predicate; the worker lifetime follows only the
    /// liveness flag again.
    pub fn remove_stop_condition(&self) {
        match self {
            Executor::Serial(e) => e.core().remove_stop_condition(),
            Executor::Parallel(e) => e.core().remove_stop_condition(),
            _ => {}
        }
    }

    /// Channel receiving dispatch errors from the worker loop (they are
    /// also logged). Without a sink, errors are log-only.
    pub fn set_error_sink(&self, sink: Sender<FlowError>) {
        match self {
            Executor::Serial(e) => e.set_error_sink(sink),
            Executor::Parallel(e) => e.set_error_sink(sink),
            _ => {}
        }
    }

    /// Downcast to the waiting zone, for `awake` access.
    pub fn as_waiting(&self) -> Option<&WaitingExecutor> {
        match self {
            Executor::Waiting(e) => Some(e),
            _ => None,
        }
    }
}

/// Execute one dispatch of `workflow` and hand it off to whatever executor
/// its next step designates. Yielding no executor suspends the workflow.
pub(crate) fn dispatch(workflow: &WorkflowHandle) -> Result<()> {
    match workflow.advance()? {
        Some(next) => next.submit(workflow.clone()),
        None => Ok(()),
    }
}

/// A swappable executor binding shared by the steps assigned to it.
///
/// Steps reference their executor through a slot, so the embedding
/// application can rebind a whole group of steps to a different executor
/// after construction without revisiting each one. Rebinding takes effect
/// at the next dispatch.
#[derive(Clone, Default)]
pub struct ExecutorSlot(Arc<RwLock<Option<ExecutorHandle>>>);

impl ExecutorSlot {
    /// A slot already bound to `executor`.
    pub fn new(executor: ExecutorHandle) -> Self {
        Self(Arc::new(RwLock::new(Some(executor))))
    }

    /// An unbound slot; binding it before the first dispatch is required.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Bind or rebind the slot.
    pub fn bind(&self, executor: ExecutorHandle) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = Some(executor);
    }

    /// The currently bound executor, if any.
    pub fn get(&self) -> Option<ExecutorHandle> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
