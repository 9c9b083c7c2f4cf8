//! Step abstraction: the unit of work inside a workflow.
//!
//! A step owns its ports as plain fields, exposes them through
//! [`Step::ports`] for the wiring pass, and does its work in [`Step::run`].
//! `run` executes on whichever executor the step's slot designates and
//! must complete without blocking that executor — a step that has to wait
//! parks the whole workflow in the waiting zone instead
//! ([`StepContext::wait`]).

use crate::executor::ExecutorHandle;
use crate::port::PortBinding;
use crate::runtime::Runtime;
use crate::workflow::WorkflowHandle;

/// Per-dispatch context handed to [`Step::run`].
///
/// Carries the requests a step may make against its owning workflow.
/// Requests are one-shot: they are consumed by the dispatch that collects
/// them and take effect at the boundary of the step that made them.
pub struct StepContext<'a> {
    workflow: &'a WorkflowHandle,
    executor: &'a ExecutorHandle,
    pub(crate) pause: bool,
    pub(crate) stop: bool,
    pub(crate) defer: Option<ExecutorHandle>,
}

impl<'a> StepContext<'a> {
    pub(crate) fn new(workflow: &'a WorkflowHandle, executor: &'a ExecutorHandle) -> Self {
        Self {
            workflow,
            executor,
            pause: false,
            stop: false,
            defer: None,
        }
    }

    /// Ask the workflow to pause after this step: the dispatch yields no
    /// further context and the workflow must be resubmitted externally.
    pub fn request_pause(&mut self) {
        self.pause = true;
    }

    /// Ask the workflow to stop after this step: the loop-end callback
    /// fires and the run ends.
    pub fn request_stop(&mut self) {
        self.stop = true;
    }

    /// Suspend the workflow in the global runtime's waiting zone after
    /// this step. It stays parked until awoken by identity, then resumes
    /// at the next step.
    pub fn wait(&mut self) {
        self.pause = true;
        self.defer = Some(Runtime::global().waiting_zone().clone());
    }

    /// Submit the workflow to `executor` once this dispatch completes,
    /// instead of the normal hand-off. Implies a pause at this step.
    pub fn defer_submit(&mut self, executor: ExecutorHandle) {
        self.pause = true;
        self.defer = Some(executor);
    }

    /// Handle of the workflow being dispatched.
    pub fn workflow(&self) -> WorkflowHandle {
        self.workflow.clone()
    }

    /// Executor this step is running on (the slot's current value).
    pub fn executor(&self) -> ExecutorHandle {
        self.executor.clone()
    }
}

/// A workflow step.
///
/// Implementors hold their ports as fields and return them from
/// [`ports`](Step::ports); the workflow binds them by name during wiring.
pub trait Step: Send {
    /// Name used in logs and wiring diagnostics.
    fn name(&self) -> &str;

    /// The step's ports, for the wiring pass. Steps without channel access
    /// keep the default.
    fn ports(&mut self) -> Vec<&mut dyn PortBinding> {
        Vec::new()
    }

    /// Called once, when the owning workflow wires. Acquire resources tied
    /// to the step's lifetime here (devices, files), not in `run`.
    fn on_initialize(&mut self) {}

    /// Called on every dispatch of this step, on its slot's executor.
    ///
    /// The owning workflow's scheduling state is held for the duration of
    /// the call: a step may read channels, make context requests, and
    /// drive *other* workflows, but must not finalize or resubmit its own.
    fn run(&mut self, ctx: &mut StepContext<'_>);

    /// Called once at workflow teardown, in reverse step order.
    fn on_finalize(&mut self) {}
}
