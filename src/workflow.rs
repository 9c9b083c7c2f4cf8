//! Workflows: ordered steps over a shared channel table.
//!
//! A workflow owns its channels (name→cell table), an ordered list of
//! (step, executor-slot) pairs, and a cursor. Executors drive it one step
//! per dispatch through [`Workflow::advance`]: the step at the cursor runs
//! on the calling executor's thread, the cursor moves, and the dispatch
//! returns the executor of the *next* step so the caller can hand the
//! workflow off — possibly across threads. Suspension is expressed by
//! returning no executor at all; nothing ever blocks waiting for another
//! step.
//!
//! The first dispatch is the implicit wiring pass: every step's ports are
//! resolved by name against the channel table, per-step `on_initialize`
//! hooks run, and the cursor lands on the first user step. A mandatory
//! port with no matching channel — or a channel of the wrong type — fails
//! this dispatch fatally, before any user step runs.

use crate::channel::{CellRef, Channel};
use crate::error::{FlowError, Result};
use crate::executor::{ExecutorHandle, ExecutorSlot};
use crate::step::{Step, StepContext};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Shared handle to a workflow. Identity (for the waiting zone) is the
/// allocation behind this handle.
pub type WorkflowHandle = Arc<Workflow>;

type Callback = Arc<dyn Fn() + Send + Sync>;
type StopPredicate = Arc<dyn Fn() -> bool + Send + Sync>;

struct StepEntry {
    step: Box<dyn Step>,
    slot: ExecutorSlot,
}

/// Mutable scheduling state, held by exactly one dispatcher at a time.
struct WorkflowState {
    steps: Vec<StepEntry>,
    cursor: usize,
    initialized: bool,
    finalized: bool,
}

/// An ordered pipeline of steps plus the channel table they wire against.
///
/// Built with [`WorkflowBuilder`]; always lives behind a [`WorkflowHandle`].
pub struct Workflow {
    name: String,
    channels: HashMap<String, CellRef>,
    looping: AtomicBool,
    loop_stop: Mutex<Option<StopPredicate>>,
    on_loop_begin: Mutex<Option<Callback>>,
    on_loop_end: Mutex<Option<Callback>>,
    on_initialize: Mutex<Option<Callback>>,
    on_finalize: Mutex<Option<Callback>>,
    state: Mutex<WorkflowState>,
    self_ref: Weak<Workflow>,
}

impl Workflow {
    /// Name used in logs and diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the wiring pass has completed.
    pub fn is_initialized(&self) -> bool {
        self.lock_state().initialized
    }

    /// Enable or disable looping back to the first step at the end.
    pub fn set_looping(&self, enabled: bool) {
        self.looping.store(enabled, Ordering::Relaxed);
    }

    /// Predicate checked at each loop end while looping; returning `true`
    /// ends the run.
    pub fn set_loop_stop_when(&self, predicate: impl Fn() -> bool + Send + Sync + 'static) {
        *self.lock_opt(&self.loop_stop) = Some(Arc::new(predicate));
    }

    /// Callback fired at the start of every loop iteration.
    pub fn set_on_loop_begin(&self, f: impl Fn() + Send + Sync + 'static) {
        *self.lock_opt(&self.on_loop_begin) = Some(Arc::new(f));
    }

    /// Callback fired at the end of every loop iteration (and when a step
    /// stops the workflow mid-list).
    pub fn set_on_loop_end(&self, f: impl Fn() + Send + Sync + 'static) {
        *self.lock_opt(&self.on_loop_end) = Some(Arc::new(f));
    }

    /// Callback fired once, after the wiring pass succeeds.
    pub fn set_on_initialize(&self, f: impl Fn() + Send + Sync + 'static) {
        *self.lock_opt(&self.on_initialize) = Some(Arc::new(f));
    }

    /// Callback fired once, at teardown.
    pub fn set_on_finalize(&self, f: impl Fn() + Send + Sync + 'static) {
        *self.lock_opt(&self.on_finalize) = Some(Arc::new(f));
    }

    /// A typed view of a declared channel, or `None` if the name is
    /// unknown or the type does not match.
    pub fn channel<T: Send + 'static>(&self, name: &str) -> Option<Channel<T>> {
        self.channels
            .get(name)
            .and_then(|cell| cell.downcast::<T>())
            .map(Channel::from_storage)
    }

    /// A fresh handle to this workflow.
    pub fn handle(&self) -> WorkflowHandle {
        self.self_ref
            .upgrade()
            .expect("workflow is always constructed behind an Arc")
    }

    // ── Dispatch ──

    /// Execute one pending dispatch: the wiring pass if it has not run
    /// yet, otherwise the step at the cursor. Returns the executor the
    /// workflow must be handed to next, or `None` when the run is paused
    /// or has ended.
    pub(crate) fn advance(&self) -> Result<Option<ExecutorHandle>> {
        {
            let st = self.lock_state();
            if st.steps.is_empty() {
                return Err(FlowError::EmptyWorkflow(self.name.clone()));
            }
            if !st.initialized {
                drop(st);
                return self.wiring_dispatch();
            }
        }
        self.step_dispatch()
    }

    /// The implicit leading dispatch: fire loop-begin, bind every port,
    /// run per-step initialization, then hand off to the first user step's
    /// executor so it runs on its own thread.
    fn wiring_dispatch(&self) -> Result<Option<ExecutorHandle>> {
        self.fire(&self.on_loop_begin);

        let first = {
            let mut st = self.lock_state();
            for entry in st.steps.iter_mut() {
                let step_name = entry.step.name().to_string();
                for port in entry.step.ports() {
                    match self.channels.get(port.mapping_name()) {
                        Some(cell) => {
                            if let Err(e) = port.bind(cell) {
                                return Err(FlowError::ChannelTypeMismatch {
                                    step: step_name,
                                    channel: port.mapping_name().to_string(),
                                    expected: e.expected,
                                    actual: e.actual,
                                });
                            }
                        }
                        None if port.is_optional() => {}
                        None => {
                            return Err(FlowError::MissingChannel {
                                step: step_name,
                                channel: port.mapping_name().to_string(),
                            });
                        }
                    }
                }
                entry.step.on_initialize();
            }
            st.initialized = true;
            st.cursor = 0;
            Self::slot_executor(&st.steps[0])?
        };

        tracing::info!(
            workflow = %self.name,
            channels = self.channels.len(),
            "workflow wired"
        );
        self.fire(&self.on_initialize);
        Ok(Some(first))
    }

    /// Run the step at the cursor and decide the hand-off.
    fn step_dispatch(&self) -> Result<Option<ExecutorHandle>> {
        let handle = self.handle();

        let mut fire_end = false;
        let mut at_loop_end = false;
        let mut outcome: Option<ExecutorHandle> = None;
        let defer;
        {
            let mut st = self.lock_state();
            let cursor = st.cursor;
            let executor = Self::slot_executor(&st.steps[cursor])?;

            let mut ctx = StepContext::new(&handle, &executor);
            st.steps[cursor].step.run(&mut ctx);
            let pause = ctx.pause;
            let stop = ctx.stop;
            defer = ctx.defer.take();

            st.cursor += 1;
            if st.cursor < st.steps.len() {
                if stop {
                    fire_end = true;
                }
                if !stop && !pause {
                    outcome = Some(Self::slot_executor(&st.steps[st.cursor])?);
                }
            } else {
                st.cursor = 0;
                fire_end = true;
                if self.looping.load(Ordering::Relaxed) && !stop && !pause {
                    at_loop_end = true;
                    outcome = Some(Self::slot_executor(&st.steps[0])?);
                }
            }
        }

        // User callbacks run with the state lock released.
        if fire_end {
            self.fire(&self.on_loop_end);
        }
        if at_loop_end {
            let predicate = self.lock_opt(&self.loop_stop).clone();
            if predicate.map_or(false, |p| p()) {
                outcome = None;
            } else {
                self.fire(&self.on_loop_begin);
            }
        }

        // A park request replaces the hand-off: the workflow goes to the
        // deferred executor (normally the waiting zone) only after this
        // dispatch has fully unwound, so a same-thread resume continues
        // from the advanced cursor.
        if let Some(target) = defer {
            target.submit(handle)?;
            return Ok(None);
        }
        Ok(outcome)
    }

    /// Executor designated by the step the cursor currently points at.
    /// Used by the waiting zone to resubmit an awoken workflow.
    pub(crate) fn current_executor(&self) -> Result<ExecutorHandle> {
        let st = self.lock_state();
        match st.steps.get(st.cursor) {
            Some(entry) => Self::slot_executor(entry),
            None => Err(FlowError::EmptyWorkflow(self.name.clone())),
        }
    }

    // ── Teardown ──

    /// Tear the workflow down: fire the on-finalize callback, then every
    /// step's `on_finalize` in reverse registration order. Idempotent;
    /// also invoked on drop.
    pub fn finalize(&self) {
        let run_step_hooks = {
            let mut st = self.lock_state();
            if st.finalized {
                return;
            }
            st.finalized = true;
            st.initialized
        };

        self.fire(&self.on_finalize);
        if run_step_hooks {
            let mut st = self.lock_state();
            for entry in st.steps.iter_mut().rev() {
                entry.step.on_finalize();
            }
        }
        tracing::debug!(workflow = %self.name, "workflow finalized");
    }

    // ── Internals ──

    fn slot_executor(entry: &StepEntry) -> Result<ExecutorHandle> {
        entry.slot.get().ok_or_else(|| FlowError::UnboundExecutor {
            step: entry.step.name().to_string(),
        })
    }

    fn fire(&self, slot: &Mutex<Option<Callback>>) {
        let callback = self.lock_opt(slot).clone();
        if let Some(f) = callback {
            f();
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, WorkflowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_opt<'a, T>(&self, slot: &'a Mutex<Option<T>>) -> MutexGuard<'a, Option<T>> {
        slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Workflow {
    fn drop(&mut self) {
        self.finalize();
    }
}

impl std::fmt::Debug for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("name", &self.name)
            .field("channels", &self.channels.len())
            .finish()
    }
}

/// Builder for [`Workflow`]: declare channels (with optional aliases),
/// ordered steps tagged with executor slots, callbacks, and looping.
pub struct WorkflowBuilder {
    name: String,
    channels: HashMap<String, CellRef>,
    steps: Vec<StepEntry>,
    looping: bool,
    loop_stop: Option<StopPredicate>,
    on_loop_begin: Option<Callback>,
    on_loop_end: Option<Callback>,
    on_initialize: Option<Callback>,
    on_finalize: Option<Callback>,
}

impl WorkflowBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            channels: HashMap::new(),
            steps: Vec::new(),
            looping: false,
            loop_stop: None,
            on_loop_begin: None,
            on_loop_end: None,
            on_initialize: None,
            on_finalize: None,
        }
    }

    /// Declare a channel holding `initial`.
    pub fn channel<T: Send + 'static>(self, name: &str, initial: T) -> Self {
        let ch = Channel::new(initial);
        self.provide(name, &ch)
    }

    /// Declare one channel reachable under several names.
    pub fn channel_aliased<T: Send + 'static>(self, names: &[&str], initial: T) -> Self {
        let ch = Channel::new(initial);
        names.iter().fold(self, |b, name| b.provide(name, &ch))
    }

    /// Register an externally-created channel under `name`. Use this to
    /// share storage across workflows or to register a channel
    /// [`connect`](Channel::connect)ed to an upstream one.
    pub fn provide<T: Send + 'static>(mut self, name: &str, channel: &Channel<T>) -> Self {
        if self.channels.insert(name.to_string(), channel.cell_ref()).is_some() {
            tracing::warn!(
                workflow = %self.name,
                channel = name,
                "channel name redeclared; later declaration wins"
            );
        }
        self
    }

    /// Append a step bound to `slot`. Steps execute in the order they are
    /// appended; the slot's executor may be rebound any time before the
    /// step is dispatched.
    pub fn step(mut self, step: impl Step + 'static, slot: &ExecutorSlot) -> Self {
        self.steps.push(StepEntry {
            step: Box::new(step),
            slot: slot.clone(),
        });
        self
    }

    /// Loop back to the first step after the last instead of ending.
    pub fn looping(mut self, enabled: bool) -> Self {
        self.looping = enabled;
        self
    }

    /// Predicate checked at each loop end; `true` ends the run.
    pub fn loop_stop_when(mut self, f: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.loop_stop = Some(Arc::new(f));
        self
    }

    pub fn on_loop_begin(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_loop_begin = Some(Arc::new(f));
        self
    }

    pub fn on_loop_end(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_loop_end = Some(Arc::new(f));
        self
    }

    pub fn on_initialize(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_initialize = Some(Arc::new(f));
        self
    }

    pub fn on_finalize(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_finalize = Some(Arc::new(f));
        self
    }

    pub fn build(self) -> WorkflowHandle {
        Arc::new_cyclic(|weak| Workflow {
            name: self.name,
            channels: self.channels,
            looping: AtomicBool::new(self.looping),
            loop_stop: Mutex::new(self.loop_stop),
            on_loop_begin: Mutex::new(self.on_loop_begin),
            on_loop_end: Mutex::new(self.on_loop_end),
            on_initialize: Mutex::new(self.on_initialize),
            on_finalize: Mutex::new(self.on_finalize),
            state: Mutex::new(WorkflowState {
                steps: self.steps,
                cursor: 0,
                initialized: false,
                finalized: false,
            }),
            self_ref: weak.clone(),
        })
    }
}
