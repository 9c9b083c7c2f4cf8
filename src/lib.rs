//! # flowline: a dataflow workflow runtime
//!
//! Describes a pipeline as an ordered list of steps over shared, named
//! data channels, then runs it by handing control between executors —
//! serial, parallel, or immediate — without ever blocking a worker thread
//! on another workflow's progress.
//!
//! ## Architecture
//!
//! ```text
//! [Workflow]  ──step──►  [Executor A]  ──hand-off──►  [Executor B]  ──► ...
//!     │                       │                            │
//!     └── channels ◄──ports───┴────────────────────────────┘
//! ```
//!
//! - **Channels** are typed, reference-counted storage cells registered
//!   under one or more names.
//! - **Ports** belong to steps and resolve to channels by name during the
//!   workflow's one-time wiring pass; a mandatory port with no matching
//!   channel (or a type mismatch) fails fast, before any step runs.
//! - **Steps** run one at a time, in list order, each on the executor its
//!   slot designates; a step may request pause/stop or park the whole
//!   workflow in the waiting zone.
//! - **Executors** each dispatch exactly one pending step per submission
//!   and resubmit the workflow wherever the next step wants to run — the
//!   same executor (queue re-entry) or a different one (cross-thread
//!   hop).
//! - The **runtime** holds the threadless service executors (realtime,
//!   deleter, waiting zone) and coordinates shutdown of registered
//!   executors.
//!
//! ## Example
//!
//! ```
//! use flowline::{Executor, ExecutorSlot, FnStep, WorkflowBuilder};
//!
//! let rt = Executor::realtime();
//! let slot = ExecutorSlot::new(rt.clone());
//!
//! let workflow = WorkflowBuilder::new("doubler")
//!     .channel("value", 21i64)
//!     .step(
//!         FnStep::new("double", |ctx| {
//!             let wf = ctx.workflow();
//!             let ch = wf.channel::<i64>("value").unwrap();
//!             ch.with(|v| *v *= 2);
//!         }),
//!         &slot,
//!     )
//!     .build();
//!
//! rt.submit(workflow.clone()).unwrap();
//! assert_eq!(workflow.channel::<i64>("value").unwrap().get(), 42);
//! ```

pub mod channel;
pub mod config;
pub mod error;
pub mod executor;
pub mod port;
pub mod runtime;
pub mod step;
pub mod steps;
pub mod workflow;

// Re-export the working set.
pub use channel::Channel;
pub use config::{ExecutorKind, ExecutorSpec, RuntimeConfig};
pub use error::{FlowError, Result};
pub use executor::{
    DeleterExecutor, Executor, ExecutorHandle, ExecutorSlot, ParallelExecutor, RealtimeExecutor,
    SerialExecutor, WaitingExecutor,
};
pub use port::{Port, PortBinding};
pub use runtime::Runtime;
pub use step::{Step, StepContext};
pub use steps::{
    AwakeStep, FnStep, GateStep, NoOpStep, NotifySignalStep, PassValueStep, Signal,
    SubmitWorkflowStep, SwapValueStep, WaitSignalStep, WaitStep,
};
pub use workflow::{Workflow, WorkflowBuilder, WorkflowHandle};
