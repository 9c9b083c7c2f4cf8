//! Built-in steps.
//!
//! Small, composable steps covering the recurring workflow chores: running
//! a closure, hopping threads, moving values between channels, suspending
//! and awakening workflows, nesting workflows, and condition-variable
//! handshakes with code outside the runtime.

mod gate;
mod lambda;
mod signal;
mod submit;
mod suspend;
mod value;

pub use gate::GateStep;
pub use lambda::FnStep;
pub use signal::{NotifySignalStep, Signal, WaitSignalStep};
pub use submit::SubmitWorkflowStep;
pub use suspend::{AwakeStep, WaitStep};
pub use value::{PassValueStep, SwapValueStep};

use crate::step::{Step, StepContext};

/// A step that does nothing. Its only effect is the hand-off: assigning it
/// to a slot moves the workflow onto that executor's thread.
pub struct NoOpStep;

impl Step for NoOpStep {
    fn name(&self) -> &str {
        "no_op"
    }

    fn run(&mut self, _ctx: &mut StepContext<'_>) {}
}
