//! Condition-variable handshake through a channel.
//!
//! A [`Signal`] is a boolean flag plus a condvar, shared by cloning (all
//! clones observe the same flag). The wait/notify steps move it through a
//! channel so a workflow can rendezvous with code outside the runtime —
//! e.g. a hardware thread signalling frame arrival.
//!
//! [`WaitSignalStep`] **blocks its executor's thread** until the signal is
//! raised. That is the point — it adapts external blocking APIs — but it
//! belongs on a dedicated serial executor, never on one shared with
//! latency-sensitive workflows. Workflow-to-workflow coordination should
//! use the waiting zone instead.

use crate::port::{Port, PortBinding};
use crate::step::{Step, StepContext};
use std::sync::{Arc, Condvar, Mutex, PoisonError};

/// Shared flag + condvar. `reversed` polarity swaps the raised/cleared
/// meaning of the flag, matching a consumer that waits for `false`.
#[derive(Clone, Default)]
pub struct Signal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl Signal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag to `!reversed` and wake all waiters.
    pub fn notify(&self, reversed: bool) {
        let (flag, condvar) = &*self.inner;
        *flag.lock().unwrap_or_else(PoisonError::into_inner) = !reversed;
        condvar.notify_all();
    }

    /// Block until the flag reads `!reversed`, then reset it to
    /// `reversed` (consuming the notification).
    pub fn wait(&self, reversed: bool) {
        let (flag, condvar) = &*self.inner;
        let mut raised = flag.lock().unwrap_or_else(PoisonError::into_inner);
        while *raised == reversed {
            raised = condvar
                .wait(raised)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *raised = reversed;
    }
}

/// Blocks the executor thread until the signal in the named channel is
/// raised, consuming the notification.
pub struct WaitSignalStep {
    signal: Port<Signal>,
    reversed: bool,
}

impl WaitSignalStep {
    pub fn new(channel: &str) -> Self {
        Self {
            signal: Port::new(channel),
            reversed: false,
        }
    }

    /// Wait for the flag to clear instead of raise.
    pub fn reversed(mut self) -> Self {
        self.reversed = true;
        self
    }
}

impl Step for WaitSignalStep {
    fn name(&self) -> &str {
        "wait_signal"
    }

    fn ports(&mut self) -> Vec<&mut dyn PortBinding> {
        vec![&mut self.signal]
    }

    fn run(&mut self, _ctx: &mut StepContext<'_>) {
        // Clone the signal out first so the channel lock is not held
        // while blocking.
        let signal = self.signal.get();
        signal.wait(self.reversed);
    }
}

/// Raises the signal in the named channel and wakes all waiters.
pub struct NotifySignalStep {
    signal: Port<Signal>,
    reversed: bool,
}

impl NotifySignalStep {
    pub fn new(channel: &str) -> Self {
        Self {
            signal: Port::new(channel),
            reversed: false,
        }
    }

    /// Clear the flag instead of raising it.
    pub fn reversed(mut self) -> Self {
        self.reversed = true;
        self
    }
}

impl Step for NotifySignalStep {
    fn name(&self) -> &str {
        "notify_signal"
    }

    fn ports(&mut self) -> Vec<&mut dyn PortBinding> {
        vec![&mut self.signal]
    }

    fn run(&mut self, _ctx: &mut StepContext<'_>) {
        self.signal.get().notify(self.reversed);
    }
}
