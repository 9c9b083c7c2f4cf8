//! Worker-thread scaffolding shared by the threaded executors.
//!
//! Owns the liveness/working flags, the join handle, the optional stop
//! predicate checked between dispatches, and the CPU-affinity setting.
//! Affinity is applied by the worker on its own thread, so it can be
//! changed before or after start.

use crate::error::FlowError;
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread::JoinHandle;

type Predicate = Box<dyn Fn() -> bool + Send + Sync>;

/// Stop predicate cell. Disabling keeps the predicate but stops
/// evaluating it, so it can be re-enabled by setting it again.
#[derive(Default)]
struct StopCondition {
    enabled: AtomicBool,
    predicate: RwLock<Option<Predicate>>,
}

impl StopCondition {
    fn set(&self, predicate: Predicate) {
        *self
            .predicate
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(predicate);
        self.enabled.store(true, Ordering::SeqCst);
    }

    fn remove(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }

    fn holds(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
            && self
                .predicate
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .as_ref()
                .map_or(false, |p| p())
    }
}

/// CPU-affinity setting, applied lazily by the worker thread itself.
#[derive(Default)]
struct Affinity {
    cpus: Mutex<Vec<usize>>,
    dirty: AtomicBool,
}

impl Affinity {
    fn set(&self, cpus: &[usize]) {
        *self.cpus.lock().unwrap_or_else(PoisonError::into_inner) = cpus.to_vec();
        self.dirty.store(true, Ordering::SeqCst);
    }

    /// Pin the calling thread if the setting changed since last applied.
    fn apply_if_dirty(&self) {
        if !self.dirty.swap(false, Ordering::SeqCst) {
            return;
        }
        let cpus = self
            .cpus
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if cpus.is_empty() {
            return;
        }
        let available = core_affinity::get_core_ids().unwrap_or_default();
        match cpus
            .iter()
            .find_map(|&id| available.iter().find(|core| core.id == id))
        {
            Some(core) => {
                core_affinity::set_for_current(*core);
                tracing::debug!(cpu = core.id, "worker thread pinned");
            }
            None => {
                tracing::warn!(requested = ?cpus, "no requested CPU available for pinning");
            }
        }
    }
}

/// Lifecycle core of a threaded executor: created → started →
/// stop-requested → joined, restartable after join.
pub(crate) struct WorkerCore {
    life: Arc<AtomicBool>,
    working: Arc<AtomicBool>,
    thread: Mutex<Option<JoinHandle<()>>>,
    affinity: Arc<Affinity>,
    stop_condition: Arc<StopCondition>,
}

impl WorkerCore {
    pub fn new() -> Self {
        Self {
            life: Arc::new(AtomicBool::new(false)),
            working: Arc::new(AtomicBool::new(false)),
            thread: Mutex::new(None),
            affinity: Arc::new(Affinity::default()),
            stop_condition: Arc::new(StopCondition::default()),
        }
    }

    /// Launch the worker loop, calling `tick` until stop is requested or
    /// the stop predicate holds. No-op while a worker is already running;
    /// a finished worker is reclaimed and replaced.
    pub fn start<F: FnMut() + Send + 'static>(&self, name: &str, mut tick: F) {
        let mut slot = self.thread.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = slot.take() {
            if self.life.load(Ordering::SeqCst) && !handle.is_finished() {
                *slot = Some(handle);
                return;
            }
            let _ = handle.join();
        }
        self.life.store(true, Ordering::SeqCst);

        let life = Arc::clone(&self.life);
        let working = Arc::clone(&self.working);
        let affinity = Arc::clone(&self.affinity);
        let stop_condition = Arc::clone(&self.stop_condition);
        let name = name.to_string();
        *slot = Some(std::thread::spawn(move || {
            tracing::info!(executor = %name, "worker thread started");
            working.store(true, Ordering::SeqCst);
            // Apply any affinity configured before start.
            affinity.dirty.store(true, Ordering::SeqCst);

            while life.load(Ordering::SeqCst) {
                if stop_condition.holds() {
                    break;
                }
                affinity.apply_if_dirty();
                tick();
            }

            working.store(false, Ordering::SeqCst);
            tracing::info!(executor = %name, "worker thread exiting");
        }));
    }

    /// Clear the liveness flag; the worker exits after its current
    /// dispatch. Returns immediately.
    pub fn request_stop(&self) {
        self.life.store(false, Ordering::SeqCst);
    }

    /// Block until the worker thread exits and reclaim it.
    pub fn join(&self) {
        let handle = self
            .thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }

    pub fn is_working(&self) -> bool {
        self.working.load(Ordering::SeqCst)
    }

    pub fn set_cpu_affinity(&self, cpus: &[usize]) {
        self.affinity.set(cpus);
    }

    pub fn set_stop_condition(&self, predicate: impl Fn() -> bool + Send + Sync + 'static) {
        self.stop_condition.set(Box::new(predicate));
    }

    pub fn remove_stop_condition(&self) {
        self.stop_condition.remove();
    }
}

/// Optional channel carrying dispatch errors out of a worker loop.
/// Errors are always logged; a sink additionally delivers them to the
/// embedding application.
pub(crate) struct ErrorSink(Mutex<Option<Sender<FlowError>>>);

impl ErrorSink {
    pub fn new() -> Self {
        Self(Mutex::new(None))
    }

    pub fn set(&self, sink: Sender<FlowError>) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = Some(sink);
    }

    pub fn report(&self, error: FlowError) {
        tracing::error!(%error, "workflow dispatch failed");
        let sink = self.0.lock().unwrap_or_else(PoisonError::into_inner).clone();
        if let Some(tx) = sink {
            let _ = tx.send(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[test]
    fn test_worker_runs_and_stops() {
        let core = WorkerCore::new();
        let ticks = Arc::new(AtomicUsize::new(0));
        let t = Arc::clone(&ticks);
        core.start("test", move || {
            t.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(1));
        });

        std::thread::sleep(Duration::from_millis(20));
        core.request_stop();
        core.join();
        assert!(!core.is_working());
        assert!(ticks.load(Ordering::SeqCst) > 0);
    }

    #[test]
    fn test_worker_restarts_after_join() {
        let core = WorkerCore::new();
        let ticks = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let t = Arc::clone(&ticks);
            core.start("test", move || {
                t.fetch_add(1, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(1));
            });
            std::thread::sleep(Duration::from_millis(10));
            core.request_stop();
            core.join();
        }
        assert!(ticks.load(Ordering::SeqCst) >= 2);
    }

    #[test]
    fn test_stop_condition_ends_loop() {
        let core = WorkerCore::new();
        let ticks = Arc::new(AtomicUsize::new(0));
        let t = Arc::clone(&ticks);
        core.set_stop_condition({
            let t = Arc::clone(&ticks);
            move || t.load(Ordering::SeqCst) >= 3
        });
        core.start("test", move || {
            t.fetch_add(1, Ordering::SeqCst);
        });

        core.join();
        assert!(ticks.load(Ordering::SeqCst) >= 3);
        assert!(!core.is_working());
    }

    #[test]
    fn test_double_start_is_a_noop() {
        let core = WorkerCore::new();
        let ticks = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let t = Arc::clone(&ticks);
            core.start("test", move || {
                t.fetch_add(1, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(1));
            });
        }
        std::thread::sleep(Duration::from_millis(10));
        core.request_stop();
        core.join();
        // Only one worker was ever live; the counter is sane either way,
        // but the join above must not hang on an orphaned thread.
    }
}
