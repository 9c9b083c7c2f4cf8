//! Wiring semantics: name resolution, optional ports, type tags, aliasing.

mod common;

use flowline::{
    Channel, Executor, ExecutorSlot, FlowError, FnStep, Port, PortBinding, Step, StepContext,
    WorkflowBuilder,
};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Reads an `i64` channel through a mandatory port on every run.
struct ReadStep {
    input: Port<i64>,
    seen: Arc<Mutex<Vec<i64>>>,
}

impl ReadStep {
    fn new(channel: &str, seen: &Arc<Mutex<Vec<i64>>>) -> Self {
        Self {
            input: Port::new(channel),
            seen: Arc::clone(seen),
        }
    }
}

impl Step for ReadStep {
    fn name(&self) -> &str {
        "read"
    }

    fn ports(&mut self) -> Vec<&mut dyn PortBinding> {
        vec![&mut self.input]
    }

    fn run(&mut self, _ctx: &mut StepContext<'_>) {
        self.seen.lock().unwrap().push(self.input.get());
    }
}

#[test]
fn mandatory_ports_resolve_and_read_declared_values() {
    common::init_tracing();
    let rt = Executor::realtime();
    let slot = ExecutorSlot::new(rt.clone());
    let seen = Arc::new(Mutex::new(Vec::new()));

    let wf = WorkflowBuilder::new("wired")
        .channel("left", 3i64)
        .channel("right", 4i64)
        .step(ReadStep::new("left", &seen), &slot)
        .step(ReadStep::new("right", &seen), &slot)
        .build();

    rt.submit(wf.clone()).unwrap();
    assert!(wf.is_initialized());
    assert_eq!(*seen.lock().unwrap(), vec![3, 4]);
}

#[test]
fn missing_mandatory_channel_fails_before_any_step_runs() {
    common::init_tracing();
    let rt = Executor::realtime();
    let slot = ExecutorSlot::new(rt.clone());
    let ran = common::counter();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let wf = WorkflowBuilder::new("broken")
        .channel("present", 0i64)
        .step(common::counting_step("first", &ran), &slot)
        .step(ReadStep::new("absent", &seen), &slot)
        .build();

    let err = rt.submit(wf.clone()).unwrap_err();
    match err {
        FlowError::MissingChannel { step, channel } => {
            assert_eq!(step, "read");
            assert_eq!(channel, "absent");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!wf.is_initialized());
    assert_eq!(ran.load(Ordering::SeqCst), 0);
}

#[test]
fn optional_port_stays_unbound_without_failing() {
    common::init_tracing();
    struct ProbeStep {
        maybe: Port<i64>,
        bound: Arc<Mutex<Option<bool>>>,
    }
    impl Step for ProbeStep {
        fn name(&self) -> &str {
            "probe"
        }
        fn ports(&mut self) -> Vec<&mut dyn PortBinding> {
            vec![&mut self.maybe]
        }
        fn run(&mut self, _ctx: &mut StepContext<'_>) {
            *self.bound.lock().unwrap() = Some(self.maybe.is_bound());
        }
    }

    let rt = Executor::realtime();
    let slot = ExecutorSlot::new(rt.clone());
    let bound = Arc::new(Mutex::new(None));

    let wf = WorkflowBuilder::new("tolerant")
        .step(
            ProbeStep {
                maybe: Port::optional("nowhere"),
                bound: Arc::clone(&bound),
            },
            &slot,
        )
        .build();

    rt.submit(wf.clone()).unwrap();
    assert!(wf.is_initialized());
    assert_eq!(*bound.lock().unwrap(), Some(false));
}

#[test]
fn type_mismatch_is_a_wiring_error() {
    common::init_tracing();
    let rt = Executor::realtime();
    let slot = ExecutorSlot::new(rt.clone());
    let seen = Arc::new(Mutex::new(Vec::new()));

    let wf = WorkflowBuilder::new("mistyped")
        .channel("value", "text".to_string())
        .step(ReadStep::new("value", &seen), &slot)
        .build();

    let err = rt.submit(wf).unwrap_err();
    match err {
        FlowError::ChannelTypeMismatch {
            channel, expected, ..
        } => {
            assert_eq!(channel, "value");
            assert_eq!(expected, "i64");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn aliased_names_share_one_storage() {
    common::init_tracing();
    let rt = Executor::realtime();
    let slot = ExecutorSlot::new(rt.clone());
    let seen = Arc::new(Mutex::new(Vec::new()));

    let writer = FnStep::new("write", |ctx| {
        let wf = ctx.workflow();
        wf.channel::<i64>("picture").unwrap().set(99);
    });

    let wf = WorkflowBuilder::new("aliased")
        .channel_aliased(&["picture", "cutting_picture"], 0i64)
        .step(writer, &slot)
        .step(ReadStep::new("cutting_picture", &seen), &slot)
        .build();

    rt.submit(wf).unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![99]);
}

#[test]
fn connected_channel_keeps_value_visible_after_upstream_drops() {
    common::init_tracing();
    let rt = Executor::realtime();
    let slot = ExecutorSlot::new(rt.clone());
    let seen = Arc::new(Mutex::new(Vec::new()));

    let mut downstream = Channel::new(0i64);
    {
        let upstream = Channel::new(0i64);
        downstream.connect(&upstream);
        upstream.set(7);
    }

    let wf = WorkflowBuilder::new("connected")
        .provide("shared", &downstream)
        .step(ReadStep::new("shared", &seen), &slot)
        .build();

    rt.submit(wf).unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![7]);
}

/// A step with an arbitrary list of mandatory ports.
struct ManyPortsStep {
    ports: Vec<Port<i32>>,
}

impl Step for ManyPortsStep {
    fn name(&self) -> &str {
        "many_ports"
    }

    fn ports(&mut self) -> Vec<&mut dyn PortBinding> {
        self.ports
            .iter_mut()
            .map(|p| p as &mut dyn PortBinding)
            .collect()
    }

    fn run(&mut self, _ctx: &mut StepContext<'_>) {}
}

proptest! {
    /// Initialization succeeds exactly when every mandatory name is
    /// declared, whatever the combination.
    #[test]
    fn wiring_succeeds_iff_mandatory_names_covered(
        declared in proptest::collection::hash_set("[a-e]", 0..5),
        required in proptest::collection::vec("[a-e]", 0..5),
    ) {
        let rt = Executor::realtime();
        let slot = ExecutorSlot::new(rt.clone());

        let mut builder = WorkflowBuilder::new("prop");
        for name in &declared {
            builder = builder.channel(name, 0i32);
        }
        let step = ManyPortsStep {
            ports: required.iter().map(|n| Port::new(n.clone())).collect(),
        };
        let wf = builder.step(step, &slot).build();

        let covered = required.iter().all(|n| declared.contains(n));
        let outcome = rt.submit(wf);
        prop_assert_eq!(outcome.is_ok(), covered);
    }
}

#[test]
fn counter_step_counts() {
    // Sanity-check the shared test helper itself.
    let count: Arc<AtomicUsize> = common::counter();
    let rt = Executor::realtime();
    let slot = ExecutorSlot::new(rt.clone());
    let wf = WorkflowBuilder::new("count")
        .step(common::counting_step("tick", &count), &slot)
        .build();
    rt.submit(wf).unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);
}
