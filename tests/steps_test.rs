//! Built-in step behavior.

mod common;

use flowline::{
    Executor, ExecutorSlot, FnStep, GateStep, NoOpStep, NotifySignalStep, PassValueStep, Signal,
    SwapValueStep, WaitSignalStep, WorkflowBuilder,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

#[test]
fn pass_value_copies_between_channels() {
    common::init_tracing();
    let rt = Executor::realtime();
    let slot = ExecutorSlot::new(rt.clone());

    let wf = WorkflowBuilder::new("passer")
        .channel("source", 41i32)
        .channel("sink", 0i32)
        .step(PassValueStep::<i32>::new("source", "sink"), &slot)
        .build();

    rt.submit(wf.clone()).unwrap();
    assert_eq!(wf.channel::<i32>("sink").unwrap().get(), 41);
    // The source keeps its value; this is a copy, not a move.
    assert_eq!(wf.channel::<i32>("source").unwrap().get(), 41);
}

#[test]
fn pass_value_tolerates_aliased_names() {
    common::init_tracing();
    let rt = Executor::realtime();
    let slot = ExecutorSlot::new(rt.clone());

    let wf = WorkflowBuilder::new("self_pass")
        .channel_aliased(&["a", "b"], 5i32)
        .step(PassValueStep::<i32>::new("a", "b"), &slot)
        .build();

    rt.submit(wf.clone()).unwrap();
    assert_eq!(wf.channel::<i32>("a").unwrap().get(), 5);
}

#[test]
fn swap_value_exchanges_channels() {
    common::init_tracing();
    let rt = Executor::realtime();
    let slot = ExecutorSlot::new(rt.clone());

    let wf = WorkflowBuilder::new("swapper")
        .channel("front", "live".to_string())
        .channel("back", "scratch".to_string())
        .step(SwapValueStep::<String>::new("front", "back"), &slot)
        .build();

    rt.submit(wf.clone()).unwrap();
    assert_eq!(wf.channel::<String>("front").unwrap().get(), "scratch");
    assert_eq!(wf.channel::<String>("back").unwrap().get(), "live");
}

#[test]
fn gate_skips_inner_step_while_condition_is_false() {
    common::init_tracing();
    let rt = Executor::realtime();
    let slot = ExecutorSlot::new(rt.clone());
    let enabled = Arc::new(AtomicBool::new(false));
    let count = common::counter();

    let wf = WorkflowBuilder::new("gated")
        .step(
            GateStep::new(common::counting_step("inner", &count), {
                let enabled = Arc::clone(&enabled);
                move || enabled.load(Ordering::SeqCst)
            }),
            &slot,
        )
        .build();

    rt.submit(wf.clone()).unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 0);

    enabled.store(true, Ordering::SeqCst);
    rt.submit(wf).unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn noop_step_only_moves_the_workflow() {
    common::init_tracing();
    let worker = Executor::serial();
    worker.start();
    let rt = Executor::realtime();
    let count = common::counter();

    // The no-op hops the workflow onto the worker; the next step runs there.
    let wf = WorkflowBuilder::new("hop")
        .step(NoOpStep, &ExecutorSlot::new(worker.clone()))
        .step(common::counting_step("landed", &count), &ExecutorSlot::new(rt.clone()))
        .build();

    rt.submit(wf).unwrap();
    assert!(common::wait_until(TIMEOUT, || count.load(Ordering::SeqCst) == 1));

    worker.request_stop();
    worker.join();
}

#[test]
fn wait_signal_blocks_until_external_notify() {
    common::init_tracing();
    let executor = Executor::serial();
    executor.start();
    let slot = ExecutorSlot::new(executor.clone());
    let count = common::counter();
    let signal = Signal::new();

    let wf = WorkflowBuilder::new("rendezvous")
        .channel("frame_ready", signal.clone())
        .step(WaitSignalStep::new("frame_ready"), &slot)
        .step(common::counting_step("after", &count), &slot)
        .build();

    executor.submit(wf).unwrap();
    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(count.load(Ordering::SeqCst), 0, "still waiting for the signal");

    signal.notify(false);
    assert!(common::wait_until(TIMEOUT, || count.load(Ordering::SeqCst) == 1));

    executor.request_stop();
    executor.join();
}

#[test]
fn notify_signal_step_wakes_a_waiting_thread() {
    common::init_tracing();
    let rt = Executor::realtime();
    let slot = ExecutorSlot::new(rt.clone());
    let signal = Signal::new();

    let waiter = {
        let signal = signal.clone();
        std::thread::spawn(move || signal.wait(false))
    };

    let wf = WorkflowBuilder::new("notifier")
        .channel("frame_done", signal)
        .step(NotifySignalStep::new("frame_done"), &slot)
        .build();
    rt.submit(wf).unwrap();

    waiter.join().unwrap();
}

#[test]
fn fn_step_sees_its_own_executor() {
    common::init_tracing();
    let rt = Executor::realtime();
    let slot = ExecutorSlot::new(rt.clone());
    let matched = Arc::new(AtomicBool::new(false));

    let m = Arc::clone(&matched);
    let expected = rt.clone();
    let wf = WorkflowBuilder::new("introspect")
        .step(
            FnStep::new("check", move |ctx| {
                m.store(Arc::ptr_eq(&ctx.executor(), &expected), Ordering::SeqCst);
            }),
            &slot,
        )
        .build();

    rt.submit(wf).unwrap();
    assert!(matched.load(Ordering::SeqCst));
}
