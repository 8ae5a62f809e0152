#![forbid(unsafe_code)]

//! Integration tests: the controller's close state machine.

mod common;

use std::rc::Rc;

use common::{Rig, instance};
use fdialog::{CloseResult, ControllerPhase, DialogController};
use fdialog_core::{
    CloseAttempt, DialogError, DialogOptions, DialogResult, DialogSettings, LifecycleHook,
};
use fdialog_harness::{HookCall, RenderCall, ScriptedViewModel};
use futures::FutureExt;
use serde_json::json;

fn open(
    rig: &mut Rig,
    vm: &Rc<ScriptedViewModel>,
    reject_on_cancel: bool,
) -> (DialogController, CloseResult) {
    let opened = rig
        .open(DialogSettings::new(instance(vm)).reject_on_cancel(reject_on_cancel))
        .expect("dialog opens");
    assert!(!opened.was_cancelled);
    (
        opened.controller.expect("controller yielded"),
        opened.close_result.expect("close result yielded"),
    )
}

// ============================================================================
// Re-entrancy
// ============================================================================

#[test]
fn concurrent_close_calls_share_one_sequence() {
    let mut rig = Rig::new();
    let vm = Rc::new(ScriptedViewModel::new("edit"));
    let (controller, close_result) = open(&mut rig, &vm, false);

    vm.hold(LifecycleHook::CanDeactivate);
    let first = controller.ok(Some(json!("first")));
    rig.pool.run_until_stalled();
    assert_eq!(controller.phase(), ControllerPhase::Closing);
    assert_eq!(vm.in_flight(), 1);

    let second = controller.cancel(Some(json!("second")));
    let third = controller.close(false, None);
    assert!(first.ptr_eq(&second));
    assert!(first.ptr_eq(&third));

    vm.release(LifecycleHook::CanDeactivate);
    assert_eq!(rig.pool.run_until(second), Ok(CloseAttempt::Closed));
    assert_eq!(rig.pool.run_until(third), Ok(CloseAttempt::Closed));

    assert_eq!(vm.count(LifecycleHook::CanDeactivate), 1);
    assert_eq!(vm.count(LifecycleHook::Deactivate), 1);
    assert_eq!(rig.renderer.hides(), 1);
    assert_eq!(
        rig.pool.run_until(close_result),
        Ok(DialogResult::new(false, Some(json!("first"))))
    );
}

#[test]
fn close_runs_without_being_awaited() {
    let mut rig = Rig::new();
    let vm = Rc::new(ScriptedViewModel::new("edit"));
    let (controller, close_result) = open(&mut rig, &vm, false);

    drop(controller.ok(None));
    rig.pool.run_until_stalled();

    assert_eq!(controller.phase(), ControllerPhase::Closed);
    assert_eq!(
        close_result.now_or_never(),
        Some(Ok(DialogResult::new(false, None)))
    );
}

#[test]
fn hooks_run_in_order() {
    let mut rig = Rig::new();
    let vm = Rc::new(ScriptedViewModel::new("edit"));
    let (controller, _close_result) = open(&mut rig, &vm, false);

    rig.pool
        .run_until(controller.cancel(None))
        .expect("close succeeds");

    assert_eq!(
        vm.calls(),
        vec![
            HookCall::CanActivate(None),
            HookCall::Activate(None),
            HookCall::CanDeactivate(false),
            HookCall::Deactivate,
        ]
    );
    assert_eq!(
        rig.renderer.calls(),
        vec![
            RenderCall::Show(controller.id()),
            RenderCall::Hide(controller.id())
        ]
    );
}

// ============================================================================
// Vetoes
// ============================================================================

#[test]
fn veto_without_reject_keeps_dialog_open() {
    let mut rig = Rig::new();
    let vm = Rc::new(ScriptedViewModel::new("dirty-form").refusing_close());
    let (controller, close_result) = open(&mut rig, &vm, false);

    let attempt = rig.pool.run_until(controller.ok(Some(json!(1))));
    assert_eq!(attempt, Ok(CloseAttempt::Vetoed));
    assert!(attempt.expect("vetoed").was_cancelled());
    assert_eq!(controller.phase(), ControllerPhase::Open);
    assert!(close_result.clone().now_or_never().is_none());
    assert_eq!(vm.count(LifecycleHook::Deactivate), 0);
    assert_eq!(rig.renderer.hides(), 0);
    assert_eq!(rig.service.controllers(), vec![controller.clone()]);

    vm.set_verdict(LifecycleHook::CanDeactivate, Some(true));
    let retry = rig.pool.run_until(controller.cancel(Some(json!("x"))));
    assert_eq!(retry, Ok(CloseAttempt::Closed));
    assert_eq!(
        rig.pool.run_until(close_result),
        Ok(DialogResult::new(true, Some(json!("x"))))
    );
}

#[test]
fn veto_with_reject_rejects_only_the_attempt() {
    let mut rig = Rig::new();
    let vm = Rc::new(ScriptedViewModel::new("dirty-form").refusing_close());
    let (controller, close_result) = open(&mut rig, &vm, true);

    let attempt = rig.pool.run_until(controller.cancel(Some(json!("why"))));
    let err = attempt.expect_err("attempt rejected");
    assert!(err.is_cancellation());
    assert_eq!(controller.phase(), ControllerPhase::Open);
    assert!(close_result.now_or_never().is_none());
    assert!(rig.service.has_open_dialog());
}

// ============================================================================
// Settlement
// ============================================================================

#[test]
fn ok_resolves_with_output() {
    let mut rig = Rig::new();
    let vm = Rc::new(ScriptedViewModel::new("pick"));
    let (controller, close_result) = open(&mut rig, &vm, true);

    rig.pool
        .run_until(controller.ok(Some(json!({"picked": 2}))))
        .expect("closes");
    assert_eq!(
        rig.pool.run_until(close_result),
        Ok(DialogResult::new(false, Some(json!({"picked": 2}))))
    );
}

#[test]
fn cancel_resolves_cancelled_result() {
    let mut rig = Rig::new();
    let vm = Rc::new(ScriptedViewModel::new("pick"));
    let (controller, close_result) = open(&mut rig, &vm, false);

    rig.pool
        .run_until(controller.cancel(Some(json!("x"))))
        .expect("closes");
    let result = rig.pool.run_until(close_result).expect("resolved");
    assert!(result.was_cancelled);
    assert_eq!(result.output, Some(json!("x")));
}

#[test]
fn cancel_with_reject_rejects_close_result() {
    let mut rig = Rig::new();
    let vm = Rc::new(ScriptedViewModel::new("pick"));
    let (controller, close_result) = open(&mut rig, &vm, true);

    // The close itself succeeds; only the dialog's result is a rejection.
    assert_eq!(
        rig.pool.run_until(controller.cancel(Some(json!("x")))),
        Ok(CloseAttempt::Closed)
    );
    let err = rig.pool.run_until(close_result).expect_err("rejected");
    assert_eq!(
        err.as_cancellation().and_then(|c| c.reason()),
        Some(&json!("x"))
    );
}

#[test]
fn cancel_without_reason_rejects_with_empty_reason() {
    let mut rig = Rig::with_options(DialogOptions {
        reject_on_cancel: true,
        ..DialogOptions::default()
    });
    let vm = Rc::new(ScriptedViewModel::new("pick"));
    let opened = rig
        .open(DialogSettings::new(instance(&vm)))
        .expect("dialog opens");
    let controller = opened.controller.expect("controller");

    rig.pool.run_until(controller.cancel(None)).expect("closes");
    let err = rig
        .pool
        .run_until(opened.close_result.expect("close result"))
        .expect_err("rejected");
    let cancel = err.as_cancellation().expect("cancellation");
    assert!(cancel.was_cancelled());
    assert_eq!(cancel.reason(), None);
    assert_eq!(err.to_string(), "Operation cancelled.");
}

#[test]
fn settled_dialog_leaves_service() {
    let mut rig = Rig::new();
    let vm = Rc::new(ScriptedViewModel::new("pick"));
    let (controller, _close_result) = open(&mut rig, &vm, false);
    assert!(rig.service.has_active_dialog());

    rig.pool.run_until(controller.ok(None)).expect("closes");
    assert!(rig.service.controllers().is_empty());
    assert!(!rig.service.has_open_dialog());
    assert!(!rig.service.has_active_dialog());
}

// ============================================================================
// error()
// ============================================================================

#[test]
fn error_skips_gate_and_rejects_with_message() {
    let mut rig = Rig::new();
    let vm = Rc::new(ScriptedViewModel::new("report").refusing_close());
    let (controller, close_result) = open(&mut rig, &vm, false);

    rig.pool
        .run_until(controller.error(json!({"code": 500})))
        .expect("error path runs");

    assert_eq!(vm.count(LifecycleHook::CanDeactivate), 0);
    assert_eq!(vm.count(LifecycleHook::Deactivate), 1);
    assert_eq!(rig.renderer.hides(), 1);
    assert_eq!(controller.phase(), ControllerPhase::Rejected);
    assert_eq!(
        rig.pool.run_until(close_result),
        Err(DialogError::Errored(json!({"code": 500})))
    );
    assert!(rig.service.controllers().is_empty());
    assert_eq!(
        rig.pool.run_until(controller.ok(None)),
        Err(DialogError::Inactive)
    );
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn failing_deactivate_reopens_controller() {
    let mut rig = Rig::new();
    let vm = Rc::new(ScriptedViewModel::new("stuck"));
    let (controller, close_result) = open(&mut rig, &vm, false);
    vm.fail(LifecycleHook::Deactivate, "still saving");

    let first = controller.ok(None);
    assert_eq!(
        rig.pool.run_until(first.clone()),
        Err(DialogError::hook(LifecycleHook::Deactivate, "still saving"))
    );
    assert_eq!(controller.phase(), ControllerPhase::Open);
    assert_eq!(rig.renderer.hides(), 0);
    assert!(close_result.now_or_never().is_none());

    // The guard was cleared, so the next request starts a new attempt.
    let second = controller.ok(None);
    assert!(!first.ptr_eq(&second));
    assert!(rig.pool.run_until(second).is_err());
    assert_eq!(vm.count(LifecycleHook::Deactivate), 2);
}

#[test]
fn failing_hide_propagates() {
    let mut rig = Rig::new();
    let vm = Rc::new(ScriptedViewModel::new("pick"));
    let (controller, _close_result) = open(&mut rig, &vm, false);
    rig.renderer.fail_hide("detached document");

    assert_eq!(
        rig.pool.run_until(controller.cancel(None)),
        Err(DialogError::host("detached document"))
    );
    assert_eq!(controller.phase(), ControllerPhase::Open);
    assert_eq!(rig.service.controllers().len(), 1);
}
