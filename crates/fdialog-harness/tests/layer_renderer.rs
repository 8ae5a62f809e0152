#![forbid(unsafe_code)]

//! Integration tests: layer renderer over the in-memory host.

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{init_tracing, instance};
use fdialog::{
    ControllerPhase, DialogController, DialogEvent, EventOutcome, KeyCode, KeyEvent,
    KeyEventKind, LayerKind, MIN_VERTICAL_MARGIN, OpenDialogResult,
};
use fdialog_core::{DialogOptions, DialogResult, DialogSettings, NodeId};
use fdialog_harness::{DialogFixture, HostOp, MemoryHost, ScriptedViewModel};
use futures::FutureExt;
use futures::task::LocalSpawnExt;

fn fixture() -> DialogFixture {
    init_tracing();
    DialogFixture::new()
}

fn open_with(
    fx: &mut DialogFixture,
    settings: impl FnOnce(DialogSettings) -> DialogSettings,
) -> OpenDialogResult {
    let vm = Rc::new(ScriptedViewModel::new("vm"));
    fx.open(settings(DialogSettings::new(instance(&vm))))
        .expect("dialog opens")
}

fn open_unlocked(fx: &mut DialogFixture) -> DialogController {
    open_with(fx, |s| s.lock(false))
        .controller
        .expect("controller")
}

// ============================================================================
// Mounting
// ============================================================================

#[test]
fn layers_stack_in_open_order() {
    let mut fx = fixture();
    let c1 = open_unlocked(&mut fx);
    let c2 = open_unlocked(&mut fx);
    let c3 = open_unlocked(&mut fx);

    let overlays = fx.host.layers(LayerKind::Overlay);
    let containers = fx.host.layers(LayerKind::Container);
    assert_eq!(containers.len(), 3);
    let expected: Vec<NodeId> = overlays
        .iter()
        .zip(&containers)
        .flat_map(|(o, c)| [*o, *c])
        .collect();
    assert_eq!(fx.host.document(), expected);

    for node in overlays.iter().chain(&containers) {
        assert_eq!(fx.host.z_index(*node), Some(1000));
        assert!(fx.host.is_active(*node));
    }
    assert_eq!(fx.registry.ids(), vec![c1.id(), c2.id(), c3.id()]);
    assert_eq!(fx.service.controllers(), vec![c1, c2, c3]);
}

#[test]
fn anchor_is_wrapped_inside_container() {
    let mut fx = fixture();
    let controller = open_unlocked(&mut fx);
    let anchor = controller.slot().expect("slot").anchor();

    let container = fx.host.layers(LayerKind::Container)[0];
    let wrapper = fx.host.children(container);
    assert_eq!(wrapper.len(), 1);
    assert_eq!(fx.host.children(wrapper[0]), vec![anchor]);
    assert!(fx.composer.slots()[0].is_attached());
}

#[test]
fn dialog_is_centered_vertically() {
    let mut fx = fixture();
    open_unlocked(&mut fx);
    let container = fx.host.layers(LayerKind::Container)[0];
    assert_eq!(fx.host.vertical_margin(container), Some(300.0));

    fx.host.set_content_height(790.0);
    open_unlocked(&mut fx);
    let container = fx.host.layers(LayerKind::Container)[1];
    assert_eq!(fx.host.vertical_margin(container), Some(MIN_VERTICAL_MARGIN));
}

#[test]
fn center_horizontal_only_skips_vertical_margin() {
    let mut fx = fixture();
    open_with(&mut fx, |s| s.center_horizontal_only(true));
    let container = fx.host.layers(LayerKind::Container)[0];
    assert_eq!(fx.host.vertical_margin(container), None);
}

#[test]
fn position_callback_replaces_centering() {
    let mut fx = fixture();
    let placed: Rc<RefCell<Vec<(NodeId, NodeId)>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&placed);
    open_with(&mut fx, move |s| {
        s.position(move |container, overlay| sink.borrow_mut().push((container, overlay)))
    });

    let container = fx.host.layers(LayerKind::Container)[0];
    let overlay = fx.host.layers(LayerKind::Overlay)[0];
    assert_eq!(*placed.borrow(), vec![(container, overlay)]);
    assert_eq!(fx.host.vertical_margin(container), None);
}

#[test]
fn hide_removes_layers_and_detaches_slot() {
    let mut fx = fixture();
    let controller = open_unlocked(&mut fx);
    fx.run(controller.ok(None)).expect("closes");

    assert!(fx.host.document().is_empty());
    assert_eq!(fx.renderer.mounted(), 0);
    assert!(fx.registry.is_empty());
    let slot = &fx.composer.slots()[0];
    assert_eq!(slot.attached_count(), 1);
    assert_eq!(slot.detached_count(), 1);
    assert_eq!(fx.composer.views()[0].unbind_count(), 1);
}

#[test]
fn document_open_marker_tracks_last_dialog() {
    let mut fx = fixture();
    assert!(!fx.host.is_document_open());
    let c1 = open_unlocked(&mut fx);
    let c2 = open_unlocked(&mut fx);
    assert!(fx.host.is_document_open());

    fx.run(c1.cancel(None)).expect("closes");
    assert!(fx.host.is_document_open());
    fx.run(c2.cancel(None)).expect("closes");
    assert!(!fx.host.is_document_open());
}

#[test]
fn key_listener_attached_once_and_detached_when_empty() {
    let mut fx = fixture();
    let c1 = open_unlocked(&mut fx);
    assert!(fx.host.has_key_listener());
    let c2 = open_unlocked(&mut fx);
    assert_eq!(fx.host.key_listener_toggles(), 1);

    fx.run(c2.ok(None)).expect("closes");
    assert!(fx.host.has_key_listener());
    fx.run(c1.ok(None)).expect("closes");
    assert!(!fx.host.has_key_listener());
    assert!(!fx.renderer.is_listening());
    assert_eq!(fx.host.key_listener_toggles(), 2);
}

// ============================================================================
// Escape
// ============================================================================

#[test]
fn escape_cancels_only_the_top_dialog() {
    let mut fx = fixture();
    let c1 = open_unlocked(&mut fx);
    let c2 = open_unlocked(&mut fx);
    let top = open_with(&mut fx, |s| s.lock(false));
    let c3 = top.controller.expect("controller");

    assert_eq!(fx.press_escape(), EventOutcome::Cancelling(c3.id()));
    assert_eq!(c3.phase(), ControllerPhase::Closed);
    assert_eq!(
        top.close_result.expect("close result").now_or_never(),
        Some(Ok(DialogResult::new(true, None)))
    );
    assert_eq!(fx.service.controllers(), vec![c1.clone(), c2.clone()]);

    assert_eq!(fx.press_escape().cancelled(), Some(c2.id()));
    assert_eq!(fx.service.controllers(), vec![c1]);
}

#[test]
fn escape_ignores_locked_top_dialog() {
    let mut fx = fixture();
    let lower = open_unlocked(&mut fx);
    let locked = open_with(&mut fx, |s| s)
        .controller
        .expect("controller");

    assert_eq!(fx.press_escape(), EventOutcome::Ignored);
    assert_eq!(locked.phase(), ControllerPhase::Open);
    assert_eq!(lower.phase(), ControllerPhase::Open);
}

#[test]
fn escape_closes_locked_dialog_when_enabled() {
    let mut fx = fixture();
    let controller = open_with(&mut fx, |s| s.enable_esc_close(true))
        .controller
        .expect("controller");

    assert_eq!(fx.press_escape(), EventOutcome::Cancelling(controller.id()));
    assert!(controller.is_settled());
}

#[test]
fn escape_press_and_other_keys_are_ignored() {
    let mut fx = fixture();
    let controller = open_unlocked(&mut fx);

    let press = DialogEvent::Key(KeyEvent::new(KeyCode::Escape, KeyEventKind::Press));
    let enter = DialogEvent::Key(KeyEvent::new(KeyCode::Enter, KeyEventKind::Release));
    assert_eq!(fx.renderer.handle_event(&press), EventOutcome::Ignored);
    assert_eq!(fx.renderer.handle_event(&enter), EventOutcome::Ignored);
    fx.settle();
    assert_eq!(controller.phase(), ControllerPhase::Open);
}

#[test]
fn vetoed_escape_keeps_dialog_on_top() {
    let mut fx = fixture();
    let vm = Rc::new(ScriptedViewModel::new("dirty").refusing_close());
    let controller = fx
        .open(DialogSettings::new(instance(&vm)).lock(false))
        .expect("opens")
        .controller
        .expect("controller");

    assert_eq!(fx.press_escape(), EventOutcome::Cancelling(controller.id()));
    assert_eq!(controller.phase(), ControllerPhase::Open);
    assert_eq!(fx.registry.top_id(), Some(controller.id()));
    assert_eq!(fx.host.layers(LayerKind::Container).len(), 1);
}

// ============================================================================
// Backdrop clicks
// ============================================================================

#[test]
fn backdrop_click_cancels_unlocked_dialog() {
    let mut fx = fixture();
    let controller = open_unlocked(&mut fx);
    let container = fx.host.layers(LayerKind::Container)[0];

    assert_eq!(
        fx.click_backdrop(container),
        EventOutcome::Cancelling(controller.id())
    );
    assert_eq!(controller.phase(), ControllerPhase::Closed);
}

#[test]
fn content_click_never_cancels() {
    let mut fx = fixture();
    let controller = open_unlocked(&mut fx);
    let container = fx.host.layers(LayerKind::Container)[0];

    assert_eq!(
        fx.renderer
            .handle_event(&DialogEvent::content_click(container)),
        EventOutcome::Ignored
    );
    fx.settle();
    assert_eq!(controller.phase(), ControllerPhase::Open);
}

#[test]
fn backdrop_click_ignored_when_locked() {
    let mut fx = fixture();
    let controller = open_with(&mut fx, |s| s.enable_esc_close(true))
        .controller
        .expect("controller");
    let container = fx.host.layers(LayerKind::Container)[0];

    assert_eq!(fx.click_backdrop(container), EventOutcome::Ignored);
    assert_eq!(controller.phase(), ControllerPhase::Open);
}

#[test]
fn backdrop_click_targets_its_own_dialog() {
    let mut fx = fixture();
    let lower = open_unlocked(&mut fx);
    let upper = open_unlocked(&mut fx);
    let lower_container = fx.host.layers(LayerKind::Container)[0];

    assert_eq!(
        fx.click_backdrop(lower_container),
        EventOutcome::Cancelling(lower.id())
    );
    assert_eq!(fx.service.controllers(), vec![upper]);
}

// ============================================================================
// Transitions
// ============================================================================

#[test]
fn show_and_hide_wait_for_transitions() {
    init_tracing();
    let mut fx = DialogFixture::with_host(
        MemoryHost::new().with_transitions(true),
        DialogOptions::default(),
    );
    let vm = Rc::new(ScriptedViewModel::new("animated"));
    let service = fx.service.clone();
    let settings = DialogSettings::new(instance(&vm)).lock(false);

    let opening = fx
        .pool
        .spawner()
        .spawn_local_with_handle(async move { service.open_and_yield_controller(settings).await })
        .expect("spawned");
    fx.settle();

    // Mounted and registered, but not reported as open yet.
    assert_eq!(fx.host.pending_transitions(), 1);
    assert_eq!(fx.registry.depth(), 1);
    assert!(fx.service.controllers().is_empty());

    fx.host.finish_transitions();
    let controller = fx
        .run(opening)
        .expect("opens")
        .controller
        .expect("controller");
    assert!(fx.service.has_open_dialog());

    let closing = controller.cancel(None);
    fx.settle();
    assert_eq!(controller.phase(), ControllerPhase::Closing);
    let container = fx.host.layers(LayerKind::Container)[0];
    assert!(!fx.host.is_active(container));
    assert_eq!(fx.composer.slots()[0].detached_count(), 0);

    fx.host.finish_transitions();
    fx.run(closing).expect("closes");
    assert!(fx.host.document().is_empty());
    assert_eq!(fx.composer.slots()[0].detached_count(), 1);
}

#[test]
fn ignore_transitions_resolves_immediately() {
    init_tracing();
    let mut fx = DialogFixture::with_host(
        MemoryHost::new().with_transitions(true),
        DialogOptions::default(),
    );
    let controller = open_with(&mut fx, |s| s.ignore_transitions(true))
        .controller
        .expect("controller");
    assert_eq!(fx.host.pending_transitions(), 0);

    fx.run(controller.ok(None)).expect("closes");
    assert_eq!(fx.host.pending_transitions(), 0);
    assert!(fx.host.document().is_empty());
}

// ============================================================================
// Host failures
// ============================================================================

#[test]
fn failure_after_registration_unmounts_dialog() {
    let mut fx = fixture();
    let vm = Rc::new(ScriptedViewModel::new("vm"));
    fx.host.fail(HostOp::SetVerticalMargin);

    let err = fx
        .open(DialogSettings::new(instance(&vm)))
        .expect_err("show fails");
    assert!(matches!(err, fdialog_core::DialogError::Host(_)));
    fx.settle();

    assert!(fx.registry.is_empty());
    assert!(fx.host.document().is_empty());
    assert!(!fx.host.has_key_listener());
    assert!(!fx.host.is_document_open());
    assert!(fx.service.controllers().is_empty());
    assert_eq!(vm.count(fdialog_core::LifecycleHook::Deactivate), 1);
}

#[test]
fn failure_before_insert_leaves_document_untouched() {
    let mut fx = fixture();
    let vm = Rc::new(ScriptedViewModel::new("vm"));
    fx.host.fail(HostOp::InsertLayers);

    assert!(fx.open(DialogSettings::new(instance(&vm))).is_err());
    assert!(fx.registry.is_empty());
    assert!(fx.host.document().is_empty());
    assert_eq!(fx.host.key_listener_toggles(), 0);
}

#[test]
fn error_close_hides_dialog() {
    let mut fx = fixture();
    let opened = open_with(&mut fx, |s| s);
    let controller = opened.controller.expect("controller");

    fx.run(controller.error(serde_json::json!("render crashed")))
        .expect("error path runs");
    assert!(fx.host.document().is_empty());
    assert!(fx.registry.is_empty());
    assert!(
        fx.run(opened.close_result.expect("close result"))
            .is_err()
    );
}
