#![forbid(unsafe_code)]

//! Default renderer: one overlay and one container layer per dialog.
//!
//! # Invariants
//!
//! - A new dialog's layers are inserted directly after the topmost mounted
//!   container, so later dialogs always stack above earlier ones.
//! - The key listener is attached when the registry goes from empty to one
//!   dialog and detached when it becomes empty again.
//! - Escape (on key release) only ever targets the registry's top dialog, and
//!   only if that dialog is unlocked or explicitly allows Escape while locked.
//! - A backdrop click cancels its own dialog unless locked; clicks on the
//!   dialog content never do.
//! - The document-open marker is cleared only once the last dialog is gone.
//!
//! # Failure Modes
//!
//! - Host failures propagate unchanged. A failure after the dialog was
//!   registered unmounts it again before the error is returned.
//! - A transition end that never arrives leaves `show_dialog`/`hide_dialog`
//!   pending forever.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use async_trait::async_trait;
use fdialog_core::{DialogError, HostError, NodeId};
use futures::future::LocalBoxFuture;

use super::event::{ClickEvent, DialogEvent, EventOutcome, KeyCode, KeyEvent, KeyEventKind};
use super::host::{DialogHost, LayerKind};
use super::registry::DialogRegistry;
use super::Renderer;
use crate::composition::ViewSlot;
use crate::controller::{DialogController, DialogId};

/// Smallest top/bottom margin applied when centering a dialog.
pub const MIN_VERTICAL_MARGIN: f32 = 30.0;

struct Mount {
    dialog: DialogId,
    controller: DialogController,
    overlay: NodeId,
    container: NodeId,
    /// Backdrop clicks are routed only while set.
    interactive: bool,
}

/// Renders dialogs as overlay + container layers of a [`DialogHost`].
pub struct LayerRenderer<H: DialogHost> {
    host: Rc<H>,
    registry: Rc<DialogRegistry>,
    mounts: RefCell<Vec<Mount>>,
    listening: Cell<bool>,
}

impl<H: DialogHost> LayerRenderer<H> {
    /// Create a renderer over `host` sharing `registry`.
    pub fn new(host: Rc<H>, registry: Rc<DialogRegistry>) -> Self {
        Self {
            host,
            registry,
            mounts: RefCell::new(Vec::new()),
            listening: Cell::new(false),
        }
    }

    /// The registry of displayed dialogs.
    pub fn registry(&self) -> &Rc<DialogRegistry> {
        &self.registry
    }

    /// The host document.
    pub fn host(&self) -> &Rc<H> {
        &self.host
    }

    /// Whether this renderer's key listener is attached.
    pub fn is_listening(&self) -> bool {
        self.listening.get()
    }

    /// Number of dialogs mounted by this renderer.
    pub fn mounted(&self) -> usize {
        self.mounts.borrow().len()
    }

    // --- Event Handling ---

    /// Route a host input event.
    ///
    /// Cancels are requested on the targeted controller and run on its
    /// spawner; this call never waits for them.
    pub fn handle_event(&self, event: &DialogEvent) -> EventOutcome {
        let target = match event {
            DialogEvent::Key(key) => self.escape_target(key),
            DialogEvent::Click(click) => self.backdrop_target(click),
        };

        match target {
            Some(controller) => {
                tracing::debug!(dialog = %controller.id(), "dismissing dialog");
                // The attempt is tracked by the controller itself.
                let _ = controller.cancel(None);
                EventOutcome::Cancelling(controller.id())
            }
            None => EventOutcome::Ignored,
        }
    }

    fn escape_target(&self, key: &KeyEvent) -> Option<DialogController> {
        if !self.listening.get() || key.code != KeyCode::Escape || key.kind != KeyEventKind::Release
        {
            return None;
        }
        self.registry
            .top()
            .filter(|top| top.settings().escape_closes())
    }

    fn backdrop_target(&self, click: &ClickEvent) -> Option<DialogController> {
        if click.on_content {
            return None;
        }
        let mounts = self.mounts.borrow();
        let mount = mounts
            .iter()
            .find(|m| m.interactive && m.container == click.container)?;
        mount
            .controller
            .settings()
            .backdrop_closes()
            .then(|| mount.controller.clone())
    }

    // --- Mounting ---

    fn set_listener(&self, attached: bool) {
        if self.listening.replace(attached) != attached {
            tracing::trace!(attached, "dialog key listener");
            self.host.set_key_listener(attached);
        }
    }

    fn transition(&self, container: NodeId, ignore: bool) -> Option<LocalBoxFuture<'static, ()>> {
        (!ignore && self.host.has_transition(container))
            .then(|| self.host.transition_end(container))
    }

    fn center(&self, container: NodeId) -> Result<(), HostError> {
        let margin = vertical_margin(
            self.host.viewport_height(),
            self.host.content_height(container),
        );
        self.host.set_vertical_margin(container, margin)
    }

    /// Steps of `show_dialog` that run once the dialog is registered.
    async fn present(
        &self,
        controller: &DialogController,
        slot: &dyn ViewSlot,
        overlay: NodeId,
        container: NodeId,
    ) -> Result<(), DialogError> {
        let settings = controller.settings();
        slot.attached();

        match &settings.position {
            Some(position) => position(container, overlay),
            None if !settings.center_horizontal_only => self.center(container)?,
            None => {}
        }

        if let Some(mount) = self
            .mounts
            .borrow_mut()
            .iter_mut()
            .find(|m| m.dialog == controller.id())
        {
            mount.interactive = true;
        }

        let transition = self.transition(container, settings.ignore_transitions);
        self.host.set_active(overlay, true)?;
        self.host.set_active(container, true)?;
        self.host.set_document_open(true);

        if let Some(transition) = transition {
            transition.await;
        }
        Ok(())
    }

    fn take_mount(&self, dialog: DialogId) -> Option<Mount> {
        let mut mounts = self.mounts.borrow_mut();
        let idx = mounts.iter().position(|m| m.dialog == dialog)?;
        Some(mounts.remove(idx))
    }

    fn unregister(&self, dialog: DialogId) {
        self.registry.remove(dialog);
        if self.registry.is_empty() {
            self.set_listener(false);
        }
    }

    fn abort_mount(&self, dialog: DialogId) {
        self.unregister(dialog);
        if let Some(mount) = self.take_mount(dialog) {
            for node in [mount.overlay, mount.container] {
                if let Err(err) = self.host.remove(node) {
                    tracing::warn!(%dialog, %node, %err, "failed to remove dialog layer");
                }
            }
        }
        if self.registry.is_empty() {
            self.host.set_document_open(false);
        }
    }
}

#[async_trait(?Send)]
impl<H: DialogHost> Renderer for LayerRenderer<H> {
    fn dialog_container(&self) -> Result<NodeId, DialogError> {
        Ok(self.host.create_anchor()?)
    }

    async fn show_dialog(&self, controller: &DialogController) -> Result<(), DialogError> {
        let dialog = controller.id();
        let slot = controller
            .slot()
            .ok_or_else(|| DialogError::host(format!("{dialog} has no view slot")))?;
        let z_index = controller.settings().starting_z_index;

        let overlay = self.host.create_layer(LayerKind::Overlay)?;
        let container = self.host.create_layer(LayerKind::Container)?;
        let wrapper = self.host.create_layer(LayerKind::Wrapper)?;
        self.host.append_child(wrapper, slot.anchor())?;
        self.host.append_child(container, wrapper)?;
        self.host.set_z_index(overlay, z_index)?;
        self.host.set_z_index(container, z_index)?;

        let after = self.mounts.borrow().last().map(|m| m.container);
        self.host.insert_layers(overlay, container, after)?;

        if self.registry.is_empty() {
            self.set_listener(true);
        }
        let depth = self.registry.push(controller.clone());
        self.mounts.borrow_mut().push(Mount {
            dialog,
            controller: controller.clone(),
            overlay,
            container,
            interactive: false,
        });
        tracing::debug!(%dialog, depth, z_index, "showing dialog");

        if let Err(err) = self.present(controller, slot.as_ref(), overlay, container).await {
            self.abort_mount(dialog);
            return Err(err);
        }
        Ok(())
    }

    async fn hide_dialog(&self, controller: &DialogController) -> Result<(), DialogError> {
        let dialog = controller.id();
        if let Some(mount) = self
            .mounts
            .borrow_mut()
            .iter_mut()
            .find(|m| m.dialog == dialog)
        {
            mount.interactive = false;
        }

        self.unregister(dialog);

        let Some((overlay, container)) = self
            .mounts
            .borrow()
            .iter()
            .find(|m| m.dialog == dialog)
            .map(|m| (m.overlay, m.container))
        else {
            tracing::debug!(%dialog, "hide requested for a dialog that is not mounted");
            return Ok(());
        };
        tracing::debug!(%dialog, remaining = self.registry.depth(), "hiding dialog");

        let transition = self.transition(container, controller.settings().ignore_transitions);
        self.host.set_active(overlay, false)?;
        self.host.set_active(container, false)?;
        if let Some(transition) = transition {
            transition.await;
        }

        self.host.remove(overlay)?;
        self.host.remove(container)?;
        self.take_mount(dialog);
        if let Some(slot) = controller.slot() {
            slot.detached();
        }

        if self.registry.is_empty() {
            self.host.set_document_open(false);
        }
        Ok(())
    }
}

impl<H: DialogHost> fmt::Debug for LayerRenderer<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerRenderer")
            .field("registry", &self.registry)
            .field("mounted", &self.mounted())
            .field("listening", &self.listening.get())
            .finish_non_exhaustive()
    }
}

/// Equal top/bottom margin that centers content of height `content` in a
/// viewport of height `viewport`.
fn vertical_margin(viewport: f32, content: f32) -> f32 {
    ((viewport - content) / 2.0).max(MIN_VERTICAL_MARGIN)
}
