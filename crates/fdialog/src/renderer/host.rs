#![forbid(unsafe_code)]

//! Contract for the document dialogs are mounted into.
//!
//! The host owns real nodes (DOM elements, terminal layers, ...). The
//! renderer only drives it through this trait, so every failure the host
//! reports propagates to the caller of `show_dialog`/`hide_dialog` unchanged.
//!
//! # Layout produced per dialog
//!
//! ```text
//! document
//! ├── overlay      (LayerKind::Overlay, z = starting z-index)
//! └── container    (LayerKind::Container, z = starting z-index)
//!     └── wrapper  (LayerKind::Wrapper)
//!         └── anchor (from dialog_container / view slot)
//! ```

use fdialog_core::{HostError, NodeId};
use futures::future::LocalBoxFuture;

/// Kind of layer node the renderer asks the host to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    /// Full-screen backdrop behind a dialog.
    Overlay,
    /// Full-screen container holding the dialog content.
    Container,
    /// Padding wrapper between container and anchor.
    Wrapper,
}

/// Document abstraction used by [`super::LayerRenderer`].
pub trait DialogHost {
    /// Create a detached node for a view slot to anchor to.
    fn create_anchor(&self) -> Result<NodeId, HostError>;

    /// Create a detached layer node.
    fn create_layer(&self, kind: LayerKind) -> Result<NodeId, HostError>;

    /// Append `child` to `parent`.
    fn append_child(&self, parent: NodeId, child: NodeId) -> Result<(), HostError>;

    /// Insert `overlay` and then `container` into the document.
    ///
    /// With `after = Some(node)` both go directly after `node`, overlay first.
    /// With `None` they go to the front of the document, overlay first.
    fn insert_layers(
        &self,
        overlay: NodeId,
        container: NodeId,
        after: Option<NodeId>,
    ) -> Result<(), HostError>;

    /// Remove a node from the document.
    fn remove(&self, node: NodeId) -> Result<(), HostError>;

    /// Set a node's stacking order.
    fn set_z_index(&self, node: NodeId, z_index: u32) -> Result<(), HostError>;

    /// Toggle the active (visible) state that drives transitions.
    fn set_active(&self, node: NodeId, active: bool) -> Result<(), HostError>;

    /// Mark the document as having at least one open dialog.
    fn set_document_open(&self, open: bool);

    /// Whether changing `node`'s active state runs a transition.
    fn has_transition(&self, node: NodeId) -> bool;

    /// Completes when the next transition on `node` ends.
    ///
    /// Must be requested before the state change that starts the transition.
    fn transition_end(&self, node: NodeId) -> LocalBoxFuture<'static, ()>;

    /// Height of the visible viewport.
    fn viewport_height(&self) -> f32;

    /// Height of the content inside `container`.
    fn content_height(&self, container: NodeId) -> f32;

    /// Apply equal top and bottom margins to the content inside `container`.
    fn set_vertical_margin(&self, container: NodeId, margin: f32) -> Result<(), HostError>;

    /// Attach or detach the document-wide key listener.
    fn set_key_listener(&self, attached: bool);
}
