#![forbid(unsafe_code)]

//! Dialog rendering: host contract, open-dialog registry and the default
//! layer renderer.
//!
//! - [`Renderer`]: what controllers and the service need from a renderer.
//! - [`DialogHost`]: the document the dialogs are mounted into.
//! - [`DialogRegistry`]: the stack of displayed dialogs, owned by whoever
//!   builds the renderer and shared explicitly.
//! - [`LayerRenderer`]: overlay + container layers per dialog, transition
//!   waits, Escape and backdrop handling.
//!
//! # Example
//!
//! ```ignore
//! let registry = Rc::new(DialogRegistry::new());
//! let renderer = Rc::new(LayerRenderer::new(host, Rc::clone(&registry)));
//!
//! // Route input from the host's event loop.
//! renderer.handle_event(&DialogEvent::escape_released());
//! ```

mod event;
mod host;
mod layer;
mod registry;

pub use event::{ClickEvent, DialogEvent, EventOutcome, KeyCode, KeyEvent, KeyEventKind};
pub use host::{DialogHost, LayerKind};
pub use layer::{LayerRenderer, MIN_VERTICAL_MARGIN};
pub use registry::DialogRegistry;

use async_trait::async_trait;
use fdialog_core::{DialogError, NodeId};

use crate::controller::DialogController;

/// Displays and hides dialogs.
#[async_trait(?Send)]
pub trait Renderer {
    /// Create the node a dialog's view slot is anchored to.
    fn dialog_container(&self) -> Result<NodeId, DialogError>;

    /// Display the dialog; resolves once the opening transition finished.
    async fn show_dialog(&self, controller: &DialogController) -> Result<(), DialogError>;

    /// Hide the dialog; resolves once it has been removed from the host.
    async fn hide_dialog(&self, controller: &DialogController) -> Result<(), DialogError>;
}
