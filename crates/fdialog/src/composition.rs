#![forbid(unsafe_code)]

//! Contracts for the external composition system.
//!
//! Dialogs do not render or bind views themselves. The service hands a
//! [`CompositionContext`] to a [`CompositionEngine`], which resolves named
//! view-models and composes the bound view. The renderer only needs the
//! [`ViewSlot`] the view is mounted through.

use std::fmt;
use std::rc::Rc;

use async_trait::async_trait;
use fdialog_core::{DialogError, NodeId, Value, ViewModel, ViewModelRef};

use crate::scope::Scope;

/// Mount point for a composed view.
pub trait ViewSlot {
    /// The host node the view is mounted into.
    fn anchor(&self) -> NodeId;

    /// The slot's content entered the document.
    fn attached(&self);

    /// The slot's content left the document.
    fn detached(&self);
}

/// A bound view produced by composition.
pub trait ComposedView {
    /// Root node of the view, if the engine exposes one.
    fn view(&self) -> Option<NodeId>;

    /// Release bindings. Called once the dialog has been hidden.
    fn unbind(&self);
}

/// Everything a composition engine needs to produce a dialog's view.
#[derive(Clone)]
pub struct CompositionContext {
    /// Scope the dialog was opened from.
    pub scope: Scope,
    /// Isolated scope for this dialog; holds its controller.
    pub child_scope: Scope,
    pub view_model: ViewModelRef,
    pub view: Option<String>,
    pub model: Option<Value>,
    /// Node returned by the renderer's `dialog_container`.
    pub host: NodeId,
    pub slot: Rc<dyn ViewSlot>,
}

impl CompositionContext {
    /// The resolved view-model instance, if resolution has happened.
    pub fn instance(&self) -> Option<Rc<dyn ViewModel>> {
        match &self.view_model {
            ViewModelRef::Instance(view_model) => Some(Rc::clone(view_model)),
            _ => None,
        }
    }
}

impl fmt::Debug for CompositionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositionContext")
            .field("view_model", &self.view_model)
            .field("view", &self.view)
            .field("model", &self.model)
            .field("host", &self.host)
            .field("anchor", &self.slot.anchor())
            .finish_non_exhaustive()
    }
}

/// External composition engine.
#[async_trait(?Send)]
pub trait CompositionEngine {
    /// Create the slot a dialog's view will be mounted through.
    fn create_view_slot(&self, host: NodeId) -> Rc<dyn ViewSlot>;

    /// Resolve a named view-model reference to an instance.
    ///
    /// Only called when `ctx.view_model` is not already an instance.
    async fn ensure_view_model(
        &self,
        ctx: CompositionContext,
    ) -> Result<CompositionContext, DialogError>;

    /// Compose the view for a resolved context.
    ///
    /// Engines are expected to run the view-model's `activate` hook here.
    async fn compose(&self, ctx: &CompositionContext) -> Result<Rc<dyn ComposedView>, DialogError>;
}
