#![forbid(unsafe_code)]

//! Reference composition engine.
//!
//! [`RegistryComposer`] resolves named view-models from a name -> factory
//! table. Factories receive the dialog's child [`Scope`], so a view-model can
//! pick up its own [`fdialog::DialogController`]. Composition runs the
//! view-model's `activate` hook with the dialog model and produces a
//! [`BoundView`] rooted at the dialog's host node.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use async_trait::async_trait;
use fdialog::{ComposedView, CompositionContext, CompositionEngine, Scope, ViewSlot};
use fdialog_core::{DialogError, LifecycleCall, NodeId, ViewModel, ViewModelRef, invoke_lifecycle};

type Factory = Box<dyn Fn(&Scope) -> Rc<dyn ViewModel>>;

/// View slot over a host anchor that counts attach/detach calls.
#[derive(Debug)]
pub struct AnchorSlot {
    anchor: NodeId,
    attached: Cell<usize>,
    detached: Cell<usize>,
}

impl AnchorSlot {
    pub fn new(anchor: NodeId) -> Self {
        Self {
            anchor,
            attached: Cell::new(0),
            detached: Cell::new(0),
        }
    }

    pub fn attached_count(&self) -> usize {
        self.attached.get()
    }

    pub fn detached_count(&self) -> usize {
        self.detached.get()
    }

    /// Attached and not yet detached.
    pub fn is_attached(&self) -> bool {
        self.attached.get() > self.detached.get()
    }
}

impl ViewSlot for AnchorSlot {
    fn anchor(&self) -> NodeId {
        self.anchor
    }

    fn attached(&self) {
        self.attached.set(self.attached.get() + 1);
    }

    fn detached(&self) {
        self.detached.set(self.detached.get() + 1);
    }
}

/// Composed view that records unbinding.
#[derive(Debug)]
pub struct BoundView {
    root: NodeId,
    view: Option<String>,
    unbinds: Cell<usize>,
}

impl BoundView {
    /// Name of the view template, if one was requested.
    pub fn template(&self) -> Option<&str> {
        self.view.as_deref()
    }

    pub fn unbind_count(&self) -> usize {
        self.unbinds.get()
    }
}

impl ComposedView for BoundView {
    fn view(&self) -> Option<NodeId> {
        Some(self.root)
    }

    fn unbind(&self) {
        self.unbinds.set(self.unbinds.get() + 1);
    }
}

/// Name -> factory composition engine.
#[derive(Default)]
pub struct RegistryComposer {
    factories: RefCell<BTreeMap<String, Factory>>,
    slots: RefCell<Vec<Rc<AnchorSlot>>>,
    views: RefCell<Vec<Rc<BoundView>>>,
    compose_failure: RefCell<Option<String>>,
}

impl RegistryComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `name`.
    pub fn register(
        &self,
        name: impl Into<String>,
        factory: impl Fn(&Scope) -> Rc<dyn ViewModel> + 'static,
    ) {
        self.factories
            .borrow_mut()
            .insert(name.into(), Box::new(factory));
    }

    /// Register a ready instance under `name`; every resolution returns it.
    pub fn register_instance(&self, name: impl Into<String>, view_model: Rc<dyn ViewModel>) {
        self.register(name, move |_| Rc::clone(&view_model));
    }

    /// Make every later `compose` fail with `message`.
    pub fn fail_compose(&self, message: impl Into<String>) {
        *self.compose_failure.borrow_mut() = Some(message.into());
    }

    /// Slots handed out so far, in creation order.
    pub fn slots(&self) -> Vec<Rc<AnchorSlot>> {
        self.slots.borrow().clone()
    }

    /// Views composed so far, in composition order.
    pub fn views(&self) -> Vec<Rc<BoundView>> {
        self.views.borrow().clone()
    }
}

#[async_trait(?Send)]
impl CompositionEngine for RegistryComposer {
    fn create_view_slot(&self, host: NodeId) -> Rc<dyn ViewSlot> {
        let slot = Rc::new(AnchorSlot::new(host));
        self.slots.borrow_mut().push(Rc::clone(&slot));
        slot
    }

    async fn ensure_view_model(
        &self,
        mut ctx: CompositionContext,
    ) -> Result<CompositionContext, DialogError> {
        let Some(name) = ctx.view_model.lookup_name().map(str::to_owned) else {
            return Ok(ctx);
        };
        let factories = self.factories.borrow();
        match factories.get(&name) {
            Some(factory) => {
                tracing::trace!(view_model = %name, "view-model resolved");
                ctx.view_model = ViewModelRef::Instance(factory(&ctx.child_scope));
                Ok(ctx)
            }
            None => Err(DialogError::UnresolvedViewModel(name)),
        }
    }

    async fn compose(&self, ctx: &CompositionContext) -> Result<Rc<dyn ComposedView>, DialogError> {
        if let Some(message) = self.compose_failure.borrow().clone() {
            return Err(DialogError::host(message));
        }
        let view_model = ctx
            .instance()
            .ok_or_else(|| DialogError::UnresolvedViewModel(format!("{:?}", ctx.view_model)))?;
        invoke_lifecycle(view_model.as_ref(), LifecycleCall::Activate(ctx.model.as_ref())).await?;

        let view = Rc::new(BoundView {
            root: ctx.host,
            view: ctx.view.clone(),
            unbinds: Cell::new(0),
        });
        self.views.borrow_mut().push(Rc::clone(&view));
        Ok(view)
    }
}

impl fmt::Debug for RegistryComposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryComposer")
            .field("names", &self.factories.borrow().keys().collect::<Vec<_>>())
            .field("slots", &self.slots.borrow().len())
            .field("views", &self.views.borrow().len())
            .finish()
    }
}
