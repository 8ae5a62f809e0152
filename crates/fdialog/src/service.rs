#![forbid(unsafe_code)]

//! Opening dialogs and closing them in bulk.
//!
//! ```text
//! open(settings)
//!   resolve settings (process-wide z-index wins)
//!   child scope + controller (registered in the child scope)
//!   resolve view-model (module/name -> composition engine)
//!   can_activate(model) --false--> cancelled / DialogCancelError
//!   compose -> renderer.show_dialog -> tracked in `controllers()`
//! ```
//!
//! # Invariants
//!
//! - `controllers()` holds exactly the dialogs that were shown and whose
//!   close result has not settled, in open order.
//! - `has_open_dialog()` and `has_active_dialog()` are `true` iff
//!   `controllers()` is non-empty.
//! - A controller is dropped from `controllers()` as soon as its close result
//!   settles, on either branch.
//! - A dialog that is never shown (vetoed, failed, or closed during
//!   `activate`) keeps no reference to its view-model, slot or view.
//! - The service holds its scope weakly, so registering the service in that
//!   scope creates no cycle.
//!
//! # Failure Modes
//!
//! - Resolution, composition and show failures propagate unchanged.
//! - A failed show triggers a best-effort `deactivate` that is spawned and
//!   never awaited; its own failure is only logged.
//! - Opening after the scope was dropped fails with
//!   [`DialogError::ScopeDropped`].

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use fdialog_core::{
    CloseAttempt, DialogError, DialogOptions, DialogResult, DialogSettings, LifecycleCall,
    ViewModel, ViewModelRef, invoke_lifecycle,
};
use futures::future::join_all;
use futures::task::{LocalSpawn, LocalSpawnExt};
use tracing::Instrument;

use crate::composition::{CompositionContext, CompositionEngine};
use crate::controller::{CloseResult, DialogController};
use crate::renderer::Renderer;
use crate::scope::{Scope, WeakScope};

/// Envelope returned when the caller wants the controller.
#[derive(Clone)]
pub struct OpenDialogResult {
    /// `true` when activation was vetoed and nothing was shown.
    pub was_cancelled: bool,
    pub controller: Option<DialogController>,
    /// Settles when the dialog closes.
    pub close_result: Option<CloseResult>,
}

impl OpenDialogResult {
    /// Envelope for a dialog whose activation was vetoed.
    pub fn cancelled() -> Self {
        Self {
            was_cancelled: true,
            controller: None,
            close_result: None,
        }
    }

    fn opened(controller: DialogController, close_result: CloseResult) -> Self {
        Self {
            was_cancelled: false,
            controller: Some(controller),
            close_result: Some(close_result),
        }
    }
}

impl fmt::Debug for OpenDialogResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenDialogResult")
            .field("was_cancelled", &self.was_cancelled)
            .field("controller", &self.controller)
            .field("close_result", &self.close_result.as_ref().map(|_| ".."))
            .finish()
    }
}

/// Result of [`DialogService::open_as_configured`].
#[derive(Debug, Clone)]
pub enum OpenOutcome {
    /// `yield_controller` was set.
    Yielded(OpenDialogResult),
    /// The dialog closed (or never opened).
    Closed(DialogResult),
}

/// How far an open got once the view-model was bound.
enum Presented {
    Shown,
    Vetoed,
    /// Settled during `activate`, before anything was shown.
    ClosedEarly,
}

struct ServiceInner {
    scope: WeakScope,
    composer: Rc<dyn CompositionEngine>,
    renderer: Rc<dyn Renderer>,
    spawner: Rc<dyn LocalSpawn>,
    options: DialogOptions,
    controllers: RefCell<Vec<DialogController>>,
    has_open_dialog: Cell<bool>,
}

impl ServiceInner {
    fn track(&self, controller: DialogController) {
        let mut controllers = self.controllers.borrow_mut();
        controllers.push(controller);
        self.has_open_dialog.set(!controllers.is_empty());
    }

    fn untrack(&self, controller: &DialogController) {
        let mut controllers = self.controllers.borrow_mut();
        if let Some(idx) = controllers.iter().position(|c| c.ptr_eq(controller)) {
            controllers.remove(idx);
            self.has_open_dialog.set(!controllers.is_empty());
            tracing::trace!(
                dialog = %controller.id(),
                open = controllers.len(),
                "dialog untracked"
            );
        }
    }
}

/// Opens dialogs and tracks the ones currently open. Clones share state.
#[derive(Clone)]
pub struct DialogService {
    inner: Rc<ServiceInner>,
}

impl DialogService {
    /// Create a service.
    ///
    /// `scope` is the parent of every dialog's child scope and is held
    /// weakly; `spawner` runs close sequences and best-effort cleanup.
    pub fn new(
        scope: Scope,
        composer: Rc<dyn CompositionEngine>,
        renderer: Rc<dyn Renderer>,
        spawner: Rc<dyn LocalSpawn>,
        options: DialogOptions,
    ) -> Self {
        Self {
            inner: Rc::new(ServiceInner {
                scope: scope.downgrade(),
                composer,
                renderer,
                spawner,
                options,
                controllers: RefCell::new(Vec::new()),
                has_open_dialog: Cell::new(false),
            }),
        }
    }

    /// Process-wide defaults applied to every open.
    pub fn options(&self) -> &DialogOptions {
        &self.inner.options
    }

    /// Scope dialogs are opened from, if it is still alive.
    pub fn scope(&self) -> Option<Scope> {
        self.inner.scope.upgrade()
    }

    /// Open dialogs, in open order.
    pub fn controllers(&self) -> Vec<DialogController> {
        self.inner.controllers.borrow().clone()
    }

    #[inline]
    pub fn has_open_dialog(&self) -> bool {
        self.inner.has_open_dialog.get()
    }

    #[inline]
    pub fn has_active_dialog(&self) -> bool {
        self.inner.has_open_dialog.get()
    }

    // --- Opening ---

    /// Open a dialog and wait for it to close.
    ///
    /// Resolves to `DialogResult { was_cancelled: true, output: None }` if
    /// activation was vetoed.
    pub async fn open(&self, settings: DialogSettings) -> Result<DialogResult, DialogError> {
        let opened = self.open_and_yield_controller(settings).await?;
        match opened.close_result {
            Some(close_result) if !opened.was_cancelled => close_result.await,
            _ => Ok(DialogResult::cancelled()),
        }
    }

    /// Open a dialog and return as soon as it is shown.
    pub async fn open_and_yield_controller(
        &self,
        settings: DialogSettings,
    ) -> Result<OpenDialogResult, DialogError> {
        let settings = settings.resolve(&self.inner.options);
        let (controller, close_result) = DialogController::new(
            Rc::clone(&self.inner.renderer),
            Rc::clone(&self.inner.spawner),
            settings,
        );
        let span = tracing::debug_span!("dialog_open", dialog = %controller.id());
        self.open_controller(controller, close_result)
            .instrument(span)
            .await
    }

    /// Open honoring the `yield_controller` setting (falling back to the
    /// process-wide default).
    pub async fn open_as_configured(
        &self,
        settings: DialogSettings,
    ) -> Result<OpenOutcome, DialogError> {
        let yield_controller = settings
            .yield_controller
            .unwrap_or(self.inner.options.yield_controller);
        if yield_controller {
            self.open_and_yield_controller(settings)
                .await
                .map(OpenOutcome::Yielded)
        } else {
            self.open(settings).await.map(OpenOutcome::Closed)
        }
    }

    async fn open_controller(
        &self,
        controller: DialogController,
        close_result: CloseResult,
    ) -> Result<OpenDialogResult, DialogError> {
        let scope = self.inner.scope.upgrade().ok_or(DialogError::ScopeDropped)?;
        let child_scope = scope.create_child();
        child_scope.register(controller.clone());

        let weak: Weak<ServiceInner> = Rc::downgrade(&self.inner);
        controller.on_settled(move |settled| {
            if let Some(inner) = weak.upgrade() {
                inner.untrack(settled);
            }
        });

        let ctx = self.resolve_view_model(&controller, scope, child_scope).await?;
        let Some(view_model) = ctx.instance() else {
            let name = ctx.view_model.lookup_name().unwrap_or_default().to_owned();
            return Err(DialogError::UnresolvedViewModel(name));
        };
        controller.bind_view_model(Rc::clone(&view_model), Rc::clone(&ctx.slot));

        match self.present(&controller, &ctx, view_model).await {
            Ok(Presented::Shown) => {}
            Ok(Presented::ClosedEarly) => {
                tracing::debug!(dialog = %controller.id(), "dialog closed before it was shown");
                return Ok(OpenDialogResult::opened(controller, close_result));
            }
            Ok(Presented::Vetoed) => {
                controller.release();
                if controller.settings().reject_on_cancel {
                    return Err(DialogError::cancelled(None));
                }
                return Ok(OpenDialogResult::cancelled());
            }
            Err(err) => {
                controller.release();
                return Err(err);
            }
        }

        if controller.is_settled() {
            tracing::debug!(dialog = %controller.id(), "dialog settled while opening");
        } else {
            self.inner.track(controller.clone());
        }
        tracing::debug!(
            dialog = %controller.id(),
            open = self.inner.controllers.borrow().len(),
            "dialog opened"
        );
        Ok(OpenDialogResult::opened(controller, close_result))
    }

    /// Activation gate, composition and show for a controller whose
    /// view-model is bound.
    async fn present(
        &self,
        controller: &DialogController,
        ctx: &CompositionContext,
        view_model: Rc<dyn ViewModel>,
    ) -> Result<Presented, DialogError> {
        let model = controller.settings().model.as_ref();
        if !invoke_lifecycle(view_model.as_ref(), LifecycleCall::CanActivate(model)).await? {
            tracing::debug!(dialog = %controller.id(), "activation vetoed by canActivate");
            return Ok(Presented::Vetoed);
        }

        let view = self.inner.composer.compose(ctx).await?;
        if controller.is_settled() {
            // The close sequence ran before the view existed.
            view.unbind();
            return Ok(Presented::ClosedEarly);
        }
        controller.bind_view(view);

        if let Err(err) = self.inner.renderer.show_dialog(controller).await {
            tracing::debug!(dialog = %controller.id(), %err, "show failed");
            self.deactivate_detached(controller, view_model);
            return Err(err);
        }
        Ok(Presented::Shown)
    }

    async fn resolve_view_model(
        &self,
        controller: &DialogController,
        scope: Scope,
        child_scope: Scope,
    ) -> Result<CompositionContext, DialogError> {
        let settings = controller.settings();
        let host = self.inner.renderer.dialog_container()?;
        let view_model = match &settings.view_model {
            ViewModelRef::Module(id) => ViewModelRef::named(*id),
            other => other.clone(),
        };
        let ctx = CompositionContext {
            scope,
            child_scope,
            view_model,
            view: settings.view.clone(),
            model: settings.model.clone(),
            host,
            slot: self.inner.composer.create_view_slot(host),
        };

        if ctx.instance().is_some() {
            return Ok(ctx);
        }
        self.inner.composer.ensure_view_model(ctx).await
    }

    fn deactivate_detached(&self, controller: &DialogController, view_model: Rc<dyn ViewModel>) {
        let dialog = controller.id();
        let cleanup = async move {
            let outcome = invoke_lifecycle(view_model.as_ref(), LifecycleCall::Deactivate).await;
            if let Err(err) = outcome {
                tracing::warn!(%dialog, %err, "deactivate after failed show also failed");
            }
        };
        if let Err(err) = self.inner.spawner.spawn_local(cleanup) {
            tracing::warn!(%dialog, %err, "deactivate after failed show not spawned");
        }
    }

    // --- Closing ---

    /// Cancel every open dialog and return the ones that refused to close.
    ///
    /// All cancels run concurrently and every attempt is allowed to finish.
    /// A dialog counts as refusing when its `can_deactivate` vetoed, or, for
    /// `reject_on_cancel` dialogs, when its attempt was rejected with a
    /// cancellation. Any other failure is returned (the first one, in open
    /// order) once all attempts have finished.
    pub async fn close_all(&self) -> Result<Vec<DialogController>, DialogError> {
        let snapshot = self.controllers();
        tracing::debug!(open = snapshot.len(), "closing all dialogs");

        let attempts = snapshot.into_iter().map(|controller| async move {
            match controller.cancel(None).await {
                Ok(CloseAttempt::Closed) => Ok(None),
                Ok(CloseAttempt::Vetoed) => Ok(Some(controller)),
                Err(err) if err.is_cancellation() && controller.settings().reject_on_cancel => {
                    Ok(Some(controller))
                }
                Err(err) => Err(err),
            }
        });

        let mut unclosed = Vec::new();
        for outcome in join_all(attempts).await {
            if let Some(controller) = outcome? {
                unclosed.push(controller);
            }
        }
        Ok(unclosed)
    }
}

impl fmt::Debug for DialogService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogService")
            .field("options", &self.inner.options)
            .field("scope", &self.inner.scope)
            .field("controllers", &self.inner.controllers.borrow())
            .finish_non_exhaustive()
    }
}
