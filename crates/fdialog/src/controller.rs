#![forbid(unsafe_code)]

//! Per-dialog lifecycle state machine.
//!
//! A [`DialogController`] is created for every `open` and owns the sender
//! half of the dialog's close result. Closing runs strictly in sequence:
//!
//! ```text
//! can_deactivate(ok) -> deactivate() -> renderer.hide_dialog -> unbind -> settle
//! ```
//!
//! # State machine
//!
//! ```text
//!            close/ok/cancel                 sequence succeeded
//!   Open ---------------------> Closing ---------------------------> Closed
//!    ^                             |
//!    +-----------------------------+  vetoed or failed
//!
//!   Open/Closing --error()--> Rejected
//! ```
//!
//! # Invariants
//!
//! - At most one close sequence runs per controller. A `close`, `ok` or
//!   `cancel` issued while `Closing` returns the in-flight [`PendingClose`];
//!   after `Closed` it returns the completed one.
//! - A vetoed or failed close sequence returns the controller to `Open`, so a
//!   later attempt can run.
//! - The close result settles at most once.
//! - Close sequences are eager: they are spawned when requested and progress
//!   even if nobody awaits the returned handle.
//!
//! # Failure Modes
//!
//! - Hook, renderer or unbind failures reject the close attempt unchanged.
//! - A hook or transition that never completes leaves the controller
//!   `Closing` forever; there is no timeout.
//! - `close`/`error` on a `Rejected` controller yield [`DialogError::Inactive`].

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use fdialog_core::{
    CloseAttempt, DialogError, DialogResult, LifecycleCall, ResolvedSettings, Value, ViewModel,
    invoke_lifecycle,
};
use futures::channel::oneshot;
use futures::future::{self, FutureExt, LocalBoxFuture, Shared};
use futures::task::{LocalSpawn, LocalSpawnExt};
use tracing::Instrument;

use crate::composition::{ComposedView, ViewSlot};
use crate::renderer::Renderer;

/// Global counter for unique dialog IDs.
static DIALOG_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier of an opened dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DialogId(u64);

impl DialogId {
    fn next() -> Self {
        Self(DIALOG_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DialogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dialog#{}", self.0)
    }
}

/// Shared handle to a close attempt. Every clone observes the same outcome.
pub type PendingClose = Shared<LocalBoxFuture<'static, Result<CloseAttempt, DialogError>>>;

/// Shared handle to a dialog's final result.
pub type CloseResult = Shared<LocalBoxFuture<'static, Result<DialogResult, DialogError>>>;

/// Observable phase of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerPhase {
    Open,
    Closing,
    Closed,
    Rejected,
}

enum Phase {
    Open,
    Closing(PendingClose),
    Closed(PendingClose),
    Rejected,
}

impl Phase {
    fn kind(&self) -> ControllerPhase {
        match self {
            Self::Open => ControllerPhase::Open,
            Self::Closing(_) => ControllerPhase::Closing,
            Self::Closed(_) => ControllerPhase::Closed,
            Self::Rejected => ControllerPhase::Rejected,
        }
    }
}

type SettleSender = oneshot::Sender<Result<DialogResult, DialogError>>;
type SettleObserver = Box<dyn FnOnce(&DialogController)>;

struct ControllerInner {
    id: DialogId,
    renderer: Rc<dyn Renderer>,
    spawner: Rc<dyn LocalSpawn>,
    settings: ResolvedSettings,
    view_model: RefCell<Option<Rc<dyn ViewModel>>>,
    slot: RefCell<Option<Rc<dyn ViewSlot>>>,
    view: RefCell<Option<Rc<dyn ComposedView>>>,
    phase: RefCell<Phase>,
    settle: RefCell<Option<SettleSender>>,
    observers: RefCell<Vec<SettleObserver>>,
}

/// Controller of one open dialog. Clones share the same dialog.
#[derive(Clone)]
pub struct DialogController {
    inner: Rc<ControllerInner>,
}

impl DialogController {
    /// Create a controller and the close result it will settle.
    pub fn new(
        renderer: Rc<dyn Renderer>,
        spawner: Rc<dyn LocalSpawn>,
        settings: ResolvedSettings,
    ) -> (Self, CloseResult) {
        let (sender, receiver) = oneshot::channel();
        let controller = Self {
            inner: Rc::new(ControllerInner {
                id: DialogId::next(),
                renderer,
                spawner,
                settings,
                view_model: RefCell::new(None),
                slot: RefCell::new(None),
                view: RefCell::new(None),
                phase: RefCell::new(Phase::Open),
                settle: RefCell::new(Some(sender)),
                observers: RefCell::new(Vec::new()),
            }),
        };
        let close_result = receiver
            .map(|received| received.unwrap_or(Err(DialogError::Abandoned)))
            .boxed_local()
            .shared();
        (controller, close_result)
    }

    /// Unique id of this dialog.
    #[inline]
    pub fn id(&self) -> DialogId {
        self.inner.id
    }

    /// Settings fixed at open time.
    #[inline]
    pub fn settings(&self) -> &ResolvedSettings {
        &self.inner.settings
    }

    /// The renderer displaying this dialog.
    pub fn renderer(&self) -> Rc<dyn Renderer> {
        Rc::clone(&self.inner.renderer)
    }

    /// Current phase.
    pub fn phase(&self) -> ControllerPhase {
        self.inner.phase.borrow().kind()
    }

    /// Whether the close result has been settled.
    pub fn is_settled(&self) -> bool {
        self.inner.settle.borrow().is_none()
    }

    /// The view-model instance. Released once the dialog settles.
    pub fn view_model(&self) -> Option<Rc<dyn ViewModel>> {
        self.inner.view_model.borrow().clone()
    }

    /// The slot the view is mounted through.
    pub fn slot(&self) -> Option<Rc<dyn ViewSlot>> {
        self.inner.slot.borrow().clone()
    }

    /// The composed view.
    pub fn view(&self) -> Option<Rc<dyn ComposedView>> {
        self.inner.view.borrow().clone()
    }

    pub(crate) fn bind_view_model(&self, view_model: Rc<dyn ViewModel>, slot: Rc<dyn ViewSlot>) {
        *self.inner.view_model.borrow_mut() = Some(view_model);
        *self.inner.slot.borrow_mut() = Some(slot);
    }

    pub(crate) fn bind_view(&self, view: Rc<dyn ComposedView>) {
        *self.inner.view.borrow_mut() = Some(view);
    }

    /// Run `observer` once the close result settles, on either branch.
    pub fn on_settled(&self, observer: impl FnOnce(&DialogController) + 'static) {
        self.inner.observers.borrow_mut().push(Box::new(observer));
    }

    /// Whether two handles refer to the same dialog.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // --- Close operations ---

    /// Close successfully with `output`.
    pub fn ok(&self, output: Option<Value>) -> PendingClose {
        self.close(true, output)
    }

    /// Close as cancelled with `output`.
    pub fn cancel(&self, output: Option<Value>) -> PendingClose {
        self.close(false, output)
    }

    /// Request a close. `ok` selects between the ok and cancel branches.
    ///
    /// Returns the in-flight attempt if one is already running.
    pub fn close(&self, ok: bool, output: Option<Value>) -> PendingClose {
        let pending = {
            let mut phase = self.inner.phase.borrow_mut();
            match &*phase {
                Phase::Closing(pending) | Phase::Closed(pending) => return pending.clone(),
                Phase::Rejected => {
                    return future::ready(Err(DialogError::Inactive))
                        .boxed_local()
                        .shared();
                }
                Phase::Open => {}
            }

            let this = self.clone();
            let span = tracing::debug_span!("dialog_close", dialog = %self.inner.id, ok);
            let pending = async move { this.run_close(ok, output).await }
                .instrument(span)
                .boxed_local()
                .shared();
            *phase = Phase::Closing(pending.clone());
            pending
        };

        if let Err(err) = self.inner.spawner.spawn_local(pending.clone().map(drop)) {
            tracing::warn!(
                dialog = %self.inner.id,
                %err,
                "close sequence not spawned; it runs when awaited"
            );
        }
        pending
    }

    /// Close the dialog because of a failure that happened while it was showing.
    ///
    /// Skips `can_deactivate`, tears the dialog down and rejects the close
    /// result with [`DialogError::Errored`].
    pub async fn error(&self, message: Value) -> Result<(), DialogError> {
        if matches!(
            self.phase(),
            ControllerPhase::Closed | ControllerPhase::Rejected
        ) {
            return Err(DialogError::Inactive);
        }

        tracing::debug!(dialog = %self.inner.id, "closing dialog with error");
        self.teardown().await?;
        *self.inner.phase.borrow_mut() = Phase::Rejected;
        self.settle(Err(DialogError::Errored(message)));
        Ok(())
    }

    // --- Close sequence ---

    async fn run_close(
        &self,
        ok: bool,
        output: Option<Value>,
    ) -> Result<CloseAttempt, DialogError> {
        let outcome = self.close_sequence(ok, output).await;
        if !matches!(outcome, Ok(CloseAttempt::Closed)) {
            let mut phase = self.inner.phase.borrow_mut();
            if matches!(*phase, Phase::Closing(_)) {
                *phase = Phase::Open;
            }
        }
        outcome
    }

    async fn close_sequence(
        &self,
        ok: bool,
        output: Option<Value>,
    ) -> Result<CloseAttempt, DialogError> {
        let reject_on_cancel = self.inner.settings.reject_on_cancel;

        let can_deactivate = match self.view_model() {
            Some(view_model) => {
                invoke_lifecycle(view_model.as_ref(), LifecycleCall::CanDeactivate(ok)).await?
            }
            None => true,
        };

        if !can_deactivate {
            tracing::debug!(dialog = %self.inner.id, "close vetoed by canDeactivate");
            if reject_on_cancel {
                return Err(DialogError::cancelled(None));
            }
            return Ok(CloseAttempt::Vetoed);
        }

        self.teardown().await?;

        {
            let mut phase = self.inner.phase.borrow_mut();
            if let Phase::Closing(pending) = &*phase {
                let pending = pending.clone();
                *phase = Phase::Closed(pending);
            }
        }

        let result = DialogResult::new(!ok, output);
        if ok || !reject_on_cancel {
            self.settle(Ok(result));
        } else {
            self.settle(Err(DialogError::cancelled(result.output)));
        }
        Ok(CloseAttempt::Closed)
    }

    async fn teardown(&self) -> Result<(), DialogError> {
        if let Some(view_model) = self.view_model() {
            invoke_lifecycle(view_model.as_ref(), LifecycleCall::Deactivate).await?;
        }
        self.inner.renderer.hide_dialog(self).await?;
        if let Some(view) = self.view() {
            view.unbind();
        }
        Ok(())
    }

    fn settle(&self, result: Result<DialogResult, DialogError>) {
        let Some(sender) = self.inner.settle.borrow_mut().take() else {
            return;
        };

        tracing::debug!(
            dialog = %self.inner.id,
            resolved = result.is_ok(),
            "dialog settled"
        );
        // The receiving side may already be gone; the outcome is still final.
        let _ = sender.send(result);

        let observers = std::mem::take(&mut *self.inner.observers.borrow_mut());
        for observer in observers {
            observer(self);
        }

        self.release();
    }

    /// Drop the view, slot and view-model references.
    ///
    /// View-models commonly hold their controller, so a dialog that settles or
    /// never gets shown must let go of them.
    pub(crate) fn release(&self) {
        self.inner.view.borrow_mut().take();
        self.inner.slot.borrow_mut().take();
        self.inner.view_model.borrow_mut().take();
    }
}

impl PartialEq for DialogController {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for DialogController {}

impl fmt::Debug for DialogController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogController")
            .field("id", &self.inner.id)
            .field("phase", &self.phase())
            .field("settings", &self.inner.settings)
            .finish_non_exhaustive()
    }
}
