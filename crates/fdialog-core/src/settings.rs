#![forbid(unsafe_code)]

//! Process-wide dialog options and per-open settings.
//!
//! [`DialogOptions`] holds the defaults configured once for the whole
//! application. Each `open` call passes a [`DialogSettings`] whose `Some`
//! fields override those defaults; [`DialogSettings::resolve`] produces the
//! immutable [`ResolvedSettings`] a controller keeps for its lifetime.
//!
//! # Invariants
//!
//! - `ResolvedSettings::starting_z_index` always equals the process-wide
//!   `DialogOptions::starting_z_index`; a per-open override is accepted but
//!   discarded.
//! - Settings never change after a dialog opens.

use std::fmt;
use std::rc::Rc;

use crate::Value;
use crate::lifecycle::ViewModel;
use crate::node::NodeId;

/// Custom positioning callback: `(container, overlay)`.
pub type PositionFn = Rc<dyn Fn(NodeId, NodeId)>;

/// Process-wide dialog defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default, rename_all = "camelCase")
)]
pub struct DialogOptions {
    /// Disable dismissal through backdrop click and Escape.
    pub lock: bool,
    /// Skip vertical centering.
    pub center_horizontal_only: bool,
    /// Z-index applied to every dialog's overlay and container.
    pub starting_z_index: u32,
    /// Resolve show/hide without waiting for transitions.
    pub ignore_transitions: bool,
    /// Reject instead of resolving when a dialog is cancelled.
    pub reject_on_cancel: bool,
    /// Hand back the controller instead of waiting for the close result.
    pub yield_controller: bool,
    /// Allow Escape to close a locked dialog.
    pub enable_esc_close: bool,
}

impl Default for DialogOptions {
    fn default() -> Self {
        Self {
            lock: true,
            center_horizontal_only: false,
            starting_z_index: 1000,
            ignore_transitions: false,
            reject_on_cancel: false,
            yield_controller: false,
            enable_esc_close: false,
        }
    }
}

/// Module identity for view-model types that are resolved by name.
pub trait DialogModule {
    /// Identifier the composition engine resolves to an instance.
    const MODULE_ID: &'static str;
}

/// Reference to the view-model backing a dialog.
#[derive(Clone)]
pub enum ViewModelRef {
    /// A ready instance.
    Instance(Rc<dyn ViewModel>),
    /// A name resolved asynchronously by the composition engine.
    Named(String),
    /// A module identity, resolved like [`ViewModelRef::Named`].
    Module(&'static str),
}

impl ViewModelRef {
    /// Reference a ready instance.
    pub fn instance(view_model: impl ViewModel + 'static) -> Self {
        Self::Instance(Rc::new(view_model))
    }

    /// Reference a view-model by name.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Reference a view-model type by its module identity.
    pub fn module<M: DialogModule>() -> Self {
        Self::Module(M::MODULE_ID)
    }

    /// The name to resolve, if this is not an instance.
    pub fn lookup_name(&self) -> Option<&str> {
        match self {
            Self::Instance(_) => None,
            Self::Named(name) => Some(name),
            Self::Module(id) => Some(id),
        }
    }
}

impl From<Rc<dyn ViewModel>> for ViewModelRef {
    fn from(view_model: Rc<dyn ViewModel>) -> Self {
        Self::Instance(view_model)
    }
}

impl fmt::Debug for ViewModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance(_) => f.write_str("Instance(..)"),
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::Module(id) => f.debug_tuple("Module").field(id).finish(),
        }
    }
}

/// Per-open dialog settings. `None` fields fall back to [`DialogOptions`].
#[derive(Clone)]
pub struct DialogSettings {
    pub view_model: ViewModelRef,
    pub view: Option<String>,
    pub model: Option<Value>,
    pub lock: Option<bool>,
    pub starting_z_index: Option<u32>,
    pub center_horizontal_only: Option<bool>,
    pub reject_on_cancel: Option<bool>,
    pub yield_controller: Option<bool>,
    pub ignore_transitions: Option<bool>,
    pub enable_esc_close: Option<bool>,
    pub position: Option<PositionFn>,
}

impl DialogSettings {
    /// Settings for the given view-model with every option defaulted.
    pub fn new(view_model: impl Into<ViewModelRef>) -> Self {
        Self {
            view_model: view_model.into(),
            view: None,
            model: None,
            lock: None,
            starting_z_index: None,
            center_horizontal_only: None,
            reject_on_cancel: None,
            yield_controller: None,
            ignore_transitions: None,
            enable_esc_close: None,
            position: None,
        }
    }

    /// Set an explicit view name.
    pub fn view(mut self, view: impl Into<String>) -> Self {
        self.view = Some(view.into());
        self
    }

    /// Set the model passed to `can_activate`/`activate`.
    pub fn model(mut self, model: Value) -> Self {
        self.model = Some(model);
        self
    }

    /// Set whether backdrop click and Escape are disabled.
    pub fn lock(mut self, lock: bool) -> Self {
        self.lock = Some(lock);
        self
    }

    /// Request a starting z-index. Discarded by [`resolve`](Self::resolve).
    pub fn starting_z_index(mut self, z_index: u32) -> Self {
        self.starting_z_index = Some(z_index);
        self
    }

    /// Set whether vertical centering is skipped.
    pub fn center_horizontal_only(mut self, value: bool) -> Self {
        self.center_horizontal_only = Some(value);
        self
    }

    /// Set whether cancellation rejects.
    pub fn reject_on_cancel(mut self, value: bool) -> Self {
        self.reject_on_cancel = Some(value);
        self
    }

    /// Set whether `open_as_configured` yields the controller.
    pub fn yield_controller(mut self, value: bool) -> Self {
        self.yield_controller = Some(value);
        self
    }

    /// Set whether transitions are ignored.
    pub fn ignore_transitions(mut self, value: bool) -> Self {
        self.ignore_transitions = Some(value);
        self
    }

    /// Set whether Escape closes a locked dialog.
    pub fn enable_esc_close(mut self, value: bool) -> Self {
        self.enable_esc_close = Some(value);
        self
    }

    /// Install a custom positioning callback.
    pub fn position(mut self, position: impl Fn(NodeId, NodeId) + 'static) -> Self {
        self.position = Some(Rc::new(position));
        self
    }

    /// Merge over `defaults`, forcing the process-wide starting z-index.
    pub fn resolve(self, defaults: &DialogOptions) -> ResolvedSettings {
        if let Some(requested) = self.starting_z_index
            && requested != defaults.starting_z_index
        {
            tracing::debug!(
                requested,
                applied = defaults.starting_z_index,
                "per-dialog starting z-index ignored"
            );
        }

        ResolvedSettings {
            view_model: self.view_model,
            view: self.view,
            model: self.model,
            lock: self.lock.unwrap_or(defaults.lock),
            starting_z_index: defaults.starting_z_index,
            center_horizontal_only: self
                .center_horizontal_only
                .unwrap_or(defaults.center_horizontal_only),
            reject_on_cancel: self.reject_on_cancel.unwrap_or(defaults.reject_on_cancel),
            yield_controller: self.yield_controller.unwrap_or(defaults.yield_controller),
            ignore_transitions: self
                .ignore_transitions
                .unwrap_or(defaults.ignore_transitions),
            enable_esc_close: self.enable_esc_close.unwrap_or(defaults.enable_esc_close),
            position: self.position,
        }
    }
}

impl fmt::Debug for DialogSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogSettings")
            .field("view_model", &self.view_model)
            .field("view", &self.view)
            .field("model", &self.model)
            .field("lock", &self.lock)
            .field("starting_z_index", &self.starting_z_index)
            .field("center_horizontal_only", &self.center_horizontal_only)
            .field("reject_on_cancel", &self.reject_on_cancel)
            .field("yield_controller", &self.yield_controller)
            .field("ignore_transitions", &self.ignore_transitions)
            .field("enable_esc_close", &self.enable_esc_close)
            .field("position", &self.position.is_some())
            .finish()
    }
}

/// Settings of an open dialog, fixed at open time.
#[derive(Clone)]
pub struct ResolvedSettings {
    pub view_model: ViewModelRef,
    pub view: Option<String>,
    pub model: Option<Value>,
    pub lock: bool,
    pub starting_z_index: u32,
    pub center_horizontal_only: bool,
    pub reject_on_cancel: bool,
    pub yield_controller: bool,
    pub ignore_transitions: bool,
    pub enable_esc_close: bool,
    pub position: Option<PositionFn>,
}

impl ResolvedSettings {
    /// Whether Escape may cancel this dialog when it is on top.
    #[inline]
    pub fn escape_closes(&self) -> bool {
        !self.lock || self.enable_esc_close
    }

    /// Whether a backdrop click may cancel this dialog.
    #[inline]
    pub fn backdrop_closes(&self) -> bool {
        !self.lock
    }
}

impl fmt::Debug for ResolvedSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedSettings")
            .field("view_model", &self.view_model)
            .field("view", &self.view)
            .field("model", &self.model)
            .field("lock", &self.lock)
            .field("starting_z_index", &self.starting_z_index)
            .field("center_horizontal_only", &self.center_horizontal_only)
            .field("reject_on_cancel", &self.reject_on_cancel)
            .field("yield_controller", &self.yield_controller)
            .field("ignore_transitions", &self.ignore_transitions)
            .field("enable_esc_close", &self.enable_esc_close)
            .field("position", &self.position.is_some())
            .finish()
    }
}
