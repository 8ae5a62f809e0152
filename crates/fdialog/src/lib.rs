#![forbid(unsafe_code)]

//! Modal dialogs for FrankenTUI.
//!
//! A [`DialogService`] opens dialogs backed by [`ViewModel`]s, gates them
//! through the optional lifecycle hooks and keeps track of the ones that are
//! open. Every dialog gets a [`DialogController`] that closes it (`ok`,
//! `cancel`, `close`, `error`) and settles the dialog's close result.
//!
//! Rendering goes through a [`Renderer`]; [`LayerRenderer`] mounts each dialog
//! as an overlay + container pair into a [`DialogHost`] document and routes
//! Escape and backdrop clicks to the topmost dialog. View composition is
//! delegated to a [`CompositionEngine`].
//!
//! Everything runs on a single thread; asynchronous steps (hooks, composition,
//! transitions) are futures driven by the embedding event loop.

pub mod composition;
pub mod config;
pub mod controller;
pub mod elements;
pub mod renderer;
pub mod scope;
pub mod service;

pub use composition::{ComposedView, CompositionContext, CompositionEngine, ViewSlot};
pub use config::{ConfigurationError, DialogConfiguration};
pub use controller::{CloseResult, ControllerPhase, DialogController, DialogId, PendingClose};
pub use elements::{AttachFocus, DialogFooter, DialogHeader, Focusable};
pub use renderer::{
    ClickEvent, DialogEvent, DialogHost, DialogRegistry, EventOutcome, KeyCode, KeyEvent,
    KeyEventKind, LayerKind, LayerRenderer, MIN_VERTICAL_MARGIN, Renderer,
};
pub use scope::{Scope, WeakScope};
pub use service::{DialogService, OpenDialogResult, OpenOutcome};

pub use fdialog_core::{
    CloseAttempt, DialogCancelError, DialogError, DialogModule, DialogOptions, DialogResult,
    DialogSettings, HookResult, HostError, LifecycleHook, LifecycleHooks, NodeId,
    ResolvedSettings, Value, ViewModel, ViewModelRef,
};
