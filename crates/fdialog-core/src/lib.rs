#![forbid(unsafe_code)]

//! Core contracts for FrankenTUI dialogs.
//!
//! This crate holds the pieces every other dialog crate builds on:
//!
//! - [`lifecycle`]: the optional-capability [`ViewModel`] trait and the
//!   [`invoke_lifecycle`] normalizer.
//! - [`result`]: terminal values of open/close sequences.
//! - [`error`]: the [`DialogError`] taxonomy (cancellation, host failure, ...).
//! - [`settings`]: process-wide [`DialogOptions`] and per-open [`DialogSettings`].
//!
//! Payloads (`model`, `output`, cancellation `reason`) are [`serde_json::Value`]s;
//! `None` stands for "no payload".

pub mod error;
pub mod lifecycle;
pub mod node;
pub mod result;
pub mod settings;

pub use error::{DialogCancelError, DialogError, HostError};
pub use lifecycle::{
    HookResult, LifecycleCall, LifecycleHook, LifecycleHooks, ViewModel, invoke_lifecycle,
};
pub use node::NodeId;
pub use result::{CloseAttempt, DialogResult};
pub use settings::{
    DialogModule, DialogOptions, DialogSettings, PositionFn, ResolvedSettings, ViewModelRef,
};

/// Arbitrary payload exchanged with view-models.
pub type Value = serde_json::Value;
