#![forbid(unsafe_code)]

//! Dialog error taxonomy.
//!
//! Three families of failure reach callers:
//!
//! 1. **Cancellation** ([`DialogError::Cancelled`]): a dialog was dismissed, or
//!    its activation/deactivation was vetoed, while `reject_on_cancel` is set.
//! 2. **Host failure** ([`DialogError::Host`], [`DialogError::Hook`]): a
//!    renderer, composition or lifecycle hook call failed. These propagate
//!    unchanged; nothing retries.
//! 3. **Controller misuse** ([`DialogError::Inactive`],
//!    [`DialogError::Abandoned`]): calls against a controller that already
//!    settled, a controller dropped before it settled, or a service whose
//!    parent scope is gone ([`DialogError::ScopeDropped`]).
//!
//! A veto without `reject_on_cancel` is not an error at all: it surfaces as a
//! resolved value whose `was_cancelled` flag is set.
//!
//! All types here are `Clone` because they are the outputs of shared futures.

use crate::Value;
use crate::lifecycle::LifecycleHook;
use thiserror::Error;

/// Error carried by the reject path when a dialog is cancelled under
/// `reject_on_cancel`.
#[derive(Debug, Clone, PartialEq, Default, Error)]
#[error("Operation cancelled.")]
pub struct DialogCancelError {
    reason: Option<Value>,
}

impl DialogCancelError {
    /// Create a cancellation error with an optional reason.
    pub fn new(reason: Option<Value>) -> Self {
        Self { reason }
    }

    /// Always `true`; mirrors the `was_cancelled` flag of [`crate::DialogResult`].
    #[inline]
    pub const fn was_cancelled(&self) -> bool {
        true
    }

    /// The cancellation reason, if one was supplied.
    pub fn reason(&self) -> Option<&Value> {
        self.reason.as_ref()
    }

    /// Consume the error and return its reason.
    pub fn into_reason(self) -> Option<Value> {
        self.reason
    }
}

/// Failure reported by the host document or another external collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HostError {
    message: String,
}

impl HostError {
    /// Create a host error from any displayable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Every failure a dialog operation can surface.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DialogError {
    /// The dialog was cancelled and the caller asked for rejection.
    #[error(transparent)]
    Cancelled(#[from] DialogCancelError),

    /// The host document, renderer or composition engine failed.
    #[error("host failure: {0}")]
    Host(#[from] HostError),

    /// A lifecycle hook failed.
    #[error("lifecycle hook `{hook}` failed: {message}")]
    Hook {
        hook: LifecycleHook,
        message: String,
    },

    /// The dialog was closed through `DialogController::error` with this message.
    #[error("dialog closed with error: {0}")]
    Errored(Value),

    /// A named or module view-model reference could not be resolved.
    #[error("view-model `{0}` could not be resolved")]
    UnresolvedViewModel(String),

    /// The controller has already settled; no further transitions are possible.
    #[error("dialog is no longer open")]
    Inactive,

    /// The controller was dropped before its outer result settled.
    #[error("dialog controller dropped before settling")]
    Abandoned,

    /// The scope dialogs are opened from no longer exists.
    #[error("dialog service scope was dropped")]
    ScopeDropped,
}

impl DialogError {
    /// Shorthand for a cancellation carrying `reason`.
    pub fn cancelled(reason: Option<Value>) -> Self {
        Self::Cancelled(DialogCancelError::new(reason))
    }

    /// Shorthand for a host failure.
    pub fn host(message: impl Into<String>) -> Self {
        Self::Host(HostError::new(message))
    }

    /// Shorthand for a failing lifecycle hook.
    pub fn hook(hook: LifecycleHook, message: impl Into<String>) -> Self {
        Self::Hook {
            hook,
            message: message.into(),
        }
    }

    /// Whether this error is a cancellation signal rather than a failure.
    #[inline]
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// The cancellation payload, if this is a cancellation.
    pub fn as_cancellation(&self) -> Option<&DialogCancelError> {
        match self {
            Self::Cancelled(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cancel_error_defaults_to_no_reason() {
        let err = DialogCancelError::default();
        assert!(err.was_cancelled());
        assert!(err.reason().is_none());
        assert_eq!(err.to_string(), "Operation cancelled.");
    }

    #[test]
    fn cancel_error_keeps_reason() {
        let err = DialogCancelError::new(Some(json!("nope")));
        assert_eq!(err.reason(), Some(&json!("nope")));
        assert_eq!(err.into_reason(), Some(json!("nope")));
    }

    #[test]
    fn cancellation_is_distinguished_from_failures() {
        assert!(DialogError::cancelled(None).is_cancellation());
        assert!(!DialogError::host("boom").is_cancellation());
        assert!(!DialogError::Errored(json!("bad")).is_cancellation());
        assert!(DialogError::host("boom").as_cancellation().is_none());
    }

    #[test]
    fn display_messages() {
        assert_eq!(
            DialogError::cancelled(Some(json!(1))).to_string(),
            "Operation cancelled."
        );
        assert_eq!(
            DialogError::host("no body element").to_string(),
            "host failure: no body element"
        );
        assert_eq!(
            DialogError::hook(LifecycleHook::Deactivate, "save failed").to_string(),
            "lifecycle hook `deactivate` failed: save failed"
        );
        assert_eq!(
            DialogError::UnresolvedViewModel("prompt".into()).to_string(),
            "view-model `prompt` could not be resolved"
        );
        assert_eq!(
            DialogError::ScopeDropped.to_string(),
            "dialog service scope was dropped"
        );
    }
}
