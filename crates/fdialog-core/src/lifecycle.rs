#![forbid(unsafe_code)]

//! View-model lifecycle hooks and their invoker.
//!
//! A view-model may implement any subset of four hooks:
//!
//! | Hook | Argument | Called by |
//! |------|----------|-----------|
//! | `can_activate` | dialog model | service, before composition |
//! | `activate` | dialog model | composition engine |
//! | `can_deactivate` | `ok` flag of the close request | controller, before closing |
//! | `deactivate` | - | controller, while closing |
//!
//! Implemented hooks are advertised through [`ViewModel::hooks`]. The invoker
//! checks that capability set before dispatching, so an unimplemented hook is
//! never called and counts as "continue".
//!
//! # Normalization
//!
//! - Hook absent from [`ViewModel::hooks`]: `Ok(true)` without a call.
//! - Hook returns `Ok(None)`: `Ok(true)`.
//! - Hook returns `Ok(Some(b))`: `Ok(b)`.
//! - Hook returns `Err(e)`: `Err(e)`, unchanged.

use std::fmt;

use async_trait::async_trait;
use bitflags::bitflags;

use crate::Value;
use crate::error::DialogError;

/// Raw outcome of a lifecycle hook; `Ok(None)` means "no opinion".
pub type HookResult = Result<Option<bool>, DialogError>;

bitflags! {
    /// Set of lifecycle hooks a view-model implements.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LifecycleHooks: u8 {
        const CAN_ACTIVATE = 1 << 0;
        const ACTIVATE = 1 << 1;
        const CAN_DEACTIVATE = 1 << 2;
        const DEACTIVATE = 1 << 3;
    }
}

/// A single lifecycle hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleHook {
    CanActivate,
    Activate,
    CanDeactivate,
    Deactivate,
}

impl LifecycleHook {
    /// The capability flag for this hook.
    pub const fn flag(self) -> LifecycleHooks {
        match self {
            Self::CanActivate => LifecycleHooks::CAN_ACTIVATE,
            Self::Activate => LifecycleHooks::ACTIVATE,
            Self::CanDeactivate => LifecycleHooks::CAN_DEACTIVATE,
            Self::Deactivate => LifecycleHooks::DEACTIVATE,
        }
    }

    /// Conventional hook name, used in logs and error messages.
    pub const fn name(self) -> &'static str {
        match self {
            Self::CanActivate => "canActivate",
            Self::Activate => "activate",
            Self::CanDeactivate => "canDeactivate",
            Self::Deactivate => "deactivate",
        }
    }
}

impl fmt::Display for LifecycleHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A hook invocation together with its argument.
#[derive(Debug, Clone, Copy)]
pub enum LifecycleCall<'a> {
    CanActivate(Option<&'a Value>),
    Activate(Option<&'a Value>),
    CanDeactivate(bool),
    Deactivate,
}

impl LifecycleCall<'_> {
    /// The hook this call targets.
    pub const fn hook(&self) -> LifecycleHook {
        match self {
            Self::CanActivate(_) => LifecycleHook::CanActivate,
            Self::Activate(_) => LifecycleHook::Activate,
            Self::CanDeactivate(_) => LifecycleHook::CanDeactivate,
            Self::Deactivate => LifecycleHook::Deactivate,
        }
    }
}

/// Object backing a dialog's content.
///
/// Every hook is optional. Override the hooks you need and report them from
/// [`hooks`](ViewModel::hooks); the default bodies are never reached through
/// [`invoke_lifecycle`] unless the matching flag is set.
///
/// # Example
///
/// ```ignore
/// struct Confirm;
///
/// #[async_trait(?Send)]
/// impl ViewModel for Confirm {
///     fn hooks(&self) -> LifecycleHooks {
///         LifecycleHooks::CAN_DEACTIVATE
///     }
///
///     async fn can_deactivate(&self, ok: bool) -> HookResult {
///         Ok(Some(ok))
///     }
/// }
/// ```
#[async_trait(?Send)]
pub trait ViewModel {
    /// Hooks this view-model implements.
    fn hooks(&self) -> LifecycleHooks {
        LifecycleHooks::empty()
    }

    /// Gate run before the dialog is composed.
    async fn can_activate(&self, _model: Option<&Value>) -> HookResult {
        Ok(None)
    }

    /// Called by the composition engine with the dialog model.
    async fn activate(&self, _model: Option<&Value>) -> HookResult {
        Ok(None)
    }

    /// Gate run before the dialog closes; `ok` tells whether it is an `ok` or a `cancel`.
    async fn can_deactivate(&self, _ok: bool) -> HookResult {
        Ok(None)
    }

    /// Called while the dialog closes, before it is hidden.
    async fn deactivate(&self) -> HookResult {
        Ok(None)
    }
}

/// Invoke a lifecycle hook if the view-model implements it, normalizing the
/// outcome to a "continue?" boolean.
pub async fn invoke_lifecycle(
    view_model: &dyn ViewModel,
    call: LifecycleCall<'_>,
) -> Result<bool, DialogError> {
    let hook = call.hook();
    if !view_model.hooks().contains(hook.flag()) {
        tracing::trace!(%hook, "lifecycle hook not implemented");
        return Ok(true);
    }

    let outcome = match call {
        LifecycleCall::CanActivate(model) => view_model.can_activate(model).await,
        LifecycleCall::Activate(model) => view_model.activate(model).await,
        LifecycleCall::CanDeactivate(ok) => view_model.can_deactivate(ok).await,
        LifecycleCall::Deactivate => view_model.deactivate().await,
    }?;

    let verdict = outcome.unwrap_or(true);
    tracing::trace!(%hook, verdict, "lifecycle hook returned");
    Ok(verdict)
}
