#![forbid(unsafe_code)]

//! Terminal values of dialog sequences.

use crate::Value;

/// Outcome delivered to whoever opened the dialog once it closes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DialogResult {
    /// Whether the dialog was dismissed through `cancel` rather than `ok`.
    pub was_cancelled: bool,
    /// Data returned from the dialog.
    pub output: Option<Value>,
}

impl DialogResult {
    /// Create a result.
    pub fn new(was_cancelled: bool, output: Option<Value>) -> Self {
        Self {
            was_cancelled,
            output,
        }
    }

    /// Result of a dialog that never opened because activation was vetoed.
    pub fn cancelled() -> Self {
        Self::new(true, None)
    }
}

/// Outcome of a single close attempt.
///
/// This describes the *attempt*, not the dialog's result: a `cancel()` that
/// succeeds is [`CloseAttempt::Closed`] even though the dialog result has
/// `was_cancelled` set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseAttempt {
    /// The dialog closed and its result was settled.
    Closed,
    /// `can_deactivate` vetoed the close; the dialog is still open.
    Vetoed,
}

impl CloseAttempt {
    /// `true` when the close attempt was aborted by a veto.
    #[inline]
    pub const fn was_cancelled(self) -> bool {
        matches!(self, Self::Vetoed)
    }
}
