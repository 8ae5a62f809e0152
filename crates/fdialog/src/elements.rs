#![forbid(unsafe_code)]

//! Small helpers dialog views build on: footer buttons, a header close
//! button and focus-on-attach.
//!
//! Footer and header take the [`DialogController`] of the dialog they are
//! part of; inside a composed view-model that is the controller registered
//! in the dialog's child [`Scope`].

use std::fmt;
use std::rc::Rc;

use fdialog_core::Value;

use crate::controller::{DialogController, PendingClose};
use crate::scope::Scope;

/// Label of the button that cancels instead of confirming.
pub const CANCEL_BUTTON: &str = "Cancel";

/// Labels installed by [`DialogFooter::use_default_buttons`].
pub const DEFAULT_BUTTONS: [&str; 2] = [CANCEL_BUTTON, "Ok"];

/// Footer with a row of closing buttons.
#[derive(Debug, Clone)]
pub struct DialogFooter {
    controller: DialogController,
    buttons: Vec<String>,
}

impl DialogFooter {
    /// Footer without buttons.
    pub fn new(controller: DialogController) -> Self {
        Self {
            controller,
            buttons: Vec::new(),
        }
    }

    /// Footer for the dialog whose child scope is `scope`.
    pub fn from_scope(scope: &Scope) -> Option<Self> {
        scope.get::<DialogController>().map(Self::new)
    }

    #[must_use]
    pub fn with_buttons<I, S>(mut self, buttons: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.buttons = buttons.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the buttons with `Cancel` and `Ok`.
    #[must_use]
    pub fn use_default_buttons(mut self) -> Self {
        self.buttons = DEFAULT_BUTTONS.iter().map(|b| (*b).to_owned()).collect();
        self
    }

    pub fn buttons(&self) -> &[String] {
        &self.buttons
    }

    /// Close the dialog for a button press; the label becomes the output.
    pub fn close(&self, button: &str) -> PendingClose {
        let output = Some(Value::from(button));
        if Self::is_cancel_button(button) {
            self.controller.cancel(output)
        } else {
            self.controller.ok(output)
        }
    }

    /// Whether `button` cancels the dialog.
    pub fn is_cancel_button(button: &str) -> bool {
        button == CANCEL_BUTTON
    }
}

/// Dialog header; offers a close button only when the dialog is unlocked.
#[derive(Debug, Clone)]
pub struct DialogHeader {
    controller: DialogController,
}

impl DialogHeader {
    pub fn new(controller: DialogController) -> Self {
        Self { controller }
    }

    /// Header for the dialog whose child scope is `scope`.
    pub fn from_scope(scope: &Scope) -> Option<Self> {
        scope.get::<DialogController>().map(Self::new)
    }

    pub fn shows_close_button(&self) -> bool {
        !self.controller.settings().lock
    }

    /// Close button pressed.
    pub fn close(&self) -> PendingClose {
        self.controller.cancel(None)
    }
}

/// Something that can take input focus.
pub trait Focusable {
    fn focus(&self);
}

/// Focuses an element when its view is attached.
pub struct AttachFocus<F: Focusable> {
    element: Rc<F>,
    value: Value,
}

impl<F: Focusable> AttachFocus<F> {
    /// Enabled by default.
    pub fn new(element: Rc<F>) -> Self {
        Self {
            element,
            value: Value::Bool(true),
        }
    }

    /// Bound value changed. `false`, `"false"` and other falsy values disable focusing.
    pub fn set_value(&mut self, value: Value) {
        self.value = value;
    }

    pub fn is_enabled(&self) -> bool {
        match &self.value {
            Value::Null => false,
            Value::Bool(enabled) => *enabled,
            Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
            Value::String(s) => !s.is_empty() && s != "false",
            Value::Array(_) | Value::Object(_) => true,
        }
    }

    /// View attached.
    pub fn attached(&self) {
        if self.is_enabled() {
            self.element.focus();
        }
    }
}

impl<F: Focusable> fmt::Debug for AttachFocus<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttachFocus")
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}
