#![forbid(unsafe_code)]

//! Registry of the dialogs currently displayed.
//!
//! The `DialogRegistry` keeps displayed controllers in the order they were
//! shown. It is created once and handed to the renderer (and anyone else
//! who needs to know which dialog is on top) behind an `Rc`.
//!
//! # Invariants
//!
//! - Order is show order: later dialogs are always above earlier ones.
//! - Only the top (last) dialog is the Escape target.
//! - Removal by id works from any position; a missing id is a no-op.
//!
//! # Failure Modes
//!
//! - `remove()` for a non-registered id returns `None` (no panic).
//! - `top()` on an empty registry returns `None`.

use std::cell::RefCell;
use std::fmt;

use crate::controller::{DialogController, DialogId};

/// Ordered set of displayed dialogs (bottom to top).
#[derive(Default)]
pub struct DialogRegistry {
    entries: RefCell<Vec<DialogController>>,
}

impl DialogRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    // --- Stack Operations ---

    /// Register a displayed dialog on top. Returns the new depth.
    pub fn push(&self, controller: DialogController) -> usize {
        let mut entries = self.entries.borrow_mut();
        tracing::trace!(dialog = %controller.id(), depth = entries.len() + 1, "dialog registered");
        entries.push(controller);
        entries.len()
    }

    /// Remove a dialog by id.
    pub fn remove(&self, id: DialogId) -> Option<DialogController> {
        let mut entries = self.entries.borrow_mut();
        let idx = entries.iter().position(|c| c.id() == id)?;
        let removed = entries.remove(idx);
        tracing::trace!(dialog = %id, depth = entries.len(), "dialog unregistered");
        Some(removed)
    }

    /// The topmost dialog.
    pub fn top(&self) -> Option<DialogController> {
        self.entries.borrow().last().cloned()
    }

    // --- State Queries ---

    /// Check if no dialog is displayed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Number of displayed dialogs.
    #[inline]
    pub fn depth(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Check if a dialog is displayed.
    pub fn contains(&self, id: DialogId) -> bool {
        self.entries.borrow().iter().any(|c| c.id() == id)
    }

    /// Id of the topmost dialog.
    pub fn top_id(&self) -> Option<DialogId> {
        self.entries.borrow().last().map(DialogController::id)
    }

    /// Ids in show order (bottom to top).
    pub fn ids(&self) -> Vec<DialogId> {
        self.entries.borrow().iter().map(DialogController::id).collect()
    }
}

impl fmt::Debug for DialogRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}
