#![forbid(unsafe_code)]

//! Renderer that only records what it was asked to do.

use std::cell::{Cell, RefCell};

use async_trait::async_trait;
use fdialog::{DialogController, DialogId, Renderer};
use fdialog_core::{DialogError, NodeId};

/// A recorded renderer call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderCall {
    Show(DialogId),
    Hide(DialogId),
}

/// [`Renderer`] without a document: records calls and can be made to fail.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    calls: RefCell<Vec<RenderCall>>,
    next_node: Cell<u64>,
    fail_show: RefCell<Option<String>>,
    fail_hide: RefCell<Option<String>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later `show_dialog` fail with `message`.
    pub fn fail_show(&self, message: impl Into<String>) {
        *self.fail_show.borrow_mut() = Some(message.into());
    }

    /// Make every later `hide_dialog` fail with `message`.
    pub fn fail_hide(&self, message: impl Into<String>) {
        *self.fail_hide.borrow_mut() = Some(message.into());
    }

    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls.borrow().clone()
    }

    pub fn shows(&self) -> usize {
        self.count(|call| matches!(call, RenderCall::Show(_)))
    }

    pub fn hides(&self) -> usize {
        self.count(|call| matches!(call, RenderCall::Hide(_)))
    }

    fn count(&self, pred: impl Fn(&RenderCall) -> bool) -> usize {
        self.calls.borrow().iter().filter(|call| pred(call)).count()
    }
}

#[async_trait(?Send)]
impl Renderer for RecordingRenderer {
    fn dialog_container(&self) -> Result<NodeId, DialogError> {
        let node = self.next_node.get() + 1;
        self.next_node.set(node);
        Ok(NodeId::new(node))
    }

    async fn show_dialog(&self, controller: &DialogController) -> Result<(), DialogError> {
        self.calls.borrow_mut().push(RenderCall::Show(controller.id()));
        match self.fail_show.borrow().as_ref() {
            Some(message) => Err(DialogError::host(message.clone())),
            None => Ok(()),
        }
    }

    async fn hide_dialog(&self, controller: &DialogController) -> Result<(), DialogError> {
        self.calls.borrow_mut().push(RenderCall::Hide(controller.id()));
        match self.fail_hide.borrow().as_ref() {
            Some(message) => Err(DialogError::host(message.clone())),
            None => Ok(()),
        }
    }
}
