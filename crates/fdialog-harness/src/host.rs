#![forbid(unsafe_code)]

//! In-memory host document.
//!
//! [`MemoryHost`] keeps a flat top-level node order plus a parent/child map,
//! which is all [`fdialog::LayerRenderer`] needs. Transitions are manual:
//! with transitions enabled, every `transition_end` future stays pending
//! until [`MemoryHost::finish_transitions`] is called.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};

use fdialog::{DialogHost, LayerKind};
use fdialog_core::{HostError, NodeId};
use futures::channel::oneshot;
use futures::future::{FutureExt, LocalBoxFuture};

/// Host operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HostOp {
    CreateAnchor,
    CreateLayer,
    AppendChild,
    InsertLayers,
    Remove,
    SetZIndex,
    SetActive,
    SetVerticalMargin,
}

/// Kind of a node created through the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Anchor,
    Layer(LayerKind),
}

#[derive(Default)]
struct Document {
    kinds: BTreeMap<NodeId, NodeKind>,
    top_level: Vec<NodeId>,
    children: BTreeMap<NodeId, Vec<NodeId>>,
    z_index: BTreeMap<NodeId, u32>,
    active: BTreeSet<NodeId>,
    margins: BTreeMap<NodeId, f32>,
    pending: Vec<(NodeId, oneshot::Sender<()>)>,
    failures: BTreeSet<HostOp>,
}

/// Headless [`DialogHost`].
pub struct MemoryHost {
    doc: RefCell<Document>,
    next_id: Cell<u64>,
    transitions: Cell<bool>,
    viewport_height: Cell<f32>,
    content_height: Cell<f32>,
    document_open: Cell<bool>,
    key_listener: Cell<bool>,
    key_listener_toggles: Cell<usize>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    /// Empty document, no transitions, 800px viewport and 200px content.
    pub fn new() -> Self {
        Self {
            doc: RefCell::new(Document::default()),
            next_id: Cell::new(1),
            transitions: Cell::new(false),
            viewport_height: Cell::new(800.0),
            content_height: Cell::new(200.0),
            document_open: Cell::new(false),
            key_listener: Cell::new(false),
            key_listener_toggles: Cell::new(0),
        }
    }

    #[must_use]
    pub fn with_transitions(self, enabled: bool) -> Self {
        self.transitions.set(enabled);
        self
    }

    pub fn set_transitions(&self, enabled: bool) {
        self.transitions.set(enabled);
    }

    pub fn set_viewport_height(&self, height: f32) {
        self.viewport_height.set(height);
    }

    pub fn set_content_height(&self, height: f32) {
        self.content_height.set(height);
    }

    /// Make every later call of `op` fail until [`MemoryHost::clear_failures`].
    pub fn fail(&self, op: HostOp) {
        self.doc.borrow_mut().failures.insert(op);
    }

    pub fn clear_failures(&self) {
        self.doc.borrow_mut().failures.clear();
    }

    /// Complete every pending transition. Returns how many completed.
    pub fn finish_transitions(&self) -> usize {
        let pending = std::mem::take(&mut self.doc.borrow_mut().pending);
        let count = pending.len();
        for (_, done) in pending {
            let _ = done.send(());
        }
        count
    }

    pub fn pending_transitions(&self) -> usize {
        self.doc.borrow().pending.len()
    }

    // --- Inspection ---

    /// Top-level nodes in document order.
    pub fn document(&self) -> Vec<NodeId> {
        self.doc.borrow().top_level.clone()
    }

    /// Top-level nodes of `kind`, in document order.
    pub fn layers(&self, kind: LayerKind) -> Vec<NodeId> {
        let doc = self.doc.borrow();
        doc.top_level
            .iter()
            .copied()
            .filter(|node| doc.kinds.get(node) == Some(&NodeKind::Layer(kind)))
            .collect()
    }

    pub fn kind(&self, node: NodeId) -> Option<NodeKind> {
        self.doc.borrow().kinds.get(&node).copied()
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.doc
            .borrow()
            .children
            .get(&node)
            .cloned()
            .unwrap_or_default()
    }

    pub fn z_index(&self, node: NodeId) -> Option<u32> {
        self.doc.borrow().z_index.get(&node).copied()
    }

    pub fn is_active(&self, node: NodeId) -> bool {
        self.doc.borrow().active.contains(&node)
    }

    pub fn vertical_margin(&self, container: NodeId) -> Option<f32> {
        self.doc.borrow().margins.get(&container).copied()
    }

    pub fn is_document_open(&self) -> bool {
        self.document_open.get()
    }

    pub fn has_key_listener(&self) -> bool {
        self.key_listener.get()
    }

    /// How often the key listener was attached or detached.
    pub fn key_listener_toggles(&self) -> usize {
        self.key_listener_toggles.get()
    }

    fn check(&self, op: HostOp) -> Result<(), HostError> {
        if self.doc.borrow().failures.contains(&op) {
            return Err(HostError::new(format!("{op:?} failed")));
        }
        Ok(())
    }

    fn create(&self, kind: NodeKind) -> NodeId {
        let node = NodeId::new(self.next_id.get());
        self.next_id.set(node.raw() + 1);
        self.doc.borrow_mut().kinds.insert(node, kind);
        node
    }

    fn known(doc: &Document, node: NodeId) -> Result<(), HostError> {
        if doc.kinds.contains_key(&node) {
            Ok(())
        } else {
            Err(HostError::new(format!("unknown {node}")))
        }
    }
}

impl DialogHost for MemoryHost {
    fn create_anchor(&self) -> Result<NodeId, HostError> {
        self.check(HostOp::CreateAnchor)?;
        Ok(self.create(NodeKind::Anchor))
    }

    fn create_layer(&self, kind: LayerKind) -> Result<NodeId, HostError> {
        self.check(HostOp::CreateLayer)?;
        Ok(self.create(NodeKind::Layer(kind)))
    }

    fn append_child(&self, parent: NodeId, child: NodeId) -> Result<(), HostError> {
        self.check(HostOp::AppendChild)?;
        let mut doc = self.doc.borrow_mut();
        Self::known(&doc, parent)?;
        Self::known(&doc, child)?;
        doc.children.entry(parent).or_default().push(child);
        Ok(())
    }

    fn insert_layers(
        &self,
        overlay: NodeId,
        container: NodeId,
        after: Option<NodeId>,
    ) -> Result<(), HostError> {
        self.check(HostOp::InsertLayers)?;
        let mut doc = self.doc.borrow_mut();
        let at = match after {
            Some(reference) => {
                let idx = doc
                    .top_level
                    .iter()
                    .position(|n| *n == reference)
                    .ok_or_else(|| HostError::new(format!("{reference} is not in the document")))?;
                idx + 1
            }
            None => 0,
        };
        doc.top_level.insert(at, overlay);
        doc.top_level.insert(at + 1, container);
        Ok(())
    }

    fn remove(&self, node: NodeId) -> Result<(), HostError> {
        self.check(HostOp::Remove)?;
        let mut doc = self.doc.borrow_mut();
        let idx = doc
            .top_level
            .iter()
            .position(|n| *n == node)
            .ok_or_else(|| HostError::new(format!("{node} is not in the document")))?;
        doc.top_level.remove(idx);
        doc.active.remove(&node);
        Ok(())
    }

    fn set_z_index(&self, node: NodeId, z_index: u32) -> Result<(), HostError> {
        self.check(HostOp::SetZIndex)?;
        self.doc.borrow_mut().z_index.insert(node, z_index);
        Ok(())
    }

    fn set_active(&self, node: NodeId, active: bool) -> Result<(), HostError> {
        self.check(HostOp::SetActive)?;
        let mut doc = self.doc.borrow_mut();
        if active {
            doc.active.insert(node);
        } else {
            doc.active.remove(&node);
        }
        Ok(())
    }

    fn set_document_open(&self, open: bool) {
        self.document_open.set(open);
    }

    fn has_transition(&self, _node: NodeId) -> bool {
        self.transitions.get()
    }

    fn transition_end(&self, node: NodeId) -> LocalBoxFuture<'static, ()> {
        let (done, wait) = oneshot::channel();
        self.doc.borrow_mut().pending.push((node, done));
        wait.map(drop).boxed_local()
    }

    fn viewport_height(&self) -> f32 {
        self.viewport_height.get()
    }

    fn content_height(&self, _container: NodeId) -> f32 {
        self.content_height.get()
    }

    fn set_vertical_margin(&self, container: NodeId, margin: f32) -> Result<(), HostError> {
        self.check(HostOp::SetVerticalMargin)?;
        self.doc.borrow_mut().margins.insert(container, margin);
        Ok(())
    }

    fn set_key_listener(&self, attached: bool) {
        self.key_listener.set(attached);
        self.key_listener_toggles
            .set(self.key_listener_toggles.get() + 1);
    }
}
