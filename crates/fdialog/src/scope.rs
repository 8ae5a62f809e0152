#![forbid(unsafe_code)]

//! Hierarchical instance scope.
//!
//! A [`Scope`] maps types to singleton instances. Child scopes see everything
//! registered in their ancestors, while registrations in a child stay
//! invisible to the parent and to siblings. The dialog service opens every
//! dialog in a fresh child scope and registers the dialog's controller there,
//! so view-models composed for that dialog can look it up.
//!
//! # Invariants
//!
//! - Lookups walk from the scope to the root and return the nearest match.
//! - Registering the same type twice in one scope replaces the earlier instance.
//! - A [`WeakScope`] never keeps its scope alive; objects registered in a
//!   scope hold it through one to avoid reference cycles.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use ahash::AHashMap;

/// Shared handle to a scope. Clones refer to the same scope.
#[derive(Clone, Default)]
pub struct Scope {
    inner: Rc<ScopeInner>,
}

#[derive(Default)]
struct ScopeInner {
    parent: Option<Scope>,
    instances: RefCell<AHashMap<TypeId, Rc<dyn Any>>>,
}

impl Scope {
    /// Create a root scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an isolated child scope.
    #[must_use]
    pub fn create_child(&self) -> Self {
        Self {
            inner: Rc::new(ScopeInner {
                parent: Some(self.clone()),
                instances: RefCell::new(AHashMap::new()),
            }),
        }
    }

    /// Register `instance` as the singleton for `T` in this scope.
    pub fn register<T: 'static>(&self, instance: T) {
        self.inner
            .instances
            .borrow_mut()
            .insert(TypeId::of::<T>(), Rc::new(instance));
    }

    /// Look up the nearest instance of `T`.
    pub fn get<T: Clone + 'static>(&self) -> Option<T> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            let found = current
                .inner
                .instances
                .borrow()
                .get(&TypeId::of::<T>())
                .and_then(|instance| instance.downcast_ref::<T>().cloned());
            if found.is_some() {
                return found;
            }
            scope = current.inner.parent.as_ref();
        }
        None
    }

    /// Whether `T` is registered directly in this scope (ancestors excluded).
    pub fn has_own<T: 'static>(&self) -> bool {
        self.inner
            .instances
            .borrow()
            .contains_key(&TypeId::of::<T>())
    }

    /// Non-owning handle to this scope.
    pub fn downgrade(&self) -> WeakScope {
        WeakScope {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Number of ancestors above this scope.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut parent = self.inner.parent.as_ref();
        while let Some(scope) = parent {
            depth += 1;
            parent = scope.inner.parent.as_ref();
        }
        depth
    }
}

/// Non-owning handle to a [`Scope`].
#[derive(Clone, Default)]
pub struct WeakScope {
    inner: Weak<ScopeInner>,
}

impl WeakScope {
    /// The scope, if it is still alive.
    pub fn upgrade(&self) -> Option<Scope> {
        self.inner.upgrade().map(|inner| Scope { inner })
    }
}

impl fmt::Debug for WeakScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakScope")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("depth", &self.depth())
            .field("instances", &self.inner.instances.borrow().len())
            .finish()
    }
}
