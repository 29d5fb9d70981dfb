#![forbid(unsafe_code)]

//! Explicit cancellation handles.
//!
//! # Design
//!
//! A [`Disposable`] wraps a one-shot teardown closure. Clones share the same
//! teardown, so any clone can cancel and all clones observe the result.
//!
//! A [`CompositeDisposable`] accumulates handles and disposes them together.
//! It is the aggregate cancellation group a stream uses to cut every
//! forwarding path and consumer subscription in one call.
//!
//! # Invariants
//!
//! 1. A teardown closure runs at most once.
//! 2. `dispose()` on a composite disposes members in insertion order.
//! 3. A handle added after the composite was disposed is disposed on `add`.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

type Teardown = Box<dyn FnOnce()>;

struct DisposableInner {
    teardown: RefCell<Option<Teardown>>,
    disposed: Cell<bool>,
}

/// A cancellation handle for one subscription or resource.
#[derive(Clone)]
pub struct Disposable {
    inner: Rc<DisposableInner>,
}

impl Disposable {
    /// Create a handle that runs `teardown` on first disposal.
    pub fn new(teardown: impl FnOnce() + 'static) -> Self {
        Self {
            inner: Rc::new(DisposableInner {
                teardown: RefCell::new(Some(Box::new(teardown))),
                disposed: Cell::new(false),
            }),
        }
    }

    /// A handle with nothing to tear down.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            inner: Rc::new(DisposableInner {
                teardown: RefCell::new(None),
                disposed: Cell::new(false),
            }),
        }
    }

    /// Run the teardown if it has not run yet.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        // Release the borrow before running user code.
        let teardown = self.inner.teardown.borrow_mut().take();
        if let Some(teardown) = teardown {
            teardown();
        }
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }
}

impl fmt::Debug for Disposable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposable")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[derive(Default)]
struct CompositeInner {
    members: Vec<Disposable>,
    disposed: bool,
}

/// A group of handles disposed together.
///
/// Cloning a `CompositeDisposable` creates a new handle to the **same** group.
#[derive(Clone, Default)]
pub struct CompositeDisposable {
    inner: Rc<RefCell<CompositeInner>>,
}

impl CompositeDisposable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handle to the group.
    ///
    /// Members already disposed on their own are pruned here, so a long-lived
    /// group does not grow with dead handles.
    pub fn add(&self, disposable: Disposable) {
        {
            let mut inner = self.inner.borrow_mut();
            if !inner.disposed {
                inner.members.retain(|member| !member.is_disposed());
                inner.members.push(disposable);
                return;
            }
        }
        disposable.dispose();
    }

    /// Dispose every member. Later calls are no-ops.
    pub fn dispose(&self) {
        let members = {
            let mut inner = self.inner.borrow_mut();
            if inner.disposed {
                return;
            }
            inner.disposed = true;
            std::mem::take(&mut inner.members)
        };
        for member in members {
            member.dispose();
        }
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.borrow().disposed
    }

    /// Number of live members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .borrow()
            .members
            .iter()
            .filter(|member| !member.is_disposed())
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A single handle that disposes the whole group.
    #[must_use]
    pub fn to_disposable(&self) -> Disposable {
        let group = self.clone();
        Disposable::new(move || group.dispose())
    }
}

impl fmt::Debug for CompositeDisposable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("CompositeDisposable")
            .field("members", &inner.members.len())
            .field("disposed", &inner.disposed)
            .finish()
    }
}
