#![forbid(unsafe_code)]

//! Helpers for asserting on what an observable delivered.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::fault::Fault;
use crate::observable::Subscriber;

struct RecorderInner<T> {
    values: RefCell<Vec<T>>,
    faults: RefCell<Vec<Fault>>,
    completions: Cell<usize>,
}

/// Collects every signal a subscriber receives.
///
/// Cloning a `Recorder` creates a new handle to the **same** log.
pub struct Recorder<T> {
    inner: Rc<RecorderInner<T>>,
}

impl<T> Clone for Recorder<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> Default for Recorder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> Recorder<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RecorderInner {
                values: RefCell::new(Vec::new()),
                faults: RefCell::new(Vec::new()),
                completions: Cell::new(0),
            }),
        }
    }

    /// A fresh subscriber that logs into this recorder.
    #[must_use]
    pub fn subscriber(&self) -> Subscriber<T> {
        let (values, faults, done) = (self.clone(), self.clone(), self.clone());
        Subscriber::new(
            move |value| values.inner.values.borrow_mut().push(value),
            move |fault| faults.inner.faults.borrow_mut().push(fault),
            move || done.inner.completions.set(done.inner.completions.get() + 1),
        )
    }

    #[must_use]
    pub fn values(&self) -> Vec<T> {
        self.inner.values.borrow().clone()
    }

    /// Fault messages in arrival order.
    #[must_use]
    pub fn faults(&self) -> Vec<String> {
        self.inner
            .faults
            .borrow()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[must_use]
    pub fn completions(&self) -> usize {
        self.inner.completions.get()
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completions() > 0
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.inner.values.borrow_mut().clear();
        self.inner.faults.borrow_mut().clear();
        self.inner.completions.set(0);
    }
}
