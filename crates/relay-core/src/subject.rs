#![forbid(unsafe_code)]

//! Hot, multicast sinks.
//!
//! A [`Subject`] is both a [`Sink`] and a source: values pushed into it are
//! fanned out to every current observer. Late observers see only values
//! pushed after they subscribed, except that a terminated subject replays its
//! terminal signal (error or completion) to anyone subscribing afterwards.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::disposable::Disposable;
use crate::fault::Fault;
use crate::observable::{Observable, Sink, Subscriber};

#[derive(Clone)]
enum Terminal {
    Completed,
    Failed(Fault),
}

struct SubjectInner<T> {
    observers: Vec<(u64, Subscriber<T>)>,
    next_id: u64,
    terminal: Option<Terminal>,
}

/// Multicast sink and source.
///
/// Cloning a `Subject` creates a new handle to the **same** observer list.
pub struct Subject<T> {
    inner: Rc<RefCell<SubjectInner<T>>>,
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Subject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Subject")
            .field("observers", &inner.observers.len())
            .field("terminated", &inner.terminal.is_some())
            .finish()
    }
}

impl<T: Clone + 'static> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> Subject<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SubjectInner {
                observers: Vec::new(),
                next_id: 0,
                terminal: None,
            })),
        }
    }

    /// Number of observers currently attached.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.inner.borrow().observers.len()
    }

    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.inner.borrow().terminal.is_some()
    }

    /// View this subject as a plain observable.
    #[must_use]
    pub fn as_observable(&self) -> Observable<T> {
        let subject = self.clone();
        Observable::new(move |subscriber| subject.attach(subscriber))
    }

    fn attach(&self, subscriber: Subscriber<T>) -> Disposable {
        let terminal = {
            let mut inner = self.inner.borrow_mut();
            match inner.terminal.clone() {
                Some(terminal) => terminal,
                None => {
                    let id = inner.next_id;
                    inner.next_id += 1;
                    inner.observers.push((id, subscriber));
                    let weak: Weak<RefCell<SubjectInner<T>>> = Rc::downgrade(&self.inner);
                    return Disposable::new(move || {
                        if let Some(inner) = weak.upgrade() {
                            inner.borrow_mut().observers.retain(|(oid, _)| *oid != id);
                        }
                    });
                }
            }
        };
        match terminal {
            Terminal::Completed => subscriber.complete(),
            Terminal::Failed(fault) => subscriber.error(fault),
        }
        Disposable::empty()
    }

    fn snapshot(&self) -> Vec<Subscriber<T>> {
        let inner = self.inner.borrow();
        if inner.terminal.is_some() {
            return Vec::new();
        }
        inner.observers.iter().map(|(_, s)| s.clone()).collect()
    }

    fn terminate(&self, terminal: Terminal) -> Vec<Subscriber<T>> {
        let mut inner = self.inner.borrow_mut();
        if inner.terminal.is_some() {
            return Vec::new();
        }
        inner.terminal = Some(terminal);
        std::mem::take(&mut inner.observers)
            .into_iter()
            .map(|(_, s)| s)
            .collect()
    }
}

impl<T: Clone + 'static> Sink<T> for Subject<T> {
    fn next(&self, value: T) {
        for observer in self.snapshot() {
            observer.next(value.clone());
        }
    }

    fn error(&self, fault: Fault) {
        for observer in self.terminate(Terminal::Failed(fault.clone())) {
            observer.error(fault.clone());
        }
    }

    fn complete(&self) {
        for observer in self.terminate(Terminal::Completed) {
            observer.complete();
        }
    }
}
