#![forbid(unsafe_code)]

//! Subscribable producers and the consumer side of a subscription.
//!
//! # Design
//!
//! An [`Observable<T>`] is a shared subscribe function. Subscribing hands the
//! function a [`Subscriber<T>`] and receives a [`Disposable`] back. Whether
//! the producer is cold (starts per subscriber, like [`Observable::of`]) or
//! hot (shares one producer, like [`Subject`](crate::Subject)) is up to the
//! subscribe function.
//!
//! # Invariants
//!
//! 1. A subscriber delivers nothing after it is closed. It closes on `error`,
//!    on `complete`, or when its subscription is disposed.
//! 2. `error` and `complete` are delivered at most once between them.
//! 3. Values from one producer reach one subscriber in emission order.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::disposable::Disposable;
use crate::fault::Fault;

/// Anything that accepts the three stream signals.
pub trait Sink<T> {
    /// Push one value.
    fn next(&self, value: T);
    /// Terminate with an error.
    fn error(&self, fault: Fault);
    /// Terminate normally.
    fn complete(&self);
}

struct SubscriberInner<T> {
    on_next: Box<dyn Fn(T)>,
    on_error: Box<dyn Fn(Fault)>,
    on_complete: Box<dyn Fn()>,
    closed: Cell<bool>,
}

/// The consumer end of a single subscription.
///
/// Cloning a `Subscriber` creates a new handle to the **same** callbacks and
/// closed flag.
pub struct Subscriber<T> {
    inner: Rc<SubscriberInner<T>>,
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Subscriber<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("closed", &self.inner.closed.get())
            .finish()
    }
}

impl<T: 'static> Subscriber<T> {
    pub fn new(
        on_next: impl Fn(T) + 'static,
        on_error: impl Fn(Fault) + 'static,
        on_complete: impl Fn() + 'static,
    ) -> Self {
        Self {
            inner: Rc::new(SubscriberInner {
                on_next: Box::new(on_next),
                on_error: Box::new(on_error),
                on_complete: Box::new(on_complete),
                closed: Cell::new(false),
            }),
        }
    }

    /// A subscriber that only observes values. Errors and completion close it
    /// silently.
    pub fn from_next(on_next: impl Fn(T) + 'static) -> Self {
        Self::new(on_next, |_| {}, || {})
    }

    /// Stop delivering events without signalling anything.
    pub fn close(&self) {
        self.inner.closed.set(true);
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.get()
    }
}

impl<T: 'static> Sink<T> for Subscriber<T> {
    fn next(&self, value: T) {
        if !self.inner.closed.get() {
            (self.inner.on_next)(value);
        }
    }

    fn error(&self, fault: Fault) {
        if !self.inner.closed.replace(true) {
            (self.inner.on_error)(fault);
        }
    }

    fn complete(&self) {
        if !self.inner.closed.replace(true) {
            (self.inner.on_complete)();
        }
    }
}

type SubscribeFn<T> = dyn Fn(Subscriber<T>) -> Disposable;

/// A subscribable producer of `T` values.
///
/// Cloning an `Observable` is cheap and yields the same producer.
pub struct Observable<T> {
    subscribe_fn: Rc<SubscribeFn<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            subscribe_fn: Rc::clone(&self.subscribe_fn),
        }
    }
}

impl<T> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable").finish_non_exhaustive()
    }
}

impl<T: 'static> Observable<T> {
    /// Build an observable from its subscribe function.
    ///
    /// The function receives the subscriber and returns the teardown for
    /// whatever it registered.
    pub fn new(subscribe: impl Fn(Subscriber<T>) -> Disposable + 'static) -> Self {
        Self {
            subscribe_fn: Rc::new(subscribe),
        }
    }

    /// Subscribe an existing subscriber.
    ///
    /// Disposing the returned handle closes the subscriber first, so no event
    /// slips through while the producer tears down.
    pub fn subscribe_observer(&self, subscriber: Subscriber<T>) -> Disposable {
        let upstream = (self.subscribe_fn)(subscriber.clone());
        Disposable::new(move || {
            subscriber.close();
            upstream.dispose();
        })
    }

    /// Subscribe to values only.
    pub fn subscribe(&self, on_next: impl Fn(T) + 'static) -> Disposable {
        self.subscribe_observer(Subscriber::from_next(on_next))
    }

    /// Subscribe to values and errors.
    pub fn subscribe_with(
        &self,
        on_next: impl Fn(T) + 'static,
        on_error: impl Fn(Fault) + 'static,
    ) -> Disposable {
        self.subscribe_observer(Subscriber::new(on_next, on_error, || {}))
    }

    /// Subscribe to all three signals.
    pub fn subscribe_all(
        &self,
        on_next: impl Fn(T) + 'static,
        on_error: impl Fn(Fault) + 'static,
        on_complete: impl Fn() + 'static,
    ) -> Disposable {
        self.subscribe_observer(Subscriber::new(on_next, on_error, on_complete))
    }

    /// Completes immediately without emitting.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(|subscriber| {
            subscriber.complete();
            Disposable::empty()
        })
    }

    /// Never emits and never terminates.
    #[must_use]
    pub fn never() -> Self {
        Self::new(|_| Disposable::empty())
    }

    /// Fails immediately with `fault`.
    pub fn fail(fault: Fault) -> Self {
        Self::new(move |subscriber| {
            subscriber.error(fault.clone());
            Disposable::empty()
        })
    }
}

impl<T: Clone + 'static> Observable<T> {
    /// Emit `values` synchronously to each subscriber, then complete.
    pub fn of(values: impl IntoIterator<Item = T>) -> Self {
        let values: Rc<[T]> = values.into_iter().collect();
        Self::new(move |subscriber| {
            for value in values.iter() {
                if subscriber.is_closed() {
                    break;
                }
                subscriber.next(value.clone());
            }
            subscriber.complete();
            Disposable::empty()
        })
    }
}
