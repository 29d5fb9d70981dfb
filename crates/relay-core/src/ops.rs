#![forbid(unsafe_code)]

//! Operators for composing observables.
//!
//! Every operator returns a new cold [`Observable`] that subscribes to its
//! upstream once per downstream subscriber. Errors always pass through;
//! completion passes through unless the operator ends the stream itself
//! (`take`).

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::disposable::Disposable;
use crate::observable::{Observable, Sink, Subscriber};

/// Build an upstream subscriber that forwards errors and completion to
/// `downstream` and hands values to `on_next`.
fn relay<T, U>(
    downstream: Subscriber<U>,
    on_next: impl Fn(&Subscriber<U>, T) + 'static,
) -> Subscriber<T>
where
    T: 'static,
    U: 'static,
{
    let for_next = downstream.clone();
    let for_error = downstream.clone();
    Subscriber::new(
        move |value| on_next(&for_next, value),
        move |fault| for_error.error(fault),
        move || downstream.complete(),
    )
}

impl<T: 'static> Observable<T> {
    /// Transform each value.
    pub fn map<U: 'static>(&self, f: impl Fn(T) -> U + 'static) -> Observable<U> {
        let source = self.clone();
        let f = Rc::new(f);
        Observable::new(move |downstream| {
            let f = Rc::clone(&f);
            source.subscribe_observer(relay(downstream, move |out, value| out.next(f(value))))
        })
    }

    /// Keep values matching `predicate`.
    pub fn filter(&self, predicate: impl Fn(&T) -> bool + 'static) -> Observable<T> {
        let source = self.clone();
        let predicate = Rc::new(predicate);
        Observable::new(move |downstream| {
            let predicate = Rc::clone(&predicate);
            source.subscribe_observer(relay(downstream, move |out, value| {
                if predicate(&value) {
                    out.next(value);
                }
            }))
        })
    }

    /// Emit a running accumulation, starting from `seed` for each subscriber.
    pub fn scan<A: Clone + 'static>(
        &self,
        seed: A,
        f: impl Fn(A, T) -> A + 'static,
    ) -> Observable<A> {
        let source = self.clone();
        let f = Rc::new(f);
        Observable::new(move |downstream| {
            let f = Rc::clone(&f);
            let acc = RefCell::new(seed.clone());
            source.subscribe_observer(relay(downstream, move |out, value| {
                let next = f(acc.borrow().clone(), value);
                *acc.borrow_mut() = next.clone();
                out.next(next);
            }))
        })
    }

    /// Emit at most `count` values, then complete and unsubscribe upstream.
    pub fn take(&self, count: usize) -> Observable<T> {
        let source = self.clone();
        Observable::new(move |downstream: Subscriber<T>| {
            if count == 0 {
                downstream.complete();
                return Disposable::empty();
            }
            let upstream: Rc<RefCell<Option<Disposable>>> = Rc::new(RefCell::new(None));
            let finished = Rc::new(Cell::new(false));
            let remaining = Cell::new(count);
            let (slot, done) = (Rc::clone(&upstream), Rc::clone(&finished));
            let handle = source.subscribe_observer(relay(downstream, move |out, value| {
                if done.get() {
                    return;
                }
                remaining.set(remaining.get() - 1);
                out.next(value);
                if remaining.get() == 0 {
                    done.set(true);
                    out.complete();
                    let held = slot.borrow_mut().take();
                    if let Some(handle) = held {
                        handle.dispose();
                    }
                }
            }));
            // The limit may be hit while subscribing to a synchronous source.
            if finished.get() {
                handle.dispose();
            } else {
                *upstream.borrow_mut() = Some(handle.clone());
            }
            handle
        })
    }

    /// Interleave values from `self` and `other`; completes when both have.
    pub fn merge(&self, other: &Observable<T>) -> Observable<T> {
        let sources = [self.clone(), other.clone()];
        Observable::new(move |downstream: Subscriber<T>| {
            let live = Rc::new(Cell::new(sources.len()));
            let handles: Vec<Disposable> = sources
                .iter()
                .map(|source| {
                    let for_next = downstream.clone();
                    let for_error = downstream.clone();
                    let for_complete = downstream.clone();
                    let live = Rc::clone(&live);
                    source.subscribe_all(
                        move |value| for_next.next(value),
                        move |fault| for_error.error(fault),
                        move || {
                            live.set(live.get() - 1);
                            if live.get() == 0 {
                                for_complete.complete();
                            }
                        },
                    )
                })
                .collect();
            Disposable::new(move || {
                for handle in handles {
                    handle.dispose();
                }
            })
        })
    }
}

impl<T: Clone + 'static> Observable<T> {
    /// Emit `value` to each subscriber before subscribing upstream.
    pub fn start_with(&self, value: T) -> Observable<T> {
        let source = self.clone();
        Observable::new(move |downstream: Subscriber<T>| {
            downstream.next(value.clone());
            source.subscribe_observer(downstream)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{Fault, Subject};

    use super::*;

    fn record<T: Clone + 'static>(source: &Observable<T>) -> (Disposable, Rc<RefCell<Vec<T>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let handle = source.subscribe(move |v| s.borrow_mut().push(v));
        (handle, seen)
    }

    #[test]
    fn map_and_filter_chain() {
        let evens_doubled = Observable::of(1..=6).filter(|v| v % 2 == 0).map(|v| v * 2);
        let (_h, seen) = record(&evens_doubled);
        assert_eq!(*seen.borrow(), vec![4, 8, 12]);
    }

    #[test]
    fn scan_restarts_per_subscriber() {
        let sums = Observable::of([1, 2, 3]).scan(0, |acc, v| acc + v);
        let (_a, first) = record(&sums);
        let (_b, second) = record(&sums);
        assert_eq!(*first.borrow(), vec![1, 3, 6]);
        assert_eq!(*second.borrow(), vec![1, 3, 6]);
    }

    #[test]
    fn take_limits_and_detaches_hot_source() {
        let subject = Subject::new();
        let (_h, seen) = record(&subject.as_observable().take(2));
        subject.next(1);
        subject.next(2);
        assert_eq!(subject.observer_count(), 0);
        subject.next(3);
        assert_eq!(*seen.borrow(), vec![1, 2]);
    }

    #[test]
    fn take_on_synchronous_source() {
        let (_h, seen) = record(&Observable::of(0..100).take(3));
        assert_eq!(*seen.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn take_zero_completes_without_subscribing() {
        let subject: Subject<i32> = Subject::new();
        let done = Rc::new(Cell::new(false));
        let d = Rc::clone(&done);
        subject
            .as_observable()
            .take(0)
            .subscribe_all(|_| {}, |_| {}, move || d.set(true));
        assert!(done.get());
        assert_eq!(subject.observer_count(), 0);
    }

    #[test]
    fn start_with_prepends() {
        let (_h, seen) = record(&Observable::of([2, 3]).start_with(1));
        assert_eq!(*seen.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn merge_interleaves_and_completes_after_both() {
        let left = Subject::new();
        let right = Subject::new();
        let merged = left.as_observable().merge(&right.as_observable());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let done = Rc::new(Cell::new(false));
        let (s, d) = (Rc::clone(&seen), Rc::clone(&done));
        merged.subscribe_all(move |v| s.borrow_mut().push(v), |_| {}, move || d.set(true));

        left.next("l1");
        right.next("r1");
        left.next("l2");
        left.complete();
        assert!(!done.get());
        right.complete();
        assert!(done.get());
        assert_eq!(*seen.borrow(), vec!["l1", "r1", "l2"]);
    }

    #[test]
    fn errors_pass_through_operators() {
        let subject: Subject<i32> = Subject::new();
        let failed = Rc::new(Cell::new(false));
        let f = Rc::clone(&failed);
        subject
            .as_observable()
            .map(|v| v + 1)
            .filter(|_| true)
            .subscribe_with(|_| {}, move |_| f.set(true));
        subject.error(Fault::msg("upstream"));
        assert!(failed.get());
    }

    #[test]
    fn disposing_downstream_detaches_upstream() {
        let subject = Subject::new();
        let (handle, _seen) = record(&subject.as_observable().map(|v: i32| v));
        assert_eq!(subject.observer_count(), 1);
        handle.dispose();
        assert_eq!(subject.observer_count(), 0);
    }
}
