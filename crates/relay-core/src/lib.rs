#![forbid(unsafe_code)]

//! Push-based reactive primitives for Relay.
//!
//! This crate provides the minimal stream contract the rest of the workspace
//! builds on:
//!
//! - [`Observable`]: a subscribable producer of values, errors, and a
//!   completion signal.
//! - [`Subject`]: a hot, multicast [`Sink`] that is also subscribable.
//! - [`Subscriber`]: the consumer side of one subscription.
//! - [`Disposable`] / [`CompositeDisposable`]: explicit cancellation handles.
//! - [`Fault`]: the cloneable error value carried on the error channel.
//!
//! # Architecture
//!
//! Everything is single-threaded. Shared state lives behind
//! `Rc<RefCell<..>>` and no `RefCell` borrow is held while a user callback
//! runs, so callbacks may re-enter (subscribe, emit, dispose) freely.
//!
//! Unlike an RAII guard, dropping a [`Disposable`] does **not** cancel the
//! subscription. Cancellation is always an explicit `dispose()` call, which
//! lets a subscription outlive the scope that created it.
//!
//! # Invariants
//!
//! 1. A [`Subscriber`] receives no events after `error`, `complete`, or
//!    disposal of its subscription.
//! 2. A [`Subject`] notifies observers in subscription order.
//! 3. `dispose()` is idempotent on every handle type.
//! 4. Adding a handle to a disposed [`CompositeDisposable`] disposes it
//!    immediately.

pub mod disposable;
pub mod fault;
pub mod observable;
pub mod ops;
pub mod subject;
pub mod testing;

pub use disposable::{CompositeDisposable, Disposable};
pub use fault::Fault;
pub use observable::{Observable, Sink, Subscriber};
pub use subject::Subject;
