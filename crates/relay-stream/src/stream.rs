#![forbid(unsafe_code)]

//! Streams whose inputs are bound after definition.
//!
//! # Lifecycle
//!
//! ```text
//!            inject()                 subscribe()
//!  Created ───────────▶ Injected ─────────────────▶ Subscribed
//!     │                                                 ▲
//!     └──────────────────── subscribe() ────────────────┘
//!
//!  any state ── dispose() ──▶ Disposed (terminal)
//! ```
//!
//! Transitions only move forward. `inject` stages one batch of replications;
//! the batch runs at the first moment a consumer is known to exist: either
//! the next `subscribe`, or immediately if the stream is already subscribed
//! (or activates eagerly). Both paths drain the same queue, so each staged
//! batch runs exactly once no matter which call arrives first.
//!
//! # Invariants
//!
//! 1. `placeholders().len() == arity()` for the life of the stream.
//! 2. A staged replication runs at most once.
//! 3. `dispose()` severs every forwarding path and every consumer
//!    subscription, and is idempotent.
//! 4. No `RefCell` borrow is held while replication or user callbacks run,
//!    so a circular graph may re-enter `subscribe` during activation.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use relay_core::{CompositeDisposable, Disposable, Fault, Observable, Subscriber};

use crate::diagnostics::{Diagnostics, Warning};
use crate::error::Result;
use crate::factory::{Inputs, StreamFactory};
use crate::logging::debug;
use crate::placeholder::{DirectPlaceholder, Placeholder, Placeholders};
use crate::replication::{Replication, Replicator};
use crate::source::{Injected, Input, InteractionSource, Source};

static NEXT_STREAM_ID: AtomicU64 = AtomicU64::new(1);

fn next_stream_id() -> u64 {
    NEXT_STREAM_ID.fetch_add(1, Ordering::Relaxed)
}

/// Where a stream is in its wiring lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Lifecycle {
    /// Defined; no sources bound, no consumer.
    Created,
    /// Sources bound; waiting for a consumer.
    Injected,
    /// A consumer exists; injected sources are wired.
    Subscribed,
    /// Torn down. Terminal.
    Disposed,
}

type Batch<I> = Vec<Replication<I>>;

struct StreamInner<I, O> {
    id: u64,
    output: Observable<O>,
    interactions: Option<Rc<dyn InteractionSource<O>>>,
    placeholders: Vec<Placeholder<I>>,
    lifecycle: Cell<Lifecycle>,
    was_injected: Cell<bool>,
    was_subscribed: Cell<bool>,
    eager: bool,
    pending: RefCell<Vec<Batch<I>>>,
    group: CompositeDisposable,
    replicator: Replicator<I>,
    diagnostics: Rc<dyn Diagnostics>,
}

/// A composed stream with forward-declared inputs of type `I`, producing `O`.
///
/// Cloning a `Stream` creates a new handle to the **same** stream.
pub struct Stream<I, O = I> {
    inner: Rc<StreamInner<I, O>>,
}

impl<I, O> Clone for Stream<I, O> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<I, O> fmt::Debug for Stream<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("id", &self.inner.id)
            .field("arity", &self.inner.placeholders.len())
            .field("lifecycle", &self.inner.lifecycle.get())
            .field("was_injected", &self.inner.was_injected.get())
            .field("was_subscribed", &self.inner.was_subscribed.get())
            .field("pending", &self.inner.pending.borrow().len())
            .finish()
    }
}

/// Everything the factory hands over to build a stream.
pub(crate) struct StreamParts<I, O> {
    pub(crate) output: Observable<O>,
    pub(crate) interactions: Option<Rc<dyn InteractionSource<O>>>,
    pub(crate) placeholders: Vec<Placeholder<I>>,
    pub(crate) eager: bool,
    pub(crate) replicator: Replicator<I>,
    pub(crate) diagnostics: Rc<dyn Diagnostics>,
}

impl<I: Clone + 'static, O: 'static> Stream<I, O> {
    pub(crate) fn from_parts(parts: StreamParts<I, O>) -> Self {
        Self {
            inner: Rc::new(StreamInner {
                id: next_stream_id(),
                output: parts.output,
                interactions: parts.interactions,
                placeholders: parts.placeholders,
                lifecycle: Cell::new(Lifecycle::Created),
                was_injected: Cell::new(false),
                was_subscribed: Cell::new(false),
                eager: parts.eager,
                pending: RefCell::new(Vec::new()),
                group: CompositeDisposable::new(),
                replicator: parts.replicator,
                diagnostics: parts.diagnostics,
            }),
        }
    }

    /// Define a stream over `N` direct inputs with the default factory.
    pub fn define<R, const N: usize>(
        definition: impl FnOnce([DirectPlaceholder<I>; N]) -> R,
    ) -> Result<Self>
    where
        R: Source<O>,
    {
        StreamFactory::default().define(definition)
    }

    /// Define a stream over explicitly declared inputs with the default
    /// factory.
    pub fn create<R>(inputs: Inputs, definition: impl FnOnce(&Placeholders<I>) -> R) -> Result<Self>
    where
        R: Source<O>,
    {
        StreamFactory::default().create(inputs, definition)
    }

    /// Process-unique identifier, used in log events.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Number of declared inputs.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.inner.placeholders.len()
    }

    #[must_use]
    pub fn placeholders(&self) -> &[Placeholder<I>] {
        &self.inner.placeholders
    }

    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.inner.lifecycle.get()
    }

    #[must_use]
    pub fn was_injected(&self) -> bool {
        self.inner.was_injected.get()
    }

    #[must_use]
    pub fn was_subscribed(&self) -> bool {
        self.inner.was_subscribed.get()
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.lifecycle() == Lifecycle::Disposed
    }

    /// Staged batches still waiting for a consumer.
    #[must_use]
    pub fn pending_batches(&self) -> usize {
        self.inner.pending.borrow().len()
    }

    /// Bind sources to the placeholders, position by position.
    ///
    /// Surplus inputs are ignored and missing positions stay unwired; both
    /// are reported as [`Warning::ArityMismatch`]. Shape errors are returned
    /// before anything is staged or reported. The inputs are handed back
    /// unchanged.
    pub fn inject<It>(&self, inputs: It) -> Result<Injected<I>>
    where
        It: IntoIterator,
        It::Item: Into<Input<I>>,
    {
        let inputs: Vec<Input<I>> = inputs.into_iter().map(Into::into).collect();
        let inner = &self.inner;

        if self.is_disposed() {
            inner.diagnostics.warn(&Warning::InjectAfterDispose);
            return Ok(inputs.into());
        }
        let batch = inner
            .placeholders
            .iter()
            .enumerate()
            .filter_map(|(position, placeholder)| {
                let input = inputs.get(position).and_then(Input::source);
                inner
                    .replicator
                    .plan(Some(position), input, Some(placeholder))
                    .transpose()
            })
            .collect::<Result<Batch<I>>>()?;

        if inner.was_injected.get() {
            inner.diagnostics.warn(&Warning::AlreadyInjected);
        }
        if inputs.len() != self.arity() {
            inner.diagnostics.warn(&Warning::ArityMismatch {
                expected: self.arity(),
                supplied: inputs.len(),
            });
        }

        debug!(
            message = "relay.stream.inject",
            stream_id = inner.id,
            supplied = inputs.len(),
            staged = batch.len()
        );
        inner.pending.borrow_mut().push(batch);
        inner.was_injected.set(true);
        self.advance(Lifecycle::Injected);

        if inner.eager || inner.was_subscribed.get() {
            self.activate();
        }
        Ok(inputs.into())
    }

    /// Inject a single source.
    pub fn inject_one(&self, input: impl Into<Input<I>>) -> Result<Injected<I>> {
        self.inject([input.into()])
    }

    /// Subscribe a consumer, then run any staged replications.
    ///
    /// A disposed stream never touches its output; an already-disposed handle
    /// comes back and the consumer sees nothing.
    ///
    /// The returned handle cancels this consumer only; [`dispose`](Self::dispose)
    /// cancels all of them.
    pub fn subscribe_observer(&self, subscriber: Subscriber<O>) -> Disposable {
        if self.is_disposed() {
            let handle = Disposable::empty();
            handle.dispose();
            return handle;
        }
        let handle = self.inner.output.subscribe_observer(subscriber);
        self.inner.group.add(handle.clone());
        self.inner.was_subscribed.set(true);
        self.advance(Lifecycle::Subscribed);
        self.activate();
        handle
    }

    pub fn subscribe(&self, on_next: impl Fn(O) + 'static) -> Disposable {
        self.subscribe_observer(Subscriber::from_next(on_next))
    }

    pub fn subscribe_with(
        &self,
        on_next: impl Fn(O) + 'static,
        on_error: impl Fn(Fault) + 'static,
    ) -> Disposable {
        self.subscribe_observer(Subscriber::new(on_next, on_error, || {}))
    }

    pub fn subscribe_all(
        &self,
        on_next: impl Fn(O) + 'static,
        on_error: impl Fn(Fault) + 'static,
        on_complete: impl Fn() + 'static,
    ) -> Disposable {
        self.subscribe_observer(Subscriber::new(on_next, on_error, on_complete))
    }

    /// Tear down every forwarding path and consumer subscription.
    pub fn dispose(&self) {
        if self.is_disposed() {
            return;
        }
        self.inner.lifecycle.set(Lifecycle::Disposed);
        let dropped = std::mem::take(&mut *self.inner.pending.borrow_mut());
        drop(dropped);
        self.inner.group.dispose();
        debug!(message = "relay.stream.dispose", stream_id = self.inner.id);
    }

    /// This stream as a plain observable. Subscribing to it goes through
    /// [`subscribe_observer`](Self::subscribe_observer), so it activates
    /// pending replication like any other consumer.
    #[must_use]
    pub fn as_observable(&self) -> Observable<O> {
        let stream = self.clone();
        Observable::new(move |subscriber| stream.subscribe_observer(subscriber))
    }

    fn advance(&self, to: Lifecycle) {
        if to > self.inner.lifecycle.get() {
            self.inner.lifecycle.set(to);
        }
    }

    fn activate(&self) {
        let batches = std::mem::take(&mut *self.inner.pending.borrow_mut());
        if batches.is_empty() {
            return;
        }
        debug!(
            message = "relay.stream.activate",
            stream_id = self.inner.id,
            batches = batches.len()
        );
        for replication in batches.into_iter().flatten() {
            let handle = self.inner.replicator.run(replication);
            self.inner.group.add(handle);
        }
    }
}

impl<I: Clone + 'static, O: 'static> Source<O> for Stream<I, O> {
    fn subscribable(&self) -> Option<Observable<O>> {
        Some(self.as_observable())
    }

    fn interactions(&self) -> Option<Rc<dyn InteractionSource<O>>> {
        self.inner.interactions.clone()
    }
}

impl<I: Clone + 'static, O: 'static> From<Stream<I, O>> for Input<O> {
    fn from(stream: Stream<I, O>) -> Self {
        Input::new(stream)
    }
}
