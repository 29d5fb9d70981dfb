#![forbid(unsafe_code)]

//! Forwarding of injected sources into placeholders.
//!
//! # Design
//!
//! Replication is split in two steps so that shape errors surface at
//! injection time while the wiring itself can be deferred:
//!
//! 1. [`Replicator::plan`] resolves which strategy a `(source, placeholder)`
//!    pair needs and fails fast with [`StreamError::InvalidInjection`] if
//!    neither applies.
//! 2. [`Replicator::run`] performs the wiring and returns one handle for it.
//!
//! [`Replicator::replicate_all`] does both at once.
//!
//! # Dispatch
//!
//! The source's capabilities are checked first, `select` before `subscribe`:
//!
//! | source exposes       | placeholder  | strategy                      |
//! |----------------------|--------------|-------------------------------|
//! | `select`             | interaction  | `forward_interactions`        |
//! | `select`             | direct       | nothing (no declared pairs)   |
//! | `subscribe` only     | direct       | `forward`                     |
//! | `subscribe` only     | interaction  | `InvalidInjection`            |
//! | neither              | any          | `InvalidInjection`            |
//!
//! A missing source is skipped or rejected per [`MissingInputPolicy`]; a
//! missing placeholder (surplus input) is always skipped.

use std::fmt;
use std::rc::Rc;

use relay_core::{CompositeDisposable, Disposable, Observable, Sink, Subject};

use crate::config::{MissingInputPolicy, StreamConfig};
use crate::diagnostics::Diagnostics;
use crate::error::{InjectionMismatch, Result, StreamError};
use crate::logging::trace;
use crate::placeholder::{InteractionPlaceholder, Placeholder};
use crate::source::{InteractionSource, Source};

/// A resolved, not yet started, replication.
pub(crate) enum Replication<T> {
    Direct {
        position: Option<usize>,
        source: Observable<T>,
        sink: Subject<T>,
    },
    Interactions {
        position: Option<usize>,
        source: Rc<dyn InteractionSource<T>>,
        placeholder: InteractionPlaceholder<T>,
    },
}

impl<T> fmt::Debug for Replication<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct { position, .. } => f
                .debug_struct("Replication::Direct")
                .field("position", position)
                .finish_non_exhaustive(),
            Self::Interactions { position, .. } => f
                .debug_struct("Replication::Interactions")
                .field("position", position)
                .finish_non_exhaustive(),
        }
    }
}

/// Forwards source emissions into placeholder sinks.
pub struct Replicator<T> {
    diagnostics: Rc<dyn Diagnostics>,
    missing_inputs: MissingInputPolicy,
    forward_completion: bool,
    _values: std::marker::PhantomData<fn(T)>,
}

impl<T> Clone for Replicator<T> {
    fn clone(&self) -> Self {
        Self {
            diagnostics: Rc::clone(&self.diagnostics),
            missing_inputs: self.missing_inputs,
            forward_completion: self.forward_completion,
            _values: std::marker::PhantomData,
        }
    }
}

impl<T> fmt::Debug for Replicator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Replicator")
            .field("missing_inputs", &self.missing_inputs)
            .field("forward_completion", &self.forward_completion)
            .finish_non_exhaustive()
    }
}

impl<T: Clone + 'static> Replicator<T> {
    pub fn new(config: &StreamConfig, diagnostics: Rc<dyn Diagnostics>) -> Self {
        Self {
            diagnostics,
            missing_inputs: config.missing_inputs,
            forward_completion: config.forward_completion,
            _values: std::marker::PhantomData,
        }
    }

    /// Push every value (and error) of `source` into `sink`.
    ///
    /// Errors reach the sink first and are then reported to diagnostics.
    /// Completion is forwarded only when configured.
    pub fn forward(&self, source: &Observable<T>, sink: &Subject<T>) -> Disposable {
        let next_sink = sink.clone();
        let error_sink = sink.clone();
        let done_sink = sink.clone();
        let diagnostics = Rc::clone(&self.diagnostics);
        let forward_completion = self.forward_completion;
        source.subscribe_all(
            move |value| next_sink.next(value),
            move |fault| {
                error_sink.error(fault.clone());
                diagnostics.upstream_error(&fault);
            },
            move || {
                if forward_completion {
                    done_sink.complete();
                }
            },
        )
    }

    /// Wire every pair declared by `placeholder` that `input` can serve.
    pub fn forward_interactions(
        &self,
        input: &dyn InteractionSource<T>,
        placeholder: &InteractionPlaceholder<T>,
    ) -> CompositeDisposable {
        let group = CompositeDisposable::new();
        for (selector, event, sink) in placeholder.routes() {
            match input.select(&selector, &event) {
                Some(source) => {
                    trace!(message = "relay.replicate.pair", %selector, %event);
                    group.add(self.forward(&source, &sink));
                }
                None => {
                    trace!(message = "relay.replicate.pair_unmatched", %selector, %event);
                }
            }
        }
        group
    }

    /// Resolve and immediately run the replication for one pair.
    ///
    /// Returns `Ok(None)` when there was nothing to wire.
    pub fn replicate_all(
        &self,
        input: Option<&dyn Source<T>>,
        placeholder: Option<&Placeholder<T>>,
    ) -> Result<Option<Disposable>> {
        Ok(self
            .plan(None, input, placeholder)?
            .map(|replication| self.run(replication)))
    }

    pub(crate) fn plan(
        &self,
        position: Option<usize>,
        input: Option<&dyn Source<T>>,
        placeholder: Option<&Placeholder<T>>,
    ) -> Result<Option<Replication<T>>> {
        let Some(placeholder) = placeholder else {
            return Ok(None);
        };
        let Some(input) = input else {
            return match self.missing_inputs {
                MissingInputPolicy::Skip => Ok(None),
                MissingInputPolicy::Reject => Err(StreamError::MissingInput { position }),
            };
        };
        let mismatch = |reason| StreamError::InvalidInjection { position, reason };

        if let Some(source) = input.interactions() {
            return Ok(match placeholder {
                Placeholder::Interaction(placeholder) => Some(Replication::Interactions {
                    position,
                    source,
                    placeholder: placeholder.clone(),
                }),
                Placeholder::Direct(_) => {
                    trace!(message = "relay.replicate.no_pairs", ?position);
                    None
                }
            });
        }

        match (input.subscribable(), placeholder) {
            (Some(source), Placeholder::Direct(placeholder)) => Ok(Some(Replication::Direct {
                position,
                source,
                sink: placeholder.sink().clone(),
            })),
            (Some(_), Placeholder::Interaction(_)) => {
                Err(mismatch(InjectionMismatch::NotSelectable))
            }
            (None, _) => Err(mismatch(InjectionMismatch::Unrecognized)),
        }
    }

    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    pub(crate) fn run(&self, replication: Replication<T>) -> Disposable {
        match replication {
            Replication::Direct {
                position,
                source,
                sink,
            } => {
                trace!(message = "relay.replicate.direct", ?position);
                self.forward(&source, &sink)
            }
            Replication::Interactions {
                position,
                source,
                placeholder,
            } => {
                trace!(
                    message = "relay.replicate.interactions",
                    ?position,
                    pairs = placeholder.pair_count()
                );
                self.forward_interactions(source.as_ref(), &placeholder)
                    .to_disposable()
            }
        }
    }
}
