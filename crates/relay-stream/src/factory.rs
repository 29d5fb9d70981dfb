#![forbid(unsafe_code)]

//! Building streams from defining computations.
//!
//! A definition is any `FnOnce` that receives placeholders and returns
//! something implementing [`Source`]. The factory creates one placeholder
//! per declared input, runs the definition exactly once, and checks that the
//! result can actually be subscribed to.
//!
//! # Failure Modes
//!
//! - Duplicate input names: [`StreamError::Construction`] before the
//!   definition runs.
//! - A result without subscribe capability (for example `()` or `None`):
//!   [`StreamError::Construction`].

use std::collections::HashSet;
use std::rc::Rc;

use relay_core::Observable;

use crate::config::StreamConfig;
use crate::diagnostics::{Diagnostics, TracingDiagnostics};
use crate::error::{Result, StreamError};
use crate::logging::debug;
use crate::placeholder::{
    DirectPlaceholder, InteractionPlaceholder, Placeholder, PlaceholderKind, Placeholders,
};
use crate::replication::Replicator;
use crate::source::Source;
use crate::stream::{Stream, StreamParts};

/// One declared input slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDecl {
    kind: PlaceholderKind,
    name: Option<String>,
}

impl InputDecl {
    #[must_use]
    pub fn kind(&self) -> PlaceholderKind {
        self.kind
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Ordered input declarations. The length is the stream's arity.
///
/// ```
/// use relay_stream::{Inputs, PlaceholderKind};
///
/// let inputs = Inputs::new().named_interaction("dom").direct();
/// assert_eq!(inputs.len(), 2);
/// assert_eq!(inputs.kinds(), vec![PlaceholderKind::Interaction, PlaceholderKind::Direct]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inputs {
    decls: Vec<InputDecl>,
}

impl Inputs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `count` anonymous direct inputs.
    #[must_use]
    pub fn directs(count: usize) -> Self {
        (0..count).fold(Self::new(), |inputs, _| inputs.direct())
    }

    #[must_use]
    pub fn direct(self) -> Self {
        self.push(PlaceholderKind::Direct, None)
    }

    #[must_use]
    pub fn interaction(self) -> Self {
        self.push(PlaceholderKind::Interaction, None)
    }

    #[must_use]
    pub fn named_direct(self, name: impl Into<String>) -> Self {
        self.push(PlaceholderKind::Direct, Some(name.into()))
    }

    #[must_use]
    pub fn named_interaction(self, name: impl Into<String>) -> Self {
        self.push(PlaceholderKind::Interaction, Some(name.into()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.decls.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    #[must_use]
    pub fn kinds(&self) -> Vec<PlaceholderKind> {
        self.decls.iter().map(InputDecl::kind).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InputDecl> {
        self.decls.iter()
    }

    fn push(mut self, kind: PlaceholderKind, name: Option<String>) -> Self {
        self.decls.push(InputDecl { kind, name });
        self
    }

    fn check_names(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for name in self.decls.iter().filter_map(InputDecl::name) {
            if !seen.insert(name) {
                return Err(StreamError::construction(format!(
                    "duplicate input name `{name}`"
                )));
            }
        }
        Ok(())
    }

    fn placeholders<I: Clone + 'static>(&self) -> Placeholders<I> {
        Placeholders::new(
            self.decls
                .iter()
                .map(|decl| {
                    let name = decl.name.as_deref().map(Rc::from);
                    match decl.kind {
                        PlaceholderKind::Direct => Placeholder::Direct(DirectPlaceholder::new(name)),
                        PlaceholderKind::Interaction => {
                            Placeholder::Interaction(InteractionPlaceholder::new(name))
                        }
                    }
                })
                .collect(),
        )
    }
}

/// The subscribe capability of `value`, or a construction error.
pub fn require_subscribable<O, R>(value: &R) -> Result<Observable<O>>
where
    R: Source<O> + ?Sized,
{
    value.subscribable().ok_or_else(|| {
        StreamError::construction("definition result does not expose subscribe")
    })
}

/// Builds [`Stream`]s with a shared configuration and diagnostics sink.
///
/// Cloning a `StreamFactory` shares the **same** diagnostics sink.
#[derive(Clone)]
pub struct StreamFactory {
    config: StreamConfig,
    diagnostics: Rc<dyn Diagnostics>,
}

impl std::fmt::Debug for StreamFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamFactory")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for StreamFactory {
    fn default() -> Self {
        Self::new(StreamConfig::default())
    }
}

impl StreamFactory {
    #[must_use]
    pub fn new(config: StreamConfig) -> Self {
        Self {
            config,
            diagnostics: Rc::new(TracingDiagnostics),
        }
    }

    /// A factory configured from `RELAY_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(StreamConfig::from_env())
    }

    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: impl Diagnostics + 'static) -> Self {
        self.diagnostics = Rc::new(diagnostics);
        self
    }

    #[must_use]
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Run `definition` over placeholders for `inputs` and wrap the result.
    pub fn create<I, O, R>(
        &self,
        inputs: Inputs,
        definition: impl FnOnce(&Placeholders<I>) -> R,
    ) -> Result<Stream<I, O>>
    where
        I: Clone + 'static,
        O: 'static,
        R: Source<O>,
    {
        inputs.check_names()?;
        let placeholders = inputs.placeholders();
        let result = definition(&placeholders);
        self.assemble(placeholders, &result)
    }

    /// Shorthand for `N` direct inputs, handed over as an array.
    pub fn define<I, O, R, const N: usize>(
        &self,
        definition: impl FnOnce([DirectPlaceholder<I>; N]) -> R,
    ) -> Result<Stream<I, O>>
    where
        I: Clone + 'static,
        O: 'static,
        R: Source<O>,
    {
        let directs: [DirectPlaceholder<I>; N] = std::array::from_fn(|_| DirectPlaceholder::new(None));
        let placeholders =
            Placeholders::new(directs.iter().cloned().map(Placeholder::Direct).collect());
        let result = definition(directs);
        self.assemble(placeholders, &result)
    }

    fn assemble<I, O, R>(&self, placeholders: Placeholders<I>, result: &R) -> Result<Stream<I, O>>
    where
        I: Clone + 'static,
        O: 'static,
        R: Source<O>,
    {
        let output = require_subscribable(result)?;
        let interactions = result.interactions();
        let eager = self.config.eager_activation || interactions.is_some();

        debug!(
            message = "relay.stream.create",
            arity = placeholders.len(),
            eager
        );
        Ok(Stream::from_parts(StreamParts {
            output,
            interactions,
            placeholders: placeholders.into_vec(),
            eager,
            replicator: Replicator::new(&self.config, Rc::clone(&self.diagnostics)),
            diagnostics: Rc::clone(&self.diagnostics),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Interactions;
    use crate::testing::RecordingDiagnostics;
    use relay_core::Subject;

    #[test]
    fn unit_result_is_rejected() {
        let result: Result<Stream<i32>> = StreamFactory::default().create(Inputs::directs(1), |_| ());
        let err = result.expect_err("unit exposes nothing");
        assert!(matches!(err, StreamError::Construction { .. }));
        assert!(err.to_string().contains("subscribe"));
    }

    #[test]
    fn none_result_is_rejected() {
        let result: Result<Stream<i32>> =
            StreamFactory::default().create(Inputs::directs(1), |_| None::<Observable<i32>>);
        let err = result.expect_err("absent result");
        assert!(matches!(err, StreamError::Construction { .. }));
    }

    #[test]
    fn duplicate_names_are_rejected_before_definition_runs() {
        let ran = std::cell::Cell::new(false);
        let result: Result<Stream<i32>> = StreamFactory::default().create(
            Inputs::new().named_direct("x").named_interaction("x"),
            |_| {
                ran.set(true);
                Observable::never()
            },
        );
        let err = result.expect_err("duplicate");
        assert!(err.to_string().contains("duplicate input name `x`"));
        assert!(!ran.get());
    }

    #[test]
    fn definition_runs_once_with_declared_shapes() {
        let calls = std::cell::Cell::new(0);
        let stream: Stream<i32> = StreamFactory::default()
            .create(
                Inputs::new().named_interaction("dom").named_direct("ticks"),
                |placeholders| {
                    calls.set(calls.get() + 1);
                    assert_eq!(placeholders.len(), 2);
                    assert_eq!(
                        placeholders.named("dom").map(Placeholder::kind),
                        Some(PlaceholderKind::Interaction)
                    );
                    placeholders.direct(1).map(|ticks| ticks.observable())
                },
            )
            .expect("valid");
        assert_eq!(calls.get(), 1);
        assert_eq!(stream.arity(), 2);
        assert_eq!(stream.placeholders()[1].name(), Some("ticks"));
    }

    #[test]
    fn define_exposes_array_placeholders_on_the_stream() {
        let stream: Stream<i32> = StreamFactory::default()
            .define(|[a, b]: [DirectPlaceholder<i32>; 2]| a.observable().merge(&b.observable()))
            .expect("valid");
        assert_eq!(stream.arity(), 2);
        assert!(
            stream
                .placeholders()
                .iter()
                .all(|p| p.kind() == PlaceholderKind::Direct)
        );
    }

    #[test]
    fn interactions_result_activates_eagerly() {
        let diagnostics = RecordingDiagnostics::new();
        let factory = StreamFactory::default().with_diagnostics(diagnostics.clone());
        let stream: Stream<i32> = factory
            .define(|[input]: [DirectPlaceholder<i32>; 1]| {
                Interactions::new().with_stream(input.observable())
            })
            .expect("valid");
        let source: Subject<i32> = Subject::new();
        stream.inject([source.clone()]).expect("inject");
        assert_eq!(source.observer_count(), 1);
        assert_eq!(stream.pending_batches(), 0);
    }

    #[test]
    fn eager_config_activates_plain_streams() {
        let factory = StreamFactory::new(StreamConfig::default().with_eager_activation(true));
        let stream: Stream<i32> = factory
            .define(|[input]: [DirectPlaceholder<i32>; 1]| input.observable())
            .expect("valid");
        let source: Subject<i32> = Subject::new();
        stream.inject([source.clone()]).expect("inject");
        assert_eq!(source.observer_count(), 1);
    }

    #[test]
    fn require_subscribable_accepts_subjects() {
        let subject: Subject<u8> = Subject::new();
        assert!(require_subscribable(&subject).is_ok());
        assert!(require_subscribable::<u8, _>(&()).is_err());
    }
}
