#![forbid(unsafe_code)]

//! Capabilities of things that can be injected into a stream.
//!
//! Injection dispatches on what a source *can do*, not on its concrete type:
//!
//! - [`Source::subscribable`]: a plain stream of values.
//! - [`Source::interactions`]: a delegated event source answering
//!   `select(selector, event)`.
//!
//! A type may expose either, both, or neither. [`Input`] is the type-erased
//! handle `inject` accepts; [`Injected`] is what it hands back.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use relay_core::{Observable, Subject};

/// A delegated event source addressed by `(selector, event)` pairs.
pub trait InteractionSource<T> {
    /// The sub-stream for one pair, or `None` if this source has no match.
    fn select(&self, selector: &str, event: &str) -> Option<Observable<T>>;
}

impl<T, F> InteractionSource<T> for F
where
    F: Fn(&str, &str) -> Option<Observable<T>>,
{
    fn select(&self, selector: &str, event: &str) -> Option<Observable<T>> {
        self(selector, event)
    }
}

/// Capability surface of anything injectable or returned by a definition.
pub trait Source<T> {
    /// Subscribe capability, if any.
    fn subscribable(&self) -> Option<Observable<T>>;

    /// `select(selector, event)` capability, if any.
    fn interactions(&self) -> Option<Rc<dyn InteractionSource<T>>> {
        None
    }
}

impl<T: 'static> Source<T> for Observable<T> {
    fn subscribable(&self) -> Option<Observable<T>> {
        Some(self.clone())
    }
}

impl<T: Clone + 'static> Source<T> for Subject<T> {
    fn subscribable(&self) -> Option<Observable<T>> {
        Some(self.as_observable())
    }
}

impl<T, S: Source<T>> Source<T> for Option<S> {
    fn subscribable(&self) -> Option<Observable<T>> {
        self.as_ref().and_then(Source::subscribable)
    }

    fn interactions(&self) -> Option<Rc<dyn InteractionSource<T>>> {
        self.as_ref().and_then(Source::interactions)
    }
}

/// Exposes nothing. A definition returning `()` fails validation.
impl<T> Source<T> for () {
    fn subscribable(&self) -> Option<Observable<T>> {
        None
    }
}

type Routes<T> = BTreeMap<(String, String), Observable<T>>;

/// A registry of event streams keyed by `(selector, event)`.
///
/// Cloning an `Interactions` creates a new handle to the **same** registry.
/// Optionally carries an "all events" stream, which makes it subscribable as
/// well as selectable.
pub struct Interactions<T> {
    routes: Rc<RefCell<Routes<T>>>,
    all: Option<Observable<T>>,
}

impl<T> Clone for Interactions<T> {
    fn clone(&self) -> Self {
        Self {
            routes: Rc::clone(&self.routes),
            all: self.all.clone(),
        }
    }
}

impl<T> fmt::Debug for Interactions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interactions")
            .field("routes", &self.routes.borrow().keys().collect::<Vec<_>>())
            .field("subscribable", &self.all.is_some())
            .finish()
    }
}

impl<T: 'static> Default for Interactions<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Interactions<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            routes: Rc::new(RefCell::new(BTreeMap::new())),
            all: None,
        }
    }

    /// Register `events` under `(selector, event)`, replacing any previous
    /// registration.
    #[must_use]
    pub fn on(self, selector: &str, event: &str, events: Observable<T>) -> Self {
        self.register(selector, event, events);
        self
    }

    pub fn register(&self, selector: &str, event: &str, events: Observable<T>) {
        self.routes
            .borrow_mut()
            .insert((selector.to_string(), event.to_string()), events);
    }

    /// Attach an "all events" stream.
    #[must_use]
    pub fn with_stream(mut self, all: Observable<T>) -> Self {
        self.all = Some(all);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: 'static> InteractionSource<T> for Interactions<T> {
    fn select(&self, selector: &str, event: &str) -> Option<Observable<T>> {
        self.routes
            .borrow()
            .get(&(selector.to_string(), event.to_string()))
            .cloned()
    }
}

impl<T: 'static> Source<T> for Interactions<T> {
    fn subscribable(&self) -> Option<Observable<T>> {
        self.all.clone()
    }

    fn interactions(&self) -> Option<Rc<dyn InteractionSource<T>>> {
        Some(Rc::new(self.clone()))
    }
}

/// Adapts a bare [`InteractionSource`] into a select-only [`Source`].
struct SelectOnly<T> {
    source: Rc<dyn InteractionSource<T>>,
}

impl<T> Source<T> for SelectOnly<T> {
    fn subscribable(&self) -> Option<Observable<T>> {
        None
    }

    fn interactions(&self) -> Option<Rc<dyn InteractionSource<T>>> {
        Some(Rc::clone(&self.source))
    }
}

/// One positional argument to `inject`.
///
/// An `Input` is either bound to a source or explicitly unbound (a hole at
/// that position).
pub struct Input<T> {
    source: Option<Rc<dyn Source<T>>>,
}

impl<T> Clone for Input<T> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
        }
    }
}

impl<T> fmt::Debug for Input<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            None => f.write_str("Input(unbound)"),
            Some(source) => f
                .debug_struct("Input")
                .field("subscribable", &source.subscribable().is_some())
                .field("selectable", &source.interactions().is_some())
                .finish(),
        }
    }
}

impl<T: 'static> Input<T> {
    pub fn new(source: impl Source<T> + 'static) -> Self {
        Self {
            source: Some(Rc::new(source)),
        }
    }

    /// A select-only input.
    pub fn select_only(source: impl InteractionSource<T> + 'static) -> Self {
        Self::new(SelectOnly {
            source: Rc::new(source),
        })
    }

    /// A hole: this position is supplied but carries no source.
    #[must_use]
    pub fn unbound() -> Self {
        Self { source: None }
    }

    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.source.is_some()
    }

    /// The bound source, if any.
    #[must_use]
    pub fn source(&self) -> Option<&dyn Source<T>> {
        self.source.as_deref()
    }

    /// Whether two inputs are bound to the same source object.
    #[must_use]
    pub fn same_source(&self, other: &Self) -> bool {
        match (&self.source, &other.source) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T: 'static> From<Observable<T>> for Input<T> {
    fn from(source: Observable<T>) -> Self {
        Self::new(source)
    }
}

impl<T: Clone + 'static> From<Subject<T>> for Input<T> {
    fn from(source: Subject<T>) -> Self {
        Self::new(source)
    }
}

impl<T: 'static> From<Interactions<T>> for Input<T> {
    fn from(source: Interactions<T>) -> Self {
        Self::new(source)
    }
}

impl<T: 'static> From<Rc<dyn Source<T>>> for Input<T> {
    fn from(source: Rc<dyn Source<T>>) -> Self {
        Self {
            source: Some(source),
        }
    }
}

/// The inputs handed to `inject`, returned unchanged.
pub enum Injected<T> {
    None,
    One(Input<T>),
    Many(Vec<Input<T>>),
}

impl<T> Clone for Injected<T> {
    fn clone(&self) -> Self {
        match self {
            Self::None => Self::None,
            Self::One(input) => Self::One(input.clone()),
            Self::Many(inputs) => Self::Many(inputs.clone()),
        }
    }
}

impl<T> fmt::Debug for Injected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::One(input) => f.debug_tuple("One").field(input).finish(),
            Self::Many(inputs) => f.debug_tuple("Many").field(inputs).finish(),
        }
    }
}

impl<T> From<Vec<Input<T>>> for Injected<T> {
    fn from(mut inputs: Vec<Input<T>>) -> Self {
        match inputs.len() {
            0 => Self::None,
            1 => inputs.pop().map_or(Self::None, Self::One),
            _ => Self::Many(inputs),
        }
    }
}

impl<T> Injected<T> {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::None => 0,
            Self::One(_) => 1,
            Self::Many(inputs) => inputs.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The single input, if exactly one was injected.
    #[must_use]
    pub fn one(self) -> Option<Input<T>> {
        match self {
            Self::One(input) => Some(input),
            _ => None,
        }
    }

    /// All inputs, in order.
    #[must_use]
    pub fn into_vec(self) -> Vec<Input<T>> {
        match self {
            Self::None => Vec::new(),
            Self::One(input) => vec![input],
            Self::Many(inputs) => inputs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::Sink;
    use relay_core::testing::Recorder;

    #[test]
    fn interactions_select_registered_pairs() {
        let clicks = Subject::new();
        let registry = Interactions::new().on("button", "click", clicks.as_observable());
        assert_eq!(registry.len(), 1);
        assert!(registry.select("button", "click").is_some());
        assert!(registry.select("input", "change").is_none());
        assert!(registry.subscribable().is_none());
        assert!(registry.interactions().is_some());

        let rec = Recorder::new();
        registry
            .select("button", "click")
            .map(|events| events.subscribe_observer(rec.subscriber()));
        clicks.next(1u32);
        assert_eq!(rec.values(), vec![1]);
    }

    #[test]
    fn interactions_with_stream_is_both_shapes() {
        let registry: Interactions<u8> = Interactions::new().with_stream(Observable::never());
        assert!(registry.subscribable().is_some());
        assert!(registry.interactions().is_some());
    }

    #[test]
    fn closures_are_interaction_sources() {
        let clicks: Observable<i32> = Observable::of([7]);
        let source = move |selector: &str, event: &str| {
            (selector == "button" && event == "click").then(|| clicks.clone())
        };
        let input = Input::select_only(source);
        let caps = input.source().expect("bound");
        assert!(caps.subscribable().is_none());
        let select = caps.interactions().expect("selectable");
        assert!(select.select("button", "click").is_some());
        assert!(select.select("form", "submit").is_none());
    }

    #[test]
    fn option_and_unit_sources() {
        let none: Option<Observable<u8>> = None;
        assert!(Source::<u8>::subscribable(&none).is_none());
        assert!(Source::<u8>::subscribable(&Some(Observable::<u8>::never())).is_some());
        assert!(Source::<u8>::subscribable(&()).is_none());
        assert!(Source::<u8>::interactions(&()).is_none());
    }

    #[test]
    fn injected_passthrough_shapes() {
        let a: Input<u8> = Observable::never().into();
        let b: Input<u8> = Input::unbound();

        assert!(Injected::<u8>::from(Vec::new()).is_empty());

        let one = Injected::from(vec![a.clone()]);
        assert_eq!(one.len(), 1);
        assert!(one.one().expect("one").same_source(&a));

        let many = Injected::from(vec![a.clone(), b.clone()]);
        assert_eq!(many.len(), 2);
        let back = many.into_vec();
        assert!(back[0].same_source(&a));
        assert!(!back[1].is_bound());
    }
}
