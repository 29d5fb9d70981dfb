#![forbid(unsafe_code)]

//! Forward-declared input handles.
//!
//! A placeholder stands in for a source that does not exist yet. The defining
//! computation subscribes to (or selects from) placeholders as if they were
//! live; once real sources are injected, replication pushes their values into
//! the placeholder's sinks.
//!
//! # Invariants
//!
//! 1. Placeholders are only constructed by the factory, one set per stream.
//! 2. A placeholder's sinks are never replaced; only their contents change.
//! 3. Interaction pairs are kept in sorted `(selector, event)` order, so
//!    replication visits them deterministically.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use relay_core::{Observable, Subject};

use crate::source::Source;

/// Structural discriminant of a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceholderKind {
    /// Stands in for one plain stream.
    Direct,
    /// Stands in for many delegated `(selector, event)` streams.
    Interaction,
}

/// Placeholder for a single plain input stream.
pub struct DirectPlaceholder<T> {
    sink: Subject<T>,
    name: Option<Rc<str>>,
}

impl<T> Clone for DirectPlaceholder<T> {
    fn clone(&self) -> Self {
        Self {
            sink: self.sink.clone(),
            name: self.name.clone(),
        }
    }
}

impl<T> fmt::Debug for DirectPlaceholder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectPlaceholder")
            .field("name", &self.name)
            .field("sink", &self.sink)
            .finish()
    }
}

impl<T: Clone + 'static> DirectPlaceholder<T> {
    pub(crate) fn new(name: Option<Rc<str>>) -> Self {
        Self {
            sink: Subject::new(),
            name,
        }
    }

    /// The values that will be replicated into this placeholder.
    #[must_use]
    pub fn observable(&self) -> Observable<T> {
        self.sink.as_observable()
    }

    #[must_use]
    pub fn kind(&self) -> PlaceholderKind {
        PlaceholderKind::Direct
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn sink(&self) -> &Subject<T> {
        &self.sink
    }
}

impl<T: Clone + 'static> Source<T> for DirectPlaceholder<T> {
    fn subscribable(&self) -> Option<Observable<T>> {
        Some(self.observable())
    }
}

type EventSinks<T> = BTreeMap<String, BTreeMap<String, Subject<T>>>;

/// Placeholder for a delegated event source.
///
/// The defining computation declares the pairs it cares about by calling
/// [`select`](Self::select); replication later asks the injected source for
/// exactly those pairs.
pub struct InteractionPlaceholder<T> {
    events: Rc<RefCell<EventSinks<T>>>,
    name: Option<Rc<str>>,
}

impl<T> Clone for InteractionPlaceholder<T> {
    fn clone(&self) -> Self {
        Self {
            events: Rc::clone(&self.events),
            name: self.name.clone(),
        }
    }
}

impl<T> fmt::Debug for InteractionPlaceholder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let events = self.events.borrow();
        let pairs: Vec<(&str, &str)> = events
            .iter()
            .flat_map(|(selector, by_event)| {
                by_event
                    .keys()
                    .map(move |event| (selector.as_str(), event.as_str()))
            })
            .collect();
        f.debug_struct("InteractionPlaceholder")
            .field("name", &self.name)
            .field("pairs", &pairs)
            .finish()
    }
}

impl<T: Clone + 'static> InteractionPlaceholder<T> {
    pub(crate) fn new(name: Option<Rc<str>>) -> Self {
        Self {
            events: Rc::new(RefCell::new(BTreeMap::new())),
            name,
        }
    }

    /// Declare `(selector, event)` and get the stream replicated into it.
    ///
    /// Selecting the same pair twice returns the same underlying sink.
    pub fn select(&self, selector: &str, event: &str) -> Observable<T> {
        let mut events = self.events.borrow_mut();
        events
            .entry(selector.to_string())
            .or_default()
            .entry(event.to_string())
            .or_insert_with(Subject::new)
            .as_observable()
    }

    /// Every declared pair, sorted.
    #[must_use]
    pub fn declared(&self) -> Vec<(String, String)> {
        self.routes()
            .into_iter()
            .map(|(selector, event, _)| (selector, event))
            .collect()
    }

    #[must_use]
    pub fn pair_count(&self) -> usize {
        self.events.borrow().values().map(BTreeMap::len).sum()
    }

    #[must_use]
    pub fn kind(&self) -> PlaceholderKind {
        PlaceholderKind::Interaction
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Snapshot of `(selector, event, sink)` triples.
    pub(crate) fn routes(&self) -> Vec<(String, String, Subject<T>)> {
        self.events
            .borrow()
            .iter()
            .flat_map(|(selector, by_event)| {
                by_event
                    .iter()
                    .map(move |(event, sink)| (selector.clone(), event.clone(), sink.clone()))
            })
            .collect()
    }
}

/// A forward-declared input of either shape.
pub enum Placeholder<T> {
    Direct(DirectPlaceholder<T>),
    Interaction(InteractionPlaceholder<T>),
}

impl<T> Clone for Placeholder<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Direct(p) => Self::Direct(p.clone()),
            Self::Interaction(p) => Self::Interaction(p.clone()),
        }
    }
}

impl<T> fmt::Debug for Placeholder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct(p) => fmt::Debug::fmt(p, f),
            Self::Interaction(p) => fmt::Debug::fmt(p, f),
        }
    }
}

impl<T: Clone + 'static> Placeholder<T> {
    #[must_use]
    pub fn kind(&self) -> PlaceholderKind {
        match self {
            Self::Direct(_) => PlaceholderKind::Direct,
            Self::Interaction(_) => PlaceholderKind::Interaction,
        }
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Direct(p) => p.name(),
            Self::Interaction(p) => p.name(),
        }
    }

    #[must_use]
    pub fn as_direct(&self) -> Option<&DirectPlaceholder<T>> {
        match self {
            Self::Direct(p) => Some(p),
            Self::Interaction(_) => None,
        }
    }

    #[must_use]
    pub fn as_interaction(&self) -> Option<&InteractionPlaceholder<T>> {
        match self {
            Self::Interaction(p) => Some(p),
            Self::Direct(_) => None,
        }
    }
}

/// The ordered placeholder set handed to a defining computation.
pub struct Placeholders<T> {
    slots: Vec<Placeholder<T>>,
}

impl<T> fmt::Debug for Placeholders<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.slots).finish()
    }
}

impl<T: Clone + 'static> Placeholders<T> {
    pub(crate) fn new(slots: Vec<Placeholder<T>>) -> Self {
        Self { slots }
    }

    pub(crate) fn into_vec(self) -> Vec<Placeholder<T>> {
        self.slots
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn get(&self, position: usize) -> Option<&Placeholder<T>> {
        self.slots.get(position)
    }

    /// The direct placeholder at `position`, if that slot is direct.
    #[must_use]
    pub fn direct(&self, position: usize) -> Option<DirectPlaceholder<T>> {
        self.get(position).and_then(Placeholder::as_direct).cloned()
    }

    /// The interaction placeholder at `position`, if that slot is one.
    #[must_use]
    pub fn interaction(&self, position: usize) -> Option<InteractionPlaceholder<T>> {
        self.get(position)
            .and_then(Placeholder::as_interaction)
            .cloned()
    }

    /// Look a placeholder up by its declared name.
    #[must_use]
    pub fn named(&self, name: &str) -> Option<&Placeholder<T>> {
        self.slots.iter().find(|p| p.name() == Some(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Placeholder<T>> {
        self.slots.iter()
    }
}
