#![forbid(unsafe_code)]

//! Streams with forward-declared inputs.
//!
//! A [`Stream`] is defined *before* its inputs exist. The defining
//! computation receives placeholders and composes over them as if they were
//! live; real sources are bound later with [`Stream::inject`]. This is what
//! makes circular dataflow expressible: two streams can each consume the
//! other, because neither needs the other to exist at definition time.
//!
//! # Architecture
//!
//! - [`factory`]: declares inputs, runs the definition once, validates the
//!   result.
//! - [`placeholder`]: direct and interaction placeholders.
//! - [`source`]: the capability traits injection dispatches on.
//! - [`replication`]: forwarding from injected sources into placeholders.
//! - [`stream`]: the lifecycle that defers wiring until a consumer exists.
//! - [`config`] / [`diagnostics`] / [`error`]: the ambient surface.
//!
//! # Example
//!
//! ```
//! use relay_core::testing::Recorder;
//! use relay_core::{Sink, Subject};
//! use relay_stream::{DirectPlaceholder, Stream};
//!
//! let doubled: Stream<i32> =
//!     Stream::define(|[input]: [DirectPlaceholder<i32>; 1]| input.observable().map(|x| x * 2))?;
//!
//! let source: Subject<i32> = Subject::new();
//! doubled.inject([source.clone()])?;
//! source.next(5); // no consumer yet: nothing is wired
//!
//! let rec = Recorder::new();
//! doubled.subscribe_observer(rec.subscriber());
//! source.next(5);
//! assert_eq!(rec.values(), vec![10]);
//! # Ok::<(), relay_stream::StreamError>(())
//! ```

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod factory;
mod logging;
pub mod placeholder;
pub mod replication;
pub mod source;
pub mod stream;
pub mod testing;

pub use config::{MissingInputPolicy, StreamConfig};
pub use diagnostics::{Diagnostics, TracingDiagnostics, Warning};
pub use error::{InjectionMismatch, Result, StreamError};
pub use factory::{InputDecl, Inputs, StreamFactory, require_subscribable};
pub use placeholder::{
    DirectPlaceholder, InteractionPlaceholder, Placeholder, PlaceholderKind, Placeholders,
};
pub use replication::Replicator;
pub use source::{Injected, Input, InteractionSource, Interactions, Source};
pub use stream::{Lifecycle, Stream};
