#![forbid(unsafe_code)]

//! Relay public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users.

pub use relay_core::{CompositeDisposable, Disposable, Fault, Observable, Sink, Subject, Subscriber};
pub use relay_stream::{
    DirectPlaceholder, Input, Inputs, InteractionPlaceholder, Interactions, Lifecycle, Stream,
    StreamConfig, StreamError, StreamFactory,
};

pub mod prelude {
    pub use relay_core as core;
    pub use relay_stream as stream;

    pub use relay_core::{Observable, Sink, Subject};
    pub use relay_stream::{DirectPlaceholder, Input, Inputs, Interactions, Source, Stream};
}
