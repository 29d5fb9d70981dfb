#![forbid(unsafe_code)]

//! Error values carried on a stream's error channel.

use std::error::Error;
use std::fmt;
use std::rc::Rc;

/// Plain-text error used by [`Fault::msg`].
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct Message(String);

/// A cloneable, type-erased error travelling through an observable.
///
/// Every observer of a failing [`Subject`](crate::Subject) receives a clone
/// of the same fault; the underlying error is shared, not copied.
#[derive(Clone)]
pub struct Fault {
    inner: Rc<dyn Error + 'static>,
}

impl Fault {
    /// Wrap any error value.
    pub fn new<E: Error + 'static>(err: E) -> Self {
        Self {
            inner: Rc::new(err),
        }
    }

    /// Build a fault from a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(Message(message.into()))
    }

    /// Borrow the wrapped error as a concrete type, if it is one.
    #[must_use]
    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        self.inner.downcast_ref::<E>()
    }

    /// Whether two handles point at the same underlying error.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl fmt::Debug for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Fault").field(&self.inner).finish()
    }
}

impl Error for Fault {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.inner.source()
    }
}
