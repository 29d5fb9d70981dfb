#![forbid(unsafe_code)]

use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StreamError>;

/// Structural contract violations. Data-level faults never surface here;
/// they travel down the stream's error channel instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    #[error("stream definition is invalid: {reason}")]
    Construction { reason: String },

    #[error("invalid injection{}: {reason}", at_position(.position))]
    InvalidInjection {
        position: Option<usize>,
        reason: InjectionMismatch,
    },

    #[error("missing input{}", at_position(.position))]
    MissingInput { position: Option<usize> },
}

impl StreamError {
    #[must_use]
    pub fn construction(reason: impl Into<String>) -> Self {
        Self::Construction {
            reason: reason.into(),
        }
    }

    /// Input position the error refers to, when it refers to one.
    #[must_use]
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::Construction { .. } => None,
            Self::InvalidInjection { position, .. } | Self::MissingInput { position } => *position,
        }
    }
}

fn at_position(position: &Option<usize>) -> String {
    match position {
        Some(p) => format!(" at position {p}"),
        None => String::new(),
    }
}

/// Why a source could not be bound to a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionMismatch {
    /// Interaction placeholder, but the source has no `select` capability.
    NotSelectable,
    /// The source exposes neither capability.
    Unrecognized,
}

impl fmt::Display for InjectionMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotSelectable => {
                "interaction placeholder needs a source exposing select(selector, event)"
            }
            Self::Unrecognized => "source exposes neither select(selector, event) nor subscribe",
        })
    }
}
