#![forbid(unsafe_code)]

//! Stream behaviour knobs.
//!
//! Defaults reproduce the permissive wiring semantics: missing inputs are
//! skipped, upstream completion is not forwarded, and wiring waits for the
//! first consumer. [`StreamConfig::from_env`] overlays `RELAY_*` environment
//! variables on top of the defaults.

use std::env;
use std::fmt;
use std::str::FromStr;
use crate::logging::warn;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What to do when an input position has no source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MissingInputPolicy {
    /// Leave the placeholder unwired.
    #[default]
    Skip,
    /// Fail the injection with [`StreamError::MissingInput`](crate::StreamError::MissingInput).
    Reject,
}

impl FromStr for MissingInputPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "reject" => Ok(Self::Reject),
            other => Err(format!("unknown missing-input policy: {other}")),
        }
    }
}

impl fmt::Display for MissingInputPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Skip => "skip",
            Self::Reject => "reject",
        })
    }
}

/// Configuration shared by every stream a [`StreamFactory`](crate::StreamFactory) builds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StreamConfig {
    /// Handling of absent sources at injection time. Default: `Skip`.
    pub missing_inputs: MissingInputPolicy,

    /// Close a placeholder when its source completes. Default: false.
    pub forward_completion: bool,

    /// Wire injected sources immediately instead of at first subscription.
    /// Default: false.
    pub eager_activation: bool,
}

impl StreamConfig {
    pub const ENV_MISSING_INPUTS: &'static str = "RELAY_MISSING_INPUTS";
    pub const ENV_FORWARD_COMPLETION: &'static str = "RELAY_FORWARD_COMPLETION";
    pub const ENV_EAGER_ACTIVATION: &'static str = "RELAY_EAGER_ACTIVATION";

    #[must_use]
    pub fn with_missing_inputs(mut self, policy: MissingInputPolicy) -> Self {
        self.missing_inputs = policy;
        self
    }

    #[must_use]
    pub fn with_forward_completion(mut self, enabled: bool) -> Self {
        self.forward_completion = enabled;
        self
    }

    #[must_use]
    pub fn with_eager_activation(mut self, enabled: bool) -> Self {
        self.eager_activation = enabled;
        self
    }

    /// Defaults overlaid with the `RELAY_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`. Unparseable values are
    /// ignored with a warning.
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(val) = lookup(Self::ENV_MISSING_INPUTS) {
            match val.parse() {
                Ok(policy) => config.missing_inputs = policy,
                Err(reason) => warn!(
                    message = "relay.config.ignored",
                    key = Self::ENV_MISSING_INPUTS,
                    %reason
                ),
            }
        }
        if let Some(val) = lookup(Self::ENV_FORWARD_COMPLETION) {
            config.forward_completion = parse_flag(&val);
        }
        if let Some(val) = lookup(Self::ENV_EAGER_ACTIVATION) {
            config.eager_activation = parse_flag(&val);
        }
        config
    }
}

fn parse_flag(val: &str) -> bool {
    val == "1" || val.eq_ignore_ascii_case("true")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_permissive_and_lazy() {
        let config = StreamConfig::default();
        assert_eq!(config.missing_inputs, MissingInputPolicy::Skip);
        assert!(!config.forward_completion);
        assert!(!config.eager_activation);
    }

    #[test]
    fn env_overlay() {
        let config = StreamConfig::from_lookup(lookup(&[
            ("RELAY_MISSING_INPUTS", "Reject"),
            ("RELAY_FORWARD_COMPLETION", "1"),
            ("RELAY_EAGER_ACTIVATION", "TRUE"),
        ]));
        assert_eq!(config.missing_inputs, MissingInputPolicy::Reject);
        assert!(config.forward_completion);
        assert!(config.eager_activation);
    }

    #[test]
    fn bad_env_values_fall_back_to_defaults() {
        let config = StreamConfig::from_lookup(lookup(&[
            ("RELAY_MISSING_INPUTS", "explode"),
            ("RELAY_FORWARD_COMPLETION", "yes please"),
        ]));
        assert_eq!(config, StreamConfig::default());
    }

    #[test]
    fn builder_methods() {
        let config = StreamConfig::default()
            .with_missing_inputs(MissingInputPolicy::Reject)
            .with_forward_completion(true)
            .with_eager_activation(true);
        assert_eq!(config.missing_inputs.to_string(), "reject");
        assert!(config.forward_completion && config.eager_activation);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_round_trip_with_partial_input() {
        let config: StreamConfig =
            serde_json::from_str(r#"{"missing_inputs":"reject"}"#).expect("valid config");
        assert_eq!(config.missing_inputs, MissingInputPolicy::Reject);
        assert!(!config.forward_completion);

        let json = serde_json::to_string(&config).expect("serializes");
        let back: StreamConfig = serde_json::from_str(&json).expect("round trip");
        assert_eq!(back, config);
    }
}
