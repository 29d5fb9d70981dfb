#![forbid(unsafe_code)]

//! Reporting channel for non-fatal conditions.
//!
//! A stream never logs through a global on its own: it owns an
//! `Rc<dyn Diagnostics>` handed over by its factory. [`TracingDiagnostics`]
//! is the default and turns every report into a `tracing` event.

use std::fmt;

use relay_core::Fault;
use crate::logging::{error, warn};

/// A non-fatal condition. Execution always continues after one is reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// `inject` was called on a stream that had already been injected.
    AlreadyInjected,
    /// `inject` received a different number of inputs than the stream declares.
    ArityMismatch { expected: usize, supplied: usize },
    /// `inject` was called after `dispose`; nothing was wired.
    InjectAfterDispose,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyInjected => f.write_str("stream has already been injected an input"),
            Self::ArityMismatch { expected, supplied } => write!(
                f,
                "inject() should provide the {expected} input(s) the stream declares, got {supplied}"
            ),
            Self::InjectAfterDispose => f.write_str("inject() called on a disposed stream"),
        }
    }
}

/// Sink for warnings and upstream faults.
pub trait Diagnostics {
    fn warn(&self, warning: &Warning);

    /// An injected source emitted an error. The fault has already been pushed
    /// into the placeholder; this is the informational copy.
    fn upstream_error(&self, fault: &Fault);
}

/// Reports through `tracing` at WARN and ERROR level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
impl Diagnostics for TracingDiagnostics {
    fn warn(&self, warning: &Warning) {
        warn!(message = "relay.stream.warning", %warning);
    }

    fn upstream_error(&self, fault: &Fault) {
        error!(message = "relay.stream.upstream_error", %fault);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warning_display() {
        let warning = Warning::ArityMismatch {
            expected: 2,
            supplied: 1,
        };
        assert_eq!(
            warning.to_string(),
            "inject() should provide the 2 input(s) the stream declares, got 1"
        );
    }

    #[cfg(feature = "tracing")]
    mod tracing_events {
        use super::*;
        use std::sync::{Arc, Mutex};
        use tracing::Subscriber;
        use tracing_subscriber::Layer;
        use tracing_subscriber::layer::{Context, SubscriberExt};

        #[derive(Default)]
        struct Captured {
            events: Vec<(tracing::Level, String, String)>,
        }

        struct CaptureLayer {
            state: Arc<Mutex<Captured>>,
        }

        impl<S> Layer<S> for CaptureLayer
        where
            S: Subscriber + for<'lookup> tracing_subscriber::registry::LookupSpan<'lookup>,
        {
            fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
                #[derive(Default)]
                struct Fields {
                    message: String,
                    detail: String,
                }
                impl tracing::field::Visit for Fields {
                    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
                        if field.name() == "message" {
                            self.message = value.to_string();
                        }
                    }

                    fn record_debug(
                        &mut self,
                        field: &tracing::field::Field,
                        value: &dyn std::fmt::Debug,
                    ) {
                        let rendered = format!("{value:?}").trim_matches('"').to_string();
                        match field.name() {
                            "message" => self.message = rendered,
                            "warning" | "fault" => self.detail = rendered,
                            _ => {}
                        }
                    }
                }
                let mut fields = Fields::default();
                event.record(&mut fields);
                self.state.lock().expect("capture lock").events.push((
                    *event.metadata().level(),
                    fields.message,
                    fields.detail,
                ));
            }
        }

        #[test]
        fn tracing_diagnostics_emit_events() {
            let state = Arc::new(Mutex::new(Captured::default()));
            let subscriber = tracing_subscriber::registry().with(CaptureLayer {
                state: Arc::clone(&state),
            });
            let _guard = tracing::subscriber::set_default(subscriber);

            TracingDiagnostics.warn(&Warning::AlreadyInjected);
            TracingDiagnostics.upstream_error(&Fault::msg("sensor offline"));

            let captured = state.lock().expect("capture lock");
            assert_eq!(captured.events.len(), 2);
            let (level, message, detail) = &captured.events[0];
            assert_eq!(*level, tracing::Level::WARN);
            assert_eq!(message, "relay.stream.warning");
            assert_eq!(detail, "stream has already been injected an input");
            let (level, message, detail) = &captured.events[1];
            assert_eq!(*level, tracing::Level::ERROR);
            assert_eq!(message, "relay.stream.upstream_error");
            assert_eq!(detail, "sensor offline");
        }
    }
}
