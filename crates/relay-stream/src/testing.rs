#![forbid(unsafe_code)]

//! Test doubles for stream diagnostics.

use std::cell::RefCell;
use std::rc::Rc;

use relay_core::Fault;

use crate::diagnostics::{Diagnostics, Warning};

#[derive(Debug, Default)]
struct Log {
    warnings: Vec<Warning>,
    faults: Vec<String>,
}

/// Records every report instead of logging it.
///
/// Cloning a `RecordingDiagnostics` creates a new handle to the **same** log,
/// so a test can keep one handle and give another to a factory.
#[derive(Debug, Clone, Default)]
pub struct RecordingDiagnostics {
    log: Rc<RefCell<Log>>,
}

impl RecordingDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn warnings(&self) -> Vec<Warning> {
        self.log.borrow().warnings.clone()
    }

    /// Upstream fault messages in arrival order.
    #[must_use]
    pub fn faults(&self) -> Vec<String> {
        self.log.borrow().faults.clone()
    }

    #[must_use]
    pub fn is_quiet(&self) -> bool {
        let log = self.log.borrow();
        log.warnings.is_empty() && log.faults.is_empty()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn warn(&self, warning: &Warning) {
        self.log.borrow_mut().warnings.push(warning.clone());
    }

    fn upstream_error(&self, fault: &Fault) {
        self.log.borrow_mut().faults.push(fault.to_string());
    }
}
