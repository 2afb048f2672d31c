// src/diagnostics.rs

//! Error accumulator threaded between phases
//!
//! Instead of a process-wide exit status, each `get` run owns one
//! [`Diagnostics`] value. The walker and the installer record into it, and the
//! orchestrator checks it at every phase boundary.

use crate::error::Error;
use tracing::{debug, warn};

/// Process exit status for a clean run
pub const EXIT_SUCCESS: u8 = 0;

/// Process exit status when any error was recorded
pub const EXIT_FAILURE: u8 = 1;

/// Process exit status for usage and argument errors
pub const EXIT_USAGE: u8 = 2;

/// Accumulated errors for one invocation
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<Error>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error
    ///
    /// Repeat markers ([`Error::Unresolved`]) refer to a failure that is
    /// already in the list and are not counted again.
    pub fn record(&mut self, err: Error) {
        if err.is_repeat() {
            debug!("{}", err);
            return;
        }
        warn!("{}", err);
        self.errors.push(err);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    /// Count recorded errors matching a predicate
    pub fn count(&self, pred: impl Fn(&Error) -> bool) -> usize {
        self.errors.iter().filter(|e| pred(e)).count()
    }

    /// Exit status reflecting the accumulated state
    pub fn exit_code(&self) -> u8 {
        if self.has_errors() {
            EXIT_FAILURE
        } else {
            EXIT_SUCCESS
        }
    }
}
