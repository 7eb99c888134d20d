// Copyright (c) 2024-2026 The mealy developers

//! This crate contains the fundamental utilities used by the rest of the
//! mealy compiler.

#[macro_use]
extern crate bitflags;

pub mod errors;
pub mod name;
pub mod source;

use crate::errors::{Diag, DiagCode, DiagEmitter, Severity};
use std::cell::{Cell, RefCell};

/// A compiler session.
///
/// Owns the options of a single compiler run and acts as the diagnostic sink
/// all analysis passes report into. Diagnostics are retained so that callers
/// can inspect what was produced after a pass has finished.
pub struct Session {
    pub opts: SessionOptions,
    /// Whether any error diagnostics were produced.
    pub failed: Cell<bool>,
    diags: RefCell<Vec<Diag>>,
}

impl Session {
    /// Create a new session.
    pub fn new() -> Session {
        Session {
            opts: Default::default(),
            failed: Cell::new(false),
            diags: RefCell::new(Vec::new()),
        }
    }

    /// Check if a diagnostic with the given code has been emitted.
    pub fn has_diag(&self, code: DiagCode) -> bool {
        self.diags.borrow().iter().any(|d| d.code == code)
    }

    /// The codes of all diagnostics emitted so far, in emission order.
    pub fn diag_codes(&self) -> Vec<DiagCode> {
        self.diags.borrow().iter().map(|d| d.code).collect()
    }

    /// Run a closure over the emitted diagnostics.
    pub fn with_diags<R>(&self, f: impl FnOnce(&[Diag]) -> R) -> R {
        f(&self.diags.borrow())
    }
}

impl Default for Session {
    fn default() -> Session {
        Session::new()
    }
}

impl DiagEmitter for Session {
    fn emit(&self, diag: Diag) {
        if diag.severity >= Severity::Error {
            self.failed.set(true);
        }
        if self.opts.verbosity.contains(Verbosity::DIAGNOSTICS) {
            eprintln!("{}", diag);
        }
        self.diags.borrow_mut().push(diag);
    }
}

/// A set of options for a session.
#[derive(Debug, Default)]
pub struct SessionOptions {
    /// Treat reads of uninitialized variables during constant evaluation as
    /// errors rather than producing the type's default value.
    pub strict_eval: bool,
    /// The verbosity options.
    pub verbosity: Verbosity,
}

bitflags! {
    /// The verbosity flags of a session.
    #[derive(Default)]
    pub struct Verbosity: u8 {
        /// Print diagnostics to stderr as they are emitted.
        const DIAGNOSTICS = 0b001;
        /// Trace scope elaboration.
        const SCOPES      = 0b010;
        /// Trace constant evaluation.
        const EVAL        = 0b100;
    }
}
