// Copyright (c) 2024-2026 The mealy developers

//! Utilities to implement diagnostics and error reporting facilities.
//!
//! All analysis passes report problems through the [`DiagEmitter`] trait as
//! structured [`Diag`] records. A record carries a stable [`DiagCode`], the
//! severity suggested by the reporting pass, a human-readable message, and a
//! list of span/note segments. The sink that ultimately renders the record is
//! free to re-map severities; the code is the stable contract.

use crate::source::Span;
use std::fmt;

/// A result type for passes that report through the diagnostic sink.
///
/// Such passes have nothing useful to put in the error variant: by the time
/// they fail, the diagnostic has already been emitted. The unit error merely
/// propagates the fact that something went wrong.
pub type Result<T> = std::result::Result<T, ()>;

/// The stable machine-readable codes for all diagnostics the semantic core
/// produces.
///
/// The string form of these codes is part of the external interface and must
/// not change between releases; downstream tooling keys off of it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiagCode {
    /// A constant expression was required but the expression cannot be
    /// evaluated at elaboration time.
    ConstantRequired,
    /// An implicit conversion narrows the value and may lose bits.
    WidthMismatch,
    /// A name did not resolve to any declaration.
    UndeclaredIdentifier,
    /// Two types that must be assignment compatible are not.
    TypeMismatch,
    /// Division or modulus by zero during constant evaluation.
    DivideByZero,
    /// An element or range select was outside the bounds of its target.
    IndexOutOfBounds,
    /// The evaluator's call stack exceeded its depth limit.
    RecursionLimit,
    /// The evaluator's step budget was exhausted.
    EvalTimeout,
    /// Constant evaluation was cancelled from the outside.
    EvalCancelled,
    /// A `return` statement appeared outside of any subroutine.
    ReturnOutsideSubroutine,
    /// A call could not be uniquely resolved.
    AmbiguousCall,
    /// A call passed the wrong number of arguments.
    WrongArgumentCount,
    /// An expression used as an lvalue does not denote a storage location.
    InvalidLValue,
    /// A select expression is malformed, e.g. a non-constant range bound.
    InvalidSelect,
    /// A non-constant reference was encountered mid-evaluation.
    NotConstant,
    /// A variable was read before it was assigned, in strict mode.
    UninitializedVariable,
    /// A declaration shadows or collides with an existing one in its scope.
    DuplicateDeclaration,
    /// A known-but-unsupported construct was encountered, e.g. the `&&&`
    /// operator in a conditional predicate.
    UnsupportedConstruct,
    /// A system subroutine name did not resolve.
    UnknownSystemSubroutine,
    /// An internal invariant was violated. Always a compiler bug.
    Bug,
}

impl DiagCode {
    /// The stable string form of this code.
    pub fn as_str(self) -> &'static str {
        match self {
            DiagCode::ConstantRequired => "constant-required-violation",
            DiagCode::WidthMismatch => "width-mismatch",
            DiagCode::UndeclaredIdentifier => "undeclared-identifier",
            DiagCode::TypeMismatch => "type-mismatch",
            DiagCode::DivideByZero => "division-by-zero",
            DiagCode::IndexOutOfBounds => "index-out-of-bounds",
            DiagCode::RecursionLimit => "recursion-limit",
            DiagCode::EvalTimeout => "eval-timeout",
            DiagCode::EvalCancelled => "eval-cancelled",
            DiagCode::ReturnOutsideSubroutine => "return-outside-subroutine",
            DiagCode::AmbiguousCall => "ambiguous-call",
            DiagCode::WrongArgumentCount => "wrong-argument-count",
            DiagCode::InvalidLValue => "invalid-lvalue",
            DiagCode::InvalidSelect => "invalid-select",
            DiagCode::NotConstant => "not-constant",
            DiagCode::UninitializedVariable => "uninitialized-variable",
            DiagCode::DuplicateDeclaration => "duplicate-declaration",
            DiagCode::UnsupportedConstruct => "unsupported-construct",
            DiagCode::UnknownSystemSubroutine => "unknown-system-subroutine",
            DiagCode::Bug => "internal-bug",
        }
    }
}

impl fmt::Display for DiagCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Emits diagnostic messages.
pub trait DiagEmitter {
    /// Emit a diagnostic message.
    fn emit(&self, diag: Diag);
}

impl<'a, T> DiagEmitter for &'a T
where
    T: DiagEmitter + ?Sized,
{
    fn emit(&self, diag: Diag) {
        (*self).emit(diag)
    }
}

/// A structured diagnostic record under construction.
#[must_use]
#[derive(Clone, Debug)]
pub struct Diag {
    pub severity: Severity,
    pub code: DiagCode,
    pub message: String,
    pub segments: Vec<DiagSegment>,
}

/// An additional piece of information attached to a diagnostic.
#[derive(Clone, Debug)]
pub enum DiagSegment {
    /// A span of the source buffer the diagnostic refers to.
    Span(Span),
    /// A free-form note.
    Note(String),
}

impl Diag {
    /// Assemble a new diagnostic with an explicit severity.
    pub fn new<S: Into<String>>(severity: Severity, code: DiagCode, message: S) -> Diag {
        Diag {
            severity,
            code,
            message: message.into(),
            segments: Vec::new(),
        }
    }

    /// Assemble a diagnostic for an internal compiler bug.
    pub fn bug<S: Into<String>>(message: S) -> Diag {
        Diag::new(Severity::Bug, DiagCode::Bug, message)
    }

    /// Assemble an error diagnostic.
    pub fn error<S: Into<String>>(code: DiagCode, message: S) -> Diag {
        Diag::new(Severity::Error, code, message)
    }

    /// Assemble a warning diagnostic.
    pub fn warning<S: Into<String>>(code: DiagCode, message: S) -> Diag {
        Diag::new(Severity::Warning, code, message)
    }

    /// Assemble a note diagnostic.
    pub fn note<S: Into<String>>(code: DiagCode, message: S) -> Diag {
        Diag::new(Severity::Note, code, message)
    }

    /// Attach a span to the diagnostic.
    pub fn span<S: Into<Span>>(mut self, span: S) -> Diag {
        self.segments.push(DiagSegment::Span(span.into()));
        self
    }

    /// Attach a note to the diagnostic.
    pub fn add_note<S: Into<String>>(mut self, message: S) -> Diag {
        self.segments.push(DiagSegment::Note(message.into()));
        self
    }

    /// The first span attached to the diagnostic, if any.
    pub fn first_span(&self) -> Option<Span> {
        self.segments.iter().find_map(|seg| match seg {
            DiagSegment::Span(sp) => Some(*sp),
            DiagSegment::Note(_) => None,
        })
    }
}

impl fmt::Display for Diag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)?;
        for segment in &self.segments {
            match segment {
                DiagSegment::Span(sp) => write!(f, "\n  --> bytes {}..{}", sp.begin, sp.end)?,
                DiagSegment::Note(msg) => write!(f, "\n  = note: {}", msg)?,
            }
        }
        Ok(())
    }
}

/// The severity of a diagnostic.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Severity {
    Note,
    Warning,
    Error,
    Fatal,
    Bug,
}

impl Severity {
    pub fn to_str(self) -> &'static str {
        match self {
            Severity::Fatal => "fatal",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
            Severity::Bug => "compiler bug",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}
