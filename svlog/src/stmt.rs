// Copyright (c) 2024-2026 The mealy developers

//! The bound statement tree.

use crate::expr::Expression;
use crate::symbols::{ScopeId, SymbolId};
use mealy_common::source::Span;

/// A bound statement.
#[derive(Debug)]
pub struct Statement<'a> {
    pub kind: StmtKind<'a>,
    pub span: Span,
}

/// The different forms a bound statement can assume.
#[derive(Debug)]
pub enum StmtKind<'a> {
    /// A statement that failed to bind.
    Invalid,
    /// An expression evaluated for its side effects.
    Expr(Box<Expression<'a>>),
    Conditional {
        /// The predicate, implicitly convertible to a single bit.
        cond: Box<Expression<'a>>,
        if_true: Box<Statement<'a>>,
        if_false: Option<Box<Statement<'a>>>,
    },
    Return(Option<Box<Expression<'a>>>),
    /// A block with its own scope for local declarations.
    Block {
        scope: ScopeId,
        body: Vec<Statement<'a>>,
    },
    /// A local variable declaration inside a block; the evaluator
    /// initializes the variable when execution reaches this point.
    VarDecl(SymbolId),
    ForLoop {
        /// The scope holding the loop variables.
        scope: ScopeId,
        init: Vec<Statement<'a>>,
        stop: Option<Box<Expression<'a>>>,
        steps: Vec<Expression<'a>>,
        body: Box<Statement<'a>>,
    },
    /// A flat statement group without its own scope.
    List(Vec<Statement<'a>>),
}

impl<'a> Statement<'a> {
    /// Create a new statement.
    pub fn new(kind: StmtKind<'a>, span: Span) -> Statement<'a> {
        Statement { kind, span }
    }

    /// Whether this statement failed to bind.
    pub fn bad(&self) -> bool {
        matches!(self.kind, StmtKind::Invalid)
    }
}
