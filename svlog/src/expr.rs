// Copyright (c) 2024-2026 The mealy developers

//! The bound expression tree.
//!
//! Expressions are produced by the binder from syntax and carry their
//! resolved type. The variant set is closed: consumers dispatch on
//! [`ExprKind`] and the compiler checks exhaustiveness. An expression owns
//! its subexpressions; references to types and symbols are non-owning links
//! into the compilation's arena.

use crate::builtins::SystemFunction;
use crate::op::{BinaryOp, RangeSelectionKind, UnaryOp};
use crate::svint::{Logic, SvInt};
use crate::symbols::SymbolId;
use crate::ty::Type;
use mealy_common::source::Span;

/// A bound, typed expression.
#[derive(Debug, Clone)]
pub struct Expression<'a> {
    pub kind: ExprKind<'a>,
    /// The type of the expression. Never absent; binding failures produce
    /// the error type.
    pub ty: Type<'a>,
    pub span: Span,
}

/// The different forms a bound expression can assume.
#[derive(Debug, Clone)]
pub enum ExprKind<'a> {
    /// A subtree that failed to bind. Wraps the partially bound child if
    /// one exists. Always has the error type.
    Invalid(Option<Box<Expression<'a>>>),
    IntegerLiteral(SvInt),
    /// An unbased unsized literal such as `'1`, which fills however many
    /// bits its context determines.
    UnbasedUnsizedLiteral(Logic),
    RealLiteral(f64),
    StringLiteral(String),
    NullLiteral,
    UnboundedLiteral,
    /// A resolved reference to a value symbol.
    NamedValue {
        symbol: SymbolId,
        /// Whether the reference crossed an instance boundary. Hierarchical
        /// references are not constant.
        hierarchical: bool,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expression<'a>>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expression<'a>>,
        rhs: Box<Expression<'a>>,
    },
    Conditional {
        cond: Box<Expression<'a>>,
        if_true: Box<Expression<'a>>,
        if_false: Box<Expression<'a>>,
    },
    /// A blocking assignment used in expression position.
    Assignment {
        lhs: Box<Expression<'a>>,
        rhs: Box<Expression<'a>>,
    },
    Concat(Vec<Expression<'a>>),
    Replication {
        /// The folded replication count.
        count: u32,
        operand: Box<Expression<'a>>,
    },
    ElementSelect {
        value: Box<Expression<'a>>,
        selector: Box<Expression<'a>>,
    },
    RangeSelect {
        value: Box<Expression<'a>>,
        kind: RangeSelectionKind,
        /// The msb for simple selects, the base for indexed ones.
        left: Box<Expression<'a>>,
        /// The lsb for simple selects, the width for indexed ones. Always
        /// constant.
        right: Box<Expression<'a>>,
    },
    MemberAccess {
        value: Box<Expression<'a>>,
        /// The index of the field within the struct type.
        index: usize,
    },
    /// A call of a user subroutine.
    Call {
        subroutine: SymbolId,
        args: Vec<Expression<'a>>,
    },
    /// A call of a system subroutine, with its result type already
    /// computed by the per-function checker.
    SystemCall {
        function: SystemFunction,
        args: Vec<Expression<'a>>,
    },
    /// A width, sign, or representation change.
    Conversion {
        operand: Box<Expression<'a>>,
        /// Whether the conversion was inserted by the binder rather than
        /// written as a cast.
        implicit: bool,
    },
    /// An `inside` membership check.
    Inside {
        value: Box<Expression<'a>>,
        set: Vec<Expression<'a>>,
    },
}

impl<'a> Expression<'a> {
    /// Create a new expression.
    pub fn new(kind: ExprKind<'a>, ty: Type<'a>, span: Span) -> Expression<'a> {
        Expression { kind, ty, span }
    }

    /// Whether this expression or any part of it failed to bind.
    pub fn bad(&self) -> bool {
        matches!(self.kind, ExprKind::Invalid(_)) || self.ty.is_error()
    }

    /// Whether the expression denotes a storage location.
    pub fn is_lvalue(&self) -> bool {
        match &self.kind {
            ExprKind::NamedValue { symbol: _, .. } => true,
            ExprKind::ElementSelect { value, .. }
            | ExprKind::RangeSelect { value, .. }
            | ExprKind::MemberAccess { value, .. } => value.is_lvalue(),
            ExprKind::Concat(parts) => parts.iter().all(|p| p.is_lvalue()),
            _ => false,
        }
    }

    /// The embedded integer, asserting this is an integer literal.
    ///
    /// Calling this on any other kind is a programming bug.
    pub fn as_integer_literal(&self) -> &SvInt {
        match &self.kind {
            ExprKind::IntegerLiteral(v) => v,
            _ => panic!("expression is not an integer literal"),
        }
    }

    /// The referenced symbol, asserting this is a named value.
    pub fn as_named_value(&self) -> SymbolId {
        match &self.kind {
            ExprKind::NamedValue { symbol, .. } => *symbol,
            _ => panic!("expression is not a named value"),
        }
    }
}
