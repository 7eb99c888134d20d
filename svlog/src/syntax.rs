// Copyright (c) 2024-2026 The mealy developers

//! The syntax tree interface consumed by the semantic core.
//!
//! The lexer, preprocessor, and parser live in outer layers; what arrives
//! here is an immutable tree of nodes, each carrying a kind discriminator
//! and a source span. The core never modifies syntax. Tests construct these
//! trees directly through the constructors below.

use crate::op::{BinaryOp, RangeSelectionKind, UnaryOp};
use crate::svint::LiteralBase;
use mealy_common::source::{Span, Spanned, INVALID_SPAN};
use mealy_common::name::Name;

/// The kind discriminator exposed by every expression node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    IntegerLiteral,
    UnbasedUnsizedLiteral,
    RealLiteral,
    StringLiteral,
    NullLiteral,
    UnboundedLiteral,
    Identifier,
    ScopedName,
    UnaryExpression,
    BinaryExpression,
    ConditionalExpression,
    AssignmentExpression,
    ConcatenationExpression,
    ReplicationExpression,
    ElementSelectExpression,
    RangeSelectExpression,
    MemberAccessExpression,
    InvocationExpression,
    SystemInvocationExpression,
    CastExpression,
    InsideExpression,
    ExpressionStatement,
    ConditionalStatement,
    ReturnStatement,
    BlockStatement,
    ForLoopStatement,
    DataDeclaration,
}

/// An expression in the source text.
#[derive(Debug)]
pub struct ExprSyntax {
    pub kind: ExprSyntaxKind,
    pub span: Span,
}

/// The different forms an expression can assume in the source text.
#[derive(Debug)]
pub enum ExprSyntaxKind {
    /// A sized or unsized based integer literal, e.g. `4'b10x0` or `42`.
    IntegerLiteral {
        /// The explicit size, if the literal had one.
        width: Option<u32>,
        /// Whether the literal carried the `s` flag.
        signed: bool,
        base: LiteralBase,
        digits: String,
    },
    /// An unbased unsized literal: `'0`, `'1`, `'x`, or `'z`.
    UnbasedUnsizedLiteral(char),
    RealLiteral(f64),
    StringLiteral(String),
    NullLiteral,
    /// The `$` token denoting an unbounded range.
    UnboundedLiteral,
    /// A simple identifier.
    Ident(Name),
    /// A dotted name, e.g. `pkg.param` or a hierarchical path. The first
    /// segment may be the `$unit` scope.
    ScopedName(Vec<Spanned<Name>>),
    Unary {
        op: UnaryOp,
        operand: Box<ExprSyntax>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<ExprSyntax>,
        rhs: Box<ExprSyntax>,
    },
    Conditional {
        cond: Box<ExprSyntax>,
        if_true: Box<ExprSyntax>,
        if_false: Box<ExprSyntax>,
    },
    Assignment {
        lhs: Box<ExprSyntax>,
        rhs: Box<ExprSyntax>,
    },
    Concatenation(Vec<ExprSyntax>),
    Replication {
        count: Box<ExprSyntax>,
        operand: Box<ExprSyntax>,
    },
    ElementSelect {
        value: Box<ExprSyntax>,
        selector: Box<ExprSyntax>,
    },
    RangeSelect {
        value: Box<ExprSyntax>,
        kind: RangeSelectionKind,
        left: Box<ExprSyntax>,
        right: Box<ExprSyntax>,
    },
    MemberAccess {
        value: Box<ExprSyntax>,
        member: Spanned<Name>,
    },
    /// A call of a user subroutine.
    Invocation {
        target: Box<ExprSyntax>,
        args: Vec<ExprSyntax>,
    },
    /// A call of a system subroutine, e.g. `$bits(x)`.
    SystemInvocation {
        name: Spanned<Name>,
        args: Vec<ExprSyntax>,
    },
    /// A cast `ty'(expr)`.
    Cast {
        ty: Box<TypeSyntax>,
        operand: Box<ExprSyntax>,
    },
    /// An `expr inside { ... }` membership check.
    Inside {
        value: Box<ExprSyntax>,
        set: Vec<ExprSyntax>,
    },
}

impl ExprSyntax {
    /// The kind discriminator of this node.
    pub fn syntax_kind(&self) -> SyntaxKind {
        match self.kind {
            ExprSyntaxKind::IntegerLiteral { .. } => SyntaxKind::IntegerLiteral,
            ExprSyntaxKind::UnbasedUnsizedLiteral(_) => SyntaxKind::UnbasedUnsizedLiteral,
            ExprSyntaxKind::RealLiteral(_) => SyntaxKind::RealLiteral,
            ExprSyntaxKind::StringLiteral(_) => SyntaxKind::StringLiteral,
            ExprSyntaxKind::NullLiteral => SyntaxKind::NullLiteral,
            ExprSyntaxKind::UnboundedLiteral => SyntaxKind::UnboundedLiteral,
            ExprSyntaxKind::Ident(_) => SyntaxKind::Identifier,
            ExprSyntaxKind::ScopedName(_) => SyntaxKind::ScopedName,
            ExprSyntaxKind::Unary { .. } => SyntaxKind::UnaryExpression,
            ExprSyntaxKind::Binary { .. } => SyntaxKind::BinaryExpression,
            ExprSyntaxKind::Conditional { .. } => SyntaxKind::ConditionalExpression,
            ExprSyntaxKind::Assignment { .. } => SyntaxKind::AssignmentExpression,
            ExprSyntaxKind::Concatenation(_) => SyntaxKind::ConcatenationExpression,
            ExprSyntaxKind::Replication { .. } => SyntaxKind::ReplicationExpression,
            ExprSyntaxKind::ElementSelect { .. } => SyntaxKind::ElementSelectExpression,
            ExprSyntaxKind::RangeSelect { .. } => SyntaxKind::RangeSelectExpression,
            ExprSyntaxKind::MemberAccess { .. } => SyntaxKind::MemberAccessExpression,
            ExprSyntaxKind::Invocation { .. } => SyntaxKind::InvocationExpression,
            ExprSyntaxKind::SystemInvocation { .. } => SyntaxKind::SystemInvocationExpression,
            ExprSyntaxKind::Cast { .. } => SyntaxKind::CastExpression,
            ExprSyntaxKind::Inside { .. } => SyntaxKind::InsideExpression,
        }
    }

    /// Wrap a kind with an invalid span, for synthesized trees.
    pub fn new(kind: ExprSyntaxKind) -> ExprSyntax {
        ExprSyntax {
            kind,
            span: INVALID_SPAN,
        }
    }

    /// Wrap a kind with a span.
    pub fn with_span(kind: ExprSyntaxKind, span: Span) -> ExprSyntax {
        ExprSyntax { kind, span }
    }
}

/// A statement in the source text.
#[derive(Debug)]
pub struct StmtSyntax {
    pub kind: StmtSyntaxKind,
    pub span: Span,
}

/// The different forms a statement can assume in the source text.
#[derive(Debug)]
pub enum StmtSyntaxKind {
    Expr(ExprSyntax),
    Conditional {
        /// The predicate conditions. More than one condition means the
        /// `&&&` operator was used, which is not supported.
        conditions: Vec<ConditionSyntax>,
        if_true: Box<StmtSyntax>,
        if_false: Option<Box<StmtSyntax>>,
    },
    Return(Option<ExprSyntax>),
    Block(Vec<BlockItemSyntax>),
    ForLoop {
        init: Vec<BlockItemSyntax>,
        stop: Option<ExprSyntax>,
        steps: Vec<ExprSyntax>,
        body: Box<StmtSyntax>,
    },
}

impl StmtSyntax {
    /// The kind discriminator of this node.
    pub fn syntax_kind(&self) -> SyntaxKind {
        match self.kind {
            StmtSyntaxKind::Expr(_) => SyntaxKind::ExpressionStatement,
            StmtSyntaxKind::Conditional { .. } => SyntaxKind::ConditionalStatement,
            StmtSyntaxKind::Return(_) => SyntaxKind::ReturnStatement,
            StmtSyntaxKind::Block(_) => SyntaxKind::BlockStatement,
            StmtSyntaxKind::ForLoop { .. } => SyntaxKind::ForLoopStatement,
        }
    }

    /// Wrap a kind with an invalid span, for synthesized trees.
    pub fn new(kind: StmtSyntaxKind) -> StmtSyntax {
        StmtSyntax {
            kind,
            span: INVALID_SPAN,
        }
    }
}

/// One condition of a conditional statement's predicate.
#[derive(Debug)]
pub struct ConditionSyntax {
    pub expr: ExprSyntax,
    /// A `matches` pattern clause was attached. Not supported.
    pub matches_clause: bool,
}

/// An item in a statement block: either a local declaration or a statement.
#[derive(Debug)]
pub enum BlockItemSyntax {
    Decl(DataDeclSyntax),
    Stmt(StmtSyntax),
}

/// A data declaration, e.g. `int x = 42;`.
#[derive(Debug)]
pub struct DataDeclSyntax {
    pub ty: TypeSyntax,
    pub name: Spanned<Name>,
    pub init: Option<ExprSyntax>,
}

/// A type in the source text.
#[derive(Debug)]
pub struct TypeSyntax {
    pub kind: TypeSyntaxKind,
    pub span: Span,
}

impl TypeSyntax {
    /// Wrap a kind with an invalid span, for synthesized trees.
    pub fn new(kind: TypeSyntaxKind) -> TypeSyntax {
        TypeSyntax {
            kind,
            span: INVALID_SPAN,
        }
    }
}

/// The different forms a type can assume in the source text.
#[derive(Debug)]
pub enum TypeSyntaxKind {
    /// A predefined type keyword, with an optional explicit signing.
    Predefined {
        keyword: PredefinedType,
        signing: Option<bool>,
    },
    /// A reference to a typedef or enum by name.
    Named(Name),
    /// A packed dimension applied to an element type. The bounds are
    /// constant expressions.
    Packed {
        elem: Box<TypeSyntax>,
        msb: ExprSyntax,
        lsb: ExprSyntax,
    },
    /// An unpacked dimension. The bounds are constant expressions.
    Unpacked {
        elem: Box<TypeSyntax>,
        msb: ExprSyntax,
        lsb: ExprSyntax,
    },
    /// An enum declaration body.
    Enum {
        base: Option<Box<TypeSyntax>>,
        variants: Vec<EnumVariantSyntax>,
    },
    /// A struct declaration body.
    Struct {
        packed: bool,
        fields: Vec<StructFieldSyntax>,
    },
}

/// The predefined type keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredefinedType {
    Logic,
    Bit,
    Byte,
    ShortInt,
    Int,
    LongInt,
    Integer,
    Time,
    Real,
    ShortReal,
    RealTime,
    String,
    Event,
    Void,
}

/// One variant of an enum declaration.
#[derive(Debug)]
pub struct EnumVariantSyntax {
    pub name: Spanned<Name>,
    pub value: Option<ExprSyntax>,
}

/// One field of a struct declaration.
#[derive(Debug)]
pub struct StructFieldSyntax {
    pub ty: TypeSyntax,
    pub name: Spanned<Name>,
}

/// A member of a scope, held in deferred form until the scope is first
/// queried.
#[derive(Debug)]
pub enum MemberSyntax {
    Parameter(ParameterSyntax),
    Variable(DataDeclSyntax),
    Subroutine(SubroutineSyntax),
    Typedef(TypedefSyntax),
    Package(PackageSyntax),
}

/// A `parameter` or `localparam` declaration.
#[derive(Debug)]
pub struct ParameterSyntax {
    pub name: Spanned<Name>,
    /// The declared type; implicit if absent.
    pub ty: Option<TypeSyntax>,
    /// The default/assigned value.
    pub init: Option<ExprSyntax>,
    pub is_local: bool,
}

/// A `function` or `task` declaration.
#[derive(Debug)]
pub struct SubroutineSyntax {
    pub name: Spanned<Name>,
    /// The return type; `None` for tasks and void functions.
    pub return_ty: Option<TypeSyntax>,
    pub lifetime: Lifetime,
    pub ports: Vec<SubroutinePortSyntax>,
    pub items: Vec<BlockItemSyntax>,
    pub is_task: bool,
}

/// The lifetime of subroutine and block variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    Automatic,
    Static,
}

/// One formal port of a subroutine prototype.
#[derive(Debug)]
pub struct SubroutinePortSyntax {
    /// The direction. Absent directions inherit from the previous port.
    pub direction: Option<Direction>,
    /// The type. Absent types default to `logic` after an explicit
    /// direction, and inherit the previous port's type otherwise.
    pub ty: Option<TypeSyntax>,
    pub name: Spanned<Name>,
    pub default: Option<ExprSyntax>,
}

/// The direction of a formal argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    In,
    Out,
    InOut,
    Ref,
}

/// A `typedef` declaration.
#[derive(Debug)]
pub struct TypedefSyntax {
    pub name: Spanned<Name>,
    pub ty: TypeSyntax,
}

/// A `package` declaration.
#[derive(Debug)]
pub struct PackageSyntax {
    pub name: Spanned<Name>,
    pub members: Vec<MemberSyntax>,
}
