// Copyright (c) 2024-2026 The mealy developers

#![allow(dead_code)]

//! Utilities for semantic tests.
//!
//! The parser lives outside this crate, so tests assemble syntax trees
//! directly through these helpers and hand them to the binder.

pub use mealy_common::errors::DiagCode;
pub use mealy_common::name::{intern, Name};
pub use mealy_common::source::{Location, Spanned, INVALID_SPAN};
pub use mealy_common::Session;
pub use mealy_svlog::binder::{Binder, BindFlags};
pub use mealy_svlog::eval::{EvalContext, Flow};
pub use mealy_svlog::op::{BinaryOp, RangeSelectionKind, UnaryOp};
pub use mealy_svlog::svint::{LiteralBase, Logic, SvInt};
pub use mealy_svlog::syntax::*;
pub use mealy_svlog::{Compilation, ConstantValue, GlobalArenas};

pub fn sp<T>(value: T) -> Spanned<T> {
    Spanned::new(value, INVALID_SPAN)
}

pub fn name(s: &str) -> Spanned<Name> {
    sp(intern(s))
}

pub fn here() -> Location {
    Location::new(0)
}

// Expression builders.

pub fn int(v: u64) -> ExprSyntax {
    ExprSyntax::new(ExprSyntaxKind::IntegerLiteral {
        width: None,
        signed: true,
        base: LiteralBase::Decimal,
        digits: v.to_string(),
    })
}

pub fn lit(width: u32, base: LiteralBase, digits: &str) -> ExprSyntax {
    ExprSyntax::new(ExprSyntaxKind::IntegerLiteral {
        width: Some(width),
        signed: false,
        base,
        digits: digits.into(),
    })
}

pub fn bin_lit(s: &str) -> ExprSyntax {
    let tick = s.find('\'').unwrap();
    lit(s[..tick].parse().unwrap(), LiteralBase::Binary, &s[tick + 2..])
}

pub fn ident(n: &str) -> ExprSyntax {
    ExprSyntax::new(ExprSyntaxKind::Ident(intern(n)))
}

pub fn scoped(path: &[&str]) -> ExprSyntax {
    ExprSyntax::new(ExprSyntaxKind::ScopedName(
        path.iter().map(|s| name(s)).collect(),
    ))
}

pub fn unary(op: UnaryOp, operand: ExprSyntax) -> ExprSyntax {
    ExprSyntax::new(ExprSyntaxKind::Unary {
        op,
        operand: Box::new(operand),
    })
}

pub fn binary(op: BinaryOp, lhs: ExprSyntax, rhs: ExprSyntax) -> ExprSyntax {
    ExprSyntax::new(ExprSyntaxKind::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    })
}

pub fn cond(cond: ExprSyntax, if_true: ExprSyntax, if_false: ExprSyntax) -> ExprSyntax {
    ExprSyntax::new(ExprSyntaxKind::Conditional {
        cond: Box::new(cond),
        if_true: Box::new(if_true),
        if_false: Box::new(if_false),
    })
}

pub fn assign(lhs: ExprSyntax, rhs: ExprSyntax) -> ExprSyntax {
    ExprSyntax::new(ExprSyntaxKind::Assignment {
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    })
}

pub fn concat(parts: Vec<ExprSyntax>) -> ExprSyntax {
    ExprSyntax::new(ExprSyntaxKind::Concatenation(parts))
}

pub fn index(value: ExprSyntax, selector: ExprSyntax) -> ExprSyntax {
    ExprSyntax::new(ExprSyntaxKind::ElementSelect {
        value: Box::new(value),
        selector: Box::new(selector),
    })
}

pub fn range_sel(
    value: ExprSyntax,
    kind: RangeSelectionKind,
    left: ExprSyntax,
    right: ExprSyntax,
) -> ExprSyntax {
    ExprSyntax::new(ExprSyntaxKind::RangeSelect {
        value: Box::new(value),
        kind,
        left: Box::new(left),
        right: Box::new(right),
    })
}

pub fn member(value: ExprSyntax, field: &str) -> ExprSyntax {
    ExprSyntax::new(ExprSyntaxKind::MemberAccess {
        value: Box::new(value),
        member: name(field),
    })
}

pub fn call(target: &str, args: Vec<ExprSyntax>) -> ExprSyntax {
    ExprSyntax::new(ExprSyntaxKind::Invocation {
        target: Box::new(ident(target)),
        args,
    })
}

pub fn syscall(n: &str, args: Vec<ExprSyntax>) -> ExprSyntax {
    ExprSyntax::new(ExprSyntaxKind::SystemInvocation {
        name: name(n),
        args,
    })
}

pub fn cast(ty: TypeSyntax, operand: ExprSyntax) -> ExprSyntax {
    ExprSyntax::new(ExprSyntaxKind::Cast {
        ty: Box::new(ty),
        operand: Box::new(operand),
    })
}

pub fn inside(value: ExprSyntax, set: Vec<ExprSyntax>) -> ExprSyntax {
    ExprSyntax::new(ExprSyntaxKind::Inside {
        value: Box::new(value),
        set,
    })
}

// Type builders.

pub fn t_kw(keyword: PredefinedType) -> TypeSyntax {
    TypeSyntax::new(TypeSyntaxKind::Predefined {
        keyword,
        signing: None,
    })
}

pub fn t_int() -> TypeSyntax {
    t_kw(PredefinedType::Int)
}

pub fn t_logic() -> TypeSyntax {
    t_kw(PredefinedType::Logic)
}

pub fn t_logic_vec(msb: u64, lsb: u64) -> TypeSyntax {
    TypeSyntax::new(TypeSyntaxKind::Packed {
        elem: Box::new(t_logic()),
        msb: int(msb),
        lsb: int(lsb),
    })
}

pub fn t_named(n: &str) -> TypeSyntax {
    TypeSyntax::new(TypeSyntaxKind::Named(intern(n)))
}

// Statement builders.

pub fn s_expr(expr: ExprSyntax) -> StmtSyntax {
    StmtSyntax::new(StmtSyntaxKind::Expr(expr))
}

pub fn s_if(cond: ExprSyntax, if_true: StmtSyntax, if_false: Option<StmtSyntax>) -> StmtSyntax {
    StmtSyntax::new(StmtSyntaxKind::Conditional {
        conditions: vec![ConditionSyntax {
            expr: cond,
            matches_clause: false,
        }],
        if_true: Box::new(if_true),
        if_false: if_false.map(Box::new),
    })
}

pub fn s_ret(value: Option<ExprSyntax>) -> StmtSyntax {
    StmtSyntax::new(StmtSyntaxKind::Return(value))
}

pub fn s_block(items: Vec<BlockItemSyntax>) -> StmtSyntax {
    StmtSyntax::new(StmtSyntaxKind::Block(items))
}

pub fn s_for(
    init: Vec<BlockItemSyntax>,
    stop: ExprSyntax,
    steps: Vec<ExprSyntax>,
    body: StmtSyntax,
) -> StmtSyntax {
    StmtSyntax::new(StmtSyntaxKind::ForLoop {
        init,
        stop: Some(stop),
        steps,
        body: Box::new(body),
    })
}

pub fn decl(ty: TypeSyntax, n: &str, init: Option<ExprSyntax>) -> BlockItemSyntax {
    BlockItemSyntax::Decl(DataDeclSyntax {
        ty,
        name: name(n),
        init,
    })
}

pub fn stmt(s: StmtSyntax) -> BlockItemSyntax {
    BlockItemSyntax::Stmt(s)
}

// Scope member builders.

pub fn m_param(n: &str, ty: Option<TypeSyntax>, init: ExprSyntax) -> MemberSyntax {
    MemberSyntax::Parameter(ParameterSyntax {
        name: name(n),
        ty,
        init: Some(init),
        is_local: false,
    })
}

pub fn m_var(ty: TypeSyntax, n: &str, init: Option<ExprSyntax>) -> MemberSyntax {
    MemberSyntax::Variable(DataDeclSyntax {
        ty,
        name: name(n),
        init,
    })
}

pub fn port(direction: Option<Direction>, ty: Option<TypeSyntax>, n: &str) -> SubroutinePortSyntax {
    SubroutinePortSyntax {
        direction,
        ty,
        name: name(n),
        default: None,
    }
}

pub fn m_func(
    n: &str,
    return_ty: TypeSyntax,
    ports: Vec<SubroutinePortSyntax>,
    items: Vec<BlockItemSyntax>,
) -> MemberSyntax {
    MemberSyntax::Subroutine(SubroutineSyntax {
        name: name(n),
        return_ty: Some(return_ty),
        lifetime: Lifetime::Automatic,
        ports,
        items,
        is_task: false,
    })
}

pub fn m_typedef(n: &str, ty: TypeSyntax) -> MemberSyntax {
    MemberSyntax::Typedef(TypedefSyntax { name: name(n), ty })
}

pub fn m_enum(n: &str, variants: Vec<(&str, Option<ExprSyntax>)>) -> MemberSyntax {
    m_typedef(
        n,
        TypeSyntax::new(TypeSyntaxKind::Enum {
            base: None,
            variants: variants
                .into_iter()
                .map(|(vn, value)| EnumVariantSyntax {
                    name: name(vn),
                    value,
                })
                .collect(),
        }),
    )
}

pub fn m_struct(n: &str, packed: bool, fields: Vec<(TypeSyntax, &str)>) -> MemberSyntax {
    m_typedef(
        n,
        TypeSyntax::new(TypeSyntaxKind::Struct {
            packed,
            fields: fields
                .into_iter()
                .map(|(ty, fname)| StructFieldSyntax {
                    ty,
                    name: name(fname),
                })
                .collect(),
        }),
    )
}

pub fn m_package(n: &str, members: Vec<MemberSyntax>) -> MemberSyntax {
    MemberSyntax::Package(PackageSyntax {
        name: name(n),
        members,
    })
}

/// Queue members on the root scope of a compilation.
pub fn add_members(cx: &Compilation, members: Vec<MemberSyntax>) {
    let root = cx.scope(cx.root());
    for m in members {
        root.defer(cx.alloc_member_syntax(m));
    }
}

/// Shorthand for an `SvInt` parsed from a `4'b10x0` style string.
pub fn sv(s: &str) -> SvInt {
    let tick = s.find('\'').unwrap();
    let width: u32 = s[..tick].parse().unwrap();
    let mut rest = &s[tick + 1..];
    let signed = rest.starts_with('s');
    if signed {
        rest = &rest[1..];
    }
    let base = match rest.as_bytes()[0] {
        b'b' => LiteralBase::Binary,
        b'o' => LiteralBase::Octal,
        b'd' => LiteralBase::Decimal,
        b'h' => LiteralBase::Hex,
        _ => panic!("bad base in {}", s),
    };
    SvInt::from_literal(width, signed, base, &rest[1..]).unwrap()
}

/// Assert that a constant is an integer case-equal to the expectation.
pub fn assert_value(value: &ConstantValue, expected: &str) {
    let expected = sv(expected);
    match value {
        ConstantValue::Integer(v) => {
            assert!(
                v.case_eq(&expected) && v.width() == expected.width(),
                "expected {}, got {}",
                expected,
                v
            );
        }
        other => panic!("expected {}, got {}", expected, other),
    }
}
