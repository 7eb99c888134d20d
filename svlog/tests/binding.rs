// Copyright (c) 2024-2026 The mealy developers

//! Tests for expression and statement binding: operator typing, the
//! two-pass width propagation, and invalid-subtree short-circuiting.

mod common;
use common::*;
use mealy_svlog::expr::ExprKind;
use mealy_svlog::ty::{ConversionKind, INT_TYPE};

#[test]
fn self_determined_addition_wraps_at_operand_width() {
    let sess = Session::new();
    let arena = GlobalArenas::new();
    let cx = Compilation::new(&sess, &arena);
    let binder = Binder::new(&cx, cx.root());

    // 4'hf + 4'h1 in a self-determined context stays 4 bits wide and
    // wraps to zero.
    let syntax = binary(
        BinaryOp::Add,
        lit(4, LiteralBase::Hex, "f"),
        lit(4, LiteralBase::Hex, "1"),
    );
    let expr = binder.bind_self_determined(&syntax);
    assert_eq!(expr.ty.width(), 4);
    let mut ctx = EvalContext::new(&cx);
    assert_value(&ctx.eval(expr), "4'b0000");
}

#[test]
fn context_determined_addition_widens_before_the_carry() {
    let sess = Session::new();
    let arena = GlobalArenas::new();
    let cx = Compilation::new(&sess, &arena);
    let binder = Binder::new(&cx, cx.root());

    // The same addition bound against a 32-bit target widens both
    // operands first, so the carry is not lost.
    let syntax = binary(
        BinaryOp::Add,
        lit(4, LiteralBase::Hex, "f"),
        lit(4, LiteralBase::Hex, "1"),
    );
    let expr = binder.bind_assignment_like(&INT_TYPE, &syntax, here());
    assert_eq!(expr.ty.width(), 32);
    let mut ctx = EvalContext::new(&cx);
    let value = ctx.eval(expr);
    assert_eq!(value.integer().unwrap().as_u64(), Some(16));
}

#[test]
fn shift_amount_stays_self_determined() {
    let sess = Session::new();
    let arena = GlobalArenas::new();
    let cx = Compilation::new(&sess, &arena);
    let binder = Binder::new(&cx, cx.root());

    let syntax = binary(
        BinaryOp::LogicalShiftLeft,
        lit(8, LiteralBase::Decimal, "1"),
        lit(4, LiteralBase::Decimal, "2"),
    );
    let expr = binder.bind_assignment_like(&INT_TYPE, &syntax, here());
    assert_eq!(expr.ty.width(), 32);
    // The left operand was widened through the conversion; the shift
    // amount kept its own 4-bit type.
    let (lhs, rhs) = match &expr.kind {
        ExprKind::Binary { lhs, rhs, .. } => (lhs, rhs),
        other => panic!("expected a binary node, got {:?}", other),
    };
    assert_eq!(lhs.ty.width(), 32);
    assert_eq!(rhs.ty.width(), 4);
    let mut ctx = EvalContext::new(&cx);
    assert_eq!(ctx.eval(expr).integer().unwrap().as_u64(), Some(4));
}

#[test]
fn comparison_operands_share_a_type_but_yield_one_bit() {
    let sess = Session::new();
    let arena = GlobalArenas::new();
    let cx = Compilation::new(&sess, &arena);
    let binder = Binder::new(&cx, cx.root());

    let syntax = binary(
        BinaryOp::LessThan,
        lit(4, LiteralBase::Hex, "f"),
        lit(8, LiteralBase::Hex, "ff"),
    );
    let expr = binder.bind_self_determined(&syntax);
    assert_eq!(expr.ty.width(), 1);
    let mut ctx = EvalContext::new(&cx);
    assert_eq!(ctx.eval(expr).integer().unwrap().as_u64(), Some(1));
}

#[test]
fn unbased_unsized_literal_fills_its_context() {
    let sess = Session::new();
    let arena = GlobalArenas::new();
    let cx = Compilation::new(&sess, &arena);
    let binder = Binder::new(&cx, cx.root());

    let syntax = ExprSyntax::new(ExprSyntaxKind::UnbasedUnsizedLiteral('1'));
    let expr = binder.bind_assignment_like(&INT_TYPE, &syntax, here());
    assert_eq!(expr.ty.width(), 32);
    let mut ctx = EvalContext::new(&cx);
    assert_eq!(
        ctx.eval(expr).integer().unwrap().as_u64(),
        Some(0xffff_ffff)
    );
}

#[test]
fn invalid_operand_short_circuits_without_cascades() {
    let sess = Session::new();
    let arena = GlobalArenas::new();
    let cx = Compilation::new(&sess, &arena);
    let binder = Binder::new(&cx, cx.root());

    // `missing + 1`: one undeclared-identifier diagnostic, and the whole
    // tree becomes invalid with the error type.
    let syntax = binary(BinaryOp::Add, ident("missing"), int(1));
    let expr = binder.bind_self_determined(&syntax);
    assert!(expr.bad());
    assert!(expr.ty.is_error());
    assert_eq!(sess.diag_codes(), vec![DiagCode::UndeclaredIdentifier]);
}

#[test]
fn narrowing_assignment_warns() {
    let sess = Session::new();
    let arena = GlobalArenas::new();
    let cx = Compilation::new(&sess, &arena);
    let binder = Binder::new(&cx, cx.root());

    let target = binder.bind_type(&t_logic_vec(3, 0));
    let syntax = lit(8, LiteralBase::Hex, "ff");
    let expr = binder.bind_assignment_like(target, &syntax, here());
    assert!(!expr.bad());
    assert_eq!(expr.ty.width(), 4);
    assert!(sess.has_diag(DiagCode::WidthMismatch));
}

#[test]
fn conversion_is_idempotent() {
    let sess = Session::new();
    let arena = GlobalArenas::new();
    let cx = Compilation::new(&sess, &arena);
    let binder = Binder::new(&cx, cx.root());

    let once = binder.bind_assignment_like(&INT_TYPE, &lit(4, LiteralBase::Hex, "9"), here());
    // Converting an expression that already has the target type changes
    // nothing.
    let twice = binder.convert_assignment(&INT_TYPE, (*once).clone(), here());
    assert_eq!(twice.ty, once.ty);
    let mut ctx = EvalContext::new(&cx);
    let a = ctx.eval(once);
    let b = ctx.eval(&twice);
    assert_eq!(a, b);
}

#[test]
fn concatenation_is_self_determined_and_unsigned() {
    let sess = Session::new();
    let arena = GlobalArenas::new();
    let cx = Compilation::new(&sess, &arena);
    let binder = Binder::new(&cx, cx.root());

    let syntax = concat(vec![bin_lit("4'b10x0"), bin_lit("4'b0001")]);
    let expr = binder.bind_self_determined(&syntax);
    assert_eq!(expr.ty.width(), 8);
    assert!(!expr.ty.is_signed());
    let mut ctx = EvalContext::new(&cx);
    assert_value(&ctx.eval(expr), "8'b10x00001");
}

#[test]
fn predicate_conjunction_operator_is_rejected() {
    let sess = Session::new();
    let arena = GlobalArenas::new();
    let cx = Compilation::new(&sess, &arena);
    let binder = Binder::new(&cx, cx.root());

    // `if (a &&& b)` arrives as two predicate conditions.
    let syntax = StmtSyntax::new(StmtSyntaxKind::Conditional {
        conditions: vec![
            ConditionSyntax {
                expr: int(1),
                matches_clause: false,
            },
            ConditionSyntax {
                expr: int(2),
                matches_clause: false,
            },
        ],
        if_true: Box::new(s_ret(None)),
        if_false: None,
    });
    let stmt = binder.bind_statement(&syntax);
    assert!(stmt.bad());
    assert!(sess.has_diag(DiagCode::UnsupportedConstruct));
}

#[test]
fn return_outside_subroutine_is_rejected() {
    let sess = Session::new();
    let arena = GlobalArenas::new();
    let cx = Compilation::new(&sess, &arena);
    let binder = Binder::new(&cx, cx.root());

    let stmt = binder.bind_statement(&s_ret(Some(int(1))));
    assert!(stmt.bad());
    assert!(sess.has_diag(DiagCode::ReturnOutsideSubroutine));
}

#[test]
fn unit_scope_jumps_to_the_root() {
    let sess = Session::new();
    let arena = GlobalArenas::new();
    let cx = Compilation::new(&sess, &arena);
    add_members(&cx, vec![m_param("P", Some(t_int()), int(7))]);
    let binder = Binder::new(&cx, cx.root());

    let expr = binder.bind_self_determined(&scoped(&["$unit", "P"]));
    assert!(!expr.bad());
    let mut ctx = EvalContext::new(&cx);
    assert_value(&ctx.eval(expr), "32'd7");
}

#[test]
fn enum_assignment_requires_a_cast() {
    let sess = Session::new();
    let arena = GlobalArenas::new();
    let cx = Compilation::new(&sess, &arena);
    add_members(&cx, vec![m_enum("state_t", vec![("IDLE", None), ("BUSY", None)])]);
    let binder = Binder::new(&cx, cx.root());

    let target = binder.bind_type(&t_named("state_t"));
    assert_eq!(target.assignable(&INT_TYPE), ConversionKind::Explicit);

    // A bare integer is rejected...
    let expr = binder.bind_assignment_like(target, &int(1), here());
    assert!(expr.bad());
    assert!(sess.has_diag(DiagCode::TypeMismatch));

    // ...while the same value through a cast is accepted.
    let expr = binder.bind_assignment_like(target, &cast(t_named("state_t"), int(1)), here());
    assert!(!expr.bad());
}
