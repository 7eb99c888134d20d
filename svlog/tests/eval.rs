// Copyright (c) 2024-2026 The mealy developers

//! Tests for the constant evaluator: parameters, subroutine calls, lvalue
//! writes, loops, and the budget and depth limits.

mod common;
use common::*;
use mealy_svlog::eval::parameter_value;
use mealy_svlog::symbols::{lookup_unqualified, LookupKind, SymbolKind};
use mealy_svlog::ty::INT_TYPE;

fn find(cx: &Compilation, n: &str) -> mealy_svlog::symbols::SymbolId {
    lookup_unqualified(cx, intern(n), cx.root(), LookupKind::Definition)
        .unwrap_or_else(|| panic!("`{}` not found", n))
}

#[test]
fn x_bits_poison_addition() {
    let sess = Session::new();
    let arena = GlobalArenas::new();
    let cx = Compilation::new(&sess, &arena);
    let binder = Binder::new(&cx, cx.root());

    let expr = binder.bind_self_determined(&binary(
        BinaryOp::Add,
        bin_lit("4'b10x0"),
        bin_lit("4'b0001"),
    ));
    assert_eq!(expr.ty.width(), 4);
    assert!(expr.ty.is_four_state());
    let mut ctx = EvalContext::new(&cx);
    assert_value(&ctx.eval(expr), "4'bxxxx");
}

#[test]
fn parameter_value_and_bits_query() {
    let sess = Session::new();
    let arena = GlobalArenas::new();
    let cx = Compilation::new(&sess, &arena);
    // parameter int P = 3 + 2 * 4;
    add_members(
        &cx,
        vec![m_param(
            "P",
            Some(t_int()),
            binary(
                BinaryOp::Add,
                int(3),
                binary(BinaryOp::Multiply, int(2), int(4)),
            ),
        )],
    );

    let p = find(&cx, "P");
    let value = parameter_value(&cx, p);
    assert_eq!(value.integer().unwrap().as_u64(), Some(11));

    // $bits(P) has type int and value 32.
    let binder = Binder::new(&cx, cx.root());
    let expr = binder.bind_self_determined(&syscall("$bits", vec![ident("P")]));
    assert!(expr.ty.equivalent(&INT_TYPE));
    let mut ctx = EvalContext::new(&cx);
    assert_value(&ctx.eval(expr), "32'd32");
    assert!(!sess.failed.get());
}

#[test]
fn function_call_and_step_accounting() {
    let sess = Session::new();
    let arena = GlobalArenas::new();
    let cx = Compilation::new(&sess, &arena);
    // function automatic int f(int a); return a + 1; endfunction
    add_members(
        &cx,
        vec![m_func(
            "f",
            t_int(),
            vec![port(Some(Direction::In), Some(t_int()), "a")],
            vec![stmt(s_ret(Some(binary(BinaryOp::Add, ident("a"), int(1)))))],
        )],
    );

    let binder = Binder::new(&cx, cx.root());
    let expr = binder.bind_self_determined(&call("f", vec![int(41)]));
    assert!(expr.ty.equivalent(&INT_TYPE));
    let mut ctx = EvalContext::new(&cx);
    let value = ctx.eval(expr);
    assert_value(&value, "32'd42");
    // Exactly one statement ran: the return.
    assert_eq!(ctx.steps_taken(), 1);
}

#[test]
fn partial_writes_preserve_untouched_bits() {
    let sess = Session::new();
    let arena = GlobalArenas::new();
    let cx = Compilation::new(&sess, &arena);
    let binder = Binder::new(&cx, cx.root());

    // logic [7:0] v; v[3:0] = 4'b1x01;
    let block = s_block(vec![
        decl(t_logic_vec(7, 0), "v", None),
        stmt(s_expr(assign(
            range_sel(
                ident("v"),
                RangeSelectionKind::Simple,
                int(3),
                int(0),
            ),
            bin_lit("4'b1x01"),
        ))),
    ]);
    let stmt = binder.bind_statement(&block);
    let mut ctx = EvalContext::new(&cx);
    assert_eq!(ctx.eval_stmt(stmt), Flow::Normal);

    let scope = match &stmt.kind {
        mealy_svlog::stmt::StmtKind::Block { scope, .. } => *scope,
        _ => unreachable!(),
    };
    let v = cx.scope(scope).get(&cx, intern("v")).unwrap();
    let value = ctx.get_local(v).unwrap();
    assert_value(value, "8'b0000_1x01");
}

#[test]
fn division_by_zero_records_a_diagnostic() {
    let sess = Session::new();
    let arena = GlobalArenas::new();
    let cx = Compilation::new(&sess, &arena);
    let binder = Binder::new(&cx, cx.root());

    let expr = binder.bind_self_determined(&binary(
        BinaryOp::Divide,
        lit(8, LiteralBase::Decimal, "10"),
        lit(8, LiteralBase::Decimal, "0"),
    ));
    let mut ctx = EvalContext::new(&cx);
    let value = ctx.eval(expr);
    assert_value(&value, "8'bxxxxxxxx");
    assert!(ctx.has_diag(DiagCode::DivideByZero));
    // Evaluator diagnostics are provisional; nothing reached the session.
    assert!(!sess.has_diag(DiagCode::DivideByZero));
}

#[test]
fn clog2_of_a_parameter() {
    let sess = Session::new();
    let arena = GlobalArenas::new();
    let cx = Compilation::new(&sess, &arena);
    add_members(&cx, vec![m_param("DEPTH", Some(t_int()), int(48))]);

    let binder = Binder::new(&cx, cx.root());
    let expr = binder.bind_self_determined(&syscall("$clog2", vec![ident("DEPTH")]));
    let mut ctx = EvalContext::new(&cx);
    assert_value(&ctx.eval(expr), "32'd6");
}

#[test]
fn for_loop_accumulates() {
    let sess = Session::new();
    let arena = GlobalArenas::new();
    let cx = Compilation::new(&sess, &arena);
    // function automatic int sum(int n);
    //   int acc; acc = 0;
    //   for (int i = 0; i < n; i = i + 1) acc = acc + i;
    //   return acc;
    // endfunction
    add_members(
        &cx,
        vec![m_func(
            "sum",
            t_int(),
            vec![port(Some(Direction::In), Some(t_int()), "n")],
            vec![
                decl(t_int(), "acc", Some(int(0))),
                stmt(s_for(
                    vec![decl(t_int(), "i", Some(int(0)))],
                    binary(BinaryOp::LessThan, ident("i"), ident("n")),
                    vec![assign(ident("i"), binary(BinaryOp::Add, ident("i"), int(1)))],
                    s_expr(assign(
                        ident("acc"),
                        binary(BinaryOp::Add, ident("acc"), ident("i")),
                    )),
                )),
                stmt(s_ret(Some(ident("acc")))),
            ],
        )],
    );

    let binder = Binder::new(&cx, cx.root());
    let expr = binder.bind_self_determined(&call("sum", vec![int(10)]));
    let mut ctx = EvalContext::new(&cx);
    assert_value(&ctx.eval(expr), "32'd45");
}

#[test]
fn runaway_loop_exhausts_the_budget() {
    let sess = Session::new();
    let arena = GlobalArenas::new();
    let cx = Compilation::new(&sess, &arena);
    add_members(
        &cx,
        vec![m_func(
            "spin",
            t_int(),
            vec![],
            vec![
                stmt(s_for(
                    vec![decl(t_int(), "i", Some(int(0)))],
                    binary(BinaryOp::GreaterThanEqual, ident("i"), int(0)),
                    vec![],
                    s_expr(assign(ident("i"), int(1))),
                )),
                stmt(s_ret(Some(int(0)))),
            ],
        )],
    );

    let binder = Binder::new(&cx, cx.root());
    let expr = binder.bind_self_determined(&call("spin", vec![]));
    let mut ctx = EvalContext::new(&cx).with_budget(100);
    let value = ctx.eval(expr);
    assert!(value.bad());
    assert!(ctx.has_diag(DiagCode::EvalTimeout));
}

#[test]
fn unbounded_recursion_trips_the_depth_limit() {
    let sess = Session::new();
    let arena = GlobalArenas::new();
    let cx = Compilation::new(&sess, &arena);
    // function automatic int down(int n); return down(n - 1); endfunction
    add_members(
        &cx,
        vec![m_func(
            "down",
            t_int(),
            vec![port(Some(Direction::In), Some(t_int()), "n")],
            vec![stmt(s_ret(Some(call(
                "down",
                vec![binary(BinaryOp::Subtract, ident("n"), int(1))],
            ))))],
        )],
    );

    let binder = Binder::new(&cx, cx.root());
    let expr = binder.bind_self_determined(&call("down", vec![int(1)]));
    let mut ctx = EvalContext::new(&cx).with_depth_limit(16);
    let value = ctx.eval(expr);
    assert!(value.bad());
    assert!(ctx.has_diag(DiagCode::RecursionLimit));
}

#[test]
fn output_arguments_copy_out() {
    let sess = Session::new();
    let arena = GlobalArenas::new();
    let cx = Compilation::new(&sess, &arena);
    // function automatic int split(int n, output int half);
    //   half = n / 2; return n % 2;
    // endfunction
    add_members(
        &cx,
        vec![m_func(
            "split",
            t_int(),
            vec![
                port(Some(Direction::In), Some(t_int()), "n"),
                port(Some(Direction::Out), Some(t_int()), "half"),
            ],
            vec![
                stmt(s_expr(assign(
                    ident("half"),
                    binary(BinaryOp::Divide, ident("n"), int(2)),
                ))),
                stmt(s_ret(Some(binary(BinaryOp::Mod, ident("n"), int(2))))),
            ],
        )],
    );

    let binder = Binder::new(&cx, cx.root());
    // int r; int h; r = split(7, h);
    let block = s_block(vec![
        decl(t_int(), "h", Some(int(0))),
        decl(t_int(), "r", Some(int(0))),
        stmt(s_expr(assign(ident("r"), call("split", vec![int(7), ident("h")])))),
    ]);
    let stmt = binder.bind_statement(&block);
    let mut ctx = EvalContext::new(&cx);
    assert_eq!(ctx.eval_stmt(stmt), Flow::Normal);
    let scope = match &stmt.kind {
        mealy_svlog::stmt::StmtKind::Block { scope, .. } => *scope,
        _ => unreachable!(),
    };
    let h = cx.scope(scope).get(&cx, intern("h")).unwrap();
    let r = cx.scope(scope).get(&cx, intern("r")).unwrap();
    assert_value(ctx.get_local(h).unwrap(), "32'd3");
    assert_value(ctx.get_local(r).unwrap(), "32'd1");
}

#[test]
fn enum_variants_count_up_from_explicit_values() {
    let sess = Session::new();
    let arena = GlobalArenas::new();
    let cx = Compilation::new(&sess, &arena);
    add_members(
        &cx,
        vec![m_enum(
            "op_t",
            vec![("ADD", Some(int(1))), ("SUB", None), ("MUL", Some(int(8)))],
        )],
    );

    let binder = Binder::new(&cx, cx.root());
    let expr = binder.bind_self_determined(&ident("SUB"));
    assert!(expr.ty.enum_type().is_some());
    let mut ctx = EvalContext::new(&cx);
    assert_eq!(ctx.eval(expr).integer().unwrap().as_u64(), Some(2));
    let expr = binder.bind_self_determined(&ident("MUL"));
    assert_eq!(ctx.eval(expr).integer().unwrap().as_u64(), Some(8));
}

#[test]
fn packed_struct_fields_read_and_write() {
    let sess = Session::new();
    let arena = GlobalArenas::new();
    let cx = Compilation::new(&sess, &arena);
    add_members(
        &cx,
        vec![m_struct(
            "pair_t",
            true,
            vec![(t_logic_vec(3, 0), "hi"), (t_logic_vec(3, 0), "lo")],
        )],
    );

    let binder = Binder::new(&cx, cx.root());
    // pair_t p; p.hi = 4'hA; p.lo = 4'h5;
    let block = s_block(vec![
        decl(t_named("pair_t"), "p", None),
        stmt(s_expr(assign(
            member(ident("p"), "hi"),
            lit(4, LiteralBase::Hex, "a"),
        ))),
        stmt(s_expr(assign(
            member(ident("p"), "lo"),
            lit(4, LiteralBase::Hex, "5"),
        ))),
    ]);
    let stmt = binder.bind_statement(&block);
    let mut ctx = EvalContext::new(&cx);
    assert_eq!(ctx.eval_stmt(stmt), Flow::Normal);
    let scope = match &stmt.kind {
        mealy_svlog::stmt::StmtKind::Block { scope, .. } => *scope,
        _ => unreachable!(),
    };
    let p = cx.scope(scope).get(&cx, intern("p")).unwrap();
    assert!(matches!(cx.symbol(p).kind, SymbolKind::Variable(_)));
    // The first field sits in the most significant nibble.
    assert_value(ctx.get_local(p).unwrap(), "8'b1010_0101");

    // Reading a field back slices the packed value. Bind in the block
    // scope so `p` resolves.
    let inner = Binder::new(&cx, scope);
    let read = inner.bind_self_determined(&member(ident("p"), "hi"));
    assert_value(&ctx.eval(read), "4'b1010");
}

#[test]
fn conditional_with_unknown_predicate_merges_arms() {
    let sess = Session::new();
    let arena = GlobalArenas::new();
    let cx = Compilation::new(&sess, &arena);
    let binder = Binder::new(&cx, cx.root());

    // 1'bx ? 4'b1100 : 4'b1010 keeps the agreeing MSB and turns the
    // disagreeing bits to X.
    let expr = binder.bind_self_determined(&cond(
        bin_lit("1'bx"),
        bin_lit("4'b1100"),
        bin_lit("4'b1010"),
    ));
    let mut ctx = EvalContext::new(&cx);
    assert_value(&ctx.eval(expr), "4'b1xx0");
}

#[test]
fn inside_uses_wildcard_matching() {
    let sess = Session::new();
    let arena = GlobalArenas::new();
    let cx = Compilation::new(&sess, &arena);
    let binder = Binder::new(&cx, cx.root());

    let expr = binder.bind_self_determined(&inside(
        bin_lit("4'b1011"),
        vec![bin_lit("4'b0000"), bin_lit("4'b10xx")],
    ));
    let mut ctx = EvalContext::new(&cx);
    assert_value(&ctx.eval(expr), "1'b1");

    let expr = binder.bind_self_determined(&inside(
        bin_lit("4'b0111"),
        vec![bin_lit("4'b0000"), bin_lit("4'b10xx")],
    ));
    assert_value(&ctx.eval(expr), "1'b0");
}

#[test]
fn string_and_integral_conversions_pack() {
    let sess = Session::new();
    let arena = GlobalArenas::new();
    let cx = Compilation::new(&sess, &arena);
    let binder = Binder::new(&cx, cx.root());

    let target = binder.bind_type(&t_logic_vec(15, 0));
    let syntax = ExprSyntax::new(ExprSyntaxKind::StringLiteral("Hi".into()));
    let expr = binder.bind_assignment_like(target, &syntax, here());
    assert!(!expr.bad());
    let mut ctx = EvalContext::new(&cx);
    assert_eq!(ctx.eval(expr).integer().unwrap().as_u64(), Some(0x4869));
}

#[test]
fn packages_resolve_qualified_constants() {
    let sess = Session::new();
    let arena = GlobalArenas::new();
    let cx = Compilation::new(&sess, &arena);
    add_members(
        &cx,
        vec![m_package(
            "cfg",
            vec![m_param("WIDTH", Some(t_int()), int(24))],
        )],
    );

    let binder = Binder::new(&cx, cx.root());
    let expr = binder.bind_self_determined(&scoped(&["cfg", "WIDTH"]));
    let mut ctx = EvalContext::new(&cx);
    assert_value(&ctx.eval(expr), "32'd24");
}

#[test]
fn strict_mode_rejects_uninitialized_reads() {
    let mut sess = Session::new();
    sess.opts.strict_eval = true;
    let arena = GlobalArenas::new();
    let cx = Compilation::new(&sess, &arena);
    let binder = Binder::new(&cx, cx.root());

    // int x; int y; y = x + 1;
    let block = s_block(vec![
        decl(t_int(), "x", None),
        decl(t_int(), "y", None),
        stmt(s_expr(assign(
            ident("y"),
            binary(BinaryOp::Add, ident("x"), int(1)),
        ))),
    ]);
    let stmt = binder.bind_statement(&block);
    let mut ctx = EvalContext::new(&cx);
    // `x` is in the frame with its default, so the read succeeds; drop the
    // declaration from the frame to model a use-before-assignment.
    let scope = match &stmt.kind {
        mealy_svlog::stmt::StmtKind::Block { scope, .. } => *scope,
        _ => unreachable!(),
    };
    assert_eq!(ctx.eval_stmt(stmt), Flow::Normal);
    assert!(cx.scope(scope).get(&cx, intern("x")).is_some());

    // Reading a variable that was never declared in any frame trips the
    // strict check.
    let binder = Binder::new(&cx, scope);
    let expr = binder.bind_self_determined(&ident("x"));
    let mut fresh = EvalContext::new(&cx);
    let value = fresh.eval(expr);
    assert!(value.bad());
    assert!(fresh.has_diag(DiagCode::UninitializedVariable));
}

#[test]
fn script_mode_permits_outer_frame_writes() {
    let sess = Session::new();
    let arena = GlobalArenas::new();
    let cx = Compilation::new(&sess, &arena);
    let binder = Binder::new(&cx, cx.root());

    let block = s_block(vec![
        decl(t_int(), "x", Some(int(1))),
        stmt(s_expr(assign(ident("x"), int(2)))),
    ]);
    let stmt = binder.bind_statement(&block);
    let mut ctx = EvalContext::new(&cx).script_mode();
    assert_eq!(ctx.eval_stmt(stmt), Flow::Normal);
    let scope = match &stmt.kind {
        mealy_svlog::stmt::StmtKind::Block { scope, .. } => *scope,
        _ => unreachable!(),
    };
    let x = cx.scope(scope).get(&cx, intern("x")).unwrap();
    assert_value(ctx.get_local(x).unwrap(), "32'd2");
}

#[test]
fn evaluation_is_pure_without_script_mode() {
    let sess = Session::new();
    let arena = GlobalArenas::new();
    let cx = Compilation::new(&sess, &arena);
    add_members(&cx, vec![m_param("P", Some(t_int()), int(5))]);
    let binder = Binder::new(&cx, cx.root());

    let expr = binder.bind_self_determined(&binary(
        BinaryOp::Multiply,
        ident("P"),
        ident("P"),
    ));
    let mut ctx = EvalContext::new(&cx);
    let a = ctx.eval(expr);
    let diags_after_first = ctx.diags().len();
    let b = ctx.eval(expr);
    assert_eq!(a, b);
    assert_eq!(ctx.diags().len(), diags_after_first);
}
