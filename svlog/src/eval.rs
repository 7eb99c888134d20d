// Copyright (c) 2024-2026 The mealy developers

//! Constant evaluation of bound trees.
//!
//! An [`EvalContext`] executes bound expressions and statements over
//! [`ConstantValue`]s. It maintains a stack of call frames mapping variable
//! symbols to their current values, a step budget that bounds loop and call
//! execution, and a buffer of provisional diagnostics. Evaluator
//! diagnostics stay on the context and are only flushed to the global sink
//! when the caller requires constant semantics; in non-constant contexts a
//! failed evaluation simply yields [`ConstantValue::Bad`] and the
//! diagnostics are discarded with the context.

use crate::binder::{
    self, parameter_type, subroutine_body, value_type, variable_initializer, variable_type, Binder,
    BindFlags,
};
use crate::builtins::SystemFunction;
use crate::context::Compilation;
use crate::expr::{ExprKind, Expression};
use crate::op::{BinaryOp, RangeSelectionKind, UnaryOp};
use crate::stmt::{Statement, StmtKind};
use crate::svint::{Logic, SvInt};
use crate::symbols::{SymbolId, SymbolKind};
use crate::syntax::{Direction, Lifetime};
use crate::ty::{Range, Type, TypeKind};
use crate::value::ConstantValue;
use mealy_common::errors::{Diag, DiagCode, DiagEmitter};
use mealy_common::source::{Location, Span};
use num::{BigInt, One, Signed, ToPrimitive};
use std::collections::HashMap;

/// The default number of statements an evaluation may execute.
pub const DEFAULT_STEP_BUDGET: u64 = 1 << 20;

/// The default call stack depth limit.
pub const DEFAULT_DEPTH_LIMIT: usize = 128;

/// How a statement left the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Execution continues with the next statement.
    Normal,
    /// A `return` statement fired; skip the rest of the frame.
    Returned,
    /// Evaluation failed; a diagnostic has been recorded.
    Failed,
}

/// One call frame of the evaluator.
struct Frame {
    locals: HashMap<SymbolId, ConstantValue>,
    return_value: Option<ConstantValue>,
}

impl Frame {
    fn new() -> Frame {
        Frame {
            locals: HashMap::new(),
            return_value: None,
        }
    }
}

/// A storage location: a root variable plus a path of selections into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LValue {
    pub root: SymbolId,
    pub path: Vec<Selector>,
}

/// One step of an lvalue path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// A bit range within a packed value.
    BitRange { offset: u32, width: u32 },
    /// An element or field of an aggregate.
    Element(usize),
    /// A slice of an unpacked array.
    Slice { offset: usize, len: usize },
}

/// The context a constant evaluation runs in.
pub struct EvalContext<'cx, 'gcx> {
    cx: &'cx Compilation<'gcx>,
    frames: Vec<Frame>,
    steps_remaining: u64,
    steps_taken: u64,
    depth_limit: usize,
    diags: Vec<Diag>,
    script_mode: bool,
}

impl<'cx, 'gcx> EvalContext<'cx, 'gcx> {
    /// Create a new evaluation context with the default limits.
    pub fn new(cx: &'cx Compilation<'gcx>) -> EvalContext<'cx, 'gcx> {
        EvalContext {
            cx,
            frames: vec![Frame::new()],
            steps_remaining: DEFAULT_STEP_BUDGET,
            steps_taken: 0,
            depth_limit: DEFAULT_DEPTH_LIMIT,
            diags: vec![],
            script_mode: false,
        }
    }

    /// Limit the number of statements this context may execute.
    pub fn with_budget(mut self, budget: u64) -> Self {
        self.steps_remaining = budget;
        self
    }

    /// Limit the call stack depth.
    pub fn with_depth_limit(mut self, limit: usize) -> Self {
        self.depth_limit = limit;
        self
    }

    /// Permit mutation of outer-frame variables, as the interactive session
    /// wants.
    pub fn script_mode(mut self) -> Self {
        self.script_mode = true;
        self
    }

    /// The number of statements executed so far.
    pub fn steps_taken(&self) -> u64 {
        self.steps_taken
    }

    /// The provisional diagnostics recorded so far.
    pub fn diags(&self) -> &[Diag] {
        &self.diags
    }

    /// Check whether a diagnostic with the given code was recorded.
    pub fn has_diag(&self, code: DiagCode) -> bool {
        self.diags.iter().any(|d| d.code == code)
    }

    /// Flush the provisional diagnostics to a sink. Used when the binding
    /// context requires constant semantics.
    pub fn report(&mut self, sink: &impl DiagEmitter) {
        for diag in self.diags.drain(..) {
            sink.emit(diag);
        }
    }

    fn fail(&mut self, code: DiagCode, span: Span, msg: String) -> ConstantValue {
        self.diags.push(Diag::error(code, msg).span(span));
        ConstantValue::Bad
    }

    fn note(&mut self, code: DiagCode, span: Span, msg: String) {
        self.diags.push(Diag::error(code, msg).span(span));
    }

    /// Consume one step of the budget. Returns false once exhausted.
    fn take_step(&mut self, span: Span) -> bool {
        if self.steps_remaining == 0 {
            self.note(
                DiagCode::EvalTimeout,
                span,
                "constant evaluation exceeded its step budget".to_string(),
            );
            return false;
        }
        self.steps_remaining -= 1;
        self.steps_taken += 1;
        true
    }

    fn top_frame(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("evaluator has no frame")
    }

    /// Set a variable in the innermost frame. Used to seed script-mode
    /// sessions and loop variables.
    pub fn set_local(&mut self, symbol: SymbolId, value: ConstantValue) {
        self.top_frame().locals.insert(symbol, value);
    }

    /// Read a variable visible to the innermost frame.
    pub fn get_local(&self, symbol: SymbolId) -> Option<&ConstantValue> {
        self.frames.iter().rev().find_map(|f| f.locals.get(&symbol))
    }

    /// Evaluate an expression to a value. Failures yield
    /// [`ConstantValue::Bad`] with a diagnostic recorded on the context.
    pub fn eval(&mut self, expr: &Expression<'gcx>) -> ConstantValue {
        let span = expr.span;
        match &expr.kind {
            ExprKind::Invalid(_) => ConstantValue::Bad,
            ExprKind::IntegerLiteral(v) => ConstantValue::Integer(v.clone()),
            ExprKind::UnbasedUnsizedLiteral(bit) => {
                let sbv = expr.ty.simple_bit_vector().expect("literal must be integral");
                ConstantValue::Integer(match bit {
                    Logic::Zero => SvInt::zero(sbv.width, sbv.signed, sbv.four_state),
                    Logic::One => {
                        let m = (num::BigUint::one() << sbv.width as usize) - num::BigUint::one();
                        SvInt::from_biguint(sbv.width, sbv.signed, sbv.four_state, m)
                    }
                    Logic::X => SvInt::filled_x(sbv.width, sbv.signed),
                    Logic::Z => SvInt::filled_z(sbv.width, sbv.signed),
                })
            }
            ExprKind::RealLiteral(v) => ConstantValue::Real(*v),
            ExprKind::StringLiteral(s) => ConstantValue::Str(s.clone()),
            ExprKind::NullLiteral => ConstantValue::Null,
            ExprKind::UnboundedLiteral => ConstantValue::Unbounded,
            ExprKind::NamedValue {
                symbol,
                hierarchical,
            } => self.eval_named(*symbol, *hierarchical, span),
            ExprKind::Unary { op, operand } => self.eval_unary(*op, operand, expr),
            ExprKind::Binary { op, lhs, rhs } => self.eval_binary(*op, lhs, rhs, span),
            ExprKind::Conditional {
                cond,
                if_true,
                if_false,
            } => {
                let c = self.eval(cond);
                if c.bad() {
                    return ConstantValue::Bad;
                }
                match truthy(&c) {
                    Some(true) => self.eval(if_true),
                    Some(false) => self.eval(if_false),
                    // An unknown predicate evaluates both arms and merges
                    // them bit by bit.
                    None => {
                        let t = self.eval(if_true);
                        let f = self.eval(if_false);
                        if t.bad() || f.bad() {
                            return ConstantValue::Bad;
                        }
                        self.merge_arms(t, f, expr.ty, span)
                    }
                }
            }
            ExprKind::Assignment { lhs, rhs } => {
                let value = self.eval(rhs);
                if value.bad() {
                    return ConstantValue::Bad;
                }
                let lv = match self.eval_lvalue(lhs) {
                    Some(lv) => lv,
                    None => return ConstantValue::Bad,
                };
                if !self.store(&lv, value.clone(), span) {
                    return ConstantValue::Bad;
                }
                value
            }
            ExprKind::Concat(parts) => {
                if expr.ty.is_string() {
                    let mut out = String::new();
                    for part in parts {
                        match self.eval(part) {
                            ConstantValue::Str(s) => out.push_str(&s),
                            ConstantValue::Bad => return ConstantValue::Bad,
                            other => {
                                return self.fail(
                                    DiagCode::TypeMismatch,
                                    part.span,
                                    format!("cannot concatenate `{}` into a string", other),
                                )
                            }
                        }
                    }
                    return ConstantValue::Str(out);
                }
                let mut values = Vec::with_capacity(parts.len());
                for part in parts {
                    match self.eval_integer(part) {
                        Some(v) => values.push(v),
                        None => return ConstantValue::Bad,
                    }
                }
                ConstantValue::Integer(SvInt::concat(&values))
            }
            ExprKind::Replication { count, operand } => match self.eval_integer(operand) {
                Some(v) => ConstantValue::Integer(v.replicate(*count)),
                None => ConstantValue::Bad,
            },
            ExprKind::ElementSelect { value, selector } => {
                self.eval_element_select(value, selector, expr.ty, span)
            }
            ExprKind::RangeSelect {
                value,
                kind,
                left,
                right,
            } => self.eval_range_select(value, *kind, left, right, expr.ty, span),
            ExprKind::MemberAccess { value, index } => {
                let strukt = value
                    .ty
                    .struct_type()
                    .expect("member access on non-struct")
                    .clone();
                let target = self.eval(value);
                if target.bad() {
                    return ConstantValue::Bad;
                }
                match target {
                    ConstantValue::Elements(fields) => fields
                        .into_iter()
                        .nth(*index)
                        .unwrap_or(ConstantValue::Bad),
                    ConstantValue::Integer(v) => {
                        let field = &strukt.fields[*index];
                        ConstantValue::Integer(v.slice(field.offset, field.ty.width()))
                    }
                    other => self.fail(
                        DiagCode::TypeMismatch,
                        span,
                        format!("cannot access a field of `{}`", other),
                    ),
                }
            }
            ExprKind::Call { subroutine, args } => self.eval_call(*subroutine, args, expr),
            ExprKind::SystemCall { function, args } => self.eval_system_call(*function, args, span),
            ExprKind::Conversion { operand, .. } => {
                let value = self.eval(operand);
                if value.bad() {
                    return ConstantValue::Bad;
                }
                self.convert_value(expr.ty, value, span)
            }
            ExprKind::Inside { value, set } => {
                let needle = self.eval(value);
                if needle.bad() {
                    return ConstantValue::Bad;
                }
                let mut unknown = false;
                for member in set {
                    let candidate = self.eval(member);
                    if candidate.bad() {
                        return ConstantValue::Bad;
                    }
                    match (&needle, &candidate) {
                        (ConstantValue::Integer(a), ConstantValue::Integer(b)) => {
                            // Membership uses wildcard equality; X/Z bits
                            // in the set element are don't-care.
                            match a.wildcard_eq(b).to_bool() {
                                Some(true) => return ConstantValue::Integer(SvInt::from_u64(1, false, 1)),
                                Some(false) => (),
                                None => unknown = true,
                            }
                        }
                        (a, b) => {
                            if a.case_matches(b) {
                                return ConstantValue::Integer(SvInt::from_u64(1, false, 1));
                            }
                        }
                    }
                }
                if unknown {
                    ConstantValue::Integer(SvInt::filled_x(1, false))
                } else {
                    ConstantValue::Integer(SvInt::from_u64(1, false, 0))
                }
            }
        }
    }

    fn eval_integer(&mut self, expr: &Expression<'gcx>) -> Option<SvInt> {
        match self.eval(expr) {
            ConstantValue::Integer(v) => Some(v),
            ConstantValue::Bad => None,
            other => {
                self.note(
                    DiagCode::TypeMismatch,
                    expr.span,
                    format!("expected an integral value, got `{}`", other),
                );
                None
            }
        }
    }

    fn eval_named(&mut self, symbol: SymbolId, hierarchical: bool, span: Span) -> ConstantValue {
        if hierarchical {
            return self.fail(
                DiagCode::NotConstant,
                span,
                "hierarchical references are not constant".to_string(),
            );
        }
        let sym = self.cx.symbol(symbol);
        match &sym.kind {
            SymbolKind::Parameter(_) => parameter_value(self.cx, symbol),
            SymbolKind::EnumMember(_) => enum_member_value(self.cx, symbol),
            SymbolKind::Variable(var) => {
                if let Some(v) = self.get_local(symbol) {
                    return v.clone();
                }
                if var.lifetime == Lifetime::Static {
                    return self.fail(
                        DiagCode::NotConstant,
                        span,
                        format!("static variable `{}` is not constant", sym.name),
                    );
                }
                if self.cx.sess.opts.strict_eval {
                    return self.fail(
                        DiagCode::UninitializedVariable,
                        span,
                        format!("variable `{}` is used before it is assigned", sym.name),
                    );
                }
                default_value(variable_type(self.cx, symbol))
            }
            SymbolKind::FormalArgument(_) => match self.get_local(symbol) {
                Some(v) => v.clone(),
                None => self.fail(
                    DiagCode::NotConstant,
                    span,
                    format!("argument `{}` has no value here", sym.name),
                ),
            },
            other => self.fail(
                DiagCode::NotConstant,
                span,
                format!("{} `{}` has no constant value", other.desc(), sym.name),
            ),
        }
    }

    fn eval_unary(
        &mut self,
        op: UnaryOp,
        operand: &Expression<'gcx>,
        expr: &Expression<'gcx>,
    ) -> ConstantValue {
        let span = expr.span;
        if op.is_increment() {
            return self.eval_increment(op, operand, span);
        }
        let value = self.eval(operand);
        if value.bad() {
            return ConstantValue::Bad;
        }
        match value {
            ConstantValue::Integer(v) => ConstantValue::Integer(match op {
                UnaryOp::Plus => v,
                UnaryOp::Minus => v.neg(),
                UnaryOp::BitwiseNot => v.not(),
                UnaryOp::ReductionAnd => v.reduce_and(),
                UnaryOp::ReductionOr => v.reduce_or(),
                UnaryOp::ReductionXor => v.reduce_xor(),
                UnaryOp::ReductionNand => v.reduce_and().logic_not(),
                UnaryOp::ReductionNor => v.reduce_or().logic_not(),
                UnaryOp::ReductionXnor => v.reduce_xor().logic_not(),
                UnaryOp::LogicalNot => v.logic_not(),
                _ => unreachable!(),
            }),
            ConstantValue::Real(v) => match op {
                UnaryOp::Plus => ConstantValue::Real(v),
                UnaryOp::Minus => ConstantValue::Real(-v),
                UnaryOp::LogicalNot => {
                    ConstantValue::Integer(SvInt::from_u64(1, false, (v == 0.0) as u64))
                }
                _ => self.fail(
                    DiagCode::TypeMismatch,
                    span,
                    format!("{} cannot be applied to a real value", op),
                ),
            },
            other => self.fail(
                DiagCode::TypeMismatch,
                span,
                format!("{} cannot be applied to `{}`", op, other),
            ),
        }
    }

    fn eval_increment(
        &mut self,
        op: UnaryOp,
        operand: &Expression<'gcx>,
        span: Span,
    ) -> ConstantValue {
        let lv = match self.eval_lvalue(operand) {
            Some(lv) => lv,
            None => return ConstantValue::Bad,
        };
        let old = self.load(&lv, span);
        let old = match old {
            ConstantValue::Integer(v) => v,
            ConstantValue::Bad => return ConstantValue::Bad,
            other => {
                return self.fail(
                    DiagCode::TypeMismatch,
                    span,
                    format!("{} cannot be applied to `{}`", op, other),
                )
            }
        };
        let one = SvInt::from_u64(old.width(), old.is_signed(), 1);
        let new = match op {
            UnaryOp::Preincrement | UnaryOp::Postincrement => old.add(&one),
            _ => old.sub(&one),
        };
        let new = new.resize(old.width()).as_signed(old.is_signed());
        if !self.store(&lv, ConstantValue::Integer(new.clone()), span) {
            return ConstantValue::Bad;
        }
        match op {
            UnaryOp::Preincrement | UnaryOp::Predecrement => ConstantValue::Integer(new),
            _ => ConstantValue::Integer(old),
        }
    }

    fn eval_binary(
        &mut self,
        op: BinaryOp,
        lhs: &Expression<'gcx>,
        rhs: &Expression<'gcx>,
        span: Span,
    ) -> ConstantValue {
        if op.is_logical() {
            return self.eval_logical(op, lhs, rhs);
        }
        let lv = self.eval(lhs);
        if lv.bad() {
            return ConstantValue::Bad;
        }
        let rv = self.eval(rhs);
        if rv.bad() {
            return ConstantValue::Bad;
        }
        match (lv, rv) {
            (ConstantValue::Integer(a), ConstantValue::Integer(b)) => {
                self.eval_int_binary(op, a, b, span)
            }
            (ConstantValue::Real(a), ConstantValue::Real(b)) => self.eval_real_binary(op, a, b, span),
            (ConstantValue::Str(a), ConstantValue::Str(b)) => {
                let result = match op {
                    BinaryOp::Equality | BinaryOp::CaseEquality => a == b,
                    BinaryOp::Inequality | BinaryOp::CaseInequality => a != b,
                    BinaryOp::GreaterThan => a > b,
                    BinaryOp::GreaterThanEqual => a >= b,
                    BinaryOp::LessThan => a < b,
                    BinaryOp::LessThanEqual => a <= b,
                    _ => {
                        return self.fail(
                            DiagCode::TypeMismatch,
                            span,
                            format!("{} cannot be applied to strings", op),
                        )
                    }
                };
                ConstantValue::Integer(SvInt::from_u64(1, false, result as u64))
            }
            (a, b) => self.fail(
                DiagCode::TypeMismatch,
                span,
                format!("{} cannot be applied to `{}` and `{}`", op, a, b),
            ),
        }
    }

    fn eval_int_binary(&mut self, op: BinaryOp, a: SvInt, b: SvInt, span: Span) -> ConstantValue {
        let v = match op {
            BinaryOp::Add => a.add(&b),
            BinaryOp::Subtract => a.sub(&b),
            BinaryOp::Multiply => a.mul(&b),
            BinaryOp::Divide | BinaryOp::Mod => {
                if b.is_zero() {
                    self.note(
                        DiagCode::DivideByZero,
                        span,
                        "division by zero".to_string(),
                    );
                }
                if op == BinaryOp::Divide {
                    a.div(&b)
                } else {
                    a.rem(&b)
                }
            }
            BinaryOp::Power => a.pow(&b),
            BinaryOp::BinaryAnd => a.and(&b),
            BinaryOp::BinaryOr => a.or(&b),
            BinaryOp::BinaryXor => a.xor(&b),
            BinaryOp::BinaryXnor => a.xnor(&b),
            BinaryOp::Equality => a.logic_eq(&b),
            BinaryOp::Inequality => a.logic_ne(&b),
            BinaryOp::CaseEquality => SvInt::from_u64(1, false, a.case_eq(&b) as u64),
            BinaryOp::CaseInequality => SvInt::from_u64(1, false, !a.case_eq(&b) as u64),
            BinaryOp::WildcardEquality => a.wildcard_eq(&b),
            BinaryOp::WildcardInequality => a.wildcard_eq(&b).logic_not(),
            BinaryOp::GreaterThan => a.gt(&b),
            BinaryOp::GreaterThanEqual => a.ge(&b),
            BinaryOp::LessThan => a.lt(&b),
            BinaryOp::LessThanEqual => a.le(&b),
            BinaryOp::LogicalShiftLeft | BinaryOp::ArithmeticShiftLeft => {
                match shift_amount(&b) {
                    Some(n) => a.shl(n),
                    None => SvInt::filled_x(a.width(), a.is_signed()),
                }
            }
            BinaryOp::LogicalShiftRight => match shift_amount(&b) {
                Some(n) => a.lshr(n),
                None => SvInt::filled_x(a.width(), a.is_signed()),
            },
            BinaryOp::ArithmeticShiftRight => match shift_amount(&b) {
                Some(n) => a.ashr(n),
                None => SvInt::filled_x(a.width(), a.is_signed()),
            },
            BinaryOp::LogicalAnd
            | BinaryOp::LogicalOr
            | BinaryOp::LogicalImplication
            | BinaryOp::LogicalEquivalence => unreachable!("handled by eval_logical"),
        };
        ConstantValue::Integer(v)
    }

    fn eval_real_binary(&mut self, op: BinaryOp, a: f64, b: f64, span: Span) -> ConstantValue {
        let bit = |b: bool| ConstantValue::Integer(SvInt::from_u64(1, false, b as u64));
        match op {
            BinaryOp::Add => ConstantValue::Real(a + b),
            BinaryOp::Subtract => ConstantValue::Real(a - b),
            BinaryOp::Multiply => ConstantValue::Real(a * b),
            BinaryOp::Divide => {
                if b == 0.0 {
                    self.note(DiagCode::DivideByZero, span, "division by zero".to_string());
                }
                ConstantValue::Real(a / b)
            }
            BinaryOp::Power => ConstantValue::Real(a.powf(b)),
            BinaryOp::Equality => bit(a == b),
            BinaryOp::Inequality => bit(a != b),
            BinaryOp::GreaterThan => bit(a > b),
            BinaryOp::GreaterThanEqual => bit(a >= b),
            BinaryOp::LessThan => bit(a < b),
            BinaryOp::LessThanEqual => bit(a <= b),
            _ => self.fail(
                DiagCode::TypeMismatch,
                span,
                format!("{} cannot be applied to real values", op),
            ),
        }
    }

    fn eval_logical(
        &mut self,
        op: BinaryOp,
        lhs: &Expression<'gcx>,
        rhs: &Expression<'gcx>,
    ) -> ConstantValue {
        let bit = |b: bool| ConstantValue::Integer(SvInt::from_u64(1, false, b as u64));
        let x = || ConstantValue::Integer(SvInt::filled_x(1, false));
        let lv = self.eval(lhs);
        if lv.bad() {
            return ConstantValue::Bad;
        }
        let l = truthy(&lv);
        // Short-circuit where the left side already decides.
        match (op, l) {
            (BinaryOp::LogicalAnd, Some(false)) => return bit(false),
            (BinaryOp::LogicalOr, Some(true)) => return bit(true),
            (BinaryOp::LogicalImplication, Some(false)) => return bit(true),
            _ => (),
        }
        let rv = self.eval(rhs);
        if rv.bad() {
            return ConstantValue::Bad;
        }
        let r = truthy(&rv);
        match op {
            BinaryOp::LogicalAnd => match (l, r) {
                (Some(true), Some(b)) => bit(b),
                (_, Some(false)) => bit(false),
                _ => x(),
            },
            BinaryOp::LogicalOr => match (l, r) {
                (Some(false), Some(b)) => bit(b),
                (_, Some(true)) => bit(true),
                _ => x(),
            },
            BinaryOp::LogicalImplication => match (l, r) {
                (Some(true), Some(b)) => bit(b),
                (_, Some(true)) => bit(true),
                _ => x(),
            },
            BinaryOp::LogicalEquivalence => match (l, r) {
                (Some(a), Some(b)) => bit(a == b),
                _ => x(),
            },
            _ => unreachable!(),
        }
    }

    fn merge_arms(
        &mut self,
        t: ConstantValue,
        f: ConstantValue,
        ty: Type<'gcx>,
        span: Span,
    ) -> ConstantValue {
        match (t, f) {
            (ConstantValue::Integer(a), ConstantValue::Integer(b)) => {
                ConstantValue::Integer(a.merge(&b))
            }
            (ConstantValue::Elements(a), ConstantValue::Elements(b)) if a.len() == b.len() => {
                let elem_ty = ty.element_type().unwrap_or(ty);
                ConstantValue::Elements(
                    a.into_iter()
                        .zip(b)
                        .map(|(x, y)| self.merge_arms(x, y, elem_ty, span))
                        .collect(),
                )
            }
            (a, b) => {
                if a == b {
                    a
                } else {
                    self.fail(
                        DiagCode::NotConstant,
                        span,
                        "conditional with unknown predicate has no defined value".to_string(),
                    )
                }
            }
        }
    }

    fn eval_element_select(
        &mut self,
        value: &Expression<'gcx>,
        selector: &Expression<'gcx>,
        result_ty: Type<'gcx>,
        span: Span,
    ) -> ConstantValue {
        let target = self.eval(value);
        if target.bad() {
            return ConstantValue::Bad;
        }
        let index = match self.eval_integer(selector) {
            Some(v) => v,
            None => return ConstantValue::Bad,
        };
        let range = select_range(value.ty);
        let offset = index
            .to_bigint()
            .and_then(|i| i.to_i32())
            .and_then(|i| range.offset(i));
        match target {
            ConstantValue::Integer(v) => match offset {
                Some(offset) => {
                    let elem_width = result_ty.width();
                    ConstantValue::Integer(v.slice(offset * elem_width, elem_width))
                }
                // An out-of-bounds or unknown index reads as X.
                None => ConstantValue::Integer(SvInt::filled_x(result_ty.width(), false)),
            },
            ConstantValue::Elements(elems) => match offset {
                Some(offset) => elems
                    .into_iter()
                    .nth(offset as usize)
                    .unwrap_or(ConstantValue::Bad),
                None => self.fail(
                    DiagCode::IndexOutOfBounds,
                    span,
                    format!("index {} is out of bounds for `{}`", index, value.ty),
                ),
            },
            other => self.fail(
                DiagCode::TypeMismatch,
                span,
                format!("cannot index `{}`", other),
            ),
        }
    }

    fn eval_range_select(
        &mut self,
        value: &Expression<'gcx>,
        kind: RangeSelectionKind,
        left: &Expression<'gcx>,
        right: &Expression<'gcx>,
        result_ty: Type<'gcx>,
        span: Span,
    ) -> ConstantValue {
        let target = self.eval(value);
        if target.bad() {
            return ConstantValue::Bad;
        }
        let range = select_range(value.ty);
        let low = self.select_low_offset(kind, left, right, range);
        let width = match result_ty.resolve() {
            TypeKind::UnpackedArray { range, .. } => range.size(),
            other => other.width(),
        };
        match target {
            ConstantValue::Integer(v) => {
                let elem_width = match value.ty.resolve() {
                    TypeKind::PackedArray { elem, .. } => elem.width(),
                    _ => 1,
                };
                match low {
                    Some(low) => ConstantValue::Integer(v.slice(low * elem_width, width)),
                    None => ConstantValue::Integer(SvInt::filled_x(width, false)),
                }
            }
            ConstantValue::Elements(elems) => {
                let len = match result_ty.array_range() {
                    Some(r) => r.size() as usize,
                    None => {
                        return self.fail(
                            DiagCode::TypeMismatch,
                            span,
                            "range select on a non-array aggregate".to_string(),
                        )
                    }
                };
                match low {
                    Some(low) if (low as usize + len) <= elems.len() => ConstantValue::Elements(
                        elems[low as usize..low as usize + len].to_vec(),
                    ),
                    _ => self.fail(
                        DiagCode::IndexOutOfBounds,
                        span,
                        format!("range select is out of bounds for `{}`", value.ty),
                    ),
                }
            }
            other => self.fail(
                DiagCode::TypeMismatch,
                span,
                format!("cannot range select `{}`", other),
            ),
        }
    }

    /// The offset of the least significant selected element, or `None` if
    /// the bounds are unknown or out of range.
    fn select_low_offset(
        &mut self,
        kind: RangeSelectionKind,
        left: &Expression<'gcx>,
        right: &Expression<'gcx>,
        range: Range,
    ) -> Option<u32> {
        let as_i32 = |this: &mut Self, e: &Expression<'gcx>| -> Option<i32> {
            this.eval_integer(e)?.to_bigint()?.to_i32()
        };
        match kind {
            RangeSelectionKind::Simple => {
                let msb = as_i32(self, left)?;
                let lsb = as_i32(self, right)?;
                let o1 = range.offset(msb)?;
                let o2 = range.offset(lsb)?;
                Some(o1.min(o2))
            }
            RangeSelectionKind::IndexedUp => {
                let base = as_i32(self, left)?;
                let width = as_i32(self, right)? as u32;
                let base_offset = range.offset(base)?;
                if range.is_descending() {
                    range.offset(base + width as i32 - 1)?;
                    Some(base_offset)
                } else {
                    range.offset(base + width as i32 - 1)
                }
            }
            RangeSelectionKind::IndexedDown => {
                let base = as_i32(self, left)?;
                let width = as_i32(self, right)? as u32;
                let base_offset = range.offset(base)?;
                if range.is_descending() {
                    range.offset(base - width as i32 + 1)
                } else {
                    range.offset(base - width as i32 + 1)?;
                    Some(base_offset)
                }
            }
        }
    }

    fn eval_call(
        &mut self,
        subroutine: SymbolId,
        args: &[Expression<'gcx>],
        expr: &Expression<'gcx>,
    ) -> ConstantValue {
        let span = expr.span;
        if self.frames.len() > self.depth_limit {
            return self.fail(
                DiagCode::RecursionLimit,
                span,
                "constant evaluation exceeded the call depth limit".to_string(),
            );
        }
        let sym = self.cx.symbol(subroutine);
        let sub = match &sym.kind {
            SymbolKind::Subroutine(s) => s,
            _ => unreachable!("call target is not a subroutine"),
        };
        if sub.is_task {
            return self.fail(
                DiagCode::NotConstant,
                span,
                format!("task `{}` cannot be evaluated at elaboration time", sym.name),
            );
        }
        let body = subroutine_body(self.cx, subroutine);
        let formals = sub.args.borrow().clone();
        let return_ty = sub.return_ty.get().unwrap_or(&crate::ty::VOID_TYPE);

        // Bind argument values by direction in the caller's frame.
        let mut copy_in: Vec<(SymbolId, ConstantValue)> = Vec::with_capacity(formals.len());
        let mut copy_out: Vec<(SymbolId, LValue)> = vec![];
        for (&formal_id, arg) in formals.iter().zip(args) {
            let formal = match &self.cx.symbol(formal_id).kind {
                SymbolKind::FormalArgument(f) => f,
                _ => unreachable!(),
            };
            match formal.direction {
                Direction::In => {
                    let v = self.eval(arg);
                    if v.bad() {
                        return ConstantValue::Bad;
                    }
                    copy_in.push((formal_id, v));
                }
                Direction::Out => {
                    let lv = match self.eval_lvalue(arg) {
                        Some(lv) => lv,
                        None => return ConstantValue::Bad,
                    };
                    copy_in.push((formal_id, default_value(formal.ty)));
                    copy_out.push((formal_id, lv));
                }
                Direction::InOut | Direction::Ref => {
                    let v = self.eval(arg);
                    if v.bad() {
                        return ConstantValue::Bad;
                    }
                    let lv = match self.eval_lvalue(arg) {
                        Some(lv) => lv,
                        None => return ConstantValue::Bad,
                    };
                    copy_in.push((formal_id, v));
                    copy_out.push((formal_id, lv));
                }
            }
        }

        trace!("calling {} with {} frames live", sym.name, self.frames.len());
        self.frames.push(Frame::new());
        for (id, v) in copy_in {
            self.top_frame().locals.insert(id, v);
        }
        let flow = self.eval_stmt(body);
        let mut frame = self.frames.pop().expect("call frame missing");
        if flow == Flow::Failed {
            return ConstantValue::Bad;
        }
        let result = match frame.return_value.take() {
            Some(v) => v,
            // A function that falls off the end yields its return type's
            // default; a void function yields null.
            None => match return_ty.resolve() {
                TypeKind::Void => ConstantValue::Null,
                _ => default_value(return_ty),
            },
        };
        // Propagate Out/InOut/Ref writes after the frame is gone.
        for (formal_id, lv) in copy_out {
            let v = frame
                .locals
                .get(&formal_id)
                .cloned()
                .unwrap_or(ConstantValue::Bad);
            if !self.store(&lv, v, span) {
                return ConstantValue::Bad;
            }
        }
        result
    }

    fn eval_system_call(
        &mut self,
        function: SystemFunction,
        args: &[Expression<'gcx>],
        span: Span,
    ) -> ConstantValue {
        match function {
            SystemFunction::Bits => {
                ConstantValue::Integer(SvInt::from_u64(32, true, args[0].ty.width() as u64))
            }
            SystemFunction::Clog2 => {
                let v = match self.eval_integer(&args[0]) {
                    Some(v) => v,
                    None => return ConstantValue::Bad,
                };
                let v = match v.to_bigint() {
                    Some(v) => v,
                    None => {
                        return self.fail(
                            DiagCode::ConstantRequired,
                            span,
                            "`$clog2` of a value with unknown bits".to_string(),
                        )
                    }
                };
                let result = if v <= BigInt::one() {
                    0u64
                } else {
                    (v - BigInt::one()).bits()
                };
                ConstantValue::Integer(SvInt::from_u64(32, true, result))
            }
        }
    }

    /// Convert a value to a type, as declared by a conversion node.
    fn convert_value(&mut self, ty: Type<'gcx>, value: ConstantValue, span: Span) -> ConstantValue {
        if let Some(sbv) = ty.simple_bit_vector() {
            let v = match value {
                ConstantValue::Integer(v) => v,
                ConstantValue::Real(v) => {
                    return ConstantValue::Integer(SvInt::from_bigint(
                        sbv.width,
                        sbv.signed,
                        sbv.four_state,
                        &BigInt::from(v.round() as i64),
                    ))
                }
                ConstantValue::ShortReal(v) => {
                    return ConstantValue::Integer(SvInt::from_bigint(
                        sbv.width,
                        sbv.signed,
                        sbv.four_state,
                        &BigInt::from(v.round() as i64),
                    ))
                }
                ConstantValue::Str(s) => ConstantValue::pack_string(&s),
                other => {
                    return self.fail(
                        DiagCode::TypeMismatch,
                        span,
                        format!("cannot convert `{}` to `{}`", other, ty),
                    )
                }
            };
            let v = v.resize(sbv.width).as_signed(sbv.signed).with_domain(sbv.four_state);
            return ConstantValue::Integer(v);
        }
        match ty.resolve() {
            TypeKind::Real(_) | TypeKind::String => (),
            TypeKind::UnpackedArray { elem, .. } => {
                if let ConstantValue::Elements(elems) = value {
                    return ConstantValue::Elements(
                        elems
                            .into_iter()
                            .map(|e| self.convert_value(*elem, e, span))
                            .collect(),
                    );
                }
                return self.fail(
                    DiagCode::TypeMismatch,
                    span,
                    format!("cannot convert to `{}`", ty),
                );
            }
            TypeKind::Struct(s) => {
                if let ConstantValue::Elements(elems) = value {
                    return ConstantValue::Elements(
                        elems
                            .into_iter()
                            .zip(&s.fields)
                            .map(|(e, f)| self.convert_value(f.ty, e, span))
                            .collect(),
                    );
                }
                return self.fail(
                    DiagCode::TypeMismatch,
                    span,
                    format!("cannot convert to `{}`", ty),
                );
            }
            _ => {
                return self.fail(
                    DiagCode::TypeMismatch,
                    span,
                    format!("cannot convert to `{}`", ty),
                )
            }
        }
        match (ty.resolve(), value) {
            (TypeKind::Real(crate::ty::RealKind::ShortReal), ConstantValue::Integer(v)) => {
                ConstantValue::ShortReal(int_to_f64(&v) as f32)
            }
            (TypeKind::Real(_), ConstantValue::Integer(v)) => ConstantValue::Real(int_to_f64(&v)),
            (TypeKind::Real(crate::ty::RealKind::ShortReal), ConstantValue::Real(v)) => {
                ConstantValue::ShortReal(v as f32)
            }
            (TypeKind::Real(_), ConstantValue::Real(v)) => ConstantValue::Real(v),
            (TypeKind::Real(_), ConstantValue::ShortReal(v)) => ConstantValue::Real(v as f64),
            (TypeKind::String, ConstantValue::Integer(v)) => {
                ConstantValue::Str(ConstantValue::unpack_string(&v))
            }
            (TypeKind::String, ConstantValue::Str(s)) => ConstantValue::Str(s),
            (_, other) => self.fail(
                DiagCode::TypeMismatch,
                span,
                format!("cannot convert `{}` to `{}`", other, ty),
            ),
        }
    }

    /// Evaluate an expression as a storage location.
    pub fn eval_lvalue(&mut self, expr: &Expression<'gcx>) -> Option<LValue> {
        let span = expr.span;
        match &expr.kind {
            ExprKind::NamedValue {
                symbol,
                hierarchical,
            } => {
                if *hierarchical {
                    self.note(
                        DiagCode::NotConstant,
                        span,
                        "cannot assign through a hierarchical reference".to_string(),
                    );
                    return None;
                }
                let sym = self.cx.symbol(*symbol);
                match &sym.kind {
                    SymbolKind::Variable(_) | SymbolKind::FormalArgument(_) => Some(LValue {
                        root: *symbol,
                        path: vec![],
                    }),
                    other => {
                        self.note(
                            DiagCode::InvalidLValue,
                            span,
                            format!("{} `{}` is not assignable", other.desc(), sym.name),
                        );
                        None
                    }
                }
            }
            ExprKind::ElementSelect { value, selector } => {
                let mut lv = self.eval_lvalue(value)?;
                let index = self.eval_integer(selector)?;
                let range = select_range(value.ty);
                let offset = index
                    .to_bigint()
                    .and_then(|i| i.to_i32())
                    .and_then(|i| range.offset(i));
                let offset = match offset {
                    Some(o) => o,
                    None => {
                        self.note(
                            DiagCode::IndexOutOfBounds,
                            span,
                            format!("index {} is out of bounds for `{}`", index, value.ty),
                        );
                        return None;
                    }
                };
                if value.ty.is_integral() {
                    let elem_width = expr.ty.width();
                    lv.path.push(Selector::BitRange {
                        offset: offset * elem_width,
                        width: elem_width,
                    });
                } else {
                    lv.path.push(Selector::Element(offset as usize));
                }
                Some(lv)
            }
            ExprKind::RangeSelect {
                value,
                kind,
                left,
                right,
            } => {
                let mut lv = self.eval_lvalue(value)?;
                let range = select_range(value.ty);
                let low = match self.select_low_offset(*kind, left, right, range) {
                    Some(low) => low,
                    None => {
                        self.note(
                            DiagCode::IndexOutOfBounds,
                            span,
                            format!("range select is out of bounds for `{}`", value.ty),
                        );
                        return None;
                    }
                };
                if value.ty.is_integral() {
                    let elem_width = match value.ty.resolve() {
                        TypeKind::PackedArray { elem, .. } => elem.width(),
                        _ => 1,
                    };
                    lv.path.push(Selector::BitRange {
                        offset: low * elem_width,
                        width: expr.ty.width(),
                    });
                } else {
                    let len = expr.ty.array_range().map(|r| r.size()).unwrap_or(0) as usize;
                    lv.path.push(Selector::Slice {
                        offset: low as usize,
                        len,
                    });
                }
                Some(lv)
            }
            ExprKind::MemberAccess { value, index } => {
                let mut lv = self.eval_lvalue(value)?;
                let strukt = value.ty.struct_type().expect("member access on non-struct");
                let field = &strukt.fields[*index];
                if strukt.packed {
                    lv.path.push(Selector::BitRange {
                        offset: field.offset,
                        width: field.ty.width(),
                    });
                } else {
                    lv.path.push(Selector::Element(*index));
                }
                Some(lv)
            }
            _ => {
                self.note(
                    DiagCode::InvalidLValue,
                    span,
                    "expression does not denote a storage location".to_string(),
                );
                None
            }
        }
    }

    /// Read the current value of a storage location.
    pub fn load(&mut self, lv: &LValue, span: Span) -> ConstantValue {
        let root = match self.get_local(lv.root) {
            Some(v) => v.clone(),
            None => {
                let sym = self.cx.symbol(lv.root);
                if self.cx.sess.opts.strict_eval {
                    return self.fail(
                        DiagCode::UninitializedVariable,
                        span,
                        format!("variable `{}` is used before it is assigned", sym.name),
                    );
                }
                default_value(value_type(self.cx, lv.root))
            }
        };
        let mut value = root;
        for selector in &lv.path {
            value = match (selector, value) {
                (Selector::BitRange { offset, width }, ConstantValue::Integer(v)) => {
                    ConstantValue::Integer(v.slice(*offset, *width))
                }
                (Selector::Element(i), ConstantValue::Elements(elems)) => {
                    match elems.into_iter().nth(*i) {
                        Some(v) => v,
                        None => return ConstantValue::Bad,
                    }
                }
                (Selector::Slice { offset, len }, ConstantValue::Elements(elems)) => {
                    if offset + len > elems.len() {
                        return ConstantValue::Bad;
                    }
                    ConstantValue::Elements(elems[*offset..offset + len].to_vec())
                }
                _ => return ConstantValue::Bad,
            };
        }
        value
    }

    /// Write a value to a storage location. Bits outside the written range
    /// keep their previous state, including X and Z.
    pub fn store(&mut self, lv: &LValue, value: ConstantValue, span: Span) -> bool {
        // Locate the frame that declares the root.
        let frame_index = self
            .frames
            .iter()
            .rposition(|f| f.locals.contains_key(&lv.root));
        let frame_index = match frame_index {
            Some(i) => i,
            None => {
                // An undeclared automatic variable springs into existence
                // in the innermost frame with its default value.
                let ty = value_type(self.cx, lv.root);
                let idx = self.frames.len() - 1;
                self.frames[idx]
                    .locals
                    .insert(lv.root, default_value(ty));
                idx
            }
        };
        if frame_index != self.frames.len() - 1 && !self.script_mode {
            let sym = self.cx.symbol(lv.root);
            self.note(
                DiagCode::NotConstant,
                span,
                format!(
                    "cannot modify `{}` declared in an enclosing frame",
                    sym.name
                ),
            );
            return false;
        }
        let slot = self.frames[frame_index]
            .locals
            .get_mut(&lv.root)
            .expect("frame lost its local");
        let mut target = std::mem::replace(slot, ConstantValue::Bad);
        let ok = apply_store(&mut target, &lv.path, value);
        *self.frames[frame_index]
            .locals
            .get_mut(&lv.root)
            .expect("frame lost its local") = target;
        if !ok {
            self.note(
                DiagCode::InvalidLValue,
                span,
                "write does not match the shape of the target".to_string(),
            );
        }
        ok
    }

    /// Execute a statement.
    pub fn eval_stmt(&mut self, stmt: &Statement<'gcx>) -> Flow {
        if self.cx.is_cancelled() {
            self.note(
                DiagCode::EvalCancelled,
                stmt.span,
                "constant evaluation was cancelled".to_string(),
            );
            return Flow::Failed;
        }
        match &stmt.kind {
            StmtKind::Invalid => Flow::Failed,
            StmtKind::Expr(expr) => {
                if !self.take_step(stmt.span) {
                    return Flow::Failed;
                }
                if self.eval(expr).bad() {
                    Flow::Failed
                } else {
                    Flow::Normal
                }
            }
            StmtKind::Conditional {
                cond,
                if_true,
                if_false,
            } => {
                if !self.take_step(stmt.span) {
                    return Flow::Failed;
                }
                let c = self.eval(cond);
                if c.bad() {
                    return Flow::Failed;
                }
                match self.predicate(&c, cond.span) {
                    Some(true) => self.eval_stmt(if_true),
                    Some(false) => match if_false {
                        Some(f) => self.eval_stmt(f),
                        None => Flow::Normal,
                    },
                    None => Flow::Failed,
                }
            }
            StmtKind::Return(value) => {
                if !self.take_step(stmt.span) {
                    return Flow::Failed;
                }
                let v = match value {
                    Some(value) => {
                        let v = self.eval(value);
                        if v.bad() {
                            return Flow::Failed;
                        }
                        v
                    }
                    None => ConstantValue::Null,
                };
                self.top_frame().return_value = Some(v);
                Flow::Returned
            }
            StmtKind::Block { body, .. } | StmtKind::List(body) => {
                for stmt in body {
                    match self.eval_stmt(stmt) {
                        Flow::Normal => (),
                        other => return other,
                    }
                }
                Flow::Normal
            }
            StmtKind::VarDecl(id) => {
                let value = match variable_initializer(self.cx, *id) {
                    Some(init) => {
                        let v = self.eval(init);
                        if v.bad() {
                            return Flow::Failed;
                        }
                        v
                    }
                    None => default_value(variable_type(self.cx, *id)),
                };
                self.top_frame().locals.insert(*id, value);
                Flow::Normal
            }
            StmtKind::ForLoop {
                init,
                stop,
                steps,
                body,
                ..
            } => {
                for stmt in init {
                    match self.eval_stmt(stmt) {
                        Flow::Normal => (),
                        other => return other,
                    }
                }
                loop {
                    // Every iteration costs a step, so runaway loops trip
                    // the budget.
                    if !self.take_step(stmt.span) {
                        return Flow::Failed;
                    }
                    if let Some(stop) = stop {
                        let c = self.eval(stop);
                        if c.bad() {
                            return Flow::Failed;
                        }
                        match self.predicate(&c, stop.span) {
                            Some(true) => (),
                            Some(false) => break,
                            None => return Flow::Failed,
                        }
                    }
                    match self.eval_stmt(body) {
                        Flow::Normal => (),
                        other => return other,
                    }
                    for step in steps {
                        if self.eval(step).bad() {
                            return Flow::Failed;
                        }
                    }
                }
                Flow::Normal
            }
        }
    }

    /// Decide a predicate value. Unknown predicates count as false, except
    /// in strict mode where they are an error.
    fn predicate(&mut self, value: &ConstantValue, span: Span) -> Option<bool> {
        match truthy(value) {
            Some(b) => Some(b),
            None => {
                if self.cx.sess.opts.strict_eval {
                    self.note(
                        DiagCode::ConstantRequired,
                        span,
                        "predicate evaluates to an unknown value".to_string(),
                    );
                    None
                } else {
                    Some(false)
                }
            }
        }
    }
}

/// The truth value of a constant, if its known bits decide it.
fn truthy(value: &ConstantValue) -> Option<bool> {
    match value {
        ConstantValue::Integer(v) => v.to_bool(),
        ConstantValue::Real(v) => Some(*v != 0.0),
        ConstantValue::ShortReal(v) => Some(*v != 0.0),
        ConstantValue::Str(s) => Some(!s.is_empty()),
        _ => Some(false),
    }
}

fn int_to_f64(v: &SvInt) -> f64 {
    v.to_bigint()
        .as_ref()
        .and_then(BigInt::to_f64)
        .unwrap_or(0.0)
}

fn shift_amount(v: &SvInt) -> Option<u32> {
    if v.has_unknown() {
        return None;
    }
    let signed = v.to_bigint()?;
    if signed.is_negative() {
        // A negative shift amount shifts by a huge unsigned count, which
        // clears every bit.
        return Some(u32::max_value());
    }
    Some(signed.to_u32().unwrap_or(u32::max_value()))
}

/// The implicit `[w-1:0]` range of a select target.
fn select_range(ty: Type) -> Range {
    match ty.array_range() {
        Some(r) => r,
        None => Range::with_size(ty.simple_bit_vector().map(|s| s.width).unwrap_or(1)),
    }
}

fn apply_store(target: &mut ConstantValue, path: &[Selector], value: ConstantValue) -> bool {
    let (first, rest) = match path.split_first() {
        Some(x) => x,
        None => {
            *target = value;
            return true;
        }
    };
    match (first, &mut *target) {
        (Selector::BitRange { offset, width }, ConstantValue::Integer(v)) => {
            if offset + width > v.width() {
                return false;
            }
            let mut sub = ConstantValue::Integer(v.slice(*offset, *width));
            if !apply_store(&mut sub, rest, value) {
                return false;
            }
            match sub {
                ConstantValue::Integer(sub) => {
                    *v = v.set_slice(*offset, &sub);
                    true
                }
                _ => false,
            }
        }
        (Selector::Element(i), ConstantValue::Elements(elems)) => match elems.get_mut(*i) {
            Some(slot) => apply_store(slot, rest, value),
            None => false,
        },
        (Selector::Slice { offset, len }, ConstantValue::Elements(elems)) => {
            if offset + len > elems.len() {
                return false;
            }
            match value {
                ConstantValue::Elements(new) if new.len() == *len && rest.is_empty() => {
                    elems.splice(*offset..*offset + *len, new);
                    true
                }
                _ => false,
            }
        }
        _ => false,
    }
}

/// The default value of a type: zero for integrals, empty string, zero
/// reals, aggregates element-wise.
pub fn default_value(ty: Type) -> ConstantValue {
    match ty.resolve() {
        TypeKind::Error | TypeKind::Void => ConstantValue::Bad,
        TypeKind::Null => ConstantValue::Null,
        TypeKind::String => ConstantValue::Str(String::new()),
        TypeKind::Real(crate::ty::RealKind::ShortReal) => ConstantValue::ShortReal(0.0),
        TypeKind::Real(_) => ConstantValue::Real(0.0),
        TypeKind::UnpackedArray { elem, range } => ConstantValue::Elements(
            std::iter::repeat_with(|| default_value(elem))
                .take(range.size() as usize)
                .collect::<Vec<_>>(),
        ),
        TypeKind::Struct(s) if !s.packed => {
            ConstantValue::Elements(s.fields.iter().map(|f| default_value(f.ty)).collect())
        }
        other => match other.simple_bit_vector() {
            Some(sbv) => {
                ConstantValue::Integer(SvInt::zero(sbv.width, sbv.signed, sbv.four_state))
            }
            None => ConstantValue::Bad,
        },
    }
}

/// The cached compile-time value of a parameter, computing it on first use.
/// Parameter evaluation is a constant-required context: diagnostics flush
/// to the global sink.
pub fn parameter_value<'gcx>(cx: &Compilation<'gcx>, id: SymbolId) -> ConstantValue {
    let sym = cx.symbol(id);
    let param = match &sym.kind {
        SymbolKind::Parameter(p) => p,
        _ => panic!("symbol is not a parameter"),
    };
    if let Some(v) = &*param.value.borrow() {
        return v.clone();
    }
    if param.evaluating.get() {
        cx.emit(
            Diag::error(
                DiagCode::ConstantRequired,
                format!("the value of parameter `{}` depends on itself", sym.name),
            )
            .span(sym.span),
        );
        return ConstantValue::Bad;
    }
    // Resolve the type before taking the cycle guard; the type computation
    // manages its own recursion through the same flag.
    let ty = parameter_type(cx, id);
    if ty.is_error() {
        *param.value.borrow_mut() = Some(ConstantValue::Bad);
        return ConstantValue::Bad;
    }
    param.evaluating.set(true);
    let value = compute_parameter_value(cx, id, ty);
    param.evaluating.set(false);
    *param.value.borrow_mut() = Some(value.clone());
    value
}

fn compute_parameter_value<'gcx>(
    cx: &Compilation<'gcx>,
    id: SymbolId,
    ty: crate::ty::Type<'gcx>,
) -> ConstantValue {
    let sym = cx.symbol(id);
    let param = match &sym.kind {
        SymbolKind::Parameter(p) => p,
        _ => unreachable!(),
    };
    let init = match param.init_syntax {
        Some(init) => init,
        None => {
            cx.emit(
                Diag::error(
                    DiagCode::ConstantRequired,
                    format!("parameter `{}` is not assigned and has no default", sym.name),
                )
                .span(sym.span),
            );
            return ConstantValue::Bad;
        }
    };
    let scope = sym.parent.expect("parameter without a scope");
    let binder = Binder::new(cx, scope).with_flags(BindFlags::CONSTANT_REQUIRED);
    let expr = binder.bind_assignment_like(ty, init, Location::new(sym.span.begin));
    let mut ctx = EvalContext::new(cx);
    let value = ctx.eval(expr);
    ctx.report(cx);
    value
}

/// The value of an enum variant, read off the resolved enum type.
pub fn enum_member_value<'gcx>(cx: &Compilation<'gcx>, id: SymbolId) -> ConstantValue {
    let sym = cx.symbol(id);
    let member = match &sym.kind {
        SymbolKind::EnumMember(m) => m,
        _ => panic!("symbol is not an enum member"),
    };
    let ty = binder::resolve_alias_type(cx, member.alias);
    match ty.enum_type() {
        Some(e) => ConstantValue::Integer(e.variants[member.index].1.clone()),
        None => ConstantValue::Bad,
    }
}
