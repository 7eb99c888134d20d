// Copyright (c) 2024-2026 The mealy developers

//! Construction of typed expression and statement trees from syntax.
//!
//! Binding runs in two passes. Expressions are first built bottom-up in
//! self-determined mode, every node acquiring a provisional type from its
//! operands alone. Context-determined operands are then widened to the type
//! of the enclosing expression by [`Binder::context_determined`], which
//! either propagates the new type into the subtree or inserts a conversion
//! at the boundary where a subexpression is self-determined (shift amounts,
//! comparison operands, concatenation elements).
//!
//! A failed subtree binds to an [`ExprKind::Invalid`] node with the error
//! type. Operators short-circuit on invalid operands and produce no further
//! diagnostics.

use crate::builtins::SystemFunction;
use crate::context::Compilation;
use crate::eval::EvalContext;
use crate::expr::{ExprKind, Expression};
use crate::op::{BinaryOp, RangeSelectionKind, UnaryOp};
use crate::stmt::{Statement, StmtKind};
use crate::svint::SvInt;
use crate::symbols::{
    self, FieldSymbol, FormalArgSymbol, LookupKind, ScopeId, SymbolId, SymbolKind, VariableSymbol,
};
use crate::syntax::{
    BlockItemSyntax, Direction, ExprSyntax, ExprSyntaxKind, Lifetime, PredefinedType, StmtSyntax,
    StmtSyntaxKind, TypeSyntax, TypeSyntaxKind,
};
use crate::ty::{
    ConversionKind, EnumType, IntegralType, Range, StructField, StructType, Type, TypeKind,
    ERROR_TYPE, INT_TYPE, LOGIC_TYPE, NULL_TYPE, REAL_TYPE, STRING_TYPE, VOID_TYPE,
};
use mealy_common::errors::{Diag, DiagCode, DiagEmitter};
use mealy_common::source::{Location, Span, Spanned};
use mealy_common::name::Name;

bitflags! {
    /// Flags that modify how a binder resolves and checks.
    pub struct BindFlags: u8 {
        /// The bound expression must be constant evaluable; evaluation
        /// failures are promoted to binding errors.
        const CONSTANT_REQUIRED = 0b01;
        /// Lookups are procedural: names must be declared at or before the
        /// location they are used.
        const PROCEDURAL = 0b10;
    }
}

/// Binds syntax into typed trees within a particular scope.
pub struct Binder<'cx, 'gcx> {
    cx: &'cx Compilation<'gcx>,
    scope: ScopeId,
    flags: BindFlags,
}

impl<'cx, 'gcx> Binder<'cx, 'gcx> {
    /// Create a binder resolving names in the given scope.
    pub fn new(cx: &'cx Compilation<'gcx>, scope: ScopeId) -> Binder<'cx, 'gcx> {
        Binder {
            cx,
            scope,
            flags: BindFlags::empty(),
        }
    }

    /// Add flags to the binder.
    pub fn with_flags(mut self, flags: BindFlags) -> Self {
        self.flags |= flags;
        self
    }

    fn in_scope(&self, scope: ScopeId) -> Binder<'cx, 'gcx> {
        Binder {
            cx: self.cx,
            scope,
            flags: self.flags,
        }
    }

    fn lookup_kind(&self, span: Span) -> LookupKind {
        if self.flags.contains(BindFlags::PROCEDURAL) {
            LookupKind::Procedural(Location::new(span.begin))
        } else {
            LookupKind::Definition
        }
    }

    /// Bind an expression whose type is determined solely by its operands.
    pub fn bind_self_determined(&self, syntax: &ExprSyntax) -> &'gcx Expression<'gcx> {
        let expr = self.create(syntax);
        self.cx.alloc_expr(expr)
    }

    /// Bind an expression typed and width-adjusted to an assignment target.
    pub fn bind_assignment_like(
        &self,
        lhs: Type<'gcx>,
        rhs: &ExprSyntax,
        location: Location,
    ) -> &'gcx Expression<'gcx> {
        let expr = self.create(rhs);
        let expr = self.convert_assignment(lhs, expr, location);
        self.cx.alloc_expr(expr)
    }

    fn invalid(&self, child: Option<Expression<'gcx>>, span: Span) -> Expression<'gcx> {
        Expression::new(ExprKind::Invalid(child.map(Box::new)), &ERROR_TYPE, span)
    }

    /// Build an expression bottom-up with a provisional, self-determined
    /// type.
    fn create(&self, syntax: &ExprSyntax) -> Expression<'gcx> {
        let span = syntax.span;
        match &syntax.kind {
            ExprSyntaxKind::IntegerLiteral {
                width,
                signed,
                base,
                digits,
            } => {
                let width = width.unwrap_or(32);
                match SvInt::from_literal(width, *signed, *base, digits) {
                    Some(value) => {
                        let ty = self.cx.intern_type(TypeKind::Integral(IntegralType {
                            width,
                            signed: *signed,
                            four_state: value.is_four_state(),
                        }));
                        Expression::new(ExprKind::IntegerLiteral(value), ty, span)
                    }
                    None => {
                        self.cx.emit(
                            Diag::error(
                                DiagCode::UnsupportedConstruct,
                                format!("`{}` is not a valid literal", digits),
                            )
                            .span(span),
                        );
                        self.invalid(None, span)
                    }
                }
            }
            ExprSyntaxKind::UnbasedUnsizedLiteral(c) => {
                let bit = match c {
                    '0' => crate::svint::Logic::Zero,
                    '1' => crate::svint::Logic::One,
                    'x' | 'X' => crate::svint::Logic::X,
                    _ => crate::svint::Logic::Z,
                };
                Expression::new(ExprKind::UnbasedUnsizedLiteral(bit), &LOGIC_TYPE, span)
            }
            ExprSyntaxKind::RealLiteral(v) => {
                Expression::new(ExprKind::RealLiteral(*v), &REAL_TYPE, span)
            }
            ExprSyntaxKind::StringLiteral(s) => {
                Expression::new(ExprKind::StringLiteral(s.clone()), &STRING_TYPE, span)
            }
            ExprSyntaxKind::NullLiteral => Expression::new(ExprKind::NullLiteral, &NULL_TYPE, span),
            ExprSyntaxKind::UnboundedLiteral => {
                Expression::new(ExprKind::UnboundedLiteral, &INT_TYPE, span)
            }
            ExprSyntaxKind::Ident(name) => self.bind_name(&[Spanned::new(*name, span)], span),
            ExprSyntaxKind::ScopedName(segments) => self.bind_name(segments, span),
            ExprSyntaxKind::Unary { op, operand } => self.bind_unary(*op, operand, span),
            ExprSyntaxKind::Binary { op, lhs, rhs } => self.bind_binary(*op, lhs, rhs, span),
            ExprSyntaxKind::Conditional {
                cond,
                if_true,
                if_false,
            } => self.bind_conditional(cond, if_true, if_false, span),
            ExprSyntaxKind::Assignment { lhs, rhs } => {
                let lhs = self.create(lhs);
                if lhs.bad() {
                    return self.invalid(Some(lhs), span);
                }
                if !lhs.is_lvalue() {
                    self.cx.emit(
                        Diag::error(
                            DiagCode::InvalidLValue,
                            "left-hand side of assignment does not denote a storage location",
                        )
                        .span(lhs.span),
                    );
                    return self.invalid(Some(lhs), span);
                }
                let rhs = self.create(rhs);
                let rhs = self.convert_assignment(lhs.ty, rhs, Location::new(span.begin));
                let ty = lhs.ty;
                Expression::new(
                    ExprKind::Assignment {
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    },
                    ty,
                    span,
                )
            }
            ExprSyntaxKind::Concatenation(parts) => self.bind_concat(parts, span),
            ExprSyntaxKind::Replication { count, operand } => {
                self.bind_replication(count, operand, span)
            }
            ExprSyntaxKind::ElementSelect { value, selector } => {
                self.bind_element_select(value, selector, span)
            }
            ExprSyntaxKind::RangeSelect {
                value,
                kind,
                left,
                right,
            } => self.bind_range_select(value, *kind, left, right, span),
            ExprSyntaxKind::MemberAccess { value, member } => {
                self.bind_member_access(value, *member, span)
            }
            ExprSyntaxKind::Invocation { target, args } => self.bind_call(target, args, span),
            ExprSyntaxKind::SystemInvocation { name, args } => {
                self.bind_system_call(*name, args, span)
            }
            ExprSyntaxKind::Cast { ty, operand } => {
                let target = self.bind_type(ty);
                let operand = self.create(operand);
                if operand.bad() || target.is_error() {
                    return self.invalid(Some(operand), span);
                }
                match target.assignable(operand.ty) {
                    ConversionKind::Implicit | ConversionKind::Explicit => Expression::new(
                        ExprKind::Conversion {
                            operand: Box::new(operand),
                            implicit: false,
                        },
                        target,
                        span,
                    ),
                    ConversionKind::None => {
                        self.cx.emit(
                            Diag::error(
                                DiagCode::TypeMismatch,
                                format!("cannot cast `{}` to `{}`", operand.ty, target),
                            )
                            .span(span),
                        );
                        self.invalid(Some(operand), span)
                    }
                }
            }
            ExprSyntaxKind::Inside { value, set } => {
                let value = self.create(value);
                let mut members = Vec::with_capacity(set.len());
                let mut bad = value.bad();
                for member in set {
                    let member = self.create(member);
                    bad |= member.bad();
                    members.push(member);
                }
                if bad {
                    return self.invalid(Some(value), span);
                }
                let four_state = value.ty.is_four_state()
                    || members.iter().any(|m| m.ty.is_four_state());
                let ty = self.bit_result(four_state);
                Expression::new(
                    ExprKind::Inside {
                        value: Box::new(value),
                        set: members,
                    },
                    ty,
                    span,
                )
            }
        }
    }

    fn bit_result(&self, four_state: bool) -> Type<'gcx> {
        self.cx.intern_type(TypeKind::Integral(IntegralType {
            width: 1,
            signed: false,
            four_state,
        }))
    }

    fn bind_name(&self, segments: &[Spanned<Name>], span: Span) -> Expression<'gcx> {
        let kind = self.lookup_kind(span);
        let (symbol, hierarchical) =
            match symbols::lookup_qualified(self.cx, segments, self.scope, kind) {
                Ok(x) => x,
                Err(symbols::LookupError::NotFound(name)) => {
                    self.cx.emit(
                        Diag::error(
                            DiagCode::UndeclaredIdentifier,
                            format!("`{}` is not declared", name.value),
                        )
                        .span(name.span),
                    );
                    return self.invalid(None, span);
                }
                Err(symbols::LookupError::NotAScope(name)) => {
                    self.cx.emit(
                        Diag::error(
                            DiagCode::UndeclaredIdentifier,
                            format!("`{}` does not name a scope", name.value),
                        )
                        .span(name.span),
                    );
                    return self.invalid(None, span);
                }
            };
        let ty = value_type(self.cx, symbol);
        if ty.is_error() {
            let sym = self.cx.symbol(symbol);
            self.cx.emit(
                Diag::error(
                    DiagCode::TypeMismatch,
                    format!("{} `{}` cannot be used as a value", sym.kind.desc(), sym.name),
                )
                .span(span),
            );
            return self.invalid(None, span);
        }
        Expression::new(
            ExprKind::NamedValue {
                symbol,
                hierarchical,
            },
            ty,
            span,
        )
    }

    fn require_integral(&self, expr: &Expression<'gcx>, what: &str) -> bool {
        if expr.ty.is_integral() {
            return true;
        }
        self.cx.emit(
            Diag::error(
                DiagCode::TypeMismatch,
                format!("{} must be integral, not `{}`", what, expr.ty),
            )
            .span(expr.span),
        );
        false
    }

    fn bind_unary(&self, op: UnaryOp, operand: &ExprSyntax, span: Span) -> Expression<'gcx> {
        let mut operand = self.create(operand);
        if operand.bad() {
            return self.invalid(Some(operand), span);
        }
        let ty = if op.is_reduction() || op == UnaryOp::LogicalNot {
            if !self.require_integral(&operand, "the operand") {
                return self.invalid(Some(operand), span);
            }
            self.bit_result(operand.ty.is_four_state())
        } else if op.is_increment() {
            if !operand.is_lvalue() {
                self.cx.emit(
                    Diag::error(
                        DiagCode::InvalidLValue,
                        format!("the operand of {} must be an lvalue", op),
                    )
                    .span(operand.span),
                );
                return self.invalid(Some(operand), span);
            }
            operand.ty
        } else {
            // Plus, minus, bitwise not operate on integrals and reals.
            if !operand.ty.is_integral() && !operand.ty.is_real() {
                self.require_integral(&operand, "the operand");
                return self.invalid(Some(operand), span);
            }
            if op == UnaryOp::BitwiseNot && operand.ty.is_real() {
                self.require_integral(&operand, "the operand");
                return self.invalid(Some(operand), span);
            }
            operand.ty
        };
        // Reduction and logical-not operands are self-determined; the rest
        // propagate the parent's context.
        if op.is_reduction() || op == UnaryOp::LogicalNot {
            self.self_determined(&mut operand);
        }
        Expression::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            ty,
            span,
        )
    }

    /// The common type of a binary operation: maximum width, signed iff
    /// both operands are signed, four-state if either side is or the caller
    /// forces it.
    fn binary_operator_type(
        &self,
        lt: Type<'gcx>,
        rt: Type<'gcx>,
        force_four_state: bool,
    ) -> Type<'gcx> {
        if lt.is_real() || rt.is_real() {
            return &REAL_TYPE;
        }
        let l = match lt.simple_bit_vector() {
            Some(x) => x,
            None => return &ERROR_TYPE,
        };
        let r = match rt.simple_bit_vector() {
            Some(x) => x,
            None => return &ERROR_TYPE,
        };
        self.cx.intern_type(TypeKind::Integral(IntegralType {
            width: l.width.max(r.width),
            signed: l.signed && r.signed,
            four_state: l.four_state || r.four_state || force_four_state,
        }))
    }

    fn bind_binary(
        &self,
        op: BinaryOp,
        lhs: &ExprSyntax,
        rhs: &ExprSyntax,
        span: Span,
    ) -> Expression<'gcx> {
        let mut lhs = self.create(lhs);
        let mut rhs = self.create(rhs);
        if lhs.bad() || rhs.bad() {
            return self.invalid(Some(lhs), span);
        }
        let ty = if op == BinaryOp::Power && (lhs.ty.is_real() || rhs.ty.is_real()) {
            // Power over reals shares the real result type.
            self.context_determined(&mut lhs, &REAL_TYPE);
            self.context_determined(&mut rhs, &REAL_TYPE);
            if lhs.bad() || rhs.bad() {
                return self.invalid(Some(lhs), span);
            }
            &REAL_TYPE
        } else if op.is_shift() || op == BinaryOp::Power {
            // The result takes the left operand's type; the right operand
            // is self-determined.
            if !self.require_integral(&lhs, "the left operand")
                || !self.require_integral(&rhs, "the right operand")
            {
                return self.invalid(Some(lhs), span);
            }
            self.self_determined(&mut rhs);
            lhs.ty
        } else if op.is_comparison() {
            // Operands share a common comparison type; the result is a
            // single bit.
            let both_strings = lhs.ty.is_string() && rhs.ty.is_string();
            if !both_strings {
                if !lhs.ty.is_integral() && !lhs.ty.is_real() {
                    self.require_integral(&lhs, "the left operand");
                    return self.invalid(Some(lhs), span);
                }
                if !rhs.ty.is_integral() && !rhs.ty.is_real() {
                    self.require_integral(&rhs, "the right operand");
                    return self.invalid(Some(rhs), span);
                }
                let common = self.binary_operator_type(lhs.ty, rhs.ty, false);
                self.context_determined(&mut lhs, common);
                self.context_determined(&mut rhs, common);
            }
            let four_state = lhs.ty.is_four_state() || rhs.ty.is_four_state();
            self.bit_result(four_state)
        } else if op.is_logical() {
            // Operands are self-determined predicates.
            self.self_determined(&mut lhs);
            self.self_determined(&mut rhs);
            let four_state = lhs.ty.is_four_state() || rhs.ty.is_four_state();
            self.bit_result(four_state)
        } else {
            if !lhs.ty.is_integral() && !lhs.ty.is_real() {
                self.require_integral(&lhs, "the left operand");
                return self.invalid(Some(lhs), span);
            }
            if !rhs.ty.is_integral() && !rhs.ty.is_real() {
                self.require_integral(&rhs, "the right operand");
                return self.invalid(Some(rhs), span);
            }
            let common = self.binary_operator_type(lhs.ty, rhs.ty, false);
            if common.is_real()
                && matches!(
                    op,
                    BinaryOp::Mod
                        | BinaryOp::BinaryAnd
                        | BinaryOp::BinaryOr
                        | BinaryOp::BinaryXor
                        | BinaryOp::BinaryXnor
                )
            {
                self.cx.emit(
                    Diag::error(
                        DiagCode::TypeMismatch,
                        format!("{} cannot be applied to real operands", op),
                    )
                    .span(span),
                );
                return self.invalid(Some(lhs), span);
            }
            self.context_determined(&mut lhs, common);
            self.context_determined(&mut rhs, common);
            common
        };
        Expression::new(
            ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            ty,
            span,
        )
    }

    fn bind_conditional(
        &self,
        cond: &ExprSyntax,
        if_true: &ExprSyntax,
        if_false: &ExprSyntax,
        span: Span,
    ) -> Expression<'gcx> {
        let mut cond = self.create(cond);
        let mut if_true = self.create(if_true);
        let mut if_false = self.create(if_false);
        if cond.bad() || if_true.bad() || if_false.bad() {
            return self.invalid(Some(cond), span);
        }
        self.self_determined(&mut cond);
        let ty = if if_true.ty.equivalent(if_false.ty) {
            if_true.ty
        } else if (if_true.ty.is_integral() || if_true.ty.is_real())
            && (if_false.ty.is_integral() || if_false.ty.is_real())
        {
            let common = self.binary_operator_type(if_true.ty, if_false.ty, false);
            self.context_determined(&mut if_true, common);
            self.context_determined(&mut if_false, common);
            common
        } else {
            self.cx.emit(
                Diag::error(
                    DiagCode::TypeMismatch,
                    format!(
                        "the arms of `?:` have incompatible types `{}` and `{}`",
                        if_true.ty, if_false.ty
                    ),
                )
                .span(span),
            );
            return self.invalid(Some(cond), span);
        };
        Expression::new(
            ExprKind::Conditional {
                cond: Box::new(cond),
                if_true: Box::new(if_true),
                if_false: Box::new(if_false),
            },
            ty,
            span,
        )
    }

    fn bind_concat(&self, parts: &[ExprSyntax], span: Span) -> Expression<'gcx> {
        let mut bound = Vec::with_capacity(parts.len());
        let mut width = 0u32;
        let mut four_state = false;
        let mut bad = false;
        let mut all_strings = !parts.is_empty();
        for part in parts {
            let mut part = self.create(part);
            // Concatenation operands are self-determined.
            self.self_determined(&mut part);
            bad |= part.bad();
            all_strings &= part.ty.is_string();
            if !bad && !part.ty.is_string() {
                match part.ty.simple_bit_vector() {
                    Some(sbv) => {
                        width += sbv.width;
                        four_state |= sbv.four_state;
                    }
                    None => {
                        self.require_integral(&part, "a concatenation operand");
                        bad = true;
                    }
                }
            }
            bound.push(part);
        }
        if bad {
            return self.invalid(bound.into_iter().next(), span);
        }
        let ty = if all_strings {
            &STRING_TYPE
        } else {
            self.cx.intern_type(TypeKind::Integral(IntegralType {
                width,
                signed: false,
                four_state,
            }))
        };
        Expression::new(ExprKind::Concat(bound), ty, span)
    }

    fn bind_replication(
        &self,
        count: &ExprSyntax,
        operand: &ExprSyntax,
        span: Span,
    ) -> Expression<'gcx> {
        let count_expr = self.create(count);
        let count = match self.fold_positive(&count_expr, "replication count") {
            Some(n) => n,
            None => return self.invalid(Some(count_expr), span),
        };
        let mut operand = self.create(operand);
        self.self_determined(&mut operand);
        if operand.bad() {
            return self.invalid(Some(operand), span);
        }
        let sbv = match operand.ty.simple_bit_vector() {
            Some(x) => x,
            None => {
                self.require_integral(&operand, "the replication operand");
                return self.invalid(Some(operand), span);
            }
        };
        let ty = self.cx.intern_type(TypeKind::Integral(IntegralType {
            width: sbv.width * count,
            signed: false,
            four_state: sbv.four_state,
        }));
        Expression::new(
            ExprKind::Replication {
                count,
                operand: Box::new(operand),
            },
            ty,
            span,
        )
    }

    fn bind_element_select(
        &self,
        value: &ExprSyntax,
        selector: &ExprSyntax,
        span: Span,
    ) -> Expression<'gcx> {
        let value = self.create(value);
        let mut selector = self.create(selector);
        self.self_determined(&mut selector);
        if value.bad() || selector.bad() {
            return self.invalid(Some(value), span);
        }
        if !self.require_integral(&selector, "the index") {
            return self.invalid(Some(value), span);
        }
        let ty = match value.ty.resolve() {
            TypeKind::PackedArray { elem, .. } | TypeKind::UnpackedArray { elem, .. } => *elem,
            other if other.is_integral() => self.bit_result(other.is_four_state()),
            other => {
                self.cx.emit(
                    Diag::error(
                        DiagCode::InvalidSelect,
                        format!("`{}` cannot be indexed", other),
                    )
                    .span(span),
                );
                return self.invalid(Some(value), span);
            }
        };
        Expression::new(
            ExprKind::ElementSelect {
                value: Box::new(value),
                selector: Box::new(selector),
            },
            ty,
            span,
        )
    }

    fn bind_range_select(
        &self,
        value: &ExprSyntax,
        kind: RangeSelectionKind,
        left: &ExprSyntax,
        right: &ExprSyntax,
        span: Span,
    ) -> Expression<'gcx> {
        let value = self.create(value);
        let mut left = self.create(left);
        let mut right = self.create(right);
        self.self_determined(&mut left);
        self.self_determined(&mut right);
        if value.bad() || left.bad() || right.bad() {
            return self.invalid(Some(value), span);
        }
        let width = match kind {
            RangeSelectionKind::Simple => {
                // Both bounds must be constant.
                let msb = self.fold_i32(&left, "the range bound");
                let lsb = self.fold_i32(&right, "the range bound");
                match (msb, lsb) {
                    (Some(msb), Some(lsb)) => (msb - lsb).abs() as u32 + 1,
                    _ => return self.invalid(Some(value), span),
                }
            }
            RangeSelectionKind::IndexedUp | RangeSelectionKind::IndexedDown => {
                // The width must be a constant positive; the base may be a
                // runtime value.
                match self.fold_positive(&right, "the select width") {
                    Some(n) => n,
                    None => return self.invalid(Some(value), span),
                }
            }
        };
        let ty = match value.ty.resolve() {
            TypeKind::UnpackedArray { elem, .. } => self.cx.intern_type(TypeKind::UnpackedArray {
                elem: *elem,
                range: Range::with_size(width),
            }),
            other => match other.simple_bit_vector() {
                Some(sbv) => self.cx.intern_type(TypeKind::Integral(IntegralType {
                    width,
                    signed: false,
                    four_state: sbv.four_state,
                })),
                None => {
                    self.cx.emit(
                        Diag::error(
                            DiagCode::InvalidSelect,
                            format!("`{}` cannot be range selected", other),
                        )
                        .span(span),
                    );
                    return self.invalid(Some(value), span);
                }
            },
        };
        Expression::new(
            ExprKind::RangeSelect {
                value: Box::new(value),
                kind,
                left: Box::new(left),
                right: Box::new(right),
            },
            ty,
            span,
        )
    }

    fn bind_member_access(
        &self,
        value: &ExprSyntax,
        member: Spanned<Name>,
        span: Span,
    ) -> Expression<'gcx> {
        let value = self.create(value);
        if value.bad() {
            return self.invalid(Some(value), span);
        }
        let strukt = match value.ty.struct_type() {
            Some(s) => s,
            None => {
                self.cx.emit(
                    Diag::error(
                        DiagCode::TypeMismatch,
                        format!("`{}` is not a struct", value.ty),
                    )
                    .span(value.span),
                );
                return self.invalid(Some(value), span);
            }
        };
        let index = match strukt.fields.iter().position(|f| f.name == member.value) {
            Some(i) => i,
            None => {
                self.cx.emit(
                    Diag::error(
                        DiagCode::UndeclaredIdentifier,
                        format!("`{}` has no field `{}`", value.ty, member.value),
                    )
                    .span(member.span),
                );
                return self.invalid(Some(value), span);
            }
        };
        let ty = strukt.fields[index].ty;
        Expression::new(
            ExprKind::MemberAccess {
                value: Box::new(value),
                index,
            },
            ty,
            span,
        )
    }

    fn bind_call(
        &self,
        target: &ExprSyntax,
        args: &[ExprSyntax],
        span: Span,
    ) -> Expression<'gcx> {
        let segments: Vec<Spanned<Name>> = match &target.kind {
            ExprSyntaxKind::Ident(name) => vec![Spanned::new(*name, target.span)],
            ExprSyntaxKind::ScopedName(segments) => segments.clone(),
            _ => {
                self.cx.emit(
                    Diag::error(DiagCode::AmbiguousCall, "call target must be a name")
                        .span(target.span),
                );
                return self.invalid(None, span);
            }
        };
        let kind = self.lookup_kind(span);
        let subroutine = match symbols::lookup_qualified(self.cx, &segments, self.scope, kind) {
            Ok((id, _)) => id,
            Err(symbols::LookupError::NotFound(name))
            | Err(symbols::LookupError::NotAScope(name)) => {
                self.cx.emit(
                    Diag::error(
                        DiagCode::UndeclaredIdentifier,
                        format!("`{}` is not declared", name.value),
                    )
                    .span(name.span),
                );
                return self.invalid(None, span);
            }
        };
        let sub = match &self.cx.symbol(subroutine).kind {
            SymbolKind::Subroutine(sub) => sub,
            other => {
                self.cx.emit(
                    Diag::error(
                        DiagCode::AmbiguousCall,
                        format!("{} `{}` is not callable", other.desc(), segments.last().unwrap().value),
                    )
                    .span(span),
                );
                return self.invalid(None, span);
            }
        };
        ensure_subroutine_init(self.cx, subroutine);
        let formals = sub.args.borrow().clone();
        if args.len() > formals.len() {
            self.cx.emit(
                Diag::error(
                    DiagCode::WrongArgumentCount,
                    format!("expected {} arguments, got {}", formals.len(), args.len()),
                )
                .span(span),
            );
            return self.invalid(None, span);
        }
        let mut bound = Vec::with_capacity(formals.len());
        let mut bad = false;
        for (i, &formal_id) in formals.iter().enumerate() {
            let formal = match &self.cx.symbol(formal_id).kind {
                SymbolKind::FormalArgument(f) => f,
                _ => unreachable!("subroutine argument is not a formal"),
            };
            if let Some(arg) = args.get(i) {
                let arg = match formal.direction {
                    Direction::In => {
                        let expr = self.create(arg);
                        self.convert_assignment(formal.ty, expr, Location::new(span.begin))
                    }
                    Direction::Out | Direction::InOut | Direction::Ref => {
                        let expr = self.create(arg);
                        if !expr.bad() && !expr.is_lvalue() {
                            self.cx.emit(
                                Diag::error(
                                    DiagCode::InvalidLValue,
                                    format!(
                                        "argument {} must be an lvalue for this direction",
                                        i + 1
                                    ),
                                )
                                .span(expr.span),
                            );
                            bad = true;
                        }
                        expr
                    }
                };
                bad |= arg.bad();
                bound.push(arg);
            } else if let Some(default) = formal.default {
                bound.push((*default).clone());
            } else {
                self.cx.emit(
                    Diag::error(
                        DiagCode::WrongArgumentCount,
                        format!(
                            "expected {} arguments, got {}",
                            formals.len(),
                            args.len()
                        ),
                    )
                    .span(span),
                );
                return self.invalid(None, span);
            }
        }
        if bad {
            return self.invalid(None, span);
        }
        let ty = sub.return_ty.get().unwrap_or(&VOID_TYPE);
        Expression::new(
            ExprKind::Call {
                subroutine,
                args: bound,
            },
            ty,
            span,
        )
    }

    fn bind_system_call(
        &self,
        name: Spanned<Name>,
        args: &[ExprSyntax],
        span: Span,
    ) -> Expression<'gcx> {
        let function = match SystemFunction::lookup(&name.value.as_str()) {
            Some(f) => f,
            None => {
                self.cx.emit(
                    Diag::error(
                        DiagCode::UnknownSystemSubroutine,
                        format!("unknown system subroutine `{}`", name.value),
                    )
                    .span(name.span),
                );
                return self.invalid(None, span);
            }
        };
        if args.len() != function.arg_count() {
            self.cx.emit(
                Diag::error(
                    DiagCode::WrongArgumentCount,
                    format!(
                        "`{}` takes {} argument(s), got {}",
                        name.value,
                        function.arg_count(),
                        args.len()
                    ),
                )
                .span(span),
            );
            return self.invalid(None, span);
        }
        let mut bound = Vec::with_capacity(args.len());
        let mut bad = false;
        for arg in args {
            let mut arg = self.create(arg);
            self.self_determined(&mut arg);
            bad |= arg.bad();
            bound.push(arg);
        }
        if bad {
            return self.invalid(bound.into_iter().next(), span);
        }
        // The per-function checker supplies the result type from the
        // argument types.
        let ty = match function.result_type(self.cx, &bound) {
            Ok(ty) => ty,
            Err(msg) => {
                self.cx
                    .emit(Diag::error(DiagCode::TypeMismatch, msg).span(span));
                return self.invalid(bound.into_iter().next(), span);
            }
        };
        Expression::new(ExprKind::SystemCall { function, args: bound }, ty, span)
    }

    /// Finalize a self-determined subexpression. The provisional type
    /// becomes final; nothing widens it from above.
    fn self_determined(&self, _expr: &mut Expression<'gcx>) {
        // The provisional types assigned during creation are already
        // self-determined; this marks the boundary in the code.
    }

    /// Widen a context-determined subexpression to the enclosing type,
    /// propagating into operand trees where the operator allows it and
    /// inserting a conversion at self-determined boundaries.
    pub fn context_determined(&self, expr: &mut Expression<'gcx>, ty: Type<'gcx>) {
        if expr.bad() || ty.is_error() {
            return;
        }
        if expr.ty == ty {
            return;
        }
        if self.propagate_type(expr, ty) {
            return;
        }
        self.insert_conversion(expr, ty, true);
    }

    fn insert_conversion(&self, expr: &mut Expression<'gcx>, ty: Type<'gcx>, implicit: bool) {
        let span = expr.span;
        let inner = std::mem::replace(expr, self.invalid(None, span));
        *expr = Expression::new(
            ExprKind::Conversion {
                operand: Box::new(inner),
                implicit,
            },
            ty,
            span,
        );
    }

    /// Try to push a wider context type down into an expression tree.
    /// Returns false if the expression is a self-determined boundary.
    fn propagate_type(&self, expr: &mut Expression<'gcx>, ty: Type<'gcx>) -> bool {
        let target = match ty.simple_bit_vector() {
            Some(t) => t,
            None => return false,
        };
        let current = match expr.ty.simple_bit_vector() {
            Some(t) => t,
            None => return false,
        };
        if target.width < current.width {
            return false;
        }
        match &mut expr.kind {
            // Literals fold the conversion into their value.
            ExprKind::IntegerLiteral(value) => {
                *value = value
                    .extend(target.width, current.signed)
                    .as_signed(target.signed)
                    .with_domain(target.four_state);
                expr.ty = ty;
                true
            }
            // Unbased unsized literals fill the whole context width.
            ExprKind::UnbasedUnsizedLiteral(_) => {
                expr.ty = ty;
                true
            }
            ExprKind::Unary { op, operand } => match op {
                UnaryOp::Plus | UnaryOp::Minus | UnaryOp::BitwiseNot => {
                    self.context_determined(operand, ty);
                    expr.ty = ty;
                    true
                }
                _ => false,
            },
            ExprKind::Binary { op, lhs, rhs } => {
                if op.is_arithmetic() && *op != BinaryOp::Power {
                    self.context_determined(lhs, ty);
                    self.context_determined(rhs, ty);
                    expr.ty = ty;
                    true
                } else if op.is_shift() || *op == BinaryOp::Power {
                    // Only the left operand is context-determined.
                    self.context_determined(lhs, ty);
                    expr.ty = ty;
                    true
                } else {
                    false
                }
            }
            ExprKind::Conditional {
                if_true, if_false, ..
            } => {
                self.context_determined(if_true, ty);
                self.context_determined(if_false, ty);
                expr.ty = ty;
                true
            }
            _ => false,
        }
    }

    /// Check assignment compatibility and adjust the expression to the
    /// target type, inserting a conversion node where needed.
    pub fn convert_assignment(
        &self,
        ty: Type<'gcx>,
        mut expr: Expression<'gcx>,
        location: Location,
    ) -> Expression<'gcx> {
        if expr.bad() || ty.is_error() {
            return expr;
        }
        if expr.ty.equivalent(ty) {
            // Even equivalent integrals may differ in nominal identity
            // (e.g. an alias); no conversion needed.
            return expr;
        }
        match ty.assignable(expr.ty) {
            ConversionKind::Implicit => {
                if let (Some(target), Some(current)) =
                    (ty.simple_bit_vector(), expr.ty.simple_bit_vector())
                {
                    if target.width >= current.width {
                        self.context_determined(&mut expr, ty);
                        return expr;
                    }
                    self.cx.emit(
                        Diag::warning(
                            DiagCode::WidthMismatch,
                            format!(
                                "implicit conversion from `{}` to `{}` loses {} bits",
                                expr.ty,
                                ty,
                                current.width - target.width
                            ),
                        )
                        .span(Span::from(location))
                        .span(expr.span),
                    );
                }
                self.insert_conversion(&mut expr, ty, true);
                expr
            }
            ConversionKind::Explicit => {
                self.cx.emit(
                    Diag::error(
                        DiagCode::TypeMismatch,
                        format!("cannot implicitly convert `{}` to `{}`; a cast is required", expr.ty, ty),
                    )
                    .span(Span::from(location))
                    .span(expr.span),
                );
                self.invalid(Some(expr), Span::from(location))
            }
            ConversionKind::None => {
                self.cx.emit(
                    Diag::error(
                        DiagCode::TypeMismatch,
                        format!("cannot convert `{}` to `{}`", expr.ty, ty),
                    )
                    .span(Span::from(location))
                    .span(expr.span),
                );
                self.invalid(Some(expr), Span::from(location))
            }
        }
    }

    /// Fold an already bound expression to a constant integer.
    fn fold_i32(&self, expr: &Expression<'gcx>, what: &str) -> Option<i32> {
        let mut ctx = EvalContext::new(self.cx);
        let value = ctx.eval(expr);
        let result = value
            .integer()
            .and_then(|v| v.to_bigint())
            .and_then(|v| num::ToPrimitive::to_i32(&v));
        match result {
            Some(v) => Some(v),
            None => {
                self.cx.emit(
                    Diag::error(
                        DiagCode::InvalidSelect,
                        format!("{} must be a constant integer", what),
                    )
                    .span(expr.span),
                );
                ctx.report(self.cx);
                None
            }
        }
    }

    fn fold_positive(&self, expr: &Expression<'gcx>, what: &str) -> Option<u32> {
        match self.fold_i32(expr, what) {
            Some(v) if v > 0 => Some(v as u32),
            Some(v) => {
                self.cx.emit(
                    Diag::error(
                        DiagCode::InvalidSelect,
                        format!("{} must be positive, got {}", what, v),
                    )
                    .span(expr.span),
                );
                None
            }
            None => None,
        }
    }

    /// Resolve a type from syntax, evaluating any constant dimension
    /// bounds.
    pub fn bind_type(&self, syntax: &TypeSyntax) -> Type<'gcx> {
        match &syntax.kind {
            TypeSyntaxKind::Predefined { keyword, signing } => {
                let base: Type<'gcx> = match keyword {
                    PredefinedType::Logic => &LOGIC_TYPE,
                    PredefinedType::Bit => &crate::ty::BIT_TYPE,
                    PredefinedType::Byte => &crate::ty::BYTE_TYPE,
                    PredefinedType::ShortInt => &crate::ty::SHORTINT_TYPE,
                    PredefinedType::Int => &INT_TYPE,
                    PredefinedType::LongInt => &crate::ty::LONGINT_TYPE,
                    PredefinedType::Integer => &crate::ty::INTEGER_TYPE,
                    PredefinedType::Time => &crate::ty::TIME_TYPE,
                    PredefinedType::Real => &REAL_TYPE,
                    PredefinedType::ShortReal => &crate::ty::SHORTREAL_TYPE,
                    PredefinedType::RealTime => &crate::ty::REALTIME_TYPE,
                    PredefinedType::String => &STRING_TYPE,
                    PredefinedType::Event => &crate::ty::EVENT_TYPE,
                    PredefinedType::Void => &VOID_TYPE,
                };
                match (signing, base.simple_bit_vector()) {
                    (Some(signed), Some(sbv)) if sbv.signed != *signed => {
                        self.cx.intern_type(TypeKind::Integral(IntegralType {
                            signed: *signed,
                            ..sbv
                        }))
                    }
                    _ => base,
                }
            }
            TypeSyntaxKind::Named(name) => {
                let kind = self.lookup_kind(syntax.span);
                match symbols::lookup_unqualified(self.cx, *name, self.scope, kind) {
                    Some(id) => resolve_alias_type(self.cx, id),
                    None => {
                        self.cx.emit(
                            Diag::error(
                                DiagCode::UndeclaredIdentifier,
                                format!("type `{}` is not declared", name),
                            )
                            .span(syntax.span),
                        );
                        &ERROR_TYPE
                    }
                }
            }
            TypeSyntaxKind::Packed { elem, msb, lsb } => {
                let elem = self.bind_type(elem);
                if elem.is_error() {
                    return &ERROR_TYPE;
                }
                if elem.simple_bit_vector().is_none() {
                    self.cx.emit(
                        Diag::error(
                            DiagCode::TypeMismatch,
                            format!("`{}` cannot have packed dimensions", elem),
                        )
                        .span(syntax.span),
                    );
                    return &ERROR_TYPE;
                }
                match self.bind_range(msb, lsb) {
                    Some(range) => self.cx.intern_type(TypeKind::PackedArray { elem, range }),
                    None => &ERROR_TYPE,
                }
            }
            TypeSyntaxKind::Unpacked { elem, msb, lsb } => {
                let elem = self.bind_type(elem);
                if elem.is_error() {
                    return &ERROR_TYPE;
                }
                match self.bind_range(msb, lsb) {
                    Some(range) => self.cx.intern_type(TypeKind::UnpackedArray { elem, range }),
                    None => &ERROR_TYPE,
                }
            }
            TypeSyntaxKind::Enum { base, variants } => {
                let base = match base {
                    Some(b) => self.bind_type(b),
                    None => &INT_TYPE,
                };
                if base.is_error() {
                    return &ERROR_TYPE;
                }
                let sbv = match base.simple_bit_vector() {
                    Some(x) => x,
                    None => {
                        self.cx.emit(
                            Diag::error(
                                DiagCode::TypeMismatch,
                                format!("enum base type `{}` is not integral", base),
                            )
                            .span(syntax.span),
                        );
                        return &ERROR_TYPE;
                    }
                };
                let mut members = Vec::with_capacity(variants.len());
                let mut next = SvInt::zero(sbv.width, sbv.signed, false);
                for variant in variants {
                    let value = match &variant.value {
                        Some(init) => {
                            let expr = self.create(init);
                            let expr = self.cx.alloc_expr(expr);
                            let mut ctx = EvalContext::new(self.cx);
                            match ctx.eval(expr).into_integer() {
                                Some(v) => v.resize(sbv.width).as_signed(sbv.signed),
                                None => {
                                    ctx.report(self.cx);
                                    self.cx.emit(
                                        Diag::error(
                                            DiagCode::ConstantRequired,
                                            format!(
                                                "value of enum variant `{}` is not constant",
                                                variant.name.value
                                            ),
                                        )
                                        .span(variant.name.span),
                                    );
                                    return &ERROR_TYPE;
                                }
                            }
                        }
                        None => next.clone(),
                    };
                    next = value.add(&SvInt::from_u64(sbv.width, sbv.signed, 1));
                    members.push((variant.name.value, value));
                }
                self.cx.intern_type(TypeKind::Enum(EnumType {
                    def: self.cx.alloc_def_id(),
                    base,
                    variants: members,
                }))
            }
            TypeSyntaxKind::Struct { packed, fields } => {
                let mut members = Vec::with_capacity(fields.len());
                for field in fields {
                    let ty = self.bind_type(&field.ty);
                    if ty.is_error() {
                        return &ERROR_TYPE;
                    }
                    if *packed && ty.simple_bit_vector().is_none() {
                        self.cx.emit(
                            Diag::error(
                                DiagCode::TypeMismatch,
                                format!("field `{}` of packed struct must be packed", field.name.value),
                            )
                            .span(field.name.span),
                        );
                        return &ERROR_TYPE;
                    }
                    members.push((field.name.value, ty));
                }
                // Packed struct fields are laid out first-declared at the
                // most significant position.
                let mut fields_out = Vec::with_capacity(members.len());
                if *packed {
                    let total: u32 = members.iter().map(|(_, ty)| ty.width()).sum();
                    let mut offset = total;
                    for (name, ty) in members {
                        offset -= ty.width();
                        fields_out.push(StructField { name, ty, offset });
                    }
                } else {
                    for (index, (name, ty)) in members.into_iter().enumerate() {
                        fields_out.push(StructField {
                            name,
                            ty,
                            offset: index as u32,
                        });
                    }
                }
                self.cx.intern_type(TypeKind::Struct(StructType {
                    def: self.cx.alloc_def_id(),
                    packed: *packed,
                    fields: fields_out,
                }))
            }
        }
    }

    fn bind_range(&self, msb: &ExprSyntax, lsb: &ExprSyntax) -> Option<Range> {
        let msb_expr = self.create(msb);
        let lsb_expr = self.create(lsb);
        let msb = self.fold_i32(&msb_expr, "the dimension bound")?;
        let lsb = self.fold_i32(&lsb_expr, "the dimension bound")?;
        Some(Range::new(msb, lsb))
    }

    /// Bind a single statement.
    pub fn bind_statement(&self, syntax: &StmtSyntax) -> &'gcx Statement<'gcx> {
        let stmt = self.create_statement(syntax);
        self.cx.alloc_stmt(stmt)
    }

    /// Bind a statement group, interleaving local declarations with
    /// statements in a fresh block scope.
    pub fn bind_statement_list(&self, items: &[BlockItemSyntax], span: Span) -> &'gcx Statement<'gcx> {
        let stmt = self.create_block(items, span);
        self.cx.alloc_stmt(stmt)
    }

    fn create_statement(&self, syntax: &StmtSyntax) -> Statement<'gcx> {
        let span = syntax.span;
        match &syntax.kind {
            StmtSyntaxKind::Expr(expr) => {
                let expr = self.create(expr);
                if expr.bad() {
                    return Statement::new(StmtKind::Invalid, span);
                }
                Statement::new(StmtKind::Expr(Box::new(expr)), span)
            }
            StmtSyntaxKind::Conditional {
                conditions,
                if_true,
                if_false,
            } => {
                if conditions.len() != 1 {
                    self.cx.emit(
                        Diag::error(
                            DiagCode::UnsupportedConstruct,
                            "the `&&&` operator in conditional predicates is not supported",
                        )
                        .span(span),
                    );
                    return Statement::new(StmtKind::Invalid, span);
                }
                if conditions[0].matches_clause {
                    self.cx.emit(
                        Diag::error(
                            DiagCode::UnsupportedConstruct,
                            "pattern matching in conditional predicates is not supported",
                        )
                        .span(span),
                    );
                    return Statement::new(StmtKind::Invalid, span);
                }
                let mut cond = self.create(&conditions[0].expr);
                self.self_determined(&mut cond);
                if cond.bad() {
                    return Statement::new(StmtKind::Invalid, span);
                }
                // The predicate must be implicitly convertible to a single
                // bit.
                if !cond.ty.is_integral() && !cond.ty.is_real() && !cond.ty.is_string() {
                    self.cx.emit(
                        Diag::error(
                            DiagCode::TypeMismatch,
                            format!("`{}` is not a valid predicate type", cond.ty),
                        )
                        .span(cond.span),
                    );
                    return Statement::new(StmtKind::Invalid, span);
                }
                let if_true = self.create_statement(if_true);
                let if_false = if_false.as_ref().map(|f| Box::new(self.create_statement(f)));
                Statement::new(
                    StmtKind::Conditional {
                        cond: Box::new(cond),
                        if_true: Box::new(if_true),
                        if_false,
                    },
                    span,
                )
            }
            StmtSyntaxKind::Return(value) => {
                let subroutine = enclosing_subroutine(self.cx, self.scope);
                let subroutine = match subroutine {
                    Some(id) => id,
                    None => {
                        self.cx.emit(
                            Diag::error(
                                DiagCode::ReturnOutsideSubroutine,
                                "`return` is only permitted inside a subroutine",
                            )
                            .span(span),
                        );
                        return Statement::new(StmtKind::Invalid, span);
                    }
                };
                let sub = match &self.cx.symbol(subroutine).kind {
                    SymbolKind::Subroutine(s) => s,
                    _ => unreachable!(),
                };
                ensure_subroutine_init(self.cx, subroutine);
                let return_ty = sub.return_ty.get().unwrap_or(&VOID_TYPE);
                match value {
                    Some(value) => {
                        let expr = self.create(value);
                        let expr =
                            self.convert_assignment(return_ty, expr, Location::new(span.begin));
                        if expr.bad() {
                            return Statement::new(StmtKind::Invalid, span);
                        }
                        Statement::new(StmtKind::Return(Some(Box::new(expr))), span)
                    }
                    None => Statement::new(StmtKind::Return(None), span),
                }
            }
            StmtSyntaxKind::Block(items) => self.create_block(items, span),
            StmtSyntaxKind::ForLoop {
                init,
                stop,
                steps,
                body,
            } => {
                let scope = self.alloc_block_scope(span);
                let nested = self.in_scope(scope);
                let mut init_stmts = Vec::with_capacity(init.len());
                for item in init {
                    init_stmts.push(nested.create_block_item(scope, item));
                }
                let stop = stop.as_ref().map(|s| {
                    let mut e = nested.create(s);
                    nested.self_determined(&mut e);
                    Box::new(e)
                });
                let steps = steps
                    .iter()
                    .map(|s| {
                        let mut e = nested.create(s);
                        nested.self_determined(&mut e);
                        e
                    })
                    .collect();
                let body = nested.create_statement(body);
                Statement::new(
                    StmtKind::ForLoop {
                        scope,
                        init: init_stmts,
                        stop,
                        steps,
                        body: Box::new(body),
                    },
                    span,
                )
            }
        }
    }

    /// Allocate a scope for a statement block, owned by an anonymous block
    /// symbol. Anonymous symbols never participate in lookup by name.
    fn alloc_block_scope(&self, span: Span) -> ScopeId {
        let scope = self.cx.alloc_scope(Some(self.scope), None);
        let owner = self.cx.alloc_symbol(
            mealy_common::name::intern(""),
            span,
            Some(self.scope),
            SymbolKind::Block { scope },
        );
        self.cx.scope(scope).owner.set(Some(owner));
        scope
    }

    fn create_block(&self, items: &[BlockItemSyntax], span: Span) -> Statement<'gcx> {
        let scope = self.alloc_block_scope(span);
        let nested = self.in_scope(scope);
        let mut body = Vec::with_capacity(items.len());
        for item in items {
            body.push(nested.create_block_item(scope, item));
        }
        Statement::new(StmtKind::Block { scope, body }, span)
    }

    fn create_block_item(&self, scope: ScopeId, item: &BlockItemSyntax) -> Statement<'gcx> {
        match item {
            BlockItemSyntax::Decl(decl) => {
                let ty = self.bind_type(&decl.ty);
                let init = decl.init.as_ref().map(|init| {
                    let expr = self.create(init);
                    let expr =
                        self.convert_assignment(ty, expr, Location::new(decl.name.span.begin));
                    &*self.cx.alloc_expr(expr)
                });
                let id = self.cx.alloc_symbol(
                    decl.name.value,
                    decl.name.span,
                    Some(scope),
                    SymbolKind::Variable(VariableSymbol {
                        ty_syntax: None,
                        init_syntax: None,
                        lifetime: Lifetime::Automatic,
                        ty: std::cell::Cell::new(Some(ty)),
                        init: std::cell::Cell::new(Some(init)),
                    }),
                );
                self.cx.scope(scope).insert(self.cx, decl.name.value, id);
                Statement::new(StmtKind::VarDecl(id), decl.name.span)
            }
            BlockItemSyntax::Stmt(stmt) => self.create_statement(stmt),
        }
    }
}

/// Find the subroutine a scope is nested in, if any.
fn enclosing_subroutine<'gcx>(cx: &Compilation<'gcx>, scope: ScopeId) -> Option<SymbolId> {
    let mut next = Some(scope);
    while let Some(id) = next {
        let scope = cx.scope(id);
        if let Some(owner) = scope.owner.get() {
            if let SymbolKind::Subroutine(_) = cx.symbol(owner).kind {
                return Some(owner);
            }
        }
        next = scope.parent;
    }
    None
}

/// The type a symbol has when referenced as a value.
pub fn value_type<'gcx>(cx: &Compilation<'gcx>, id: SymbolId) -> Type<'gcx> {
    let sym = cx.symbol(id);
    match &sym.kind {
        SymbolKind::Parameter(_) => parameter_type(cx, id),
        SymbolKind::Variable(_) => variable_type(cx, id),
        SymbolKind::FormalArgument(arg) => arg.ty,
        SymbolKind::EnumMember(member) => resolve_alias_type(cx, member.alias),
        SymbolKind::Field(field) => field.ty,
        _ => &ERROR_TYPE,
    }
}

/// The declared or inferred type of a parameter, cached on first use.
pub fn parameter_type<'gcx>(cx: &Compilation<'gcx>, id: SymbolId) -> Type<'gcx> {
    let sym = cx.symbol(id);
    let param = match &sym.kind {
        SymbolKind::Parameter(p) => p,
        _ => panic!("symbol is not a parameter"),
    };
    if let Some(ty) = param.ty.get() {
        return ty;
    }
    if param.evaluating.get() {
        cx.emit(
            Diag::error(
                DiagCode::ConstantRequired,
                format!("the type of parameter `{}` depends on itself", sym.name),
            )
            .span(sym.span),
        );
        param.ty.set(Some(&ERROR_TYPE));
        return &ERROR_TYPE;
    }
    param.evaluating.set(true);
    let scope = sym.parent.expect("parameter without a scope");
    let binder = Binder::new(cx, scope);
    let ty = match (param.ty_syntax, param.init_syntax) {
        (Some(ts), _) => binder.bind_type(ts),
        // An implicitly typed parameter takes the self-determined type of
        // its initializer.
        (None, Some(init)) => binder.bind_self_determined(init).ty,
        (None, None) => {
            cx.emit(
                Diag::error(
                    DiagCode::ConstantRequired,
                    format!("parameter `{}` has no type and no value", sym.name),
                )
                .span(sym.span),
            );
            &ERROR_TYPE
        }
    };
    param.evaluating.set(false);
    if param.ty.get().is_none() {
        param.ty.set(Some(ty));
    }
    param.ty.get().unwrap()
}

/// The declared or inferred type of a variable, cached on first use.
pub fn variable_type<'gcx>(cx: &Compilation<'gcx>, id: SymbolId) -> Type<'gcx> {
    let sym = cx.symbol(id);
    let var = match &sym.kind {
        SymbolKind::Variable(v) => v,
        _ => panic!("symbol is not a variable"),
    };
    if let Some(ty) = var.ty.get() {
        return ty;
    }
    let scope = sym.parent.expect("variable without a scope");
    let binder = Binder::new(cx, scope);
    let ty = match (var.ty_syntax, var.init_syntax) {
        (Some(ts), _) => binder.bind_type(ts),
        (None, Some(init)) => binder.bind_self_determined(init).ty,
        (None, None) => &ERROR_TYPE,
    };
    var.ty.set(Some(ty));
    ty
}

/// The bound initializer of a variable, cached on first use.
pub fn variable_initializer<'gcx>(
    cx: &Compilation<'gcx>,
    id: SymbolId,
) -> Option<&'gcx Expression<'gcx>> {
    let sym = cx.symbol(id);
    let var = match &sym.kind {
        SymbolKind::Variable(v) => v,
        _ => panic!("symbol is not a variable"),
    };
    if let Some(init) = var.init.get() {
        return init;
    }
    let ty = variable_type(cx, id);
    let init = var.init_syntax.map(|init| {
        let scope = sym.parent.expect("variable without a scope");
        let binder = Binder::new(cx, scope);
        binder.bind_assignment_like(ty, init, Location::new(sym.span.begin))
    });
    var.init.set(Some(init));
    init
}

/// Resolve the type a typedef stands for, cached on first use. For struct
/// typedefs this also materializes the field symbols into an anonymous
/// scope, which never participates in name lookup.
pub fn resolve_alias_type<'gcx>(cx: &Compilation<'gcx>, id: SymbolId) -> Type<'gcx> {
    let sym = cx.symbol(id);
    let alias = match &sym.kind {
        SymbolKind::TypeAlias(a) => a,
        SymbolKind::EnumMember(member) => return resolve_alias_type(cx, member.alias),
        other => {
            cx.emit(
                Diag::error(
                    DiagCode::TypeMismatch,
                    format!("{} `{}` is not a type", other.desc(), sym.name),
                )
                .span(sym.span),
            );
            return &ERROR_TYPE;
        }
    };
    if let Some(ty) = alias.ty.get() {
        return ty;
    }
    if alias.resolving.get() {
        cx.emit(
            Diag::error(
                DiagCode::TypeMismatch,
                format!("typedef `{}` refers to itself", sym.name),
            )
            .span(sym.span),
        );
        alias.ty.set(Some(&ERROR_TYPE));
        return &ERROR_TYPE;
    }
    alias.resolving.set(true);
    let scope = sym.parent.expect("typedef without a scope");
    let binder = Binder::new(cx, scope);
    let resolved = binder.bind_type(alias.ty_syntax);
    let named = if resolved.is_error() {
        resolved
    } else {
        cx.intern_type(TypeKind::Named {
            name: sym.name,
            ty: resolved,
        })
    };
    alias.ty.set(Some(named));
    alias.resolving.set(false);
    if let Some(strukt) = named.struct_type() {
        let field_scope = cx.alloc_scope(Some(scope), Some(id));
        for (index, field) in strukt.fields.iter().enumerate() {
            let fid = cx.alloc_symbol(
                field.name,
                sym.span,
                Some(field_scope),
                SymbolKind::Field(FieldSymbol {
                    ty: field.ty,
                    offset: field.offset,
                    index,
                }),
            );
            cx.scope(field_scope).insert(cx, field.name, fid);
        }
        alias.field_scope.set(Some(field_scope));
    }
    named
}

/// Elaborate a subroutine's prototype: resolve the return type, promote the
/// formal arguments to symbols, and bind default values. The flag is set
/// before any work happens so recursive calls see the partial view.
pub fn ensure_subroutine_init<'gcx>(cx: &Compilation<'gcx>, id: SymbolId) {
    let sym = cx.symbol(id);
    let sub = match &sym.kind {
        SymbolKind::Subroutine(s) => s,
        _ => panic!("symbol is not a subroutine"),
    };
    if sub.initialized.get() {
        return;
    }
    sub.initialized.set(true);
    let syntax = match sub.syntax {
        Some(s) => s,
        None => return,
    };
    let parent = sym.parent.expect("subroutine without a scope");
    let binder = Binder::new(cx, parent);
    let return_ty = match &syntax.return_ty {
        Some(ts) => binder.bind_type(ts),
        None => &VOID_TYPE,
    };
    sub.return_ty.set(Some(return_ty));

    // Ports without an explicit direction or type inherit from the
    // previous port, defaulting to `input logic`.
    let mut last_direction = Direction::In;
    let mut last_type: Type<'gcx> = &LOGIC_TYPE;
    let mut args = Vec::with_capacity(syntax.ports.len());
    for port in &syntax.ports {
        let direction = port.direction.unwrap_or(last_direction);
        let ty = match &port.ty {
            Some(ts) => binder.bind_type(ts),
            None if port.direction.is_some() => &LOGIC_TYPE,
            None => last_type,
        };
        let default = port.default.as_ref().map(|init| {
            binder.bind_assignment_like(ty, init, Location::new(port.name.span.begin))
        });
        let arg_id = cx.alloc_symbol(
            port.name.value,
            port.name.span,
            Some(sub.scope),
            SymbolKind::FormalArgument(FormalArgSymbol {
                ty,
                direction,
                default,
            }),
        );
        cx.scope(sub.scope).insert(cx, port.name.value, arg_id);
        args.push(arg_id);
        last_direction = direction;
        last_type = ty;
    }
    *sub.args.borrow_mut() = args;
}

/// The bound body of a subroutine, bound on first use.
pub fn subroutine_body<'gcx>(cx: &Compilation<'gcx>, id: SymbolId) -> &'gcx Statement<'gcx> {
    let sym = cx.symbol(id);
    let sub = match &sym.kind {
        SymbolKind::Subroutine(s) => s,
        _ => panic!("symbol is not a subroutine"),
    };
    if let Some(body) = sub.body.get() {
        return body;
    }
    ensure_subroutine_init(cx, id);
    let span = sub.syntax.map(|s| s.name.span).unwrap_or(sym.span);
    let items: &[BlockItemSyntax] = match sub.syntax {
        Some(s) => &s.items,
        None => &[],
    };
    let binder = Binder::new(cx, sub.scope).with_flags(BindFlags::PROCEDURAL);
    let body = binder.bind_statement_list(items, span);
    sub.body.set(Some(body));
    body
}
