// Copyright (c) 2024-2026 The mealy developers

//! A visitor protocol over bound trees.
//!
//! External consumers, e.g. serializers, can walk typed expressions and
//! statements without matching on the concrete variants themselves. The
//! default method implementations perform a pre-order walk; implementors
//! override the hooks they care about and call the walk functions to
//! descend.

use crate::expr::{ExprKind, Expression};
use crate::stmt::{Statement, StmtKind};

/// A visitor over bound expressions and statements.
pub trait Visitor<'a>: Sized {
    /// Called for every expression. The default descends into the
    /// children.
    fn visit_expr(&mut self, expr: &Expression<'a>) {
        walk_expr(self, expr)
    }

    /// Called for every statement. The default descends into the children.
    fn visit_stmt(&mut self, stmt: &Statement<'a>) {
        walk_stmt(self, stmt)
    }
}

/// Walk the children of an expression.
pub fn walk_expr<'a, V: Visitor<'a>>(visitor: &mut V, expr: &Expression<'a>) {
    match &expr.kind {
        ExprKind::Invalid(child) => {
            if let Some(child) = child {
                visitor.visit_expr(child);
            }
        }
        ExprKind::IntegerLiteral(_)
        | ExprKind::UnbasedUnsizedLiteral(_)
        | ExprKind::RealLiteral(_)
        | ExprKind::StringLiteral(_)
        | ExprKind::NullLiteral
        | ExprKind::UnboundedLiteral
        | ExprKind::NamedValue { .. } => (),
        ExprKind::Unary { operand, .. } => visitor.visit_expr(operand),
        ExprKind::Binary { lhs, rhs, .. } => {
            visitor.visit_expr(lhs);
            visitor.visit_expr(rhs);
        }
        ExprKind::Conditional {
            cond,
            if_true,
            if_false,
        } => {
            visitor.visit_expr(cond);
            visitor.visit_expr(if_true);
            visitor.visit_expr(if_false);
        }
        ExprKind::Assignment { lhs, rhs } => {
            visitor.visit_expr(lhs);
            visitor.visit_expr(rhs);
        }
        ExprKind::Concat(parts) => {
            for part in parts {
                visitor.visit_expr(part);
            }
        }
        ExprKind::Replication { operand, .. } => visitor.visit_expr(operand),
        ExprKind::ElementSelect { value, selector } => {
            visitor.visit_expr(value);
            visitor.visit_expr(selector);
        }
        ExprKind::RangeSelect {
            value, left, right, ..
        } => {
            visitor.visit_expr(value);
            visitor.visit_expr(left);
            visitor.visit_expr(right);
        }
        ExprKind::MemberAccess { value, .. } => visitor.visit_expr(value),
        ExprKind::Call { args, .. } | ExprKind::SystemCall { args, .. } => {
            for arg in args {
                visitor.visit_expr(arg);
            }
        }
        ExprKind::Conversion { operand, .. } => visitor.visit_expr(operand),
        ExprKind::Inside { value, set } => {
            visitor.visit_expr(value);
            for member in set {
                visitor.visit_expr(member);
            }
        }
    }
}

/// Walk the children of a statement.
pub fn walk_stmt<'a, V: Visitor<'a>>(visitor: &mut V, stmt: &Statement<'a>) {
    match &stmt.kind {
        StmtKind::Invalid | StmtKind::VarDecl(_) => (),
        StmtKind::Expr(expr) => visitor.visit_expr(expr),
        StmtKind::Conditional {
            cond,
            if_true,
            if_false,
        } => {
            visitor.visit_expr(cond);
            visitor.visit_stmt(if_true);
            if let Some(if_false) = if_false {
                visitor.visit_stmt(if_false);
            }
        }
        StmtKind::Return(value) => {
            if let Some(value) = value {
                visitor.visit_expr(value);
            }
        }
        StmtKind::Block { body, .. } | StmtKind::List(body) => {
            for stmt in body {
                visitor.visit_stmt(stmt);
            }
        }
        StmtKind::ForLoop {
            init,
            stop,
            steps,
            body,
            ..
        } => {
            for stmt in init {
                visitor.visit_stmt(stmt);
            }
            if let Some(stop) = stop {
                visitor.visit_expr(stop);
            }
            for step in steps {
                visitor.visit_expr(step);
            }
            visitor.visit_stmt(body);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{ExprKind, Expression};
    use crate::svint::SvInt;
    use crate::ty::INT_TYPE;
    use mealy_common::source::INVALID_SPAN;

    struct Counter {
        exprs: usize,
    }

    impl<'a> Visitor<'a> for Counter {
        fn visit_expr(&mut self, expr: &Expression<'a>) {
            self.exprs += 1;
            walk_expr(self, expr);
        }
    }

    #[test]
    fn walk_counts_every_node() {
        let lit = |v| {
            Expression::new(
                ExprKind::IntegerLiteral(SvInt::from_u64(32, true, v)),
                &INT_TYPE,
                INVALID_SPAN,
            )
        };
        let expr = Expression::new(
            ExprKind::Binary {
                op: crate::op::BinaryOp::Add,
                lhs: Box::new(lit(1)),
                rhs: Box::new(lit(2)),
            },
            &INT_TYPE,
            INVALID_SPAN,
        );
        let mut counter = Counter { exprs: 0 };
        counter.visit_expr(&expr);
        assert_eq!(counter.exprs, 3);
    }
}
