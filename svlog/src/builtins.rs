// Copyright (c) 2024-2026 The mealy developers

//! System subroutines evaluable at elaboration time.
//!
//! Each function runs a custom checker at bind time that derives the result
//! type from the argument types, and a matching evaluation rule in the
//! constant evaluator.

use crate::context::Compilation;
use crate::expr::Expression;
use crate::ty::{Type, INT_TYPE};

/// A system subroutine known to the constant evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemFunction {
    /// `$bits(expr)`: the number of bits needed to hold the argument.
    Bits,
    /// `$clog2(expr)`: the ceiling base-2 logarithm of the argument.
    Clog2,
}

impl SystemFunction {
    /// Resolve a system subroutine by name, including the leading `$`.
    pub fn lookup(name: &str) -> Option<SystemFunction> {
        match name {
            "$bits" => Some(SystemFunction::Bits),
            "$clog2" => Some(SystemFunction::Clog2),
            _ => None,
        }
    }

    /// The name of the subroutine, including the leading `$`.
    pub fn name(self) -> &'static str {
        match self {
            SystemFunction::Bits => "$bits",
            SystemFunction::Clog2 => "$clog2",
        }
    }

    /// The number of arguments the subroutine takes.
    pub fn arg_count(self) -> usize {
        1
    }

    /// Derive the result type from the bound argument types, or explain why
    /// the arguments are unacceptable.
    pub fn result_type<'gcx>(
        self,
        _cx: &Compilation<'gcx>,
        args: &[Expression<'gcx>],
    ) -> Result<Type<'gcx>, String> {
        match self {
            SystemFunction::Bits => {
                if !args[0].ty.is_integral() {
                    return Err(format!("`$bits` needs an integral argument, got `{}`", args[0].ty));
                }
                Ok(&INT_TYPE)
            }
            SystemFunction::Clog2 => {
                if !args[0].ty.is_integral() {
                    return Err(format!(
                        "`$clog2` needs an integral argument, got `{}`",
                        args[0].ty
                    ));
                }
                Ok(&INT_TYPE)
            }
        }
    }
}
