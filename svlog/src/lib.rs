// Copyright (c) 2024-2026 The mealy developers

//! The SystemVerilog semantic core of the mealy compiler.
//!
//! This crate consumes parsed syntax trees and produces fully typed, bound
//! expression and statement trees hung off a symbol hierarchy, together
//! with a constant evaluator capable of executing elaboration-time code.
//!
//! The pieces, in dependency order:
//!
//! - [`svint`]: arbitrary-width four-state integer arithmetic.
//! - [`value`]: the constant value sum type over integers, reals, strings,
//!   and aggregates.
//! - [`ty`]: the type model with equivalence and assignment compatibility.
//! - [`symbols`]: named entities, lexical scopes, and lazy member
//!   promotion.
//! - [`binder`]: turns syntax into typed trees, performing implicit
//!   conversions and the self-determined/context-determined width and sign
//!   propagation.
//! - [`eval`]: executes bound trees over constant values, with lvalue
//!   resolution, a step budget, and diagnostic capture.

#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate log;

pub mod binder;
pub mod builtins;
pub mod context;
pub mod eval;
pub mod expr;
pub mod op;
pub mod stmt;
pub mod svint;
pub mod symbols;
pub mod syntax;
pub mod ty;
pub mod value;
pub mod visit;

pub use crate::context::{Compilation, GlobalArenas};
pub use crate::svint::SvInt;
pub use crate::value::ConstantValue;
