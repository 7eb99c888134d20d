// Copyright (c) 2024-2026 The mealy developers

//! Representation of constant values.
//!
//! This module implements the values that arise during elaboration-time
//! evaluation: integers backed by [`SvInt`], floating point values, strings,
//! aggregates, and the `null`/unbounded markers. A distinguished [`bad`]
//! state marks the result of an evaluation that already produced a
//! diagnostic, so that callers can short-circuit without cascading further
//! errors.
//!
//! [`bad`]: ConstantValue::Bad

use crate::svint::SvInt;
use itertools::Itertools;
use num::BigInt;
use std::cmp::Ordering;
use std::fmt;

/// A constant value.
#[derive(Clone, PartialEq)]
pub enum ConstantValue {
    /// An integral value of explicit width and domain.
    Integer(SvInt),
    /// A `real` value.
    Real(f64),
    /// A `shortreal` value.
    ShortReal(f32),
    /// A `string` value.
    Str(String),
    /// The `null` literal.
    Null,
    /// The unbounded marker `$`.
    Unbounded,
    /// The elements of an array or the fields of a struct, in declaration
    /// order. The shape travels on the expression's type.
    Elements(Vec<ConstantValue>),
    /// The result of an evaluation that has already been diagnosed.
    Bad,
}

impl ConstantValue {
    /// Check if this is the distinguished bad value.
    pub fn bad(&self) -> bool {
        matches!(self, ConstantValue::Bad)
    }

    /// Check if this value evaluates to true as a predicate. Unknown bits
    /// make an integer predicate false.
    pub fn is_true(&self) -> bool {
        match self {
            ConstantValue::Integer(v) => v.to_bool() == Some(true),
            ConstantValue::Real(v) => *v != 0.0,
            ConstantValue::ShortReal(v) => *v != 0.0,
            ConstantValue::Str(s) => !s.is_empty(),
            _ => false,
        }
    }

    /// Get the integer payload.
    pub fn integer(&self) -> Option<&SvInt> {
        match self {
            ConstantValue::Integer(v) => Some(v),
            _ => None,
        }
    }

    /// Take the integer payload, consuming the value.
    pub fn into_integer(self) -> Option<SvInt> {
        match self {
            ConstantValue::Integer(v) => Some(v),
            _ => None,
        }
    }

    /// Get the elements of an aggregate.
    pub fn elements(&self) -> Option<&[ConstantValue]> {
        match self {
            ConstantValue::Elements(v) => Some(v),
            _ => None,
        }
    }

    /// Check membership by case equality, as used by `case` arms and the
    /// `inside` operator. Integers compare bit-exact including X/Z; other
    /// variants compare structurally.
    pub fn case_matches(&self, other: &ConstantValue) -> bool {
        match (self, other) {
            (ConstantValue::Integer(a), ConstantValue::Integer(b)) => a.case_eq(b),
            (ConstantValue::Elements(a), ConstantValue::Elements(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.case_matches(y))
            }
            (a, b) => a == b,
        }
    }

    /// A total order over constant values, used to sort and deduplicate
    /// membership sets. Values of different variants order by variant rank.
    pub fn order(&self, other: &ConstantValue) -> Ordering {
        fn rank(v: &ConstantValue) -> u8 {
            match v {
                ConstantValue::Bad => 0,
                ConstantValue::Null => 1,
                ConstantValue::Unbounded => 2,
                ConstantValue::Integer(_) => 3,
                ConstantValue::ShortReal(_) => 4,
                ConstantValue::Real(_) => 5,
                ConstantValue::Str(_) => 6,
                ConstantValue::Elements(_) => 7,
            }
        }
        match (self, other) {
            (ConstantValue::Integer(a), ConstantValue::Integer(b)) => {
                let ax = a.to_bigint();
                let bx = b.to_bigint();
                match (ax, bx) {
                    (Some(a), Some(b)) => a.cmp(&b),
                    // Values with unknown bits sort after known ones, by
                    // their literal spelling for determinism.
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => a.to_literal().cmp(&b.to_literal()),
                }
            }
            (ConstantValue::Real(a), ConstantValue::Real(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (ConstantValue::ShortReal(a), ConstantValue::ShortReal(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (ConstantValue::Str(a), ConstantValue::Str(b)) => a.cmp(b),
            (ConstantValue::Elements(a), ConstantValue::Elements(b)) => a
                .len()
                .cmp(&b.len())
                .then_with(|| {
                    a.iter()
                        .zip(b)
                        .map(|(x, y)| x.order(y))
                        .find(|o| *o != Ordering::Equal)
                        .unwrap_or(Ordering::Equal)
                }),
            (a, b) => rank(a).cmp(&rank(b)),
        }
    }

    /// Pack a string into an integral value, one byte per character, the
    /// first character in the most significant position. The empty string
    /// packs to a single zero byte.
    pub fn pack_string(s: &str) -> SvInt {
        let bytes = s.as_bytes();
        if bytes.is_empty() {
            return SvInt::from_u64(8, false, 0);
        }
        let mut v = BigInt::from(0u8);
        for &b in bytes {
            v = (v << 8) | BigInt::from(b);
        }
        SvInt::from_bigint(bytes.len() as u32 * 8, false, false, &v)
    }

    /// Unpack an integral value into a string, dropping NUL bytes, the most
    /// significant byte first.
    pub fn unpack_string(v: &SvInt) -> String {
        let known = v.with_domain(false);
        let bytes = known.value_plane().to_bytes_be();
        bytes
            .into_iter()
            .filter(|&b| b != 0)
            .map(|b| b as char)
            .collect()
    }
}

impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConstantValue::Integer(v) => write!(f, "{}", v),
            ConstantValue::Real(v) => write!(f, "{}", v),
            ConstantValue::ShortReal(v) => write!(f, "{}", v),
            ConstantValue::Str(s) => write!(f, "\"{}\"", s),
            ConstantValue::Null => write!(f, "null"),
            ConstantValue::Unbounded => write!(f, "$"),
            ConstantValue::Elements(elems) => {
                write!(f, "'{{{}}}", elems.iter().map(|e| e.to_string()).join(", "))
            }
            ConstantValue::Bad => write!(f, "<bad>"),
        }
    }
}

impl fmt::Debug for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl From<SvInt> for ConstantValue {
    fn from(v: SvInt) -> ConstantValue {
        ConstantValue::Integer(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svint::LiteralBase;

    fn int(s: &str) -> ConstantValue {
        let tick = s.find('\'').unwrap();
        let width: u32 = s[..tick].parse().unwrap();
        ConstantValue::Integer(
            SvInt::from_literal(width, false, LiteralBase::Binary, &s[tick + 2..]).unwrap(),
        )
    }

    #[test]
    fn case_membership_uses_case_equality() {
        // A selector with an x bit matches the arm with the same x bit, not
        // the arm that differs only in that bit.
        let selector = int("3'b01x");
        assert!(!selector.case_matches(&int("3'b010")));
        assert!(selector.case_matches(&int("3'b01x")));
    }

    #[test]
    fn predicate_truth() {
        assert!(int("3'b010").is_true());
        assert!(!int("3'b000").is_true());
        // All-unknown predicates are not true.
        assert!(!int("3'bxxx").is_true());
        assert!(!ConstantValue::Null.is_true());
    }

    #[test]
    fn order_is_total_and_stable() {
        let mut values = vec![
            ConstantValue::Str("b".into()),
            int("3'b001"),
            ConstantValue::Null,
            int("3'b111"),
            ConstantValue::Real(1.5),
        ];
        values.sort_by(|a, b| a.order(b));
        assert_eq!(values[0], ConstantValue::Null);
        assert_eq!(values[1], int("3'b001"));
        assert_eq!(values[4], ConstantValue::Str("b".into()));
    }

    #[test]
    fn string_packing_roundtrip() {
        let packed = ConstantValue::pack_string("Hi");
        assert_eq!(packed.width(), 16);
        assert_eq!(packed.as_u64(), Some(0x4869));
        assert_eq!(ConstantValue::unpack_string(&packed), "Hi");
    }
}
