// Copyright (c) 2024-2026 The mealy developers

//! Arbitrary-width four-state integer arithmetic.
//!
//! This module implements the integer representation that underlies all
//! integral constant values in the compiler. An [`SvInt`] has an explicit bit
//! width, a signedness, and optionally a four-state domain in which each bit
//! may carry X (unknown) or Z (high impedance) in addition to 0 and 1.
//!
//! The representation keeps three bit planes as `BigUint` magnitudes: the
//! value plane, the unknown plane (set for X and Z), and the Z plane (the
//! subset of unknown bits that are Z). Bits beyond the width are zero in all
//! planes, and the value plane is zero wherever the unknown plane is set, so
//! structurally equal values compare and hash equal.
//!
//! Operations follow the LRM's bit-level rules: arithmetic on any unknown
//! operand produces an all-X result, bitwise operations use the per-bit
//! tables (a known 0 dominates AND, a known 1 dominates OR), and ordering
//! comparisons on unknown operands yield a one-bit X.

use num::{bigint::Sign, BigInt, BigUint, One, ToPrimitive, Zero};
use std::cmp::{max, Ordering};
use std::fmt;

/// The maximum width of an integer, exclusive.
pub const MAX_WIDTH: u32 = 1 << 24;

/// The base of an integer literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralBase {
    Binary,
    Octal,
    Decimal,
    Hex,
}

impl LiteralBase {
    /// The number of value bits a single digit covers. Decimal digits do not
    /// map onto bit groups and are handled separately.
    fn bits_per_digit(self) -> u32 {
        match self {
            LiteralBase::Binary => 1,
            LiteralBase::Octal => 3,
            LiteralBase::Hex => 4,
            LiteralBase::Decimal => unreachable!("decimal digits are not bit groups"),
        }
    }

    /// The character used in a formatted literal.
    fn to_char(self) -> char {
        match self {
            LiteralBase::Binary => 'b',
            LiteralBase::Octal => 'o',
            LiteralBase::Decimal => 'd',
            LiteralBase::Hex => 'h',
        }
    }
}

/// The state of a single bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Logic {
    Zero,
    One,
    X,
    Z,
}

impl Logic {
    /// Whether the bit is X or Z.
    pub fn is_unknown(self) -> bool {
        matches!(self, Logic::X | Logic::Z)
    }

    fn to_char(self) -> char {
        match self {
            Logic::Zero => '0',
            Logic::One => '1',
            Logic::X => 'x',
            Logic::Z => 'z',
        }
    }
}

/// An arbitrary-width two- or four-state integer.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SvInt {
    width: u32,
    signed: bool,
    four_state: bool,
    /// The value plane. Zero at unknown positions and beyond the width.
    value: BigUint,
    /// The unknown plane; a set bit is X or Z. Zero unless `four_state`.
    xz: BigUint,
    /// The Z plane; always a subset of `xz`.
    z: BigUint,
}

fn mask(width: u32) -> BigUint {
    (BigUint::one() << width as usize) - BigUint::one()
}

fn get_bit(v: &BigUint, i: u32) -> bool {
    ((v >> i as usize) & BigUint::one()).is_one()
}

impl SvInt {
    /// Create a new integer from raw planes.
    ///
    /// Panics if the width is zero or beyond [`MAX_WIDTH`]; widths are
    /// checked by the type system before values are constructed.
    pub fn with_planes(
        width: u32,
        signed: bool,
        four_state: bool,
        value: BigUint,
        xz: BigUint,
        z: BigUint,
    ) -> SvInt {
        assert!(width > 0 && width < MAX_WIDTH, "invalid integer width {}", width);
        let m = mask(width);
        let xz = if four_state { xz & &m } else { BigUint::zero() };
        let z = &z & &xz;
        let value = value & &m & (&m ^ &xz);
        SvInt {
            width,
            signed,
            four_state,
            value,
            xz,
            z,
        }
    }

    /// Create a fully-known integer from a `BigUint`, truncating to `width`.
    pub fn from_biguint(width: u32, signed: bool, four_state: bool, value: BigUint) -> SvInt {
        SvInt::with_planes(width, signed, four_state, value, BigUint::zero(), BigUint::zero())
    }

    /// Create a fully-known integer from a `u64`.
    pub fn from_u64(width: u32, signed: bool, value: u64) -> SvInt {
        SvInt::from_biguint(width, signed, false, BigUint::from(value))
    }

    /// Create a fully-known integer from a `BigInt`, encoding negative values
    /// in two's complement at the given width.
    pub fn from_bigint(width: u32, signed: bool, four_state: bool, value: &BigInt) -> SvInt {
        let encoded = match value.sign() {
            Sign::Minus => {
                let m = mask(width) + BigUint::one();
                let magnitude = value.magnitude() % &m;
                (m - magnitude) & mask(width)
            }
            _ => value.magnitude().clone(),
        };
        SvInt::from_biguint(width, signed, four_state, encoded)
    }

    /// The zero value of the given shape.
    pub fn zero(width: u32, signed: bool, four_state: bool) -> SvInt {
        SvInt::from_biguint(width, signed, four_state, BigUint::zero())
    }

    /// An all-X value of the given width.
    pub fn filled_x(width: u32, signed: bool) -> SvInt {
        let m = mask(width);
        SvInt::with_planes(width, signed, true, BigUint::zero(), m, BigUint::zero())
    }

    /// An all-Z value of the given width.
    pub fn filled_z(width: u32, signed: bool) -> SvInt {
        let m = mask(width);
        SvInt::with_planes(width, signed, true, BigUint::zero(), m.clone(), m)
    }

    /// Parse a based literal.
    ///
    /// The digit string may contain `_` separators and, for the bit-group
    /// bases, `x`/`z`/`?` digits. If the most significant specified digit is
    /// X or Z, the value extends to the full width with that state; otherwise
    /// it zero extends. Returns `None` on a malformed digit string.
    pub fn from_literal(width: u32, signed: bool, base: LiteralBase, digits: &str) -> Option<SvInt> {
        if width == 0 || width >= MAX_WIDTH {
            return None;
        }
        match base {
            LiteralBase::Decimal => Self::from_decimal_literal(width, signed, digits),
            _ => Self::from_bit_group_literal(width, signed, base, digits),
        }
    }

    fn from_decimal_literal(width: u32, signed: bool, digits: &str) -> Option<SvInt> {
        let cleaned: String = digits.chars().filter(|&c| c != '_').collect();
        if cleaned.is_empty() {
            return None;
        }
        // A single x or z digit covers the whole literal in decimal.
        match &*cleaned {
            "x" | "X" => return Some(SvInt::filled_x(width, signed)),
            "z" | "Z" | "?" => return Some(SvInt::filled_z(width, signed)),
            _ => (),
        }
        let value = BigUint::parse_bytes(cleaned.as_bytes(), 10)?;
        Some(SvInt::from_biguint(width, signed, false, value))
    }

    fn from_bit_group_literal(
        width: u32,
        signed: bool,
        base: LiteralBase,
        digits: &str,
    ) -> Option<SvInt> {
        let bpd = base.bits_per_digit();
        let mut value = BigUint::zero();
        let mut xz = BigUint::zero();
        let mut z = BigUint::zero();
        let digit_mask = mask(bpd);
        let mut first: Option<Logic> = None;
        for c in digits.chars() {
            if c == '_' {
                continue;
            }
            value <<= bpd as usize;
            xz <<= bpd as usize;
            z <<= bpd as usize;
            let state = match c {
                'x' | 'X' => {
                    xz |= digit_mask.clone();
                    Logic::X
                }
                'z' | 'Z' | '?' => {
                    xz |= digit_mask.clone();
                    z |= digit_mask.clone();
                    Logic::Z
                }
                _ => {
                    let d = c.to_digit(16)? as u64;
                    if d >= (1u64 << bpd) {
                        return None;
                    }
                    value |= BigUint::from(d);
                    Logic::Zero
                }
            };
            first.get_or_insert(state);
        }
        let first = first?;
        // An unknown leading digit extends over the remaining bits; a known
        // one zero extends.
        let specified = digits.chars().filter(|&c| c != '_').count() as u32 * bpd;
        if specified < width {
            let ext = mask(width - specified) << specified as usize;
            match first {
                Logic::X => xz |= ext,
                Logic::Z => {
                    xz |= ext.clone();
                    z |= ext;
                }
                _ => (),
            }
        }
        let four_state = !xz.is_zero();
        Some(SvInt::with_planes(width, signed, four_state, value, xz, z))
    }

    /// The width in bits.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Whether the integer is signed.
    pub fn is_signed(&self) -> bool {
        self.signed
    }

    /// Whether the integer lives in the four-state domain.
    pub fn is_four_state(&self) -> bool {
        self.four_state
    }

    /// Whether any bit is X or Z.
    pub fn has_unknown(&self) -> bool {
        !self.xz.is_zero()
    }

    /// Whether the value is fully known and zero.
    pub fn is_zero(&self) -> bool {
        self.value.is_zero() && self.xz.is_zero()
    }

    /// Whether the value is fully known and one.
    pub fn is_one(&self) -> bool {
        self.value.is_one() && self.xz.is_zero()
    }

    /// The state of bit `i`. Bits at or beyond the width read as zero.
    pub fn bit(&self, i: u32) -> Logic {
        if i >= self.width {
            return Logic::Zero;
        }
        if get_bit(&self.xz, i) {
            if get_bit(&self.z, i) {
                Logic::Z
            } else {
                Logic::X
            }
        } else if get_bit(&self.value, i) {
            Logic::One
        } else {
            Logic::Zero
        }
    }

    /// The raw value plane.
    pub fn value_plane(&self) -> &BigUint {
        &self.value
    }

    /// Interpret the value as an unsigned machine integer, if it is fully
    /// known and fits.
    pub fn as_u64(&self) -> Option<u64> {
        if self.has_unknown() {
            return None;
        }
        self.value.to_u64()
    }

    /// Interpret the value under its signedness, if it is fully known.
    pub fn to_bigint(&self) -> Option<BigInt> {
        if self.has_unknown() {
            return None;
        }
        let v = BigInt::from(self.value.clone());
        if self.signed && get_bit(&self.value, self.width - 1) {
            Some(v - (BigInt::one() << self.width as usize))
        } else {
            Some(v)
        }
    }

    /// Reinterpret the signedness without changing any bits.
    pub fn as_signed(&self, signed: bool) -> SvInt {
        let mut r = self.clone();
        r.signed = signed;
        r
    }

    /// Move the value into the given domain. Leaving the four-state domain
    /// forces X and Z bits to zero.
    pub fn with_domain(&self, four_state: bool) -> SvInt {
        if four_state == self.four_state {
            return self.clone();
        }
        SvInt::with_planes(
            self.width,
            self.signed,
            four_state,
            self.value.clone(),
            self.xz.clone(),
            self.z.clone(),
        )
    }

    /// Sign- or zero-extend to a larger width, preserving unknown bits. The
    /// MSB, including its X/Z state, is replicated when extending signed.
    pub fn extend(&self, to_width: u32, signed: bool) -> SvInt {
        assert!(to_width >= self.width);
        if to_width == self.width {
            return self.as_signed(signed);
        }
        let ext = mask(to_width - self.width) << self.width as usize;
        let (mut value, mut xz, mut z) = (self.value.clone(), self.xz.clone(), self.z.clone());
        if signed {
            match self.bit(self.width - 1) {
                Logic::One => value |= ext,
                Logic::X => xz |= ext,
                Logic::Z => {
                    xz |= ext.clone();
                    z |= ext;
                }
                Logic::Zero => (),
            }
        }
        SvInt::with_planes(to_width, signed, self.four_state, value, xz, z)
    }

    /// Truncate to a smaller width, dropping MSBs.
    pub fn truncate(&self, to_width: u32) -> SvInt {
        assert!(to_width <= self.width);
        SvInt::with_planes(
            to_width,
            self.signed,
            self.four_state,
            self.value.clone(),
            self.xz.clone(),
            self.z.clone(),
        )
    }

    /// Resize to an arbitrary width, extending under this value's own
    /// signedness or truncating as needed.
    pub fn resize(&self, to_width: u32) -> SvInt {
        match to_width.cmp(&self.width) {
            Ordering::Greater => self.extend(to_width, self.signed),
            Ordering::Less => self.truncate(to_width),
            Ordering::Equal => self.clone(),
        }
    }

    fn result_shape(&self, other: &SvInt) -> (u32, bool, bool) {
        (
            max(self.width, other.width),
            self.signed && other.signed,
            self.four_state || other.four_state,
        )
    }

    /// Extend both operands to a common width and return the planes as
    /// two's-complement-encoded `BigUint`s.
    fn common(&self, other: &SvInt) -> (u32, bool, BigUint, BigUint) {
        let (w, signed, _) = self.result_shape(other);
        let a = self.extend(w, self.signed);
        let b = other.extend(w, other.signed);
        (w, signed, a.value, b.value)
    }

    /// Addition. Result width is the larger operand width.
    pub fn add(&self, other: &SvInt) -> SvInt {
        let (w, signed, four_state) = self.result_shape(other);
        if self.has_unknown() || other.has_unknown() {
            return SvInt::filled_x(w, signed);
        }
        let (w, signed, a, b) = self.common(other);
        SvInt::from_biguint(w, signed, four_state, a + b)
    }

    /// Subtraction, wrapping at the result width.
    pub fn sub(&self, other: &SvInt) -> SvInt {
        let (w, signed, four_state) = self.result_shape(other);
        if self.has_unknown() || other.has_unknown() {
            return SvInt::filled_x(w, signed);
        }
        let (w, signed, a, b) = self.common(other);
        let modulus = BigUint::one() << w as usize;
        SvInt::from_biguint(w, signed, four_state, a + modulus - b)
    }

    /// Multiplication, wrapping at the result width.
    pub fn mul(&self, other: &SvInt) -> SvInt {
        let (w, signed, four_state) = self.result_shape(other);
        if self.has_unknown() || other.has_unknown() {
            return SvInt::filled_x(w, signed);
        }
        let (w, signed, a, b) = self.common(other);
        SvInt::from_biguint(w, signed, four_state, a * b)
    }

    /// Division. The result takes the width of the dividend. Division by
    /// zero yields all-X; the caller records the diagnostic.
    pub fn div(&self, other: &SvInt) -> SvInt {
        self.div_rem(other, false)
    }

    /// Modulus. The result takes the width and sign of the dividend.
    pub fn rem(&self, other: &SvInt) -> SvInt {
        self.div_rem(other, true)
    }

    fn div_rem(&self, other: &SvInt, want_rem: bool) -> SvInt {
        let w = self.width;
        let signed = self.signed && other.signed;
        let four_state = self.four_state || other.four_state;
        if self.has_unknown() || other.has_unknown() || other.is_zero() {
            return SvInt::filled_x(w, signed);
        }
        let a = self.interp(signed);
        let b = other.interp(signed);
        let r = if want_rem { a % b } else { a / b };
        SvInt::from_bigint(w, signed, four_state, &r)
    }

    fn interp(&self, signed: bool) -> BigInt {
        let v = BigInt::from(self.value.clone());
        if signed && get_bit(&self.value, self.width - 1) {
            v - (BigInt::one() << self.width as usize)
        } else {
            v
        }
    }

    /// Exponentiation per the LRM table. The result takes the width of the
    /// base.
    pub fn pow(&self, other: &SvInt) -> SvInt {
        let w = self.width;
        let signed = self.signed && other.signed;
        let four_state = self.four_state || other.four_state;
        if self.has_unknown() || other.has_unknown() {
            return SvInt::filled_x(w, signed);
        }
        let base = self.interp(signed);
        let exp = other.interp(signed);
        if exp.sign() == Sign::Minus {
            // Negative exponents only have defined results for |base| <= 1.
            let r = if base.is_one() {
                BigInt::one()
            } else if base == BigInt::from(-1) {
                if (exp.magnitude() & BigUint::one()).is_one() {
                    BigInt::from(-1)
                } else {
                    BigInt::one()
                }
            } else if base.is_zero() {
                return SvInt::filled_x(w, signed);
            } else {
                BigInt::zero()
            };
            return SvInt::from_bigint(w, signed, four_state, &r);
        }
        let modulus = BigUint::one() << w as usize;
        let encoded = SvInt::from_bigint(w, signed, four_state, &base);
        let r = encoded.value.modpow(exp.magnitude(), &modulus);
        SvInt::from_biguint(w, signed, four_state, r)
    }

    /// Negation at this value's width.
    pub fn neg(&self) -> SvInt {
        if self.has_unknown() {
            return SvInt::filled_x(self.width, self.signed);
        }
        let modulus = BigUint::one() << self.width as usize;
        SvInt::from_biguint(
            self.width,
            self.signed,
            self.four_state,
            (modulus - &self.value) & mask(self.width),
        )
    }

    fn known_zeros(&self, width: u32) -> BigUint {
        // Bits that are known and zero, at the extended width.
        let e = self.extend(width, self.signed);
        mask(width) ^ (e.value | e.xz)
    }

    /// Bitwise AND. A known zero on either side dominates an unknown.
    pub fn and(&self, other: &SvInt) -> SvInt {
        let (w, signed, four_state) = self.result_shape(other);
        let a = self.extend(w, self.signed);
        let b = other.extend(w, other.signed);
        let k0 = self.known_zeros(w) | other.known_zeros(w);
        let xz = (a.xz | b.xz) & (mask(w) ^ &k0);
        let value = (a.value & b.value) & (mask(w) ^ &xz);
        SvInt::with_planes(w, signed, four_state, value, xz, BigUint::zero())
    }

    /// Bitwise OR. A known one on either side dominates an unknown.
    pub fn or(&self, other: &SvInt) -> SvInt {
        let (w, signed, four_state) = self.result_shape(other);
        let a = self.extend(w, self.signed);
        let b = other.extend(w, other.signed);
        let k1 = (&a.value & (mask(w) ^ &a.xz)) | (&b.value & (mask(w) ^ &b.xz));
        let xz = (a.xz | b.xz) & (mask(w) ^ &k1);
        let value = (a.value | b.value) & (mask(w) ^ &xz);
        SvInt::with_planes(w, signed, four_state, value, xz, BigUint::zero())
    }

    /// Bitwise XOR. Any unknown bit makes the result bit X.
    pub fn xor(&self, other: &SvInt) -> SvInt {
        let (w, signed, four_state) = self.result_shape(other);
        let a = self.extend(w, self.signed);
        let b = other.extend(w, other.signed);
        let xz = &a.xz | &b.xz;
        let value = (a.value ^ b.value) & (mask(w) ^ &xz);
        SvInt::with_planes(w, signed, four_state, value, xz, BigUint::zero())
    }

    /// Bitwise XNOR.
    pub fn xnor(&self, other: &SvInt) -> SvInt {
        self.xor(other).not()
    }

    /// Bitwise complement. X and Z both invert to X.
    pub fn not(&self) -> SvInt {
        let m = mask(self.width);
        let value = (&m ^ &self.value) & (&m ^ &self.xz);
        SvInt::with_planes(
            self.width,
            self.signed,
            self.four_state,
            value,
            self.xz.clone(),
            BigUint::zero(),
        )
    }

    /// Logical shift left. The result keeps the left operand's shape.
    pub fn shl(&self, amount: u32) -> SvInt {
        if amount >= self.width {
            return SvInt::zero(self.width, self.signed, self.four_state);
        }
        SvInt::with_planes(
            self.width,
            self.signed,
            self.four_state,
            &self.value << amount as usize,
            &self.xz << amount as usize,
            &self.z << amount as usize,
        )
    }

    /// Logical shift right, filling with zeros.
    pub fn lshr(&self, amount: u32) -> SvInt {
        if amount >= self.width {
            return SvInt::zero(self.width, self.signed, self.four_state);
        }
        SvInt::with_planes(
            self.width,
            self.signed,
            self.four_state,
            &self.value >> amount as usize,
            &self.xz >> amount as usize,
            &self.z >> amount as usize,
        )
    }

    /// Arithmetic shift right. Signed values replicate the MSB, including
    /// its X/Z state.
    pub fn ashr(&self, amount: u32) -> SvInt {
        if !self.signed {
            return self.lshr(amount);
        }
        let amount = amount.min(self.width);
        let keep = self.width - amount;
        let fill = if amount == 0 {
            BigUint::zero()
        } else {
            mask(amount) << keep as usize
        };
        let mut value = &self.value >> amount as usize;
        let mut xz = &self.xz >> amount as usize;
        let mut z = &self.z >> amount as usize;
        match self.bit(self.width.saturating_sub(1)) {
            Logic::One => value |= fill,
            Logic::X => xz |= fill,
            Logic::Z => {
                xz |= fill.clone();
                z |= fill;
            }
            Logic::Zero => (),
        }
        SvInt::with_planes(self.width, self.signed, self.four_state, value, xz, z)
    }

    /// Logical equality. Returns a one-bit value that is X if any operand
    /// bit is unknown.
    pub fn logic_eq(&self, other: &SvInt) -> SvInt {
        let four_state = self.four_state || other.four_state;
        if self.has_unknown() || other.has_unknown() {
            return SvInt::filled_x(1, false);
        }
        let (_, _, a, b) = self.common(other);
        SvInt::from_u64(1, false, (a == b) as u64).with_domain(four_state)
    }

    /// Logical inequality.
    pub fn logic_ne(&self, other: &SvInt) -> SvInt {
        self.logic_eq(other).logic_not()
    }

    /// Case equality: compares bit-exact including X/Z and always yields a
    /// known one-bit result.
    pub fn case_eq(&self, other: &SvInt) -> bool {
        let w = max(self.width, other.width);
        let a = self.extend(w, self.signed);
        let b = other.extend(w, other.signed);
        a.value == b.value && a.xz == b.xz && a.z == b.z
    }

    /// Wildcard equality: X/Z bits in the right operand are don't-care.
    pub fn wildcard_eq(&self, other: &SvInt) -> SvInt {
        let w = max(self.width, other.width);
        let a = self.extend(w, self.signed);
        let b = other.extend(w, other.signed);
        let care = mask(w) ^ &b.xz;
        if !(&a.xz & &care).is_zero() {
            return SvInt::filled_x(1, false);
        }
        let eq = (&a.value & &care) == (&b.value & &care);
        SvInt::from_u64(1, false, eq as u64)
    }

    fn order(&self, other: &SvInt) -> Option<Ordering> {
        if self.has_unknown() || other.has_unknown() {
            return None;
        }
        let signed = self.signed && other.signed;
        Some(self.interp(signed).cmp(&other.interp(signed)))
    }

    /// Relational `<`. One-bit result, X on any unknown.
    pub fn lt(&self, other: &SvInt) -> SvInt {
        self.relational(other, |o| o == Ordering::Less)
    }

    /// Relational `<=`.
    pub fn le(&self, other: &SvInt) -> SvInt {
        self.relational(other, |o| o != Ordering::Greater)
    }

    /// Relational `>`.
    pub fn gt(&self, other: &SvInt) -> SvInt {
        self.relational(other, |o| o == Ordering::Greater)
    }

    /// Relational `>=`.
    pub fn ge(&self, other: &SvInt) -> SvInt {
        self.relational(other, |o| o != Ordering::Less)
    }

    fn relational(&self, other: &SvInt, f: impl FnOnce(Ordering) -> bool) -> SvInt {
        match self.order(other) {
            Some(o) => SvInt::from_u64(1, false, f(o) as u64),
            None => SvInt::filled_x(1, false),
        }
    }

    /// Logical truthiness: `Some(true)` for a known nonzero value,
    /// `Some(false)` for known zero, `None` if the answer depends on
    /// unknown bits.
    pub fn to_bool(&self) -> Option<bool> {
        if !self.value.is_zero() {
            // A known one bit makes the value true regardless of X bits.
            Some(true)
        } else if self.has_unknown() {
            None
        } else {
            Some(false)
        }
    }

    /// Logical negation of a value used as a predicate.
    pub fn logic_not(&self) -> SvInt {
        match self.to_bool() {
            Some(b) => SvInt::from_u64(1, false, !b as u64),
            None => SvInt::filled_x(1, false),
        }
    }

    /// Reduction AND. A known zero bit dominates any X.
    pub fn reduce_and(&self) -> SvInt {
        if !self.known_zeros(self.width).is_zero() {
            SvInt::from_u64(1, false, 0)
        } else if self.has_unknown() {
            SvInt::filled_x(1, false)
        } else {
            SvInt::from_u64(1, false, 1)
        }
    }

    /// Reduction OR. A known one bit dominates any X.
    pub fn reduce_or(&self) -> SvInt {
        if !self.value.is_zero() {
            SvInt::from_u64(1, false, 1)
        } else if self.has_unknown() {
            SvInt::filled_x(1, false)
        } else {
            SvInt::from_u64(1, false, 0)
        }
    }

    /// Reduction XOR: the parity of the value bits, X if any bit is unknown.
    pub fn reduce_xor(&self) -> SvInt {
        if self.has_unknown() {
            return SvInt::filled_x(1, false);
        }
        let parity = self.value.count_ones() & 1;
        SvInt::from_u64(1, false, parity)
    }

    /// Merge two values bit by bit: positions where both sides agree keep
    /// their state, positions that differ become X. Used to evaluate a
    /// conditional whose predicate has unknown bits.
    pub fn merge(&self, other: &SvInt) -> SvInt {
        let w = max(self.width, other.width);
        let a = self.extend(w, self.signed);
        let b = other.extend(w, other.signed);
        let diff = (&a.value ^ &b.value) | (&a.xz ^ &b.xz) | (&a.z ^ &b.z);
        let xz = (&a.xz & &b.xz & (mask(w) ^ &diff)) | &diff;
        let z = &a.z & &b.z & (mask(w) ^ &diff);
        let value = a.value & (mask(w) ^ &xz);
        SvInt::with_planes(w, self.signed && other.signed, true, value, xz, z)
    }

    /// Concatenate values, first operand in the most significant position.
    /// The result is unsigned.
    pub fn concat(operands: &[SvInt]) -> SvInt {
        assert!(!operands.is_empty());
        let width: u32 = operands.iter().map(|o| o.width).sum();
        let four_state = operands.iter().any(|o| o.four_state);
        let mut value = BigUint::zero();
        let mut xz = BigUint::zero();
        let mut z = BigUint::zero();
        for op in operands {
            value = (value << op.width as usize) | &op.value;
            xz = (xz << op.width as usize) | &op.xz;
            z = (z << op.width as usize) | &op.z;
        }
        SvInt::with_planes(width, false, four_state, value, xz, z)
    }

    /// Replicate this value `count` times.
    pub fn replicate(&self, count: u32) -> SvInt {
        assert!(count > 0);
        let ops: Vec<SvInt> = std::iter::repeat(self.clone()).take(count as usize).collect();
        SvInt::concat(&ops)
    }

    /// Extract `width` bits starting at bit `lsb`. Positions beyond this
    /// value read as X in the four-state domain and as 0 otherwise.
    pub fn slice(&self, lsb: u32, width: u32) -> SvInt {
        assert!(width > 0);
        let value = &self.value >> lsb as usize;
        let mut xz = &self.xz >> lsb as usize;
        let z = &self.z >> lsb as usize;
        let avail = self.width.saturating_sub(lsb);
        if avail < width && self.four_state {
            xz |= mask(width - avail) << avail as usize;
        }
        SvInt::with_planes(width, false, self.four_state, value, xz, z)
    }

    /// Overwrite `other.width()` bits starting at `lsb`, preserving all
    /// other bits including their X/Z state.
    pub fn set_slice(&self, lsb: u32, other: &SvInt) -> SvInt {
        assert!(lsb + other.width() <= self.width);
        let hole = mask(self.width) ^ (mask(other.width) << lsb as usize);
        let value = (&self.value & &hole) | (&other.value << lsb as usize);
        let xz = (&self.xz & &hole) | (&other.xz << lsb as usize);
        let z = (&self.z & &hole) | (&other.z << lsb as usize);
        SvInt::with_planes(self.width, self.signed, self.four_state, value, xz, z)
    }

    /// Format the value as a canonical binary literal, e.g. `4'b10x0`.
    pub fn to_literal(&self) -> String {
        let mut s = format!("{}'{}{}", self.width, if self.signed { "s" } else { "" }, 'b');
        for i in (0..self.width).rev() {
            s.push(self.bit(i).to_char());
        }
        s
    }
}

impl fmt::Display for SvInt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.has_unknown() {
            write!(f, "{}", self.to_literal())
        } else {
            write!(
                f,
                "{}'{}{}{}",
                self.width,
                if self.signed { "s" } else { "" },
                LiteralBase::Decimal.to_char(),
                self.value
            )
        }
    }
}

impl fmt::Debug for SvInt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(s: &str) -> SvInt {
        // Parse "4'b10x0" style strings for test brevity.
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

    #[test]
    fn literal_masking() {
        assert_eq!(lit("4'hff").as_u64(), Some(0xf));
        assert_eq!(lit("8'd300").as_u64(), Some(300 % 256));
    }

    #[test]
    fn unknown_literal_extension() {
        // A leading x extends to the full width; a leading known digit
        // zero extends.
        let v = lit("8'bx1");
        assert_eq!(v.bit(7), Logic::X);
        assert_eq!(v.bit(1), Logic::X);
        assert_eq!(v.bit(0), Logic::One);
        let v = lit("8'b1z");
        assert_eq!(v.bit(7), Logic::Zero);
        assert_eq!(v.bit(0), Logic::Z);
    }

    #[test]
    fn x_propagation_in_addition() {
        let a = lit("4'b10x0");
        let b = lit("4'b0001");
        let r = a.add(&b);
        assert_eq!(r.width(), 4);
        assert!(r.is_four_state());
        assert!(r.case_eq(&SvInt::filled_x(4, false)));
    }

    #[test]
    fn extend_truncate_roundtrip() {
        for s in &["4'b10x0", "4'b1010", "4'sb1z01"] {
            let v = lit(s);
            for w in 4..10 {
                for &signed in &[false, true] {
                    let round = v.extend(w, signed).truncate(v.width()).as_signed(v.is_signed());
                    assert!(round.case_eq(&v), "{} via width {}", s, w);
                    assert_eq!(round, v.clone(), "{} via width {}", s, w);
                }
            }
        }
    }

    #[test]
    fn literal_roundtrip() {
        for s in &["4'b10x0", "12'shabc", "8'b1z01_0x10", "1'b1"] {
            let v = lit(s);
            let formatted = v.to_literal();
            let again = lit(&formatted);
            assert_eq!(v, again, "roundtrip of {} via {}", s, formatted);
        }
    }

    #[test]
    fn modular_arithmetic_matches_twos_complement() {
        for a in 0u64..16 {
            for b in 0u64..16 {
                let x = SvInt::from_u64(4, false, a);
                let y = SvInt::from_u64(4, false, b);
                assert_eq!(x.add(&y).as_u64(), Some((a + b) & 0xf));
                assert_eq!(x.sub(&y).as_u64(), Some(a.wrapping_sub(b) & 0xf));
                assert_eq!(x.mul(&y).as_u64(), Some((a * b) & 0xf));
            }
        }
    }

    #[test]
    fn signed_division() {
        let a = SvInt::from_bigint(8, true, false, &BigInt::from(-7));
        let b = SvInt::from_bigint(8, true, false, &BigInt::from(2));
        assert_eq!(a.div(&b).to_bigint(), Some(BigInt::from(-3)));
        assert_eq!(a.rem(&b).to_bigint(), Some(BigInt::from(-1)));
    }

    #[test]
    fn division_by_zero_is_all_x() {
        let a = lit("8'd10");
        let b = lit("8'd0");
        let r = a.div(&b);
        assert_eq!(r.width(), 8);
        assert!(r.case_eq(&SvInt::filled_x(8, false)));
    }

    #[test]
    fn identities() {
        for s in &["4'b1010", "7'd99", "16'shbeef"] {
            let x = lit(s);
            let zero = SvInt::zero(x.width(), x.is_signed(), false);
            let one = SvInt::from_u64(x.width(), x.is_signed(), 1);
            assert_eq!(x.add(&zero).as_u64(), x.as_u64());
            assert_eq!(x.mul(&one).as_u64(), x.as_u64());
            assert!(x.and(&x).case_eq(&x));
            assert!(x.or(&x).case_eq(&x));
        }
    }

    #[test]
    fn de_morgan_with_unknowns() {
        for (a, b) in &[("4'b10x0", "4'b110z"), ("4'b01xz", "4'bzzzz"), ("4'b1010", "4'b0110")] {
            let a = lit(a);
            let b = lit(b);
            let lhs = a.and(&b).not();
            let rhs = a.not().or(&b.not());
            assert!(lhs.case_eq(&rhs), "~({} & {})", a, b);
        }
    }

    #[test]
    fn known_bits_dominate() {
        // AND with a known 0 stays 0; OR with a known 1 stays 1.
        let x = lit("4'bxxxx");
        assert_eq!(x.and(&lit("4'b0000")).as_u64(), Some(0));
        assert!(x.or(&lit("4'b1111")).case_eq(&lit("4'b1111")));
        assert!(x.and(&lit("4'b1111")).case_eq(&lit("4'bxxxx")));
    }

    #[test]
    fn case_and_logic_equality() {
        let a = lit("3'b01x");
        assert!(a.case_eq(&lit("3'b01x")));
        assert!(!a.case_eq(&lit("3'b010")));
        // Logical equality cannot decide with unknowns in play.
        assert!(a.logic_eq(&lit("3'b010")).has_unknown());
        assert_eq!(lit("3'b010").logic_eq(&lit("3'b010")).as_u64(), Some(1));
    }

    #[test]
    fn wildcard_equality() {
        let v = lit("4'b1011");
        assert_eq!(v.wildcard_eq(&lit("4'b10xx")).as_u64(), Some(1));
        assert_eq!(v.wildcard_eq(&lit("4'b00xx")).as_u64(), Some(0));
    }

    #[test]
    fn reductions() {
        assert_eq!(lit("4'b1111").reduce_and().as_u64(), Some(1));
        assert_eq!(lit("4'b1x11").reduce_and().to_bool(), None);
        assert_eq!(lit("4'b0x11").reduce_and().as_u64(), Some(0));
        assert_eq!(lit("4'b0x00").reduce_or().to_bool(), None);
        assert_eq!(lit("4'b0x10").reduce_or().as_u64(), Some(1));
        assert_eq!(lit("4'b0110").reduce_xor().as_u64(), Some(0));
        assert_eq!(lit("4'b1110").reduce_xor().as_u64(), Some(1));
    }

    #[test]
    fn shifts() {
        let v = lit("8'sb1x00_0000");
        let r = v.ashr(2);
        assert_eq!(r.bit(7), Logic::One);
        assert_eq!(r.bit(6), Logic::One);
        assert_eq!(r.bit(5), Logic::One);
        assert_eq!(r.bit(4), Logic::X);
        let u = lit("8'b1100_0000").lshr(2);
        assert_eq!(u.as_u64(), Some(0b0011_0000));
        let l = lit("8'b0000_1101").shl(4);
        assert_eq!(l.as_u64(), Some(0b1101_0000));
    }

    #[test]
    fn arithmetic_shift_fills_x_from_unknown_msb() {
        let v = lit("4'sbx001");
        let r = v.ashr(1);
        assert_eq!(r.bit(3), Logic::X);
        assert_eq!(r.bit(2), Logic::X);
        assert_eq!(r.bit(1), Logic::Zero);
        assert_eq!(r.bit(0), Logic::Zero);
    }

    #[test]
    fn concat_and_replicate() {
        let r = SvInt::concat(&[lit("4'b10x0"), lit("4'b0001")]);
        assert_eq!(r.width(), 8);
        assert!(r.case_eq(&lit("8'b10x0_0001")));
        let rep = lit("2'b1z").replicate(3);
        assert!(rep.case_eq(&lit("6'b1z1z1z")));
    }

    #[test]
    fn slice_and_set_slice() {
        let v = lit("8'b0000_0000");
        let w = v.set_slice(0, &lit("4'b1x01"));
        assert!(w.case_eq(&lit("8'b0000_1x01")));
        assert!(w.slice(0, 4).case_eq(&lit("4'b1x01")));
        assert!(w.slice(4, 4).case_eq(&lit("4'b0000")));
    }

    #[test]
    fn relational_sign_handling() {
        let a = SvInt::from_bigint(8, true, false, &BigInt::from(-1));
        let b = SvInt::from_u64(8, true, 1);
        assert_eq!(a.lt(&b).as_u64(), Some(1));
        // Unsigned comparison sees 255 > 1.
        assert_eq!(a.as_signed(false).lt(&b).as_u64(), Some(0));
        assert!(a.lt(&lit("8'b0000_000x")).has_unknown());
    }
}
