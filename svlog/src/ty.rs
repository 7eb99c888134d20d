// Copyright (c) 2024-2026 The mealy developers

//! The SystemVerilog type system, restricted to the types that can appear in
//! elaboration-time constant expressions.
//!
//! Types are interned: all type computations intern their result in the
//! compilation's arena and hand out `&'a TypeKind<'a>` references, such that
//! structurally equal types compare equal by pointer. Nominal types (structs
//! and enums) carry the id of their defining symbol, which keeps two
//! same-shaped but distinct declarations apart under interning.

use crate::svint::SvInt;
use mealy_common::name::Name;
use std::fmt;

/// A type.
pub type Type<'a> = &'a TypeKind<'a>;

/// The id of a nominal type's defining symbol. Allocated by the compilation
/// context; never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DefId(pub u32);

/// The different forms a type can assume.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind<'a> {
    /// A type error has already been diagnosed. Propagates silently.
    Error,
    /// The `void` type.
    Void,
    /// The type of the `null` literal.
    Null,
    /// An `event`.
    Event,
    /// A `string`.
    String,
    /// Any integral type: the integer vector and atom types, and anything
    /// else fully described by a width, sign, and value domain.
    Integral(IntegralType),
    /// A floating point type.
    Real(RealKind),
    /// An enum.
    Enum(EnumType<'a>),
    /// A packed or unpacked struct.
    Struct(StructType<'a>),
    /// A packed array.
    PackedArray {
        /// The element type. Must itself be packed.
        elem: Type<'a>,
        /// The dimension range.
        range: Range,
    },
    /// An unpacked array.
    UnpackedArray {
        /// The element type.
        elem: Type<'a>,
        /// The dimension range.
        range: Range,
    },
    /// A typedef. Transparent for all equivalence purposes.
    Named {
        /// The name the user gave the alias.
        name: Name,
        /// The aliased type.
        ty: Type<'a>,
    },
}

/// The width, sign, and domain of an integral type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntegralType {
    pub width: u32,
    pub signed: bool,
    pub four_state: bool,
}

/// A floating point type kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RealKind {
    ShortReal,
    Real,
    RealTime,
}

/// A struct type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructType<'a> {
    /// The defining symbol, for nominal identity.
    pub def: DefId,
    /// Whether this is a packed struct.
    pub packed: bool,
    /// The fields, in declaration order.
    pub fields: Vec<StructField<'a>>,
}

/// A member of a struct type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StructField<'a> {
    /// The field name.
    pub name: Name,
    /// The field type.
    pub ty: Type<'a>,
    /// For packed structs the bit offset of the field from the LSB; for
    /// unpacked structs the field index.
    pub offset: u32,
}

/// An enum type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumType<'a> {
    /// The defining symbol, for nominal identity.
    pub def: DefId,
    /// The integral base type.
    pub base: Type<'a>,
    /// The variants with their values, in declaration order.
    pub variants: Vec<(Name, SvInt)>,
}

/// A packed or unpacked dimension range, e.g. `[7:0]` or `[0:3]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    pub msb: i32,
    pub lsb: i32,
}

impl Range {
    /// Create a new range.
    pub fn new(msb: i32, lsb: i32) -> Range {
        Range { msb, lsb }
    }

    /// Create a range `[size-1:0]`.
    pub fn with_size(size: u32) -> Range {
        Range {
            msb: size as i32 - 1,
            lsb: 0,
        }
    }

    /// The number of elements covered by the range.
    pub fn size(&self) -> u32 {
        (self.msb - self.lsb).abs() as u32 + 1
    }

    /// Whether the range counts down towards the LSB, like `[7:0]`.
    pub fn is_descending(&self) -> bool {
        self.msb >= self.lsb
    }

    /// Check whether an index is within the range.
    pub fn contains(&self, index: i32) -> bool {
        if self.is_descending() {
            index >= self.lsb && index <= self.msb
        } else {
            index >= self.msb && index <= self.lsb
        }
    }

    /// Translate a source-level index into an offset from the least
    /// significant element. Returns `None` if the index is out of bounds.
    pub fn offset(&self, index: i32) -> Option<u32> {
        if !self.contains(index) {
            return None;
        }
        Some(if self.is_descending() {
            (index - self.lsb) as u32
        } else {
            (self.lsb - index) as u32
        })
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}:{}]", self.msb, self.lsb)
    }
}

// The predefined types. Interning treats these like any other type; they
// exist as statics so that code can refer to them without a context at hand.
pub static ERROR_TYPE: TypeKind<'static> = TypeKind::Error;
pub static VOID_TYPE: TypeKind<'static> = TypeKind::Void;
pub static NULL_TYPE: TypeKind<'static> = TypeKind::Null;
pub static EVENT_TYPE: TypeKind<'static> = TypeKind::Event;
pub static STRING_TYPE: TypeKind<'static> = TypeKind::String;
pub static LOGIC_TYPE: TypeKind<'static> = TypeKind::Integral(IntegralType {
    width: 1,
    signed: false,
    four_state: true,
});
pub static BIT_TYPE: TypeKind<'static> = TypeKind::Integral(IntegralType {
    width: 1,
    signed: false,
    four_state: false,
});
pub static BYTE_TYPE: TypeKind<'static> = TypeKind::Integral(IntegralType {
    width: 8,
    signed: true,
    four_state: false,
});
pub static SHORTINT_TYPE: TypeKind<'static> = TypeKind::Integral(IntegralType {
    width: 16,
    signed: true,
    four_state: false,
});
pub static INT_TYPE: TypeKind<'static> = TypeKind::Integral(IntegralType {
    width: 32,
    signed: true,
    four_state: false,
});
pub static INTEGER_TYPE: TypeKind<'static> = TypeKind::Integral(IntegralType {
    width: 32,
    signed: true,
    four_state: true,
});
pub static LONGINT_TYPE: TypeKind<'static> = TypeKind::Integral(IntegralType {
    width: 64,
    signed: true,
    four_state: false,
});
pub static TIME_TYPE: TypeKind<'static> = TypeKind::Integral(IntegralType {
    width: 64,
    signed: false,
    four_state: true,
});
pub static REAL_TYPE: TypeKind<'static> = TypeKind::Real(RealKind::Real);
pub static SHORTREAL_TYPE: TypeKind<'static> = TypeKind::Real(RealKind::ShortReal);
pub static REALTIME_TYPE: TypeKind<'static> = TypeKind::Real(RealKind::RealTime);

/// How one type may be assigned to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionKind {
    /// The assignment is legal as written; a conversion node adjusts width
    /// and representation silently.
    Implicit,
    /// The assignment is only legal through an explicit cast.
    Explicit,
    /// The types are not assignment compatible.
    None,
}

impl<'a> TypeKind<'a> {
    /// Resolve typedefs to their canonical representative.
    pub fn resolve(&self) -> &Self {
        match self {
            TypeKind::Named { ty, .. } => ty.resolve(),
            other => other,
        }
    }

    /// Check if this is the error tombstone.
    pub fn is_error(&self) -> bool {
        matches!(self.resolve(), TypeKind::Error)
    }

    /// Check if this type is integral after flattening: integral scalars,
    /// enums, packed arrays, and packed structs.
    pub fn is_integral(&self) -> bool {
        self.simple_bit_vector().is_some()
    }

    /// Check if this is a floating point type.
    pub fn is_real(&self) -> bool {
        matches!(self.resolve(), TypeKind::Real(_))
    }

    /// Check if this is the string type.
    pub fn is_string(&self) -> bool {
        matches!(self.resolve(), TypeKind::String)
    }

    /// Check if this type is an aggregate whose values are element
    /// sequences.
    pub fn is_aggregate(&self) -> bool {
        matches!(
            self.resolve(),
            TypeKind::UnpackedArray { .. } | TypeKind::Struct(StructType { packed: false, .. })
        )
    }

    /// Flatten this type to its equivalent simple bit vector, if it has one.
    pub fn simple_bit_vector(&self) -> Option<IntegralType> {
        match self.resolve() {
            TypeKind::Integral(it) => Some(*it),
            TypeKind::Enum(e) => e.base.simple_bit_vector(),
            TypeKind::PackedArray { elem, range } => {
                let inner = elem.simple_bit_vector()?;
                Some(IntegralType {
                    width: inner.width * range.size(),
                    signed: false,
                    four_state: inner.four_state,
                })
            }
            TypeKind::Struct(s) if s.packed => {
                let mut width = 0;
                let mut four_state = false;
                for field in &s.fields {
                    let inner = field.ty.simple_bit_vector()?;
                    width += inner.width;
                    four_state |= inner.four_state;
                }
                Some(IntegralType {
                    width,
                    signed: false,
                    four_state,
                })
            }
            _ => None,
        }
    }

    /// The packed bit width of this type.
    ///
    /// Panics on non-integral types; the caller is expected to have checked
    /// with `is_integral` first.
    pub fn width(&self) -> u32 {
        self.simple_bit_vector()
            .unwrap_or_else(|| panic!("width of non-integral type {}", self))
            .width
    }

    /// Whether the type's values live in the four-state domain.
    pub fn is_four_state(&self) -> bool {
        match self.resolve() {
            TypeKind::String => false,
            other => other
                .simple_bit_vector()
                .map(|it| it.four_state)
                .unwrap_or(false),
        }
    }

    /// Whether the type is signed.
    pub fn is_signed(&self) -> bool {
        self.simple_bit_vector().map(|it| it.signed).unwrap_or(false)
    }

    /// The element type of an array.
    pub fn element_type(&self) -> Option<Type<'a>> {
        match self.resolve() {
            TypeKind::PackedArray { elem, .. } | TypeKind::UnpackedArray { elem, .. } => {
                Some(*elem)
            }
            _ => None,
        }
    }

    /// The dimension range of an array.
    pub fn array_range(&self) -> Option<Range> {
        match self.resolve() {
            TypeKind::PackedArray { range, .. } | TypeKind::UnpackedArray { range, .. } => {
                Some(*range)
            }
            _ => None,
        }
    }

    /// The struct payload, if this is a struct.
    pub fn struct_type(&self) -> Option<&StructType<'a>> {
        match self.resolve() {
            TypeKind::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// The enum payload, if this is an enum.
    pub fn enum_type(&self) -> Option<&EnumType<'a>> {
        match self.resolve() {
            TypeKind::Enum(e) => Some(e),
            _ => None,
        }
    }

    /// Type equivalence: structural on integrals, nominal on structs and
    /// enums, element-and-shape equality on arrays.
    pub fn equivalent(&self, other: &Self) -> bool {
        let a = self.resolve();
        let b = other.resolve();
        match (a, b) {
            (TypeKind::Integral(x), TypeKind::Integral(y)) => x == y,
            (TypeKind::Enum(x), TypeKind::Enum(y)) => x.def == y.def,
            (TypeKind::Struct(x), TypeKind::Struct(y)) => {
                if x.packed && y.packed {
                    x.fields.len() == y.fields.len()
                        && x.fields
                            .iter()
                            .zip(&y.fields)
                            .all(|(f, g)| f.ty.equivalent(g.ty))
                } else {
                    x.def == y.def
                }
            }
            (
                TypeKind::PackedArray { elem: e1, range: r1 },
                TypeKind::PackedArray { elem: e2, range: r2 },
            )
            | (
                TypeKind::UnpackedArray { elem: e1, range: r1 },
                TypeKind::UnpackedArray { elem: e2, range: r2 },
            ) => r1.size() == r2.size() && e1.equivalent(e2),
            // A packed array of width n is equivalent to any integral of the
            // same shape.
            (TypeKind::PackedArray { .. }, TypeKind::Integral(_))
            | (TypeKind::Integral(_), TypeKind::PackedArray { .. }) => {
                a.simple_bit_vector() == b.simple_bit_vector()
            }
            _ => a == b,
        }
    }

    /// Assignment compatibility of `self` (the left-hand side) and `rhs`.
    pub fn assignable(&self, rhs: &Self) -> ConversionKind {
        let lhs = self.resolve();
        let rhs = rhs.resolve();
        // Errors have been diagnosed already; let them flow.
        if lhs.is_error() || rhs.is_error() {
            return ConversionKind::Implicit;
        }
        if lhs.equivalent(rhs) {
            return ConversionKind::Implicit;
        }
        // Assigning into an enum requires a cast unless the source is the
        // same enum, which `equivalent` covered above.
        if let TypeKind::Enum(_) = lhs {
            return if rhs.is_integral() {
                ConversionKind::Explicit
            } else {
                ConversionKind::None
            };
        }
        if lhs.is_integral() && rhs.is_integral() {
            return ConversionKind::Implicit;
        }
        // Strings pack to and from integrals.
        if (lhs.is_string() && rhs.is_integral()) || (lhs.is_integral() && rhs.is_string()) {
            return ConversionKind::Implicit;
        }
        if (lhs.is_real() && (rhs.is_integral() || rhs.is_real()))
            || (lhs.is_integral() && rhs.is_real())
        {
            return ConversionKind::Implicit;
        }
        // Aggregates convert element-wise if the shapes line up.
        match (lhs, rhs) {
            (
                TypeKind::UnpackedArray { elem: e1, range: r1 },
                TypeKind::UnpackedArray { elem: e2, range: r2 },
            ) if r1.size() == r2.size() => e1.assignable(e2),
            (TypeKind::Struct(s1), TypeKind::Struct(s2))
                if !s1.packed && !s2.packed && s1.fields.len() == s2.fields.len() =>
            {
                let mut worst = ConversionKind::Implicit;
                for (f, g) in s1.fields.iter().zip(&s2.fields) {
                    match f.ty.assignable(g.ty) {
                        ConversionKind::None => return ConversionKind::None,
                        ConversionKind::Explicit => worst = ConversionKind::Explicit,
                        ConversionKind::Implicit => (),
                    }
                }
                worst
            }
            (TypeKind::Null, TypeKind::Null) => ConversionKind::Implicit,
            _ => ConversionKind::None,
        }
    }
}

impl fmt::Display for TypeKind<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TypeKind::Error => write!(f, "<error>"),
            TypeKind::Void => write!(f, "void"),
            TypeKind::Null => write!(f, "null"),
            TypeKind::Event => write!(f, "event"),
            TypeKind::String => write!(f, "string"),
            TypeKind::Integral(it) => {
                // Prefer the keyword a user would have written.
                let kw = match (it.width, it.signed, it.four_state) {
                    (1, false, true) => Some("logic"),
                    (1, false, false) => Some("bit"),
                    (8, true, false) => Some("byte"),
                    (16, true, false) => Some("shortint"),
                    (32, true, false) => Some("int"),
                    (32, true, true) => Some("integer"),
                    (64, true, false) => Some("longint"),
                    (64, false, true) => Some("time"),
                    _ => None,
                };
                match kw {
                    Some(kw) => write!(f, "{}", kw),
                    None => write!(
                        f,
                        "{}{} [{}:0]",
                        if it.four_state { "logic" } else { "bit" },
                        if it.signed { " signed" } else { "" },
                        it.width - 1
                    ),
                }
            }
            TypeKind::Real(RealKind::Real) => write!(f, "real"),
            TypeKind::Real(RealKind::ShortReal) => write!(f, "shortreal"),
            TypeKind::Real(RealKind::RealTime) => write!(f, "realtime"),
            TypeKind::Enum(_) => write!(f, "enum"),
            TypeKind::Struct(s) => {
                write!(f, "struct {}{{...}}", if s.packed { "packed " } else { "" })
            }
            TypeKind::PackedArray { elem, range } => write!(f, "{} {}", elem, range),
            TypeKind::UnpackedArray { elem, range } => write!(f, "{} $ {}", elem, range),
            TypeKind::Named { name, .. } => write!(f, "{}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_equivalence_is_structural() {
        let a = TypeKind::Integral(IntegralType {
            width: 32,
            signed: true,
            four_state: false,
        });
        assert!(a.equivalent(&INT_TYPE));
        assert!(!a.equivalent(&INTEGER_TYPE));
        assert!(!LOGIC_TYPE.equivalent(&BIT_TYPE));
    }

    #[test]
    fn packed_array_flattens_to_bit_vector() {
        let arr = TypeKind::PackedArray {
            elem: &LOGIC_TYPE,
            range: Range::new(7, 0),
        };
        let sbv = arr.simple_bit_vector().unwrap();
        assert_eq!(sbv.width, 8);
        assert!(sbv.four_state);
        assert!(!sbv.signed);
        let as_int = TypeKind::Integral(sbv);
        assert!(arr.equivalent(&as_int));
    }

    #[test]
    fn range_indexing() {
        let descending = Range::new(7, 0);
        assert_eq!(descending.size(), 8);
        assert_eq!(descending.offset(7), Some(7));
        assert_eq!(descending.offset(0), Some(0));
        assert_eq!(descending.offset(8), None);
        let ascending = Range::new(0, 3);
        assert_eq!(ascending.size(), 4);
        assert_eq!(ascending.offset(0), Some(3));
        assert_eq!(ascending.offset(3), Some(0));
    }

    #[test]
    fn assignability() {
        assert_eq!(INT_TYPE.assignable(&LOGIC_TYPE), ConversionKind::Implicit);
        assert_eq!(STRING_TYPE.assignable(&INT_TYPE), ConversionKind::Implicit);
        assert_eq!(REAL_TYPE.assignable(&INT_TYPE), ConversionKind::Implicit);
        assert_eq!(INT_TYPE.assignable(&REAL_TYPE), ConversionKind::Implicit);
        assert_eq!(STRING_TYPE.assignable(&REAL_TYPE), ConversionKind::None);
        assert_eq!(EVENT_TYPE.assignable(&INT_TYPE), ConversionKind::None);
    }

    #[test]
    fn enums_are_nominal() {
        let base = &INT_TYPE;
        let e1 = TypeKind::Enum(EnumType {
            def: DefId(1),
            base,
            variants: vec![],
        });
        let e2 = TypeKind::Enum(EnumType {
            def: DefId(2),
            base,
            variants: vec![],
        });
        assert!(!e1.equivalent(&e2));
        assert!(e1.equivalent(&e1));
        assert_eq!(e1.assignable(&INT_TYPE), ConversionKind::Explicit);
        assert_eq!(INT_TYPE.assignable(&e1), ConversionKind::Implicit);
    }

    #[test]
    fn named_types_resolve_for_equivalence() {
        let alias = TypeKind::Named {
            name: mealy_common::name::intern("word_t"),
            ty: &INT_TYPE,
        };
        assert!(alias.equivalent(&INT_TYPE));
        assert!(alias.is_integral());
        assert_eq!(alias.width(), 32);
    }
}
