//! Type model for generated programs.
//!
//! Generated programs only use the eight Java primitive types and
//! one-dimensional arrays of them. A [`TypeRef`] is a primitive kind plus
//! an array flag, so arrays can never nest.

use std::fmt;

/// A primitive Java type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Int,
    Long,
    Short,
    Byte,
    Float,
    Double,
    Boolean,
    Char,
}

impl PrimitiveKind {
    /// Every primitive kind. Random declarations draw from this list.
    pub const ALL: [PrimitiveKind; 8] = [
        PrimitiveKind::Int,
        PrimitiveKind::Long,
        PrimitiveKind::Short,
        PrimitiveKind::Char,
        PrimitiveKind::Byte,
        PrimitiveKind::Float,
        PrimitiveKind::Double,
        PrimitiveKind::Boolean,
    ];

    /// Kinds usable as operands of `+`, `-` and `*`.
    pub const ARITHMETIC: [PrimitiveKind; 6] = [
        PrimitiveKind::Int,
        PrimitiveKind::Long,
        PrimitiveKind::Short,
        PrimitiveKind::Byte,
        PrimitiveKind::Float,
        PrimitiveKind::Double,
    ];

    /// Source keyword for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Char => "char",
        }
    }

    /// Returns true for `byte`, `short`, `int` and `long`.
    pub fn is_integral(self) -> bool {
        self.bit_width().is_some()
    }

    /// Returns true for `float` and `double`.
    pub fn is_floating(self) -> bool {
        matches!(self, PrimitiveKind::Float | PrimitiveKind::Double)
    }

    /// Returns true for integral and floating kinds. `char` and `boolean`
    /// are deliberately excluded.
    pub fn is_arithmetic(self) -> bool {
        self.is_integral() || self.is_floating()
    }

    /// Two's-complement width of an integral kind.
    pub fn bit_width(self) -> Option<u32> {
        match self {
            PrimitiveKind::Byte => Some(8),
            PrimitiveKind::Short => Some(16),
            PrimitiveKind::Int => Some(32),
            PrimitiveKind::Long => Some(64),
            _ => None,
        }
    }

    /// Inclusive value range of an integral kind.
    pub fn integral_range(self) -> Option<(i64, i64)> {
        let bits = self.bit_width()?;
        let min = i64::MIN >> (64 - bits);
        let max = i64::MAX >> (64 - bits);
        Some((min, max))
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A type that can appear in a generated declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeRef {
    /// Element kind (the type itself for scalars).
    pub kind: PrimitiveKind,
    /// Whether this is a one-dimensional array of `kind`.
    pub is_array: bool,
}

impl TypeRef {
    pub const INT: TypeRef = TypeRef::scalar(PrimitiveKind::Int);
    pub const BOOLEAN: TypeRef = TypeRef::scalar(PrimitiveKind::Boolean);

    /// A scalar type.
    pub const fn scalar(kind: PrimitiveKind) -> Self {
        Self { kind, is_array: false }
    }

    /// An array of `kind`.
    pub const fn array(kind: PrimitiveKind) -> Self {
        Self { kind, is_array: true }
    }

    /// The element type: the scalar type itself, or the array's element.
    pub fn element(self) -> TypeRef {
        TypeRef::scalar(self.kind)
    }

    /// Name fragment used when deriving identifiers (`int[]` becomes `intArr`).
    pub fn name_stem(self) -> String {
        if self.is_array {
            format!("{}Arr", self.kind)
        } else {
            self.kind.to_string()
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_array {
            write!(f, "{}[]", self.kind)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_subsets() {
        for kind in PrimitiveKind::ALL {
            if kind.is_integral() || kind.is_floating() {
                assert!(kind.is_arithmetic(), "{kind} should be arithmetic");
            }
            assert!(!(kind.is_integral() && kind.is_floating()));
        }
        assert!(!PrimitiveKind::Char.is_arithmetic());
        assert!(!PrimitiveKind::Boolean.is_arithmetic());
        assert_eq!(PrimitiveKind::ARITHMETIC.len(), 6);
        assert!(PrimitiveKind::ARITHMETIC.iter().all(|k| k.is_arithmetic()));
    }

    #[test]
    fn test_integral_ranges() {
        assert_eq!(PrimitiveKind::Byte.integral_range(), Some((-128, 127)));
        assert_eq!(PrimitiveKind::Short.integral_range(), Some((-32768, 32767)));
        assert_eq!(
            PrimitiveKind::Int.integral_range(),
            Some((i32::MIN as i64, i32::MAX as i64))
        );
        assert_eq!(PrimitiveKind::Long.integral_range(), Some((i64::MIN, i64::MAX)));
        assert_eq!(PrimitiveKind::Double.integral_range(), None);
    }

    #[test]
    fn test_display_and_stem() {
        let arr = TypeRef::array(PrimitiveKind::Double);
        assert_eq!(arr.to_string(), "double[]");
        assert_eq!(arr.name_stem(), "doubleArr");
        assert_eq!(arr.element(), TypeRef::scalar(PrimitiveKind::Double));
        assert_eq!(TypeRef::INT.name_stem(), "int");
    }
}
