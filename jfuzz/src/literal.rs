//! Literal synthesis.

use rand::Rng;

use crate::types::{PrimitiveKind, TypeRef};
use crate::{GenError, GenResult};

/// Produces a literal token of type `ty`.
///
/// Integral literals are drawn uniformly from the full two's-complement
/// range of their width, floating literals from `[0, 1)`, and `char`
/// literals are written as a cast of a code unit in `[0, 2^16)`.
pub fn literal_for<R: Rng + ?Sized>(rng: &mut R, ty: TypeRef) -> GenResult<String> {
    if ty.is_array {
        return Err(GenError::UnsupportedType {
            ty,
            context: "literal synthesis",
        });
    }

    let literal = match ty.kind {
        PrimitiveKind::Boolean => {
            if rng.gen_bool(0.5) {
                "true".to_string()
            } else {
                "false".to_string()
            }
        }
        PrimitiveKind::Char => format!("(char){}", rng.gen_range(0..=u32::from(u16::MAX))),
        PrimitiveKind::Byte => rng.gen_range(i8::MIN..=i8::MAX).to_string(),
        PrimitiveKind::Short => rng.gen_range(i16::MIN..=i16::MAX).to_string(),
        PrimitiveKind::Int => rng.gen_range(i32::MIN..=i32::MAX).to_string(),
        PrimitiveKind::Long => format!("{}L", rng.gen_range(i64::MIN..=i64::MAX)),
        // Debug formatting keeps a fractional part or exponent, both valid Java.
        PrimitiveKind::Float => format!("{:?}F", rng.gen::<f64>()),
        PrimitiveKind::Double => format!("{:?}", rng.gen::<f64>()),
    };
    Ok(literal)
}

/// Parses an integral literal produced by [`literal_for`] back into its value.
pub fn parse_integral(literal: &str) -> Option<i64> {
    literal.strip_suffix('L').unwrap_or(literal).parse().ok()
}
