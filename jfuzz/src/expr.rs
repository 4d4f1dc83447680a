//! Expression synthesis.
//!
//! Expressions are built top-down from a target type. Recursion stops at
//! the configured depth, at random, or for `char` targets; the resulting
//! leaf is a (cast) variable read or a literal. Compound arithmetic
//! expressions are wrapped in a cast to the target type because Java
//! promotes `byte`/`short` operands to `int`.

use rand::Rng;
use tracing::trace;

use crate::generator::Generator;
use crate::literal::literal_for;
use crate::types::{PrimitiveKind, TypeRef};
use crate::{GenError, GenResult};

/// Exclusive upper bound of literal shift distances.
pub const MAX_SHIFT: u32 = 5;

/// Relational operators comparing two arithmetic operands.
pub const COMPARISON_OPERATORS: [&str; 6] = [">", ">=", "==", "!=", "<", "<="];

/// Boolean combinators.
pub const LOGICAL_OPERATORS: [&str; 2] = ["&&", "||"];

/// Operators of compound arithmetic expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Mul,
    Sub,
    BitAnd,
    BitOr,
    /// Unary `~`.
    BitNot,
    BitXor,
    Shr,
    Shl,
    UShr,
}

impl ArithOp {
    /// Operators valid for every arithmetic type.
    pub const COMMON: [ArithOp; 3] = [ArithOp::Add, ArithOp::Mul, ArithOp::Sub];

    /// Operators valid for integral types.
    pub const INTEGRAL: [ArithOp; 10] = [
        ArithOp::Add,
        ArithOp::Mul,
        ArithOp::Sub,
        ArithOp::BitAnd,
        ArithOp::BitOr,
        ArithOp::BitNot,
        ArithOp::BitXor,
        ArithOp::Shr,
        ArithOp::Shl,
        ArithOp::UShr,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Mul => "*",
            ArithOp::Sub => "-",
            ArithOp::BitAnd => "&",
            ArithOp::BitOr => "|",
            ArithOp::BitNot => "~",
            ArithOp::BitXor => "^",
            ArithOp::Shr => ">>",
            ArithOp::Shl => "<<",
            ArithOp::UShr => ">>>",
        }
    }

    pub fn is_shift(self) -> bool {
        matches!(self, ArithOp::Shr | ArithOp::Shl | ArithOp::UShr)
    }

    /// Operators available for `kind`.
    pub fn for_kind(kind: PrimitiveKind) -> &'static [ArithOp] {
        if kind.is_integral() {
            &Self::INTEGRAL
        } else {
            &Self::COMMON
        }
    }
}

impl<R: Rng> Generator<R> {
    /// Emits an expression of type `target`, `depth` levels below the
    /// outermost expression.
    pub fn expression(&mut self, target: TypeRef, depth: usize) -> GenResult<()> {
        if target.is_array {
            return Err(GenError::UnsupportedType {
                ty: target,
                context: "expression synthesis",
            });
        }

        let is_leaf = depth >= self.config.max_expression_depth
            || self.rng.gen_bool(self.config.probabilities.leaf)
            || target.kind == PrimitiveKind::Char;
        if is_leaf {
            return self.leaf(target);
        }

        match target.kind {
            PrimitiveKind::Boolean => self.boolean_expression(depth),
            kind if kind.is_arithmetic() => self.arithmetic_expression(kind, depth),
            _ => Err(GenError::UnsupportedType {
                ty: target,
                context: "compound expression",
            }),
        }
    }

    /// Emits a variable read of a compatible type, or a literal when
    /// nothing compatible is visible.
    pub(crate) fn leaf(&mut self, target: TypeRef) -> GenResult<()> {
        let token = match self.variable_read(target.kind) {
            Some(read) => read,
            None => literal_for(&mut self.rng, target)?,
        };
        self.out.token(token);
        Ok(())
    }

    /// Renders a read of a random visible variable as type `kind`.
    ///
    /// Arithmetic targets accept any arithmetic variable behind a cast;
    /// `boolean` and `char` need an exact element match. Array elements
    /// are read at an in-bounds literal index.
    fn variable_read(&mut self, kind: PrimitiveKind) -> Option<String> {
        let var = if kind.is_arithmetic() {
            self.scopes.lookup(&mut self.rng, |k| k.is_arithmetic())?
        } else {
            self.scopes.lookup(&mut self.rng, |k| k == kind)?
        };

        if var.ty() == TypeRef::scalar(kind) {
            return Some(var.name().to_string());
        }

        let index = if var.ty().is_array {
            format!("[{}]", self.rng.gen_range(0..var.array_size()))
        } else {
            String::new()
        };
        if kind.is_arithmetic() {
            Some(format!("({}){}{}", kind, var.name(), index))
        } else {
            Some(format!("{}{}", var.name(), index))
        }
    }

    /// Emits a comparison of two arithmetic operands or a logical
    /// combination of two boolean operands.
    fn boolean_expression(&mut self, depth: usize) -> GenResult<()> {
        let (operator, operand) = if self.rng.gen_bool(0.5) {
            let kind = self.pick(&PrimitiveKind::ARITHMETIC);
            (self.pick(&COMPARISON_OPERATORS), TypeRef::scalar(kind))
        } else {
            (self.pick(&LOGICAL_OPERATORS), TypeRef::BOOLEAN)
        };
        trace!("boolean `{}` over {} at depth {}", operator, operand, depth);

        self.parenthesized(|g| {
            g.expression(operand, depth + 1)?;
            g.out.token(operator);
            g.expression(operand, depth + 1)
        })
    }

    /// Emits `(kind) ( lhs op rhs )`.
    fn arithmetic_expression(&mut self, kind: PrimitiveKind, depth: usize) -> GenResult<()> {
        let op = self.pick(ArithOp::for_kind(kind));
        let target = TypeRef::scalar(kind);
        trace!("arithmetic `{}` for {} at depth {}", op.as_str(), kind, depth);

        self.parenthesized(|g| {
            g.out.token(kind.as_str());
            Ok(())
        })?;
        self.parenthesized(|g| {
            if op == ArithOp::BitNot {
                g.out.token(op.as_str());
                return g.expression(target, depth + 1);
            }
            g.expression(target, depth + 1)?;
            g.out.token(op.as_str());
            if op.is_shift() {
                let distance = g.rng.gen_range(0..MAX_SHIFT);
                g.out.token(distance.to_string());
                Ok(())
            } else {
                g.expression(target, depth + 1)
            }
        })
    }

    /// Emits an `int` expression normalized into `[0, n)`.
    pub fn modulo_expression(&mut self, n: usize) -> GenResult<()> {
        self.modulo_wrapped(n, |g| g.expression(TypeRef::INT, 0))
    }

    /// Emits `( ( raw ) % n + n ) % n`, which lies in `[0, n)` for any
    /// `int` value of `raw`.
    pub(crate) fn modulo_wrapped<F>(&mut self, n: usize, raw: F) -> GenResult<()>
    where
        F: FnOnce(&mut Self) -> GenResult<()>,
    {
        let n = n.to_string();
        self.parenthesized(|g| {
            g.parenthesized(raw)?;
            g.out.token("%");
            g.out.token(&n);
            g.out.token("+");
            g.out.token(&n);
            Ok(())
        })?;
        self.out.token("%");
        self.out.token(&n);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenConfig;
    use crate::literal::parse_integral;
    use crate::scope::Identifier;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn generator(seed: u64) -> Generator<StdRng> {
        Generator::new(GenConfig::default(), StdRng::seed_from_u64(seed))
    }

    /// Java's `((x % n) + n) % n` with truncating `%`.
    /// Evaluates emitted `( ( x ) % n + n ) % n` text with a literal `x`.
    /// Rust's `%` truncates toward zero like Java's.
    fn evaluate_modulo(text: &str) -> i64 {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let ["(", "(", raw, ")", "%", n1, "+", n2, ")", "%", n3] = tokens.as_slice() else {
            panic!("unexpected modulo shape: {text}");
        };
        let x = parse_integral(raw).unwrap();
        let [n1, n2, n3]: [i64; 3] = [n1, n2, n3].map(|n| n.parse().unwrap());
        ((x % n1) + n2) % n3
    }

    #[test]
    fn test_depth_bound_forces_leaf() {
        for seed in 0..200 {
            for kind in PrimitiveKind::ALL {
                let mut g = generator(seed);
                let depth = g.config.max_expression_depth;
                g.expression(TypeRef::scalar(kind), depth).unwrap();
                let text = g.out.as_str();
                // A leaf is a single token: no spaces, no operators.
                assert!(!text.trim().contains(' '), "{kind}: `{text}` is not a leaf");
            }
        }
    }

    #[test]
    fn test_char_is_always_leaf() {
        let mut g = generator(4);
        g.expression(TypeRef::scalar(PrimitiveKind::Char), 0).unwrap();
        assert!(g.out.as_str().trim().starts_with("(char)"));
    }

    #[test]
    fn test_leaf_prefers_visible_variable() {
        let mut g = generator(8);
        g.scopes.insert(Identifier::new("booleanVar_5", TypeRef::BOOLEAN));
        g.leaf(TypeRef::BOOLEAN).unwrap();
        assert_eq!(g.out.as_str(), "booleanVar_5");
    }

    #[test]
    fn test_arithmetic_leaf_casts_other_types() {
        let mut g = generator(8);
        g.scopes.insert(Identifier::new("longVar_5", TypeRef::scalar(PrimitiveKind::Long)));
        g.leaf(TypeRef::scalar(PrimitiveKind::Byte)).unwrap();
        assert_eq!(g.out.as_str(), "(byte)longVar_5");

        let mut g = generator(8);
        g.scopes.insert(Identifier::new("longVar_5", TypeRef::scalar(PrimitiveKind::Long)));
        g.leaf(TypeRef::scalar(PrimitiveKind::Long)).unwrap();
        assert_eq!(g.out.as_str(), "longVar_5");
    }

    #[test]
    fn test_array_reads_stay_in_bounds() {
        for size in 1..=5 {
            let mut g = generator(size as u64);
            let mut arr = Identifier::new("shortArrVar_1", TypeRef::array(PrimitiveKind::Short));
            arr.set_array_size(size);
            g.scopes.insert(arr);

            for _ in 0..100 {
                let read = g.variable_read(PrimitiveKind::Int).unwrap();
                let index: usize = read
                    .strip_prefix("(int)shortArrVar_1[")
                    .and_then(|rest| rest.strip_suffix(']'))
                    .unwrap()
                    .parse()
                    .unwrap();
                assert!(index < size, "index {index} out of bounds for {size}");
            }
        }
    }

    #[test]
    fn test_array_target_is_rejected() {
        let mut g = generator(0);
        let err = g.expression(TypeRef::array(PrimitiveKind::Int), 0).unwrap_err();
        assert!(matches!(err, GenError::UnsupportedType { .. }));
    }

    #[test]
    fn test_shift_operands_are_small_literals() {
        let mut found = false;
        for seed in 0..500 {
            let mut g = generator(seed);
            g.arithmetic_expression(PrimitiveKind::Int, g.config.max_expression_depth - 1)
                .unwrap();
            let tokens: Vec<&str> = g.out.as_str().split(' ').collect();
            if let Some(pos) = tokens.iter().position(|t| matches!(*t, ">>" | "<<" | ">>>")) {
                let distance: u32 = tokens[pos + 1].parse().unwrap();
                assert!(distance < MAX_SHIFT);
                found = true;
            }
        }
        assert!(found, "no shift drawn in 500 seeds");
    }

    #[test]
    fn test_floating_expressions_avoid_bitwise_operators() {
        for seed in 0..200 {
            let mut g = generator(seed);
            g.arithmetic_expression(PrimitiveKind::Double, 0).unwrap();
            let text = g.out.as_str();
            for op in ["&", "|", "^", "~", ">>", "<<"] {
                assert!(!text.split(' ').any(|t| t == op), "`{op}` in `{text}`");
            }
        }
    }

    #[test]
    fn test_modulo_normalizes_negative_value() {
        let mut g = generator(0);
        g.modulo_wrapped(5, |g| {
            g.out.token("-3");
            Ok(())
        })
        .unwrap();
        assert_eq!(g.out.as_str(), "( ( -3 ) % 5 + 5 ) % 5");
        assert_eq!(evaluate_modulo(g.out.as_str()), 2);
    }

    #[test]
    fn test_modulo_of_literal_is_in_range() {
        let config = GenConfig {
            max_expression_depth: 0,
            ..GenConfig::default()
        };
        for seed in 0..200 {
            let mut g = Generator::new(config.clone(), StdRng::seed_from_u64(seed));
            g.modulo_expression(7).unwrap();
            let value = evaluate_modulo(g.out.as_str());
            assert!((0..7).contains(&value), "{}", g.out.as_str());
        }
    }
}
