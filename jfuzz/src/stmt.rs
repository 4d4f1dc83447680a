//! Statement synthesis.
//!
//! Every block starts with a declaration so there is always something to
//! assign to, followed by randomly dispatched statements. Blocks open a
//! new scope frame; `if`, `for` and `switch` are only started while the
//! scope stack is within the configured depth, which bounds recursion.

use rand::seq::index;
use rand::Rng;
use tracing::trace;

use crate::generator::Generator;
use crate::scope::IdentKind;
use crate::types::TypeRef;
use crate::GenResult;

/// Loop start values are drawn from `[-LOOP_START_RANGE, LOOP_START_RANGE)`.
pub const LOOP_START_RANGE: i64 = 1 << 20;

/// Largest loop step.
pub const MAX_LOOP_STEP: i64 = 1000;

/// Largest `switch` modulus.
pub const MAX_SWITCH_CASES: usize = 10;

/// The statement forms the generator can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Declare,
    Assign,
    If,
    For,
    Switch,
}

impl StatementKind {
    pub const ALL: [StatementKind; 5] = [
        StatementKind::Declare,
        StatementKind::Assign,
        StatementKind::If,
        StatementKind::For,
        StatementKind::Switch,
    ];

    /// Forms that never open a nested block.
    pub const FLAT: [StatementKind; 2] = [StatementKind::Declare, StatementKind::Assign];
}

impl<R: Rng> Generator<R> {
    /// Emits a declaration and then `1..=max_statements_per_block` statements.
    pub fn statements(&mut self) -> GenResult<()> {
        self.declare_variable(false)?;
        let max = self.config.max_statements_per_block;
        let count = if max == 0 { 0 } else { self.rng.gen_range(1..=max) };
        for _ in 0..count {
            self.statement()?;
        }
        Ok(())
    }

    /// Emits one randomly chosen statement.
    pub fn statement(&mut self) -> GenResult<()> {
        let kind = if self.scopes.depth() <= self.config.max_statement_depth {
            self.pick(&StatementKind::ALL)
        } else {
            self.pick(&StatementKind::FLAT)
        };
        trace!("{:?} statement at scope depth {}", kind, self.scopes.depth());

        match kind {
            StatementKind::Declare => self.declare_variable(false),
            StatementKind::Assign => self.assign_variable(),
            StatementKind::If => self.if_statement(),
            StatementKind::For => self.for_loop(),
            StatementKind::Switch => self.switch_statement(),
        }
    }

    /// Declares a variable of a random type. Arrays are allocated with a
    /// random length, scalars initialized with an expression. The new name
    /// becomes visible only after its initializer.
    pub fn declare_variable(&mut self, is_static: bool) -> GenResult<()> {
        let ty = self.random_type();
        let mut var = self
            .scopes
            .fresh_identifier(&mut self.rng, ty, IdentKind::Variable, false);

        if is_static {
            self.out.token("static");
        }
        self.out.token(ty.to_string());
        self.out.token(var.name());
        self.out.token("=");
        if ty.is_array {
            let size = self.array_size();
            var.set_array_size(size);
            self.out.token("new");
            self.out.token(ty.kind.as_str());
            self.out.token("[");
            self.out.token(size.to_string());
            self.out.token("]");
        } else {
            self.expression(ty, 0)?;
        }
        self.out.token(";");
        self.out.newline();

        self.scopes.insert(var);
        Ok(())
    }

    /// Assigns to a random visible variable; array elements are indexed
    /// through a normalized expression. Emits nothing when no variable is
    /// visible.
    pub fn assign_variable(&mut self) -> GenResult<()> {
        let Some(target) = self.scopes.choose(&mut self.rng) else {
            return Ok(());
        };

        self.out.token(target.name());
        if target.ty().is_array {
            self.out.token("[");
            self.modulo_expression(target.array_size())?;
            self.out.token("]");
        }
        self.out.token("=");
        self.expression(target.ty().element(), 0)?;
        self.out.token(";");
        self.out.newline();
        Ok(())
    }

    /// Emits `if ( cond ) { ... }` with an optional `else { ... }`.
    pub fn if_statement(&mut self) -> GenResult<()> {
        let has_else = self.rng.gen_bool(self.config.probabilities.else_branch);

        self.out.token("if");
        self.parenthesized(|g| g.expression(TypeRef::BOOLEAN, 0))?;
        self.block(|g| g.statements())?;
        if has_else {
            self.out.token("else");
            self.block(|g| g.statements())?;
        }
        Ok(())
    }

    /// Emits a counted loop with a random start, step and trip count.
    pub fn for_loop(&mut self) -> GenResult<()> {
        let max = self.config.max_iterations;
        let iterations = if max == 0 { 0 } else { self.rng.gen_range(0..max) };
        let first = self.rng.gen_range(-LOOP_START_RANGE..LOOP_START_RANGE);
        let step = self.rng.gen_range(1..=MAX_LOOP_STEP);
        self.counted_loop(first, step, iterations)
    }

    /// Emits `for ( int i = first ; i < first + step * iterations ; i += step )`.
    ///
    /// The counter is reserved in the body's scope but never declared
    /// there, so statements in the body cannot reference or shadow it.
    pub(crate) fn counted_loop(&mut self, first: i64, step: i64, iterations: u32) -> GenResult<()> {
        let counter = self
            .scopes
            .fresh_identifier(&mut self.rng, TypeRef::INT, IdentKind::Variable, false);
        let bound = first + step * i64::from(iterations);
        let name = counter.name();

        self.out.token("for");
        self.parenthesized(|g| {
            g.out.token(TypeRef::INT.to_string());
            g.out.token(name);
            g.out.token("=");
            g.out.token(first.to_string());
            g.out.token(";");
            g.out.token(name);
            g.out.token("<");
            g.out.token(bound.to_string());
            g.out.token(";");
            g.out.token(name);
            g.out.token("+=");
            g.out.token(step.to_string());
            Ok(())
        })?;
        self.block(|g| {
            g.scopes.reserve(name);
            g.statements()
        })
    }

    /// Emits a `switch` over a normalized expression with a random subset
    /// of case labels and a default block.
    pub fn switch_statement(&mut self) -> GenResult<()> {
        let n = self.rng.gen_range(1..=MAX_SWITCH_CASES);
        let k = self.rng.gen_range(1..=n);
        let labels = index::sample(&mut self.rng, n, k).into_vec();

        self.out.token("switch");
        self.parenthesized(|g| g.modulo_expression(n))?;
        self.block(|g| {
            for label in labels {
                g.out.token("case");
                g.out.token(label.to_string());
                g.out.token(":");
                g.block(|g| g.statements())?;
                if !g.rng.gen_bool(g.config.probabilities.fallthrough) {
                    g.out.token("break");
                    g.out.token(";");
                    g.out.newline();
                }
            }
            g.out.token("default");
            g.out.token(":");
            g.block(|g| g.statements())
        })
    }

    /// Emits `return <expr> ;`.
    pub fn return_statement(&mut self, return_type: TypeRef) -> GenResult<()> {
        self.out.token("return");
        self.expression(return_type, 0)?;
        self.out.token(";");
        self.out.newline();
        Ok(())
    }
}
