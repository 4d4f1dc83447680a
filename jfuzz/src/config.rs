//! Generator Configuration
//!
//! Bounds and probabilities that shape generated programs. Every bound is
//! fixed for the lifetime of a generator.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::name::{check_segment, QualifiedName};
use crate::{GenError, GenResult};

/// Largest accepted `max_iterations`. Keeps `start + step * iterations`
/// inside the `int` range for every loop.
pub const MAX_LOOP_ITERATIONS: u32 = 1_000_000;

/// Configuration for program generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenConfig {
    /// Depth at which expressions are forced to be leaves.
    pub max_expression_depth: usize,

    /// Scope depth beyond which no `if`, `for` or `switch` is started.
    pub max_statement_depth: usize,

    /// Upper bound on the generated function's parameter count.
    pub max_function_params: usize,

    /// Upper bound on allocated array lengths.
    pub max_array_size: usize,

    /// Upper bound on statements following a block's first declaration.
    pub max_statements_per_block: usize,

    /// Exclusive upper bound on loop trip counts.
    pub max_iterations: u32,

    /// Upper bound on static field declarations.
    pub max_static_fields: usize,

    /// Fully-qualified name of the generated class.
    pub class_name: String,

    /// Name of the generated function. `None` derives a fresh one.
    pub function_name: Option<String>,

    /// Indentation width in spaces.
    pub indent_width: usize,

    /// Random choice weights.
    pub probabilities: Probabilities,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            max_expression_depth: 5,
            max_statement_depth: 3,
            max_function_params: 0,
            max_array_size: 5,
            max_statements_per_block: 5,
            max_iterations: 20,
            max_static_fields: 100,
            class_name: "javafuzz.T1".to_string(),
            function_name: Some("test".to_string()),
            indent_width: 2,
            probabilities: Probabilities::default(),
        }
    }
}

/// Probabilities of the generator's binary choices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Probabilities {
    /// A declared variable is an array.
    pub array: f64,

    /// An expression below the depth bound is a leaf anyway.
    pub leaf: f64,

    /// An `if` statement gets an `else` block.
    pub else_branch: f64,

    /// A `case` block omits its `break` and falls through.
    pub fallthrough: f64,
}

impl Default for Probabilities {
    fn default() -> Self {
        Self {
            array: 0.3,
            leaf: 0.5,
            else_branch: 0.5,
            fallthrough: 0.2,
        }
    }
}

impl GenConfig {
    /// Loads a configuration file. `.json` files are read as JSON,
    /// everything else as TOML.
    pub fn from_path(path: &Path) -> GenResult<Self> {
        let content = fs::read_to_string(path)?;
        let is_json = path.extension().is_some_and(|ext| ext == "json");
        let config: GenConfig = if is_json {
            serde_json::from_str(&content)
                .map_err(|e| GenError::Config(format!("{}: {}", path.display(), e)))?
        } else {
            toml::from_str(&content)
                .map_err(|e| GenError::Config(format!("{}: {}", path.display(), e)))?
        };
        config.validate()?;
        Ok(config)
    }

    /// Renders the configuration as TOML.
    pub fn to_toml(&self) -> GenResult<String> {
        toml::to_string_pretty(self).map_err(|e| GenError::Config(e.to_string()))
    }

    /// Parsed form of [`GenConfig::class_name`].
    pub fn qualified_name(&self) -> GenResult<QualifiedName> {
        QualifiedName::parse(&self.class_name)
    }

    /// Rejects values the generator cannot honor.
    pub fn validate(&self) -> GenResult<()> {
        let p = &self.probabilities;
        for (name, value) in [
            ("array", p.array),
            ("leaf", p.leaf),
            ("else_branch", p.else_branch),
            ("fallthrough", p.fallthrough),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(GenError::Config(format!(
                    "probability `{name}` must be within [0, 1], got {value}"
                )));
            }
        }

        if self.max_iterations > MAX_LOOP_ITERATIONS {
            return Err(GenError::Config(format!(
                "max_iterations must not exceed {MAX_LOOP_ITERATIONS}, got {}",
                self.max_iterations
            )));
        }

        if let Some(function) = &self.function_name {
            check_segment(function)
                .map_err(|reason| GenError::Config(format!("function name: {reason}")))?;
        }

        self.qualified_name()?;
        Ok(())
    }
}
