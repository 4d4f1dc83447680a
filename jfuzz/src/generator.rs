//! Program assembly.
//!
//! A [`Generator`] owns everything one generation run mutates: the random
//! source, the scope stack and the emitter. Expression and statement
//! synthesis live in [`crate::expr`] and [`crate::stmt`] as further `impl`
//! blocks on the same type.
//!
//! The generated unit has this shape:
//!
//! ```text
//! package javafuzz ;
//! public class T1 {
//!   public static void main ( String [ ] args ) {
//!     System.out.println ( test ( ) ) ;
//!   }
//!   static int intVar_123 = ... ;
//!   public static int test ( ) {
//!     ...
//!     return ... ;
//!   }
//! }
//! ```

use rand::Rng;
use tracing::{debug, info};

use crate::config::GenConfig;
use crate::emit::Emitter;
use crate::literal::literal_for;
use crate::name::QualifiedName;
use crate::scope::{IdentKind, Identifier, ScopeStack};
use crate::types::{PrimitiveKind, TypeRef};
use crate::GenResult;

/// Return type of the generated function.
pub const RETURN_TYPE: TypeRef = TypeRef::INT;

/// A generated compilation unit.
#[derive(Debug, Clone)]
pub struct Program {
    /// Fully-qualified name of the generated class.
    pub class_name: QualifiedName,
    /// Name of the generated function.
    pub function_name: String,
    /// Complete source text.
    pub source: String,
}

/// Random program generator. One instance produces one program.
pub struct Generator<R> {
    pub(crate) config: GenConfig,
    pub(crate) rng: R,
    pub(crate) scopes: ScopeStack,
    pub(crate) out: Emitter,
}

impl<R: Rng> Generator<R> {
    pub fn new(config: GenConfig, rng: R) -> Self {
        let out = Emitter::new(config.indent_width);
        Self {
            config,
            rng,
            scopes: ScopeStack::new(),
            out,
        }
    }

    /// Generates the whole compilation unit.
    ///
    /// Fails before emitting anything if the configuration is invalid.
    pub fn generate(mut self) -> GenResult<Program> {
        self.config.validate()?;
        let class_name = self.config.qualified_name()?;
        let params = self.function_params();
        let function_name = match self.config.function_name.clone() {
            Some(name) => name,
            None => self
                .scopes
                .fresh_identifier(&mut self.rng, RETURN_TYPE, IdentKind::Function, false)
                .name()
                .to_string(),
        };

        self.header(&class_name, &function_name, &params)?;
        let fields = self.static_fields()?;
        self.function(RETURN_TYPE, &function_name, params)?;
        self.out.close_block();

        let source = self.out.finish()?;
        info!(
            "Generated {} ({} static fields, {} bytes)",
            class_name,
            fields,
            source.len()
        );
        Ok(Program {
            class_name,
            function_name,
            source,
        })
    }

    /// Draws the generated function's parameters. Their names are reserved
    /// in the class scope so no static field or local can reuse them.
    fn function_params(&mut self) -> Vec<Identifier> {
        let count = self.rng.gen_range(0..=self.config.max_function_params);
        (0..count)
            .map(|_| {
                let ty = self.random_type();
                let mut param = self.scopes.fresh_identifier(
                    &mut self.rng,
                    ty,
                    IdentKind::Variable,
                    false,
                );
                if ty.is_array {
                    let size = self.array_size();
                    param.set_array_size(size);
                }
                self.scopes.reserve(param.name());
                param
            })
            .collect()
    }

    /// Emits the package line, the class opening and `main`.
    fn header(
        &mut self,
        class_name: &QualifiedName,
        function_name: &str,
        params: &[Identifier],
    ) -> GenResult<()> {
        let args = params
            .iter()
            .map(|param| self.argument_for(param))
            .collect::<GenResult<Vec<_>>>()?;

        if let Some(package) = class_name.package() {
            self.out.token("package");
            self.out.token(package);
            self.out.token(";");
            self.out.newline();
        }
        for token in ["public", "class", class_name.class_name()] {
            self.out.token(token);
        }
        self.out.open_block();

        for token in ["public", "static", "void", "main", "(", "String", "[", "]", "args", ")"] {
            self.out.token(token);
        }
        self.out.token("{");
        self.out.newline();
        self.out.with_indent(|out| {
            out.token("System.out.println");
            out.token("(");
            out.token(function_name);
            out.token("(");
            for (i, arg) in args.iter().enumerate() {
                if i != 0 {
                    out.token(",");
                }
                out.token(arg);
            }
            out.token(")");
            out.token(")");
            out.token(";");
            out.newline();
        });
        self.out.token("}");
        self.out.newline();
        Ok(())
    }

    /// The argument `main` passes for `param`.
    fn argument_for(&mut self, param: &Identifier) -> GenResult<String> {
        let ty = param.ty();
        if ty.is_array {
            return Ok(format!("new {}[{}]", ty.kind, param.array_size()));
        }
        let literal = literal_for(&mut self.rng, ty)?;
        // Method invocation does not narrow int constants.
        Ok(match ty.kind {
            PrimitiveKind::Byte | PrimitiveKind::Short => format!("({}){}", ty.kind, literal),
            _ => literal,
        })
    }

    /// Emits `0..=max_static_fields` static field declarations at class scope.
    fn static_fields(&mut self) -> GenResult<usize> {
        let count = self.rng.gen_range(0..=self.config.max_static_fields);
        debug!("Emitting {} static fields", count);
        for _ in 0..count {
            self.declare_variable(true)?;
        }
        Ok(count)
    }

    /// Emits the generated function: signature, statements, return.
    fn function(
        &mut self,
        return_type: TypeRef,
        name: &str,
        params: Vec<Identifier>,
    ) -> GenResult<()> {
        for token in ["public", "static"] {
            self.out.token(token);
        }
        self.out.token(return_type.to_string());
        self.out.token(name);

        self.parenthesized(|g| {
            for (i, param) in params.iter().enumerate() {
                if i != 0 {
                    g.out.token(",");
                }
                g.out.token(param.ty().to_string());
                g.out.token(param.name());
            }
            Ok(())
        })?;

        self.block(|g| {
            for param in params {
                g.scopes.insert(param);
            }
            g.function_body(return_type)
        })
    }

    fn function_body(&mut self, return_type: TypeRef) -> GenResult<()> {
        self.statements()?;
        self.return_statement(return_type)
    }

    /// Emits a braced block with its own scope frame around `body`.
    pub(crate) fn block<F>(&mut self, body: F) -> GenResult<()>
    where
        F: FnOnce(&mut Self) -> GenResult<()>,
    {
        self.out.open_block();
        self.scopes.push();
        let result = body(self);
        self.scopes.pop();
        self.out.close_block();
        result
    }

    /// Emits `( ... )` around `body`.
    pub(crate) fn parenthesized<F>(&mut self, body: F) -> GenResult<()>
    where
        F: FnOnce(&mut Self) -> GenResult<()>,
    {
        self.out.token("(");
        let result = body(self);
        self.out.token(")");
        result
    }

    /// A random declarable type.
    pub(crate) fn random_type(&mut self) -> TypeRef {
        let is_array = self.rng.gen_bool(self.config.probabilities.array);
        let kind = self.pick(&PrimitiveKind::ALL);
        if is_array {
            TypeRef::array(kind)
        } else {
            TypeRef::scalar(kind)
        }
    }

    /// A random array length in `[1, max_array_size]`.
    pub(crate) fn array_size(&mut self) -> usize {
        self.rng.gen_range(1..=self.config.max_array_size.max(1))
    }

    /// Picks a uniformly random element of a non-empty slice.
    pub(crate) fn pick<T: Copy>(&mut self, items: &[T]) -> T {
        items[self.rng.gen_range(0..items.len())]
    }
}
