//! Symbol table for program synthesis.
//!
//! Lexical nesting is an explicit stack of owned [`Scope`] frames. The
//! bottom frame is the class scope holding static fields; every block the
//! generator opens pushes a frame and closing the block pops it, dropping
//! its identifiers for good.
//!
//! Names are unique across the whole stack: [`ScopeStack::fresh_identifier`]
//! retries until the candidate collides with nothing visible, so the target
//! language never sees a redeclaration or a shadowed local.

use std::fmt;

use rand::Rng;

use crate::types::{PrimitiveKind, TypeRef};

/// Exclusive upper bound of the numeric suffix appended to generated names.
pub const NAME_SUFFIX_RANGE: u32 = 100_000;

/// What a generated name will denote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentKind {
    Variable,
    Function,
}

impl IdentKind {
    fn infix(self) -> &'static str {
        match self {
            IdentKind::Variable => "Var",
            IdentKind::Function => "Fun",
        }
    }
}

/// A declared name with its type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    name: String,
    ty: TypeRef,
    /// Allocated length for arrays, 0 until known and for scalars.
    array_size: usize,
}

impl Identifier {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            array_size: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> TypeRef {
        self.ty
    }

    pub fn array_size(&self) -> usize {
        self.array_size
    }

    /// Records the allocated length of an array. Set once, by the
    /// statement that allocates it.
    pub fn set_array_size(&mut self, size: usize) {
        debug_assert!(self.ty.is_array, "array size on scalar `{}`", self.name);
        debug_assert_eq!(self.array_size, 0, "array size of `{}` set twice", self.name);
        self.array_size = size;
    }

    /// Whether expressions can read this identifier. Arrays need a known
    /// length so every index stays in bounds.
    fn is_readable(&self) -> bool {
        !self.ty.is_array || self.array_size > 0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ty, self.name)
    }
}

/// One lexical block.
#[derive(Debug, Default)]
pub struct Scope {
    identifiers: Vec<Identifier>,
    /// Names that block fresh-name generation but are not referenceable.
    reserved: Vec<String>,
}

impl Scope {
    fn declares(&self, name: &str) -> bool {
        self.identifiers.iter().any(|i| i.name == name) || self.reserved.iter().any(|r| r == name)
    }
}

/// The live stack of scopes, innermost last.
#[derive(Debug)]
pub struct ScopeStack {
    frames: Vec<Scope>,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    /// Creates a stack holding only the class scope.
    pub fn new() -> Self {
        Self {
            frames: vec![Scope::default()],
        }
    }

    /// Number of live frames, the class scope included.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Enters a block.
    pub fn push(&mut self) {
        self.frames.push(Scope::default());
    }

    /// Leaves a block. The class scope is never popped.
    pub fn pop(&mut self) -> Option<Scope> {
        if self.frames.len() > 1 {
            self.frames.pop()
        } else {
            None
        }
    }

    /// All identifiers visible from the innermost frame, innermost first.
    pub fn visible(&self) -> impl Iterator<Item = &Identifier> {
        self.frames.iter().rev().flat_map(|frame| frame.identifiers.iter())
    }

    /// Returns true if `name` is declared or reserved anywhere on the stack.
    pub fn is_taken(&self, name: &str) -> bool {
        self.frames.iter().any(|frame| frame.declares(name))
    }

    /// Looks up a visible identifier by name.
    pub fn get(&self, name: &str) -> Option<&Identifier> {
        self.visible().find(|i| i.name == name)
    }

    /// Generates a name for `ty` that collides with nothing on the stack.
    pub fn fresh_name<R: Rng + ?Sized>(&self, rng: &mut R, ty: TypeRef, kind: IdentKind) -> String {
        loop {
            let suffix = rng.gen_range(0..NAME_SUFFIX_RANGE);
            let candidate = format!("{}{}_{}", ty.name_stem(), kind.infix(), suffix);
            if !self.is_taken(&candidate) {
                return candidate;
            }
        }
    }

    /// Creates an identifier with a fresh name, optionally declaring it in
    /// the innermost frame.
    pub fn fresh_identifier<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        ty: TypeRef,
        kind: IdentKind,
        insert: bool,
    ) -> Identifier {
        let ident = Identifier::new(self.fresh_name(rng, ty, kind), ty);
        if insert {
            self.insert(ident.clone());
        }
        ident
    }

    /// Declares `ident` in the innermost frame.
    pub fn insert(&mut self, ident: Identifier) {
        debug_assert!(self.get(&ident.name).is_none(), "`{}` declared twice", ident.name);
        if let Some(frame) = self.frames.last_mut() {
            frame.identifiers.push(ident);
        }
    }

    /// Keeps `name` out of fresh-name generation for the innermost frame's
    /// lifetime without making it visible to lookups.
    pub fn reserve(&mut self, name: impl Into<String>) {
        if let Some(frame) = self.frames.last_mut() {
            frame.reserved.push(name.into());
        }
    }

    /// Picks a uniformly random readable identifier whose element kind
    /// satisfies `predicate`.
    pub fn lookup<R, F>(&self, rng: &mut R, predicate: F) -> Option<Identifier>
    where
        R: Rng + ?Sized,
        F: Fn(PrimitiveKind) -> bool,
    {
        let candidates: Vec<&Identifier> = self
            .visible()
            .filter(|i| i.is_readable() && predicate(i.ty.kind))
            .collect();
        if candidates.is_empty() {
            return None;
        }
        Some(candidates[rng.gen_range(0..candidates.len())].clone())
    }

    /// Picks any readable identifier.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Identifier> {
        self.lookup(rng, |_| true)
    }
}
