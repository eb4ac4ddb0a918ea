//! Structured type signatures.
//!
//! A [`TypeSignature`] is one *usage* of a type as written in an API
//! description: `int`, `java.util.Map<K, java.util.List<V>>[]`,
//! `? super T`, or a declaration such as `E extends java.lang.Enum<E>`.
//!
//! Rendering is kept separate from parsing. [`TypeSignature::full_name_with`]
//! threads a set of type-variable names that are currently being expanded, so
//! self-referential bounds render the bare variable name on the recursive
//! occurrence instead of looping.

mod parse;

pub use parse::{parse, parse_type_parameters};
pub(crate) use parse::split_declared_name;

use serde::Serialize;
use std::collections::HashSet;

use crate::model::ClassId;

/// Names of the Java primitive types (plus `void`).
pub const PRIMITIVES: &[&str] = &[
    "boolean", "byte", "char", "double", "float", "int", "long", "short", "void",
];

/// Erasure of an unbounded type variable.
pub const OBJECT: &str = "java.lang.Object";

/// Classification of a signature. Exactly one holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Primitive,
    TypeVariable,
    Wildcard,
    Class,
}

/// A single parsed type usage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeSignature {
    pub kind: TypeKind,
    /// Array suffix such as `[]` or `[][]`, empty when not an array.
    pub dimension: String,
    pub simple_name: String,
    pub qualified_name: String,
    pub type_arguments: Vec<TypeSignature>,
    pub super_bounds: Vec<TypeSignature>,
    pub extends_bounds: Vec<TypeSignature>,
    /// Written with a trailing `...`.
    pub varargs: bool,
    /// Filled in by the resolver when the name matches a declared class.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_class: Option<ClassId>,
}

impl TypeSignature {
    pub(crate) fn named(kind: TypeKind, qualified_name: &str) -> Self {
        let simple_name = qualified_name
            .rsplit('.')
            .next()
            .unwrap_or(qualified_name)
            .to_string();
        Self {
            kind,
            dimension: String::new(),
            simple_name,
            qualified_name: qualified_name.to_string(),
            type_arguments: Vec::new(),
            super_bounds: Vec::new(),
            extends_bounds: Vec::new(),
            varargs: false,
            resolved_class: None,
        }
    }

    pub fn is_primitive(&self) -> bool {
        self.kind == TypeKind::Primitive
    }

    pub fn is_type_variable(&self) -> bool {
        self.kind == TypeKind::TypeVariable
    }

    pub fn is_wildcard(&self) -> bool {
        self.kind == TypeKind::Wildcard
    }

    /// Render with a fresh expansion set.
    pub fn full_name(&self) -> String {
        self.full_name_with(&mut HashSet::new())
    }

    /// Render the signature, using `expanding` to cut recursion through
    /// self-referential type-variable bounds.
    ///
    /// A type variable whose name is already in `expanding` renders as its
    /// bare name. Otherwise the name is added and the signature renders as
    /// the qualified name followed by the first non-empty of: type
    /// arguments, `super` bounds, `extends` bounds; then the dimension.
    pub fn full_name_with(&self, expanding: &mut HashSet<String>) -> String {
        if self.is_type_variable() && !expanding.insert(self.qualified_name.clone()) {
            return self.qualified_name.clone();
        }

        let mut out = self.qualified_name.clone();
        if !self.type_arguments.is_empty() {
            out.push('<');
            out.push_str(&render_list(&self.type_arguments, ", ", expanding));
            out.push('>');
        } else if !self.super_bounds.is_empty() {
            out.push_str(" super ");
            out.push_str(&render_list(&self.super_bounds, " & ", expanding));
        } else if !self.extends_bounds.is_empty() {
            out.push_str(" extends ");
            out.push_str(&render_list(&self.extends_bounds, " & ", expanding));
        }
        out.push_str(&self.dimension);
        out
    }

    /// Rendering used in diagnostics: like [`full_name`](Self::full_name)
    /// but varargs come back as `...`.
    pub fn display_name(&self) -> String {
        let mut out = self.full_name();
        if self.varargs {
            out.push_str("...");
        }
        out
    }

    /// Erased form: no type arguments, type variables replaced by the
    /// erasure of their first declared bound (or `java.lang.Object`), varargs
    /// as an extra array dimension.
    pub fn erasure_in(&self, scope: &TypeScope<'_>) -> String {
        let mut out = self.erased_base(scope, &mut HashSet::new());
        out.push_str(&self.dimension);
        if self.varargs {
            out.push_str("[]");
        }
        out
    }

    fn erased_base(&self, scope: &TypeScope<'_>, expanding: &mut HashSet<String>) -> String {
        match self.kind {
            TypeKind::Primitive | TypeKind::Class => self.qualified_name.clone(),
            TypeKind::Wildcard => match self.extends_bounds.first() {
                Some(bound) => bound.erased_base(scope, expanding),
                None => OBJECT.to_string(),
            },
            TypeKind::TypeVariable => {
                if !expanding.insert(self.qualified_name.clone()) {
                    return OBJECT.to_string();
                }
                let bound = self
                    .extends_bounds
                    .first()
                    .or_else(|| scope.bound_of(&self.qualified_name));
                match bound {
                    Some(bound) => {
                        let mut erased = bound.erased_base(scope, expanding);
                        erased.push_str(&bound.dimension);
                        erased
                    }
                    None => OBJECT.to_string(),
                }
            }
        }
    }

    /// Comparison form: type arguments kept, type variables replaced by
    /// their erasure so renamed variables compare equal.
    pub fn canonical_in(&self, scope: &TypeScope<'_>) -> String {
        let mut out = match self.kind {
            TypeKind::TypeVariable => self.erased_base(scope, &mut HashSet::new()),
            TypeKind::Wildcard => {
                let mut w = String::from("?");
                if let Some(b) = self.super_bounds.first() {
                    w.push_str(" super ");
                    w.push_str(&b.canonical_in(scope));
                } else if let Some(b) = self.extends_bounds.first() {
                    w.push_str(" extends ");
                    w.push_str(&b.canonical_in(scope));
                }
                w
            }
            TypeKind::Primitive | TypeKind::Class => self.qualified_name.clone(),
        };
        if !self.type_arguments.is_empty() {
            let args: Vec<String> = self
                .type_arguments
                .iter()
                .map(|a| a.canonical_in(scope))
                .collect();
            out.push('<');
            out.push_str(&args.join(","));
            out.push('>');
        }
        out.push_str(&self.dimension);
        if self.varargs {
            out.push_str("[]");
        }
        out
    }

    /// Reclassify bare class names for which `is_var` holds as type
    /// variables, recursively through arguments and bounds.
    pub fn mark_type_variables(&mut self, is_var: &dyn Fn(&str) -> bool) {
        if self.kind == TypeKind::Class
            && self.type_arguments.is_empty()
            && is_var(&self.qualified_name)
        {
            self.kind = TypeKind::TypeVariable;
        }
        for child in self.children_mut() {
            child.mark_type_variables(is_var);
        }
    }

    /// Give every usage of a type variable declared in `scope` a copy of its
    /// declared `extends` bounds. Inside a copied bound, a variable that is
    /// already being expanded keeps its bare form, so `T extends
    /// java.lang.Comparable<T>` stops after one level.
    pub fn attach_declared_bounds(&mut self, scope: &TypeScope<'_>) {
        self.attach_bounds_with(scope, &mut HashSet::new());
    }

    fn attach_bounds_with(&mut self, scope: &TypeScope<'_>, expanding: &mut HashSet<String>) {
        let bare = self.extends_bounds.is_empty() && self.super_bounds.is_empty();
        if self.is_type_variable() && bare {
            if let Some(declared) = scope.lookup(&self.qualified_name) {
                if !declared.extends_bounds.is_empty()
                    && expanding.insert(self.qualified_name.clone())
                {
                    let mut bounds = declared.extends_bounds.clone();
                    for bound in &mut bounds {
                        bound.attach_bounds_with(scope, expanding);
                    }
                    expanding.remove(&self.qualified_name);
                    self.extends_bounds = bounds;
                    return;
                }
            }
        }
        for child in self.children_mut() {
            child.attach_bounds_with(scope, expanding);
        }
    }

    /// Every nested signature: arguments, then super bounds, then extends
    /// bounds.
    pub fn children_mut(&mut self) -> impl Iterator<Item = &mut TypeSignature> {
        self.type_arguments
            .iter_mut()
            .chain(self.super_bounds.iter_mut())
            .chain(self.extends_bounds.iter_mut())
    }
}

fn render_list(items: &[TypeSignature], sep: &str, expanding: &mut HashSet<String>) -> String {
    items
        .iter()
        .map(|t| t.full_name_with(expanding))
        .collect::<Vec<_>>()
        .join(sep)
}

impl std::fmt::Display for TypeSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display_name())
    }
}

/// Type parameters declared by the enclosing generic declarations.
///
/// Frames are pushed outermost first; lookups search innermost first so a
/// method's `<T>` shadows its class's `<T>`.
#[derive(Debug, Default, Clone)]
pub struct TypeScope<'a> {
    frames: Vec<&'a [TypeSignature]>,
}

impl<'a> TypeScope<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, params: &'a [TypeSignature]) -> Self {
        self.frames.push(params);
        self
    }

    pub fn declares(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub fn lookup(&self, name: &str) -> Option<&'a TypeSignature> {
        self.frames
            .iter()
            .rev()
            .flat_map(|&frame| frame.iter())
            .find(|p| p.qualified_name == name)
    }

    fn bound_of(&self, name: &str) -> Option<&'a TypeSignature> {
        self.lookup(name).and_then(|p| p.extends_bounds.first())
    }
}
