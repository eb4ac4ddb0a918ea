//! In-memory model of one API snapshot.
//!
//! Classes live in a single arena owned by [`ApiGraph`]; packages, cross
//! references and signatures refer to them through [`ClassId`] handles.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::error::LoadError;
use crate::signature::{TypeScope, TypeSignature};

/// Index of a class in its graph's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ClassId(pub usize);

/// A reference to another class by name, linked by the resolver when the
/// name is declared in the same graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "target", rename_all = "snake_case")]
pub enum ClassRef {
    Unresolved(String),
    Resolved(ClassId),
}

impl ClassRef {
    pub fn unresolved(name: impl Into<String>) -> Self {
        ClassRef::Unresolved(name.into())
    }

    pub fn id(&self) -> Option<ClassId> {
        match self {
            ClassRef::Resolved(id) => Some(*id),
            ClassRef::Unresolved(_) => None,
        }
    }

    /// Qualified name of the target, whether linked or external.
    pub fn qualified_name<'a>(&'a self, graph: &'a ApiGraph) -> &'a str {
        match self {
            ClassRef::Unresolved(name) => name,
            ClassRef::Resolved(id) => &graph.class(*id).qualified_name,
        }
    }
}

/// Access level. Ordered from most restrictive to least.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Private,
    #[default]
    PackagePrivate,
    Protected,
    Public,
}

impl Visibility {
    /// Map the description's visibility token; empty or unknown means
    /// package-private.
    pub fn from_token(token: &str) -> Self {
        match token {
            "public" => Visibility::Public,
            "protected" => Visibility::Protected,
            "private" => Visibility::Private,
            _ => Visibility::PackagePrivate,
        }
    }

    /// Visible to client code outside the package.
    pub fn is_exported(self) -> bool {
        matches!(self, Visibility::Public | Visibility::Protected)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::PackagePrivate => "package-private",
            Visibility::Protected => "protected",
            Visibility::Public => "public",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declaration modifiers. Flags that do not apply to an entry kind stay
/// false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Modifiers {
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_final: bool,
    pub is_abstract: bool,
    pub is_synchronized: bool,
    pub is_native: bool,
    pub is_transient: bool,
    pub is_volatile: bool,
    /// Interface method with a body.
    pub is_default: bool,
}

/// `file:line` location of a declaration.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SourcePosition {
    pub file: String,
    pub line: u32,
}

impl SourcePosition {
    /// Parse a `File.java:12` token. A token without a numeric line keeps
    /// the whole text as the file name with line 0.
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        match token.rsplit_once(':') {
            Some((file, line)) => match line.parse() {
                Ok(line) => Some(Self {
                    file: file.to_string(),
                    line,
                }),
                Err(_) => Some(Self {
                    file: token.to_string(),
                    line: 0,
                }),
            },
            None => Some(Self {
                file: token.to_string(),
                line: 0,
            }),
        }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// What a class was declared as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
    Enum,
    Annotation,
    Exception,
    Error,
}

impl ClassKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ClassKind::Class => "class",
            ClassKind::Interface => "interface",
            ClassKind::Enum => "enum",
            ClassKind::Annotation => "annotation",
            ClassKind::Exception => "exception",
            ClassKind::Error => "error",
        }
    }

    pub fn is_interface(self) -> bool {
        matches!(self, ClassKind::Interface | ClassKind::Annotation)
    }
}

impl fmt::Display for ClassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterEntry {
    pub name: String,
    /// Type exactly as written in the description.
    pub type_name: String,
    pub signature: TypeSignature,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodEntry {
    pub name: String,
    pub modifiers: Modifiers,
    pub deprecated: bool,
    pub position: Option<SourcePosition>,
    pub type_parameters: Vec<TypeSignature>,
    pub return_type: TypeSignature,
    pub parameters: Vec<ParameterEntry>,
    pub exceptions: Vec<ClassRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstructorEntry {
    pub name: String,
    pub modifiers: Modifiers,
    pub deprecated: bool,
    pub position: Option<SourcePosition>,
    pub type_parameters: Vec<TypeSignature>,
    pub parameters: Vec<ParameterEntry>,
    pub exceptions: Vec<ClassRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldEntry {
    pub name: String,
    pub modifiers: Modifiers,
    pub deprecated: bool,
    pub position: Option<SourcePosition>,
    pub field_type: TypeSignature,
    /// Literal for compile-time constants.
    pub value: Option<String>,
}

/// Shared view of methods and constructors.
pub trait Callable {
    fn name(&self) -> &str;
    fn modifiers(&self) -> &Modifiers;
    fn deprecated(&self) -> bool;
    fn position(&self) -> Option<&SourcePosition>;
    fn type_parameters(&self) -> &[TypeSignature];
    fn parameters(&self) -> &[ParameterEntry];
    fn exceptions(&self) -> &[ClassRef];

    /// Name plus erased parameter types, e.g. `put(java.lang.Object,int[])`.
    fn erased_key(&self, class_scope: &TypeScope<'_>) -> String {
        let scope = class_scope.clone().with(self.type_parameters());
        let params: Vec<String> = self
            .parameters()
            .iter()
            .map(|p| p.signature.erasure_in(&scope))
            .collect();
        format!("{}({})", self.name(), params.join(","))
    }

    /// Parameter list as written, for messages.
    fn display_params(&self) -> String {
        self.parameters()
            .iter()
            .map(|p| p.signature.display_name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

macro_rules! impl_callable {
    ($ty:ty) => {
        impl Callable for $ty {
            fn name(&self) -> &str {
                &self.name
            }
            fn modifiers(&self) -> &Modifiers {
                &self.modifiers
            }
            fn deprecated(&self) -> bool {
                self.deprecated
            }
            fn position(&self) -> Option<&SourcePosition> {
                self.position.as_ref()
            }
            fn type_parameters(&self) -> &[TypeSignature] {
                &self.type_parameters
            }
            fn parameters(&self) -> &[ParameterEntry] {
                &self.parameters
            }
            fn exceptions(&self) -> &[ClassRef] {
                &self.exceptions
            }
        }
    };
}

impl_callable!(MethodEntry);
impl_callable!(ConstructorEntry);

impl MethodEntry {
    /// Abstract as seen by implementers: declared abstract, or an interface
    /// method that is neither static nor default.
    pub fn is_effectively_abstract(&self, in_interface: bool) -> bool {
        self.modifiers.is_abstract
            || (in_interface && !self.modifiers.is_static && !self.modifiers.is_default)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassEntry {
    /// Name within the package; nested classes keep their `Outer.Inner` form.
    pub name: String,
    pub qualified_name: String,
    pub package: String,
    pub kind: ClassKind,
    pub modifiers: Modifiers,
    pub deprecated: bool,
    pub position: Option<SourcePosition>,
    pub type_parameters: Vec<TypeSignature>,
    pub superclass: Option<ClassRef>,
    pub interfaces: Vec<ClassRef>,
    pub methods: Vec<MethodEntry>,
    pub constructors: Vec<ConstructorEntry>,
    pub fields: Vec<FieldEntry>,
    /// Enclosing class for nested declarations.
    pub outer: Option<ClassId>,
}

impl ClassEntry {
    pub fn new(package: &str, name: &str, kind: ClassKind) -> Self {
        let qualified_name = if package.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", package, name)
        };
        Self {
            name: name.to_string(),
            qualified_name,
            package: package.to_string(),
            kind,
            modifiers: Modifiers::default(),
            deprecated: false,
            position: None,
            type_parameters: Vec::new(),
            superclass: None,
            interfaces: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            fields: Vec::new(),
            outer: None,
        }
    }

    pub fn is_interface(&self) -> bool {
        self.kind.is_interface()
    }

    /// Clients can subclass or instantiate it: some constructor is public or
    /// protected.
    pub fn has_exported_constructor(&self) -> bool {
        self.constructors
            .iter()
            .any(|c| c.modifiers.visibility.is_exported())
    }

    pub fn field(&self, name: &str) -> Option<&FieldEntry> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageEntry {
    pub name: String,
    pub position: Option<SourcePosition>,
    /// Classes in declaration order.
    pub classes: Vec<ClassId>,
}

/// One snapshot: packages in declaration order and the class arena.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ApiGraph {
    packages: Vec<PackageEntry>,
    classes: Vec<ClassEntry>,
    #[serde(skip)]
    package_index: HashMap<String, usize>,
    #[serde(skip)]
    class_index: HashMap<String, ClassId>,
}

impl ApiGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn packages(&self) -> &[PackageEntry] {
        &self.packages
    }

    pub fn package(&self, name: &str) -> Option<&PackageEntry> {
        self.package_index.get(name).map(|&i| &self.packages[i])
    }

    /// Open a package, reusing an existing entry of the same name.
    pub fn add_package(&mut self, name: &str, position: Option<SourcePosition>) -> usize {
        if let Some(&idx) = self.package_index.get(name) {
            return idx;
        }
        let idx = self.packages.len();
        self.packages.push(PackageEntry {
            name: name.to_string(),
            position,
            classes: Vec::new(),
        });
        self.package_index.insert(name.to_string(), idx);
        idx
    }

    /// Insert a class into the arena and its package.
    pub fn add_class(&mut self, package: usize, class: ClassEntry) -> Result<ClassId, LoadError> {
        if self.class_index.contains_key(&class.qualified_name) {
            return Err(LoadError::DuplicateClass(class.qualified_name));
        }
        let id = ClassId(self.classes.len());
        self.class_index.insert(class.qualified_name.clone(), id);
        self.classes.push(class);
        self.packages[package].classes.push(id);
        Ok(id)
    }

    pub fn class(&self, id: ClassId) -> &ClassEntry {
        &self.classes[id.0]
    }

    pub fn class_mut(&mut self, id: ClassId) -> &mut ClassEntry {
        &mut self.classes[id.0]
    }

    pub fn find_class(&self, qualified_name: &str) -> Option<ClassId> {
        self.class_index.get(qualified_name).copied()
    }

    pub fn class_by_name(&self, qualified_name: &str) -> Option<&ClassEntry> {
        self.find_class(qualified_name).map(|id| self.class(id))
    }

    pub fn class_ids(&self) -> impl Iterator<Item = ClassId> {
        (0..self.classes.len()).map(ClassId)
    }

    pub fn classes(&self) -> impl Iterator<Item = (ClassId, &ClassEntry)> {
        self.classes.iter().enumerate().map(|(i, c)| (ClassId(i), c))
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Type parameters in scope inside `id`: its own plus those of every
    /// enclosing class.
    pub fn type_scope(&self, id: ClassId) -> TypeScope<'_> {
        let mut chain = vec![id];
        let mut current = self.class(id).outer;
        while let Some(outer) = current {
            if chain.contains(&outer) {
                break;
            }
            chain.push(outer);
            current = self.class(outer).outer;
        }
        chain
            .iter()
            .rev()
            .fold(TypeScope::new(), |scope, &c| scope.with(&self.class(c).type_parameters))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_order() {
        assert!(Visibility::Public > Visibility::Protected);
        assert!(Visibility::Protected > Visibility::PackagePrivate);
        assert!(Visibility::PackagePrivate > Visibility::Private);
        assert_eq!(Visibility::from_token(""), Visibility::PackagePrivate);
        assert_eq!(Visibility::from_token("protected"), Visibility::Protected);
    }

    #[test]
    fn test_source_position_parse() {
        let pos = SourcePosition::parse("Foo.java:12").unwrap();
        assert_eq!(pos.file, "Foo.java");
        assert_eq!(pos.line, 12);
        assert_eq!(pos.to_string(), "Foo.java:12");

        let bare = SourcePosition::parse("Foo.java").unwrap();
        assert_eq!(bare.line, 0);
        assert!(SourcePosition::parse("").is_none());
    }

    #[test]
    fn test_add_class_rejects_duplicates() {
        let mut graph = ApiGraph::new();
        let pkg = graph.add_package("pkg", None);
        let id = graph
            .add_class(pkg, ClassEntry::new("pkg", "Foo", ClassKind::Class))
            .unwrap();
        assert_eq!(graph.find_class("pkg.Foo"), Some(id));
        assert_eq!(graph.package("pkg").unwrap().classes, vec![id]);

        let err = graph
            .add_class(pkg, ClassEntry::new("pkg", "Foo", ClassKind::Interface))
            .unwrap_err();
        assert!(matches!(err, LoadError::DuplicateClass(name) if name == "pkg.Foo"));
    }

    #[test]
    fn test_add_package_reuses_entry() {
        let mut graph = ApiGraph::new();
        let a = graph.add_package("a", None);
        let b = graph.add_package("b", None);
        assert_eq!(graph.add_package("a", None), a);
        assert_ne!(a, b);
        assert_eq!(graph.packages().len(), 2);
    }

    #[test]
    fn test_class_ref_name() {
        let mut graph = ApiGraph::new();
        let pkg = graph.add_package("pkg", None);
        let id = graph
            .add_class(pkg, ClassEntry::new("pkg", "Base", ClassKind::Class))
            .unwrap();
        assert_eq!(ClassRef::Resolved(id).qualified_name(&graph), "pkg.Base");
        assert_eq!(
            ClassRef::unresolved("java.lang.Object").qualified_name(&graph),
            "java.lang.Object"
        );
    }
}
