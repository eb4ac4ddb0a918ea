//! Streaming loader for XML API descriptions.
//!
//! The document shape is
//!
//! ```xml
//! <api>
//!   <package name="pkg" source="pkg/package-info.java:1">
//!     <class name="Foo" extends="java.lang.Object" visibility="public" abstract="false">
//!       <implements name="java.lang.Runnable"/>
//!       <constructor name="Foo" visibility="public"/>
//!       <method name="bar" return="int" visibility="public">
//!         <parameter name="x" type="java.util.List&lt;T&gt;"/>
//!         <exception type="java.io.IOException"/>
//!       </method>
//!       <field name="MAX" type="int" static="true" final="true" value="10"/>
//!     </class>
//!   </package>
//! </api>
//! ```
//!
//! Cross references are stored as names; [`crate::resolver`] links them.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, trace};

use crate::error::{LoadError, Result, TypeParseError};
use crate::model::{
    ApiGraph, ClassEntry, ClassId, ClassKind, ClassRef, ConstructorEntry, FieldEntry,
    MethodEntry, Modifiers, ParameterEntry, SourcePosition, Visibility,
};
use crate::signature::{self, TypeScope, TypeSignature};

/// Load a snapshot from any buffered reader.
pub fn load_reader<R: BufRead>(input: R) -> Result<ApiGraph> {
    let mut reader = Reader::from_reader(input);
    reader.trim_text(true);

    let mut builder = GraphBuilder::default();
    let mut open: Vec<String> = Vec::new();
    let mut buf = Vec::new();

    loop {
        let offset = reader.buffer_position();
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let name = element_name(&e);
                builder.open(&name, &Attrs::read(&e)?, offset)?;
                open.push(name);
            }
            Event::Empty(e) => {
                let name = element_name(&e);
                builder.open(&name, &Attrs::read(&e)?, offset)?;
                builder.close(&name);
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                builder.close(&name);
                open.pop();
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(unclosed) = open.pop() {
        return Err(LoadError::Truncated(unclosed));
    }

    let graph = builder.graph;
    debug!(
        packages = graph.packages().len(),
        classes = graph.class_count(),
        "loaded snapshot"
    );
    Ok(graph)
}

pub fn load_str(text: &str) -> Result<ApiGraph> {
    load_reader(text.as_bytes())
}

pub fn load_path(path: &Path) -> Result<ApiGraph> {
    let file = File::open(path)?;
    load_reader(BufReader::new(file))
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

/// Attributes of one element, unescaped.
struct Attrs(HashMap<String, String>);

impl Attrs {
    fn read(e: &BytesStart<'_>) -> Result<Self> {
        let mut map = HashMap::new();
        for attr in e.attributes().with_checks(false) {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            map.insert(key, value);
        }
        Ok(Self(map))
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    fn required(&self, key: &'static str, element: &str, offset: usize) -> Result<&str> {
        self.get(key).ok_or_else(|| LoadError::MissingAttribute {
            element: element.to_string(),
            attribute: key,
            offset,
        })
    }

    /// First present attribute among `keys`; reports the first key when all
    /// are absent.
    fn required_any(&self, keys: &[&'static str], element: &str, offset: usize) -> Result<&str> {
        keys.iter()
            .find_map(|k| self.get(k))
            .ok_or_else(|| LoadError::MissingAttribute {
                element: element.to_string(),
                attribute: keys[0],
                offset,
            })
    }

    fn flag(&self, key: &str) -> bool {
        self.get(key) == Some("true")
    }

    fn deprecated(&self) -> bool {
        matches!(self.get("deprecated"), Some("deprecated" | "true"))
    }

    fn position(&self) -> Option<SourcePosition> {
        self.get("source").and_then(SourcePosition::parse)
    }

    fn modifiers(&self) -> Modifiers {
        Modifiers {
            visibility: Visibility::from_token(self.get("visibility").unwrap_or("")),
            is_static: self.flag("static"),
            is_final: self.flag("final"),
            is_abstract: self.flag("abstract"),
            is_synchronized: self.flag("synchronized"),
            is_native: self.flag("native"),
            is_transient: self.flag("transient"),
            is_volatile: self.flag("volatile"),
            is_default: self.flag("default"),
        }
    }
}

enum Member {
    Method(MethodEntry),
    Constructor(ConstructorEntry),
    Field(FieldEntry),
}

/// Incremental graph construction state.
#[derive(Default)]
struct GraphBuilder {
    graph: ApiGraph,
    package: Option<usize>,
    package_name: String,
    class: Option<ClassId>,
    /// Prior current-class values, restored when a class element closes.
    class_scope: Vec<Option<ClassId>>,
    member: Option<Member>,
}

impl GraphBuilder {
    fn open(&mut self, element: &str, attrs: &Attrs, offset: usize) -> Result<()> {
        trace!(element, offset, "open");
        match element {
            "package" => {
                let name = attrs.required("name", element, offset)?;
                self.package = Some(self.graph.add_package(name, attrs.position()));
                self.package_name = name.to_string();
            }
            "class" | "interface" => self.open_class(element, attrs, offset)?,
            "method" => {
                self.current_class(element, offset)?;
                let (name, type_parameters) =
                    split_name(attrs.required("name", element, offset)?, element, offset)?;
                let return_type = parse_usage(
                    attrs.required_any(&["return", "type"], element, offset)?,
                    &self.class_scope().with(&type_parameters),
                    element,
                    offset,
                )?;
                self.member = Some(Member::Method(MethodEntry {
                    name,
                    modifiers: attrs.modifiers(),
                    deprecated: attrs.deprecated(),
                    position: attrs.position(),
                    type_parameters,
                    return_type,
                    parameters: Vec::new(),
                    exceptions: Vec::new(),
                }));
            }
            "constructor" => {
                self.current_class(element, offset)?;
                let (name, type_parameters) =
                    split_name(attrs.required("name", element, offset)?, element, offset)?;
                self.member = Some(Member::Constructor(ConstructorEntry {
                    name,
                    modifiers: attrs.modifiers(),
                    deprecated: attrs.deprecated(),
                    position: attrs.position(),
                    type_parameters,
                    parameters: Vec::new(),
                    exceptions: Vec::new(),
                }));
            }
            "field" => {
                self.current_class(element, offset)?;
                let name = attrs.required("name", element, offset)?.to_string();
                let field_type = parse_usage(
                    attrs.required("type", element, offset)?,
                    &self.class_scope(),
                    element,
                    offset,
                )?;
                self.member = Some(Member::Field(FieldEntry {
                    name,
                    modifiers: attrs.modifiers(),
                    deprecated: attrs.deprecated(),
                    position: attrs.position(),
                    field_type,
                    value: attrs.get("value").map(str::to_string),
                }));
            }
            "parameter" => {
                let type_name = attrs.required("type", element, offset)?;
                let parameter = ParameterEntry {
                    name: attrs.get("name").unwrap_or_default().to_string(),
                    type_name: type_name.to_string(),
                    signature: parse_usage(type_name, &self.member_scope(), element, offset)?,
                };
                match &mut self.member {
                    Some(Member::Method(m)) => m.parameters.push(parameter),
                    Some(Member::Constructor(c)) => c.parameters.push(parameter),
                    _ => return Err(misplaced(element, "method", offset)),
                }
            }
            "exception" => {
                let name = erase_generics(attrs.required_any(&["type", "name"], element, offset)?);
                match &mut self.member {
                    Some(Member::Method(m)) => m.exceptions.push(ClassRef::unresolved(name)),
                    Some(Member::Constructor(c)) => c.exceptions.push(ClassRef::unresolved(name)),
                    _ => return Err(misplaced(element, "method", offset)),
                }
            }
            "implements" => {
                let id = self.current_class(element, offset)?;
                let name = erase_generics(attrs.required("name", element, offset)?);
                self.graph.class_mut(id).interfaces.push(ClassRef::unresolved(name));
            }
            _ => trace!(element, "ignoring unknown element"),
        }
        Ok(())
    }

    fn close(&mut self, element: &str) {
        match element {
            "package" => {
                self.package = None;
                self.package_name.clear();
            }
            "class" | "interface" => {
                self.class = self.class_scope.pop().flatten();
            }
            "method" | "constructor" | "field" => self.finish_member(),
            _ => {}
        }
    }

    fn open_class(&mut self, element: &str, attrs: &Attrs, offset: usize) -> Result<()> {
        let package = self.package.ok_or_else(|| misplaced(element, "package", offset))?;
        if self.member.is_some() {
            return Err(misplaced(element, "class", offset));
        }

        let (name, type_parameters) =
            split_name(attrs.required("name", element, offset)?, element, offset)?;
        let name = match self.class {
            Some(outer) => format!("{}.{}", self.graph.class(outer).name, name),
            None => name,
        };
        let kind = if element == "interface" {
            ClassKind::Interface
        } else {
            ClassKind::Class
        };

        let mut class = ClassEntry::new(&self.package_name, &name, kind);
        class.modifiers = attrs.modifiers();
        class.deprecated = attrs.deprecated();
        class.position = attrs.position();
        class.type_parameters = type_parameters;
        class.superclass = attrs
            .get("extends")
            .filter(|s| !s.trim().is_empty())
            .map(|s| ClassRef::unresolved(erase_generics(s)));
        class.outer = self.class;

        let id = self.graph.add_class(package, class)?;
        self.class_scope.push(self.class);
        self.class = Some(id);
        Ok(())
    }

    /// Type parameters visible in the current class and its outer classes.
    fn class_scope(&self) -> TypeScope<'_> {
        match self.class {
            Some(id) => self.graph.type_scope(id),
            None => TypeScope::new(),
        }
    }

    /// [`class_scope`](Self::class_scope) plus the open member's own
    /// type parameters.
    fn member_scope(&self) -> TypeScope<'_> {
        let scope = self.class_scope();
        match &self.member {
            Some(Member::Method(m)) => scope.with(&m.type_parameters),
            Some(Member::Constructor(c)) => scope.with(&c.type_parameters),
            _ => scope,
        }
    }

    fn current_class(&self, element: &str, offset: usize) -> Result<ClassId> {
        match self.class {
            Some(id) if self.member.is_none() => Ok(id),
            _ => Err(misplaced(element, "class", offset)),
        }
    }

    fn finish_member(&mut self) {
        let (Some(id), Some(member)) = (self.class, self.member.take()) else {
            return;
        };
        let class = self.graph.class_mut(id);
        match member {
            Member::Method(m) => class.methods.push(m),
            Member::Constructor(c) => class.constructors.push(c),
            Member::Field(f) => class.fields.push(f),
        }
    }
}

fn misplaced(element: &str, parent: &'static str, offset: usize) -> LoadError {
    LoadError::Misplaced {
        element: element.to_string(),
        parent,
        offset,
    }
}

fn type_error(element: &str, offset: usize, source: TypeParseError) -> LoadError {
    LoadError::Type {
        element: element.to_string(),
        offset,
        source,
    }
}

/// Descriptions fully qualify class names, so a bare name that is not a
/// primitive refers to a type variable of an enclosing declaration.
fn is_type_variable_name(name: &str) -> bool {
    !name.contains('.')
}

/// Parse a type usage, classify its type variables and attach the bounds
/// they were declared with in `scope`.
fn parse_usage(expr: &str, scope: &TypeScope<'_>, element: &str, offset: usize) -> Result<TypeSignature> {
    let mut sig = signature::parse(expr).map_err(|e| type_error(element, offset, e))?;
    sig.mark_type_variables(&is_type_variable_name);
    sig.attach_declared_bounds(scope);
    Ok(sig)
}

/// Split a declared name into its bare form and type parameters.
fn split_name(raw: &str, element: &str, offset: usize) -> Result<(String, Vec<TypeSignature>)> {
    let (name, mut params) =
        signature::split_declared_name(raw).map_err(|e| type_error(element, offset, e))?;
    for param in &mut params {
        for bound in param.children_mut() {
            bound.mark_type_variables(&is_type_variable_name);
        }
    }
    Ok((name, params))
}

/// `java.util.List<E>` becomes `java.util.List`, `p.Outer<K>.Inner<V>`
/// becomes `p.Outer.Inner`.
fn erase_generics(name: &str) -> String {
    let mut depth = 0usize;
    let erased: String = name
        .chars()
        .filter(|&c| match c {
            '<' => {
                depth += 1;
                false
            }
            '>' => {
                depth = depth.saturating_sub(1);
                false
            }
            _ => depth == 0,
        })
        .collect();
    erased.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<api>
  <package name="pkg" source="pkg/package-info.java:1">
    <class name="Box&lt;T extends java.lang.Number&gt;" extends="pkg.Base&lt;T&gt;" visibility="public" abstract="true" source="pkg/Box.java:10">
      <implements name="java.lang.Comparable&lt;pkg.Box&gt;"/>
      <constructor name="Box" visibility="protected"/>
      <method name="get" return="T" visibility="public" abstract="true">
        <parameter name="index" type="int"/>
        <exception type="java.io.IOException"/>
      </method>
      <method name="copy" type="java.util.List&lt;? extends T&gt;[]" visibility="public" deprecated="deprecated">
        <parameter name="parts" type="java.lang.String..."/>
      </method>
      <field name="MAX" type="int" visibility="public" static="true" final="true" value="10"/>
    </class>
    <class name="Base" visibility="public" source="pkg/Base.java:3">
    </class>
    <interface name="Listener" visibility="public">
      <method name="onEvent" return="void" visibility="public" default="true"/>
    </interface>
  </package>
</api>
"#;

    #[test]
    fn test_load_sample() {
        let graph = load_str(SAMPLE).unwrap();
        assert_eq!(graph.packages().len(), 1);
        let pkg = graph.package("pkg").unwrap();
        assert_eq!(pkg.classes.len(), 3);
        assert_eq!(pkg.position.as_ref().unwrap().line, 1);

        let boxed = graph.class_by_name("pkg.Box").unwrap();
        assert_eq!(boxed.kind, ClassKind::Class);
        assert!(boxed.modifiers.is_abstract);
        assert_eq!(boxed.modifiers.visibility, Visibility::Public);
        assert_eq!(boxed.type_parameters.len(), 1);
        assert_eq!(boxed.superclass, Some(ClassRef::unresolved("pkg.Base")));
        assert_eq!(boxed.interfaces, vec![ClassRef::unresolved("java.lang.Comparable")]);
        assert_eq!(boxed.constructors.len(), 1);
        assert_eq!(boxed.methods.len(), 2);
        assert_eq!(boxed.fields[0].value.as_deref(), Some("10"));

        let get = &boxed.methods[0];
        assert!(get.return_type.is_type_variable());
        assert_eq!(get.parameters[0].signature.qualified_name, "int");
        assert_eq!(get.exceptions, vec![ClassRef::unresolved("java.io.IOException")]);

        let copy = &boxed.methods[1];
        assert!(copy.deprecated);
        assert_eq!(copy.return_type.dimension, "[]");
        assert!(copy.parameters[0].signature.varargs);

        let listener = graph.class_by_name("pkg.Listener").unwrap();
        assert_eq!(listener.kind, ClassKind::Interface);
        assert!(listener.methods[0].modifiers.is_default);
        assert!(!listener.methods[0].is_effectively_abstract(true));
    }

    #[test]
    fn test_missing_required_attribute_is_fatal() {
        let doc = r#"<api><package name="p"><class visibility="public"/></package></api>"#;
        let err = load_str(doc).unwrap_err();
        assert!(matches!(
            err,
            LoadError::MissingAttribute { attribute: "name", .. }
        ));

        let doc = r#"<api><package name="p"><class name="A"><field name="f"/></class></package></api>"#;
        let err = load_str(doc).unwrap_err();
        assert!(matches!(
            err,
            LoadError::MissingAttribute { attribute: "type", .. }
        ));
    }

    #[test]
    fn test_unbalanced_type_is_fatal() {
        let doc = r#"<api><package name="p"><class name="A">
            <method name="m" return="java.util.List&lt;java.lang.String"/>
            </class></package></api>"#;
        let err = load_str(doc).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Type {
                source: TypeParseError::Unbalanced(_),
                ..
            }
        ));
    }

    #[test]
    fn test_misplaced_elements() {
        let doc = r#"<api><class name="A"/></api>"#;
        assert!(matches!(
            load_str(doc).unwrap_err(),
            LoadError::Misplaced { parent: "package", .. }
        ));

        let doc = r#"<api><package name="p"><method name="m" return="int"/></package></api>"#;
        assert!(matches!(
            load_str(doc).unwrap_err(),
            LoadError::Misplaced { parent: "class", .. }
        ));

        let doc = r#"<api><package name="p"><class name="A"><parameter type="int"/></class></package></api>"#;
        assert!(matches!(
            load_str(doc).unwrap_err(),
            LoadError::Misplaced { parent: "method", .. }
        ));

        let doc = r#"<api><package name="p"><class name="A">
            <method name="m" return="int"><class name="B"/></method>
            </class></package></api>"#;
        assert!(matches!(
            load_str(doc).unwrap_err(),
            LoadError::Misplaced { element, parent: "class", .. } if element == "class"
        ));
    }

    #[test]
    fn test_duplicate_class_is_fatal() {
        let doc = r#"<api><package name="p"><class name="A"/><interface name="A"/></package></api>"#;
        assert!(matches!(
            load_str(doc).unwrap_err(),
            LoadError::DuplicateClass(name) if name == "p.A"
        ));
    }

    #[test]
    fn test_truncated_document() {
        let doc = r#"<api><package name="p"><class name="A">"#;
        assert!(load_str(doc).is_err());
    }

    #[test]
    fn test_nested_class_restores_outer_scope() {
        let doc = r#"<api><package name="p">
            <class name="Outer&lt;K&gt;" visibility="public">
              <class name="Inner" visibility="public">
                <method name="key" return="K" visibility="public"/>
              </class>
              <method name="outer" return="int" visibility="public"/>
            </class>
        </package></api>"#;
        let graph = load_str(doc).unwrap();
        let outer_id = graph.find_class("p.Outer").unwrap();
        let inner_id = graph.find_class("p.Outer.Inner").unwrap();
        assert_eq!(graph.class(inner_id).outer, Some(outer_id));
        assert_eq!(graph.class(outer_id).methods.len(), 1);
        assert_eq!(graph.class(outer_id).methods[0].name, "outer");

        let key = &graph.class(inner_id).methods[0];
        let scope = graph.type_scope(inner_id);
        assert!(scope.declares("K"));
        assert_eq!(key.return_type.erasure_in(&scope), "java.lang.Object");
    }

    #[test]
    fn test_erase_generics() {
        assert_eq!(erase_generics("java.util.List<E>"), "java.util.List");
        assert_eq!(erase_generics("p.Outer<K>.Inner<java.util.Map<K, V>>"), "p.Outer.Inner");
        assert_eq!(erase_generics(" p.Plain "), "p.Plain");
    }

    #[test]
    fn test_type_variable_usages_carry_declared_bounds() {
        let graph = load_str(SAMPLE).unwrap();
        let boxed = graph.class_by_name("pkg.Box").unwrap();
        let get = &boxed.methods[0].return_type;
        assert_eq!(get.extends_bounds.len(), 1);
        assert_eq!(get.full_name(), "T extends java.lang.Number");

        let doc = r#"<api><package name="p">
            <class name="Sorted&lt;E extends java.lang.Comparable&lt;E&gt;&gt;" visibility="public">
              <field name="first" type="E" visibility="public"/>
              <method name="pick&lt;E extends java.lang.CharSequence&gt;" return="E" visibility="public">
                <parameter name="all" type="java.util.List&lt;E&gt;"/>
              </method>
            </class>
        </package></api>"#;
        let graph = load_str(doc).unwrap();
        let sorted = graph.class_by_name("p.Sorted").unwrap();
        assert_eq!(
            sorted.fields[0].field_type.full_name(),
            "E extends java.lang.Comparable<E>"
        );
        let pick = &sorted.methods[0];
        assert_eq!(pick.name, "pick");
        assert_eq!(pick.return_type.full_name(), "E extends java.lang.CharSequence");
        assert_eq!(
            pick.parameters[0].signature.full_name(),
            "java.util.List<E extends java.lang.CharSequence>"
        );
    }

    #[test]
    fn test_load_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let graph = load_path(file.path()).unwrap();
        assert_eq!(graph.class_count(), 3);

        let missing = load_path(Path::new("/nonexistent/api.xml")).unwrap_err();
        assert!(matches!(missing, LoadError::Io(_)));
    }

    #[test]
    fn test_unknown_elements_are_ignored() {
        let doc = r#"<api><package name="p"><class name="A"><annotation name="x"/></class></package></api>"#;
        let graph = load_str(doc).unwrap();
        assert!(graph.find_class("p.A").is_some());
    }
}
