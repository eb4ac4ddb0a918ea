//! Structural walk of two resolved snapshots.

use std::collections::{HashMap, HashSet};

use super::rules;
use crate::diagnostics::{Category, DiagnosticRegistry};
use crate::hierarchy::Hierarchy;
use crate::model::{
    ApiGraph, Callable, ClassId, ClassKind, ClassRef, FieldEntry, MethodEntry, SourcePosition,
};
use crate::signature::OBJECT;

/// Counts of what was compared, for logging.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CheckStats {
    pub packages: usize,
    pub classes: usize,
    pub members: usize,
}

pub(super) struct Comparator<'a> {
    old: &'a ApiGraph,
    new: &'a ApiGraph,
    old_h: Hierarchy<'a>,
    new_h: Hierarchy<'a>,
    registry: &'a mut DiagnosticRegistry,
    stats: CheckStats,
}

impl<'a> Comparator<'a> {
    pub(super) fn new(
        old: &'a ApiGraph,
        new: &'a ApiGraph,
        registry: &'a mut DiagnosticRegistry,
    ) -> Self {
        Self {
            old,
            new,
            old_h: Hierarchy::build(old),
            new_h: Hierarchy::build(new),
            registry,
            stats: CheckStats::default(),
        }
    }

    fn report(&mut self, category: Category, message: String, location: Option<&SourcePosition>) {
        self.registry.record(category, message, location);
    }

    pub(super) fn run(mut self) -> CheckStats {
        let (og, ng) = (self.old, self.new);
        for old_pkg in og.packages() {
            let Some(new_pkg) = ng.package(&old_pkg.name) else {
                self.report(
                    Category::RemovedPackage,
                    format!("Removed package {}", old_pkg.name),
                    old_pkg.position.as_ref(),
                );
                continue;
            };
            self.stats.packages += 1;

            for &old_id in &old_pkg.classes {
                let old_class = og.class(old_id);
                if !old_class.modifiers.visibility.is_exported()
                    || enclosed_by_unexported(og, old_id)
                    || self.outer_withdrawn(old_id)
                {
                    continue;
                }
                match ng.find_class(&old_class.qualified_name) {
                    Some(new_id) => self.compare_class(old_id, new_id),
                    None => self.report(
                        Category::RemovedClass,
                        format!(
                            "Removed {} {} {}",
                            old_class.modifiers.visibility, old_class.kind, old_class.qualified_name
                        ),
                        old_class.position.as_ref(),
                    ),
                }
            }

            for &new_id in &new_pkg.classes {
                let new_class = ng.class(new_id);
                if new_class.modifiers.visibility.is_exported()
                    && !enclosed_by_unexported(ng, new_id)
                    && og.find_class(&new_class.qualified_name).is_none()
                {
                    self.report(
                        Category::AddedClass,
                        format!("Added {} {}", new_class.kind, new_class.qualified_name),
                        new_class.position.as_ref(),
                    );
                }
            }
        }

        for new_pkg in ng.packages() {
            if og.package(&new_pkg.name).is_none() {
                self.report(
                    Category::AddedPackage,
                    format!("Added package {}", new_pkg.name),
                    new_pkg.position.as_ref(),
                );
            }
        }

        self.stats
    }

    fn compare_class(&mut self, old_id: ClassId, new_id: ClassId) {
        let (og, ng) = (self.old, self.new);
        self.stats.classes += 1;
        let (old, new) = (og.class(old_id), ng.class(new_id));
        let name = &old.qualified_name;
        let loc = new.position.as_ref();

        if rules::kind_incompatible(old.kind, new.kind) {
            self.report(
                Category::ChangedClass,
                format!("Class {} changed from {} to {}", name, old.kind, new.kind),
                loc,
            );
        }

        if rules::visibility_narrowed(old.modifiers.visibility, new.modifiers.visibility) {
            self.report(
                Category::ChangedScope,
                format!(
                    "Class {} changed visibility from {} to {}",
                    name, old.modifiers.visibility, new.modifiers.visibility
                ),
                loc,
            );
        }
        if !new.modifiers.visibility.is_exported() {
            // The members left the API together with the class.
            return;
        }

        if rules::static_changed(&old.modifiers, &new.modifiers) {
            self.report(
                Category::ChangedStatic,
                format!("Class {} changed 'static' qualifier", name),
                loc,
            );
        }

        if rules::became_final(&old.modifiers, &new.modifiers) {
            if rules::instantiable(old) {
                self.report(Category::ChangedFinal, format!("Class {} added 'final' qualifier", name), loc);
            } else {
                self.report(
                    Category::AddedFinalUninstantiable,
                    format!("Class {} added 'final' qualifier but was previously uninstantiable", name),
                    loc,
                );
            }
        } else if rules::lost_final(&old.modifiers, &new.modifiers) {
            self.report(Category::RemovedFinal, format!("Class {} removed 'final' qualifier", name), loc);
        }

        if rules::class_became_abstract(old, new) && rules::instantiable(old) {
            self.report(
                Category::ChangedAbstract,
                format!("Class {} changed 'abstract' qualifier", name),
                loc,
            );
        }

        if old.deprecated != new.deprecated {
            self.report(
                Category::ChangedDeprecated,
                format!("Class {} has changed deprecation state", name),
                loc,
            );
        }

        self.compare_supertypes(old_id, new_id);
        self.compare_constructors(old_id, new_id);
        self.compare_methods(old_id, new_id);
        self.compare_fields(old_id, new_id);
    }

    fn compare_supertypes(&mut self, old_id: ClassId, new_id: ClassId) {
        let (og, ng) = (self.old, self.new);
        let (old, new) = (og.class(old_id), ng.class(new_id));
        let loc = new.position.as_ref();

        if !old.is_interface() {
            if let Some(old_super) = old.superclass.as_ref().map(|s| s.qualified_name(og)) {
                let new_chain = self.new_h.superclass_chain(new_id);
                if old_super != OBJECT && !new_chain.contains(&old_super) {
                    let new_super = new_chain.first().copied().unwrap_or("<none>");
                    self.report(
                        Category::ChangedSuperclass,
                        format!(
                            "Class {} superclass changed from {} to {}",
                            old.qualified_name, old_super, new_super
                        ),
                        loc,
                    );
                }
            }
        }

        let new_supertypes = self.new_h.supertype_names(new_id);
        for iface in &old.interfaces {
            let iface = iface.qualified_name(og);
            if !new_supertypes.contains(iface) {
                self.report(
                    Category::RemovedInterface,
                    format!("Class {} no longer implements {}", old.qualified_name, iface),
                    loc,
                );
            }
        }

        let old_supertypes = self.old_h.supertype_names(old_id);
        for iface in &new.interfaces {
            let iface = iface.qualified_name(ng);
            if !old_supertypes.contains(iface) {
                self.report(
                    Category::AddedInterface,
                    format!("Added interface {} to class {}", iface, old.qualified_name),
                    loc,
                );
            }
        }
    }

    fn compare_constructors(&mut self, old_id: ClassId, new_id: ClassId) {
        let (og, ng) = (self.old, self.new);
        let (old, new) = (og.class(old_id), ng.class(new_id));
        let old_scope = og.type_scope(old_id);
        let new_scope = ng.type_scope(new_id);
        let new_by_key: HashMap<String, _> = new
            .constructors
            .iter()
            .map(|c| (c.erased_key(&new_scope), c))
            .collect();

        for old_ctor in old.constructors.iter().filter(|c| c.modifiers.visibility.is_exported()) {
            self.stats.members += 1;
            let label = format!("{}({})", old.qualified_name, old_ctor.display_params());
            match new_by_key.get(&old_ctor.erased_key(&old_scope)) {
                Some(new_ctor) => self.compare_callable(&label, old_ctor, *new_ctor),
                None => self.report(
                    Category::RemovedMethod,
                    format!("Removed constructor {}", label),
                    old_ctor.position.as_ref().or(old.position.as_ref()),
                ),
            }
        }

        let old_keys: HashSet<String> =
            old.constructors.iter().map(|c| c.erased_key(&old_scope)).collect();
        for new_ctor in new.constructors.iter().filter(|c| c.modifiers.visibility.is_exported()) {
            if !old_keys.contains(&new_ctor.erased_key(&new_scope)) {
                self.report(
                    Category::AddedMethod,
                    format!("Added constructor {}({})", new.qualified_name, new_ctor.display_params()),
                    new_ctor.position.as_ref().or(new.position.as_ref()),
                );
            }
        }
    }

    fn compare_methods(&mut self, old_id: ClassId, new_id: ClassId) {
        let (og, ng) = (self.old, self.new);
        let (old, new) = (og.class(old_id), ng.class(new_id));
        let (old_scope, new_scope) = (og.type_scope(old_id), ng.type_scope(new_id));
        let old_index = method_index(og, old_id);
        let new_index = method_index(ng, new_id);

        for old_method in old.methods.iter().filter(|m| m.modifiers.visibility.is_exported()) {
            self.stats.members += 1;
            let key = old_method.erased_key(&old_scope);
            let label = format!(
                "{}.{}({})",
                old.qualified_name,
                old_method.name,
                old_method.display_params()
            );
            match new_index.get(&key) {
                Some(new_method) => self.compare_method(old_id, old_method, new_id, new_method, &label),
                None if self.inherited_in_new(new_id, &key) => {}
                None => self.report(
                    Category::RemovedMethod,
                    format!("Removed method {}", label),
                    old_method.position.as_ref().or(old.position.as_ref()),
                ),
            }
        }

        for new_method in new.methods.iter().filter(|m| m.modifiers.visibility.is_exported()) {
            let key = new_method.erased_key(&new_scope);
            if old_index.contains_key(&key) || self.inherited_in_old(old_id, &key) {
                continue;
            }
            let label = format!(
                "{}.{}({})",
                new.qualified_name,
                new_method.name,
                new_method.display_params()
            );
            let loc = new_method.position.as_ref().or(new.position.as_ref());
            if rules::is_added_abstract(new, old, new_method) {
                self.report(
                    Category::AddedAbstractMethod,
                    format!("Added abstract method {} to existing {}", label, old.kind),
                    loc,
                );
            } else {
                self.report(Category::AddedMethod, format!("Added method {}", label), loc);
            }
        }
    }

    fn compare_method(
        &mut self,
        old_id: ClassId,
        old: &MethodEntry,
        new_id: ClassId,
        new: &MethodEntry,
        label: &str,
    ) {
        let (og, ng) = (self.old, self.new);
        let old_class = og.class(old_id);
        let new_class = ng.class(new_id);
        let loc = new.position.as_ref().or(new_class.position.as_ref());

        let old_scope = og.type_scope(old_id).with(&old.type_parameters);
        let new_scope = ng.type_scope(new_id).with(&new.type_parameters);
        if old.return_type.canonical_in(&old_scope) != new.return_type.canonical_in(&new_scope) {
            self.report(
                Category::ChangedType,
                format!(
                    "Method {} has changed return type from {} to {}",
                    label,
                    old.return_type.display_name(),
                    new.return_type.display_name()
                ),
                loc,
            );
        }

        if rules::method_became_abstract(old, old_class.is_interface(), new, new_class.is_interface()) {
            self.report(
                Category::ChangedAbstract,
                format!("Method {} has changed 'abstract' qualifier", label),
                loc,
            );
        }

        if rules::method_became_final(old_class, old, new) {
            self.report(Category::ChangedFinal, format!("Method {} has added 'final' qualifier", label), loc);
        } else if rules::lost_final(&old.modifiers, &new.modifiers) {
            self.report(Category::RemovedFinal, format!("Method {} has removed 'final' qualifier", label), loc);
        }

        if old.modifiers.is_native != new.modifiers.is_native {
            self.report(Category::ChangedNative, format!("Method {} has changed 'native' qualifier", label), loc);
        }
        if old.modifiers.is_synchronized != new.modifiers.is_synchronized {
            self.report(
                Category::ChangedSynchronized,
                format!("Method {} has changed 'synchronized' qualifier", label),
                loc,
            );
        }

        self.compare_callable(label, old, new);
    }

    /// Checks shared by methods and constructors.
    fn compare_callable<C: Callable>(&mut self, label: &str, old: &C, new: &C) {
        let ng = self.new;
        let loc = new.position().or(old.position());
        let (om, nm) = (old.modifiers(), new.modifiers());

        if rules::visibility_narrowed(om.visibility, nm.visibility) {
            self.report(
                Category::ChangedScope,
                format!("Method {} changed visibility from {} to {}", label, om.visibility, nm.visibility),
                loc,
            );
        }
        if rules::static_changed(om, nm) {
            self.report(Category::ChangedStatic, format!("Method {} has changed 'static' qualifier", label), loc);
        }
        if old.deprecated() != new.deprecated() {
            self.report(
                Category::ChangedDeprecated,
                format!("Method {} has changed deprecation state", label),
                loc,
            );
        }

        for thrown in new.exceptions() {
            if self.is_unchecked(thrown) || self.declared_in_old(thrown, old.exceptions()) {
                continue;
            }
            self.report(
                Category::ChangedThrows,
                format!(
                    "Method {} added thrown exception {}",
                    label,
                    thrown.qualified_name(ng)
                ),
                loc,
            );
        }
    }

    fn compare_fields(&mut self, old_id: ClassId, new_id: ClassId) {
        let (og, ng) = (self.old, self.new);
        let (old, new) = (og.class(old_id), ng.class(new_id));

        for old_field in old.fields.iter().filter(|f| f.modifiers.visibility.is_exported()) {
            self.stats.members += 1;
            let label = format!("{}.{}", old.qualified_name, old_field.name);
            match new.field(&old_field.name) {
                Some(new_field) => self.compare_field(old_id, old_field, new_id, new_field, &label),
                None if self.field_inherited_in_new(new_id, &old_field.name) => {}
                None => self.report(
                    Category::RemovedField,
                    format!("Removed field {}", label),
                    old_field.position.as_ref().or(old.position.as_ref()),
                ),
            }
        }

        for new_field in new.fields.iter().filter(|f| f.modifiers.visibility.is_exported()) {
            if old.field(&new_field.name).is_none()
                && !self.field_inherited_in_old(old_id, &new_field.name)
            {
                self.report(
                    Category::AddedField,
                    format!("Added field {}.{}", new.qualified_name, new_field.name),
                    new_field.position.as_ref().or(new.position.as_ref()),
                );
            }
        }
    }

    fn compare_field(
        &mut self,
        old_id: ClassId,
        old: &FieldEntry,
        new_id: ClassId,
        new: &FieldEntry,
        label: &str,
    ) {
        let (og, ng) = (self.old, self.new);
        let loc = new.position.as_ref().or(ng.class(new_id).position.as_ref());
        let (om, nm) = (&old.modifiers, &new.modifiers);

        let old_type = old.field_type.canonical_in(&og.type_scope(old_id));
        let new_type = new.field_type.canonical_in(&ng.type_scope(new_id));
        if old_type != new_type {
            self.report(
                Category::ChangedType,
                format!(
                    "Field {} has changed type from {} to {}",
                    label,
                    old.field_type.display_name(),
                    new.field_type.display_name()
                ),
                loc,
            );
        }

        if rules::visibility_narrowed(om.visibility, nm.visibility) {
            self.report(
                Category::ChangedScope,
                format!("Field {} changed visibility from {} to {}", label, om.visibility, nm.visibility),
                loc,
            );
        }
        if rules::static_changed(om, nm) {
            self.report(Category::ChangedStatic, format!("Field {} has changed 'static' qualifier", label), loc);
        }
        if rules::became_final(om, nm) {
            self.report(Category::ChangedFinal, format!("Field {} has added 'final' qualifier", label), loc);
        } else if rules::lost_final(om, nm) {
            self.report(Category::RemovedFinal, format!("Field {} has removed 'final' qualifier", label), loc);
        }
        if om.is_transient != nm.is_transient {
            self.report(
                Category::ChangedTransient,
                format!("Field {} has changed 'transient' qualifier", label),
                loc,
            );
        }
        if om.is_volatile != nm.is_volatile {
            self.report(
                Category::ChangedVolatile,
                format!("Field {} has changed 'volatile' qualifier", label),
                loc,
            );
        }
        if rules::constant_value_changed(old, new) {
            self.report(
                Category::ChangedValue,
                format!(
                    "Field {} has changed value from {} to {}",
                    label,
                    old.value.as_deref().unwrap_or_default(),
                    new.value.as_deref().unwrap_or_default()
                ),
                loc,
            );
        }
        if old.deprecated != new.deprecated {
            self.report(
                Category::ChangedDeprecated,
                format!("Field {} has changed deprecation state", label),
                loc,
            );
        }
    }

    /// An enclosing class of `old_id` still exists in the new snapshot but is
    /// no longer exported; its nested classes left the API with it.
    fn outer_withdrawn(&self, old_id: ClassId) -> bool {
        let (og, ng) = (self.old, self.new);
        let mut seen = HashSet::from([old_id]);
        let mut current = og.class(old_id).outer;
        while let Some(outer) = current {
            if !seen.insert(outer) {
                break;
            }
            let name = &og.class(outer).qualified_name;
            if ng
                .find_class(name)
                .is_some_and(|id| !ng.class(id).modifiers.visibility.is_exported())
            {
                return true;
            }
            current = og.class(outer).outer;
        }
        false
    }

    /// An exported method with this key exists in a supertype of the new class.
    fn inherited_in_new(&self, new_id: ClassId, key: &str) -> bool {
        let ng = self.new;
        self.new_h.ancestors(new_id).into_iter().any(|a| {
            method_index(ng, a)
                .get(key)
                .is_some_and(|m| m.modifiers.visibility.is_exported())
        })
    }

    /// The old class already inherited a method with this key.
    fn inherited_in_old(&self, old_id: ClassId, key: &str) -> bool {
        let og = self.old;
        self.old_h
            .ancestors(old_id)
            .into_iter()
            .any(|a| method_index(og, a).contains_key(key))
    }

    /// An exported field named `name` is declared by a supertype of the new
    /// class.
    fn field_inherited_in_new(&self, new_id: ClassId, name: &str) -> bool {
        let ng = self.new;
        self.new_h.ancestors(new_id).into_iter().any(|a| {
            ng.class(a)
                .field(name)
                .is_some_and(|f| f.modifiers.visibility.is_exported())
        })
    }

    fn field_inherited_in_old(&self, old_id: ClassId, name: &str) -> bool {
        let og = self.old;
        self.old_h
            .ancestors(old_id)
            .into_iter()
            .any(|a| og.class(a).field(name).is_some())
    }

    fn is_unchecked(&self, thrown: &ClassRef) -> bool {
        let ng = self.new;
        match thrown {
            ClassRef::Resolved(id) => {
                let class = ng.class(*id);
                class.kind == ClassKind::Error
                    || rules::is_known_unchecked(&class.qualified_name)
                    || rules::chain_is_unchecked(self.new_h.superclass_chain(*id))
            }
            ClassRef::Unresolved(name) => rules::is_known_unchecked(name),
        }
    }

    /// `thrown` (from the new snapshot) is one of, or a subclass of one of,
    /// the exceptions the old declaration already threw.
    fn declared_in_old(&self, thrown: &ClassRef, old_thrown: &[ClassRef]) -> bool {
        let (og, ng) = (self.old, self.new);
        let name = thrown.qualified_name(ng);
        old_thrown.iter().any(|o| {
            let old_name = o.qualified_name(og);
            old_name == name
                || thrown
                    .id()
                    .is_some_and(|id| self.new_h.is_subtype_of(id, old_name))
        })
    }
}

/// Some enclosing class of `id` is not exported.
fn enclosed_by_unexported(graph: &ApiGraph, id: ClassId) -> bool {
    let mut seen = HashSet::from([id]);
    let mut current = graph.class(id).outer;
    while let Some(outer) = current {
        if !seen.insert(outer) {
            break;
        }
        if !graph.class(outer).modifiers.visibility.is_exported() {
            return true;
        }
        current = graph.class(outer).outer;
    }
    false
}

/// Methods of a class keyed by name and erased parameter types.
fn method_index(graph: &ApiGraph, id: ClassId) -> HashMap<String, &MethodEntry> {
    let scope = graph.type_scope(id);
    graph
        .class(id)
        .methods
        .iter()
        .map(|m| (m.erased_key(&scope), m))
        .collect()
}
