//! Link name references inside a loaded snapshot.
//!
//! Runs after the whole document is in memory, since a subclass may be
//! described before its superclass. Names that the snapshot does not declare
//! stay [`ClassRef::Unresolved`]; they are external and not an error.

use std::collections::HashMap;
use tracing::{debug, warn};

use crate::hierarchy::Hierarchy;
use crate::model::{ApiGraph, ClassId, ClassKind, ClassRef};
use crate::signature::{TypeKind, TypeSignature};

/// What one resolver run changed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResolveStats {
    pub superclasses: usize,
    pub interfaces: usize,
    pub exceptions: usize,
    pub signatures: usize,
    pub reclassified: usize,
    /// References left pointing outside the snapshot.
    pub external: usize,
}

impl ResolveStats {
    pub fn changed(&self) -> usize {
        self.superclasses + self.interfaces + self.exceptions + self.signatures + self.reclassified
    }
}

/// Resolve superclass links, then interface links, then thrown types and
/// signature handles, then derive class kinds from the hierarchy.
///
/// Running it again on a resolved graph changes nothing.
pub fn resolve(graph: &mut ApiGraph) -> ResolveStats {
    let index: HashMap<String, ClassId> = graph
        .classes()
        .map(|(id, c)| (c.qualified_name.clone(), id))
        .collect();
    let mut stats = ResolveStats::default();
    let ids: Vec<ClassId> = graph.class_ids().collect();

    for &id in &ids {
        if let Some(link) = graph.class_mut(id).superclass.as_mut() {
            link_ref(link, &index, &mut stats.superclasses, &mut stats.external);
        }
    }

    for &id in &ids {
        for link in graph.class_mut(id).interfaces.iter_mut() {
            link_ref(link, &index, &mut stats.interfaces, &mut stats.external);
        }
    }

    for &id in &ids {
        let class = graph.class_mut(id);
        for method in class.methods.iter_mut() {
            for link in method.exceptions.iter_mut() {
                link_ref(link, &index, &mut stats.exceptions, &mut stats.external);
            }
            link_signature(&mut method.return_type, &index, &mut stats.signatures);
            for p in method.parameters.iter_mut() {
                link_signature(&mut p.signature, &index, &mut stats.signatures);
            }
        }
        for ctor in class.constructors.iter_mut() {
            for link in ctor.exceptions.iter_mut() {
                link_ref(link, &index, &mut stats.exceptions, &mut stats.external);
            }
            for p in ctor.parameters.iter_mut() {
                link_signature(&mut p.signature, &index, &mut stats.signatures);
            }
        }
        for field in class.fields.iter_mut() {
            link_signature(&mut field.field_type, &index, &mut stats.signatures);
        }
    }

    stats.reclassified = classify(graph);

    debug!(?stats, "resolved snapshot");
    stats
}

fn link_ref(
    link: &mut ClassRef,
    index: &HashMap<String, ClassId>,
    linked: &mut usize,
    external: &mut usize,
) {
    if let ClassRef::Unresolved(name) = link {
        match index.get(name.as_str()) {
            Some(&id) => {
                *link = ClassRef::Resolved(id);
                *linked += 1;
            }
            None => *external += 1,
        }
    }
}

fn link_signature(sig: &mut TypeSignature, index: &HashMap<String, ClassId>, linked: &mut usize) {
    if sig.kind == TypeKind::Class && sig.resolved_class.is_none() {
        if let Some(&id) = index.get(sig.qualified_name.as_str()) {
            sig.resolved_class = Some(id);
            *linked += 1;
        }
    }
    for child in sig.children_mut() {
        link_signature(child, index, linked);
    }
}

/// Kind implied by the superclass chain, nearest marker first.
fn kind_from_chain(chain: &[&str]) -> Option<ClassKind> {
    chain.iter().find_map(|name| match *name {
        "java.lang.Error" => Some(ClassKind::Error),
        "java.lang.Throwable" | "java.lang.Exception" | "java.lang.RuntimeException" => {
            Some(ClassKind::Exception)
        }
        "java.lang.Enum" => Some(ClassKind::Enum),
        _ => None,
    })
}

/// External bases are opaque; fall back to the JDK naming convention.
fn kind_from_external_name(name: &str) -> Option<ClassKind> {
    if name.ends_with("Exception") {
        Some(ClassKind::Exception)
    } else if name.ends_with("Error") {
        Some(ClassKind::Error)
    } else {
        None
    }
}

/// Derive exception/error/enum/annotation kinds. Returns how many classes
/// changed kind.
fn classify(graph: &mut ApiGraph) -> usize {
    let updates: Vec<(ClassId, ClassKind)> = {
        let hierarchy = Hierarchy::build(graph);
        if hierarchy.has_cycle() {
            warn!("class hierarchy contains a cycle; ancestor walks are truncated");
        }
        graph
            .classes()
            .filter_map(|(id, class)| {
                let derived = match class.kind {
                    ClassKind::Class => {
                        let chain = hierarchy.superclass_chain(id);
                        kind_from_chain(&chain).or_else(|| {
                            chain
                                .last()
                                .filter(|name| graph.find_class(name).is_none())
                                .and_then(|name| kind_from_external_name(name))
                        })
                    }
                    ClassKind::Interface => hierarchy
                        .supertype_names(id)
                        .contains("java.lang.annotation.Annotation")
                        .then_some(ClassKind::Annotation),
                    _ => None,
                };
                derived.map(|kind| (id, kind))
            })
            .collect()
    };

    for &(id, kind) in &updates {
        graph.class_mut(id).kind = kind;
    }
    updates.len()
}
