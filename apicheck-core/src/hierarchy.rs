//! Supertype queries over a resolved snapshot.
//!
//! Resolved `extends`/`implements` links become edges of a directed graph
//! (subtype -> supertype). Names of external supertypes that the snapshot does
//! not declare are kept alongside so ancestor checks still see them.

use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Bfs;
use std::collections::{BTreeSet, HashSet};

use crate::model::{ApiGraph, ClassId, ClassRef};

pub struct Hierarchy<'g> {
    api: &'g ApiGraph,
    graph: DiGraph<ClassId, ()>,
}

impl<'g> Hierarchy<'g> {
    pub fn build(api: &'g ApiGraph) -> Self {
        let mut graph = DiGraph::with_capacity(api.class_count(), api.class_count());
        for id in api.class_ids() {
            graph.add_node(id);
        }
        for (id, class) in api.classes() {
            if let Some(target) = class.superclass.as_ref().and_then(ClassRef::id) {
                graph.add_edge(node(id), node(target), ());
            }
            for target in class.interfaces.iter().filter_map(ClassRef::id) {
                graph.add_edge(node(id), node(target), ());
            }
        }
        Self { api, graph }
    }

    pub fn has_cycle(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Superclass names from the direct superclass upward. The chain ends at
    /// the first external name, a class without superclass, or a repeat.
    pub fn superclass_chain(&self, id: ClassId) -> Vec<&'g str> {
        let mut chain = Vec::new();
        let mut seen = HashSet::from([id]);
        let mut current = self.api.class(id).superclass.as_ref();
        while let Some(link) = current {
            chain.push(link.qualified_name(self.api));
            match link {
                ClassRef::Resolved(next) if seen.insert(*next) => {
                    current = self.api.class(*next).superclass.as_ref();
                }
                _ => break,
            }
        }
        chain
    }

    /// Declared supertypes reachable from `id`, nearest first, excluding `id`.
    pub fn ancestors(&self, id: ClassId) -> Vec<ClassId> {
        let mut bfs = Bfs::new(&self.graph, node(id));
        let mut out = Vec::new();
        while let Some(nx) = bfs.next(&self.graph) {
            if nx != node(id) {
                out.push(self.graph[nx]);
            }
        }
        out
    }

    /// Qualified names of every supertype of `id`, declared or external.
    pub fn supertype_names(&self, id: ClassId) -> BTreeSet<&'g str> {
        let mut names = BTreeSet::new();
        let mut bfs = Bfs::new(&self.graph, node(id));
        while let Some(nx) = bfs.next(&self.graph) {
            let class = self.api.class(self.graph[nx]);
            if nx != node(id) {
                names.insert(class.qualified_name.as_str());
            }
            for link in class.superclass.iter().chain(class.interfaces.iter()) {
                if let ClassRef::Unresolved(name) = link {
                    names.insert(name.as_str());
                }
            }
        }
        names
    }

    /// `id` is `name` or has it as a supertype.
    pub fn is_subtype_of(&self, id: ClassId, name: &str) -> bool {
        self.api.class(id).qualified_name == name || self.supertype_names(id).contains(name)
    }
}

fn node(id: ClassId) -> NodeIndex {
    NodeIndex::new(id.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_str;
    use crate::resolver::resolve;

    fn graph(doc: &str) -> ApiGraph {
        let mut g = load_str(doc).unwrap();
        resolve(&mut g);
        g
    }

    const DOC: &str = r#"<api><package name="p">
        <class name="C" extends="p.B"><implements name="p.J"/></class>
        <class name="B" extends="p.A"/>
        <class name="A" extends="java.lang.Object"><implements name="java.io.Serializable"/></class>
        <interface name="J"><implements name="p.I"/></interface>
        <interface name="I"/>
    </package></api>"#;

    #[test]
    fn test_superclass_chain_includes_external_terminal() {
        let g = graph(DOC);
        let h = Hierarchy::build(&g);
        let c = g.find_class("p.C").unwrap();
        assert_eq!(h.superclass_chain(c), vec!["p.B", "p.A", "java.lang.Object"]);
    }

    #[test]
    fn test_supertype_names_transitive() {
        let g = graph(DOC);
        let h = Hierarchy::build(&g);
        let c = g.find_class("p.C").unwrap();
        let names = h.supertype_names(c);
        for expected in ["p.A", "p.B", "p.I", "p.J", "java.lang.Object", "java.io.Serializable"] {
            assert!(names.contains(expected), "missing {}", expected);
        }
        assert!(!names.contains("p.C"));
        assert!(h.is_subtype_of(c, "p.I"));
        assert!(h.is_subtype_of(c, "p.C"));
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let g = graph(DOC);
        let h = Hierarchy::build(&g);
        let c = g.find_class("p.C").unwrap();
        let ancestors = h.ancestors(c);
        assert_eq!(ancestors.len(), 4);
        assert!(ancestors[..2].contains(&g.find_class("p.B").unwrap()));
        assert!(ancestors[..2].contains(&g.find_class("p.J").unwrap()));
    }

    #[test]
    fn test_cycle_is_bounded() {
        let g = graph(
            r#"<api><package name="p">
            <class name="X" extends="p.Y"/>
            <class name="Y" extends="p.X"/>
        </package></api>"#,
        );
        let h = Hierarchy::build(&g);
        assert!(h.has_cycle());
        let x = g.find_class("p.X").unwrap();
        assert_eq!(h.superclass_chain(x), vec!["p.Y", "p.X"]);
        assert_eq!(h.ancestors(x).len(), 1);
    }
}
