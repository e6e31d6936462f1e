use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tracing::debug;

use crate::{graph::KnowledgeGraph, query::ClosureQuery};

/// Transitive subsumption relation over class or property IRIs.
///
/// Built once per evaluation from direct `child → parent` edges and read-only
/// afterwards. Expansion visits every node at most once, so cycles in a
/// malformed ontology terminate instead of looping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HierarchyClosure {
    parents: BTreeMap<String, BTreeSet<String>>,
    ancestors: BTreeMap<String, BTreeSet<String>>,
}

impl HierarchyClosure {
    /// Builds the closure from `(child, parent)` edges.
    pub fn from_edges<I, S>(edges: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        let mut parents: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (child, parent) in edges {
            let (child, parent) = (child.into(), parent.into());
            if child != parent {
                parents.entry(child).or_default().insert(parent);
            }
        }

        let ancestors = parents
            .keys()
            .map(|node| (node.clone(), Self::expand(&parents, node)))
            .collect();

        Self { parents, ancestors }
    }

    /// Runs a hierarchy template (first column = parent, second = child)
    /// against `graph`. Rows with literal values are ignored.
    #[must_use]
    pub fn from_query(query: &ClosureQuery, graph: &KnowledgeGraph) -> Self {
        let edges: Vec<(String, String)> = query
            .select(graph)
            .into_iter()
            .filter_map(|row| match row.as_slice() {
                [parent, child, ..] if parent.is_resource() && child.is_resource() => {
                    Some((child.lexical().to_string(), parent.lexical().to_string()))
                }
                _ => None,
            })
            .collect();
        let closure = Self::from_edges(edges);
        debug!(nodes = closure.len(), "hierarchy closure built");
        closure
    }

    fn expand(parents: &BTreeMap<String, BTreeSet<String>>, start: &str) -> BTreeSet<String> {
        let mut visited = BTreeSet::from([start.to_string()]);
        let mut to_visit: VecDeque<&String> = parents
            .get(start)
            .map(|direct| direct.iter().collect())
            .unwrap_or_default();
        let mut result = BTreeSet::new();

        while let Some(current) = to_visit.pop_front() {
            if visited.insert(current.clone()) {
                result.insert(current.clone());
                if let Some(next) = parents.get(current) {
                    to_visit.extend(next.iter());
                }
            }
        }

        result
    }

    /// Number of nodes that have at least one parent.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ancestors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ancestors.is_empty()
    }

    /// Every ancestor of `iri`, excluding `iri` itself.
    #[must_use]
    pub fn ancestors_of(&self, iri: &str) -> Option<&BTreeSet<String>> {
        self.ancestors.get(iri)
    }

    /// `true` when `ancestor` is a strict ancestor of `iri`.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: &str, iri: &str) -> bool {
        self.ancestors
            .get(iri)
            .is_some_and(|ancestors| ancestors.contains(ancestor))
    }

    /// Number of subsumption steps from `iri` up to `ancestor`, following the
    /// shortest path. `Some(0)` when both are equal.
    #[must_use]
    pub fn distance(&self, iri: &str, ancestor: &str) -> Option<usize> {
        if iri == ancestor {
            return Some(0);
        }
        let mut visited = BTreeSet::from([iri]);
        let mut to_visit = VecDeque::from([(iri, 0)]);
        while let Some((current, depth)) = to_visit.pop_front() {
            for parent in self.parents.get(current).into_iter().flatten() {
                if parent == ancestor {
                    return Some(depth + 1);
                }
                if visited.insert(parent.as_str()) {
                    to_visit.push_back((parent.as_str(), depth + 1));
                }
            }
        }
        None
    }
}
