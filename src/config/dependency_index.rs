use std::collections::HashMap;

use crate::graph::{Edge, NodeId};

/// Target → incoming edges lookup, built once per evaluation pass.
///
/// Edges keep their document order within each bucket; handlers that take "the first
/// image input" rely on that order.
///
/// # Examples
/// ```
/// use render_graph::config::DependencyIndex;
/// use render_graph::graph::Edge;
///
/// let edges = vec![
///     Edge::new("e1", "prompt", "engine"),
///     Edge::new("e2", "photo", "engine"),
///     Edge::new("e3", "engine", "out"),
/// ];
/// let index = DependencyIndex::build(&edges);
///
/// let sources: Vec<&str> = index.incoming("engine").iter().map(|e| e.source.as_str()).collect();
/// assert_eq!(sources, vec!["prompt", "photo"]);
/// assert!(index.incoming("prompt").is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct DependencyIndex(pub HashMap<NodeId, Vec<Edge>>);

impl DependencyIndex {
    /// Create a new empty index
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Group `edges` by their target. O(E).
    pub fn build(edges: &[Edge]) -> Self {
        let mut index: HashMap<NodeId, Vec<Edge>> = HashMap::new();
        for edge in edges {
            index.entry(edge.target.clone()).or_default().push(edge.clone());
        }
        Self(index)
    }

    /// Incoming edges for `target`, empty when it has none.
    pub fn incoming(&self, target: &str) -> &[Edge] {
        self.0.get(target).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Get all target IDs that have at least one incoming edge
    pub fn targets(&self) -> impl Iterator<Item = &NodeId> {
        self.0.keys()
    }
}

impl From<HashMap<NodeId, Vec<Edge>>> for DependencyIndex {
    fn from(index: HashMap<NodeId, Vec<Edge>>) -> Self {
        Self(index)
    }
}

impl From<DependencyIndex> for HashMap<NodeId, Vec<Edge>> {
    fn from(index: DependencyIndex) -> Self {
        index.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_groups_by_target_preserving_order() {
        let edges = vec![
            Edge::new("e1", "a", "d"),
            Edge::new("e2", "b", "d"),
            Edge::new("e3", "a", "c"),
            Edge::new("e4", "c", "d"),
        ];

        let index = DependencyIndex::build(&edges);

        let into_d: Vec<&str> = index.incoming("d").iter().map(|e| e.id.as_str()).collect();
        assert_eq!(into_d, vec!["e1", "e2", "e4"]);
        assert_eq!(index.incoming("c").len(), 1);
        assert_eq!(index.targets().count(), 2);
    }

    #[test]
    fn test_empty_edge_list() {
        let index = DependencyIndex::build(&[]);
        assert!(index.incoming("anything").is_empty());
        assert_eq!(index.targets().count(), 0);
    }
}
