//! Graph document validation.
//!
//! The validation pipeline runs in three stages:
//!
//! 1. **Uniqueness**: every node ID appears once (error)
//! 2. **References**: every edge endpoint names an existing node (warning)
//! 3. **Cycle detection**: DFS with a recursion stack (error, with the cycle path)
//!
//! Dangling edges are only warnings because the executor treats a missing node as an
//! empty contribution. Unknown node types are warnings for the same reason.
//!
//! # Algorithms
//!
//! ## Cycle Detection Algorithm
//! Uses **Depth-First Search (DFS) with recursion stack**:
//! - **Time Complexity**: O(V + E)
//! - **Space Complexity**: O(V) for visited set and recursion stack
//! - **Advantage**: Provides the actual cycle path for debugging
//!
//! The same search backs [`find_cycle_from`], which the executor runs over the upstream
//! closure of a target before evaluating anything.
//!
//! # Examples
//!
//! ```rust
//! use render_graph::config::validate_graph;
//! use render_graph::errors::ValidationError;
//! use render_graph::graph::{Edge, GraphDocument, Node, NodeType};
//!
//! let doc = GraphDocument::new(
//!     vec![
//!         Node::new("photo", NodeType::ImageInput),
//!         Node::new("out", NodeType::Output),
//!     ],
//!     vec![
//!         Edge::new("e1", "photo", "out"),
//!         Edge::new("e2", "ghost", "out"),
//!     ],
//! );
//!
//! let warnings = validate_graph(&doc).unwrap();
//! assert!(matches!(
//!     &warnings[0],
//!     ValidationError::DanglingEdge { missing_node, .. } if missing_node == "ghost"
//! ));
//! ```

use std::collections::{HashMap, HashSet};

use crate::errors::ValidationError;
use crate::graph::{GraphDocument, GraphModel};
use crate::observability::messages::{validation::CyclicDependencyDetected, StructuredLog};

/// Validates a graph document for structural integrity.
///
/// # Returns
///
/// * `Ok(warnings)` - The document can be evaluated; `warnings` may be empty
/// * `Err(errors)` - Duplicate IDs or cycles make the document unusable
///
/// Cycle detection is skipped while duplicate IDs exist, since edges can't be resolved
/// to a single node.
pub fn validate_graph(doc: &GraphDocument) -> Result<Vec<ValidationError>, Vec<ValidationError>> {
    let mut errors = validate_unique_node_ids(doc);
    let mut warnings = validate_edge_references(doc);
    warnings.extend(validate_node_types(doc));

    if errors.is_empty() {
        if let Some(cycle) = find_cycle(doc) {
            CyclicDependencyDetected { cycle: &cycle }.log();
            errors.push(ValidationError::CyclicDependency { cycle });
        }
    }

    if errors.is_empty() {
        Ok(warnings)
    } else {
        Err(errors)
    }
}

fn validate_unique_node_ids(doc: &GraphDocument) -> Vec<ValidationError> {
    let mut seen_ids = HashSet::new();
    let mut errors = Vec::new();

    for node in &doc.nodes {
        if !seen_ids.insert(node.id.as_str()) {
            errors.push(ValidationError::DuplicateNodeId {
                node_id: node.id.clone(),
            });
        }
    }
    errors
}

fn validate_edge_references(doc: &GraphDocument) -> Vec<ValidationError> {
    let node_ids: HashSet<&str> = doc.nodes.iter().map(|n| n.id.as_str()).collect();
    let mut warnings = Vec::new();

    for edge in &doc.edges {
        for endpoint in [&edge.source, &edge.target] {
            if !node_ids.contains(endpoint.as_str()) {
                warnings.push(ValidationError::DanglingEdge {
                    edge_id: edge.id.clone(),
                    missing_node: endpoint.clone(),
                });
            }
        }
    }
    warnings
}

fn validate_node_types(doc: &GraphDocument) -> Vec<ValidationError> {
    doc.nodes
        .iter()
        .filter(|n| !crate::graph::NodeType::known().contains(&n.node_type))
        .map(|n| ValidationError::UnknownNodeType {
            node_id: n.id.clone(),
            node_type: n.node_type.to_string(),
        })
        .collect()
}

/// First cycle in the whole document, in edge direction with the first node repeated.
fn find_cycle(doc: &GraphDocument) -> Option<Vec<String>> {
    let node_ids: HashSet<&str> = doc.nodes.iter().map(|n| n.id.as_str()).collect();

    // Forward adjacency (source -> targets), skipping dangling edges
    let mut graph: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in &doc.edges {
        if node_ids.contains(edge.source.as_str()) && node_ids.contains(edge.target.as_str()) {
            graph
                .entry(edge.source.as_str())
                .or_default()
                .push(edge.target.as_str());
        }
    }

    let mut visited = HashSet::new();
    let mut rec_stack = HashSet::new();
    let mut path = Vec::new();

    for node in &doc.nodes {
        if !visited.contains(node.id.as_str()) {
            if let Some(cycle) =
                dfs_cycle_detection(&node.id, &graph, &mut visited, &mut rec_stack, &mut path)
            {
                return Some(cycle);
            }
        }
    }
    None
}

/// Cycle reachable upstream of `target`, if any.
///
/// Walks incoming edges only, so cycles in unrelated parts of the graph don't block
/// evaluation of `target`. The returned path follows edge direction.
pub fn find_cycle_from(graph: &GraphModel, target: &str) -> Option<Vec<String>> {
    // Reverse adjacency (target -> sources), restricted to existing nodes
    let mut upstream: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in graph.edges() {
        if graph.contains(&edge.source) && graph.contains(&edge.target) {
            upstream
                .entry(edge.target.as_str())
                .or_default()
                .push(edge.source.as_str());
        }
    }

    let mut visited = HashSet::new();
    let mut rec_stack = HashSet::new();
    let mut path = Vec::new();

    dfs_cycle_detection(target, &upstream, &mut visited, &mut rec_stack, &mut path).map(
        |mut cycle| {
            cycle.reverse();
            cycle
        },
    )
}

/// Depth-first search with recursion stack tracking.
///
/// * `visited` - fully explored nodes (black)
/// * `rec_stack` - nodes on the current path (gray)
/// * `path` - current DFS path, used to extract the cycle
///
/// Reaching a gray node means a back edge: the cycle is the path segment from that
/// node to the current one, closed with the back edge.
fn dfs_cycle_detection<'a>(
    node: &'a str,
    graph: &HashMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    rec_stack: &mut HashSet<&'a str>,
    path: &mut Vec<&'a str>,
) -> Option<Vec<String>> {
    visited.insert(node);
    rec_stack.insert(node);
    path.push(node);

    if let Some(neighbors) = graph.get(node) {
        for &neighbor in neighbors {
            if !visited.contains(neighbor) {
                if let Some(cycle) = dfs_cycle_detection(neighbor, graph, visited, rec_stack, path)
                {
                    return Some(cycle);
                }
            } else if rec_stack.contains(neighbor) {
                let cycle_start = path.iter().position(|n| *n == neighbor).unwrap_or(0);
                let mut cycle: Vec<String> =
                    path[cycle_start..].iter().map(|n| n.to_string()).collect();
                cycle.push(neighbor.to_string());
                return Some(cycle);
            }
        }
    }

    rec_stack.remove(node);
    path.pop();
    None
}
