// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use crate::config::DependencyIndex;
use crate::graph::{Edge, Node, NodeId, NodeType};
use crate::observability::messages::{graph::DuplicateNodeIgnored, StructuredLog};

/// Immutable view of nodes and edges for one evaluation pass.
///
/// Built from the editor's persisted document; handlers never mutate it. Changes a
/// handler wants to make to node data (such as remembering an uploaded image URL) are
/// returned as `NodeUpdate`s and applied by the caller after the run.
#[derive(Debug, Clone, Default)]
pub struct GraphModel {
    nodes: HashMap<NodeId, Node>,
    order: Vec<NodeId>,
    edges: Vec<Edge>,
    index: DependencyIndex,
}

impl GraphModel {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        let mut by_id = HashMap::with_capacity(nodes.len());
        let mut order = Vec::with_capacity(nodes.len());

        for node in nodes {
            if by_id.contains_key(&node.id) {
                DuplicateNodeIgnored { node_id: &node.id }.log();
                continue;
            }
            order.push(node.id.clone());
            by_id.insert(node.id.clone(), node);
        }

        let index = DependencyIndex::build(&edges);
        Self {
            nodes: by_id,
            order,
            edges,
            index,
        }
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Nodes in document order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn nodes_of_type<'a>(&'a self, node_type: &'a NodeType) -> impl Iterator<Item = &'a Node> {
        self.nodes().filter(move |n| &n.node_type == node_type)
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn incoming(&self, target: &str) -> &[Edge] {
        self.index.incoming(target)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Read-only graph access handed to every handler.
///
/// Handlers that need more than their evaluated inputs (the engine collecting LoRA
/// settings from gear nodes, rescene reading image roles) query through this view
/// instead of reaching for shared editor state.
#[derive(Debug, Clone, Copy)]
pub struct GraphContext<'a> {
    graph: &'a GraphModel,
}

impl<'a> GraphContext<'a> {
    pub fn new(graph: &'a GraphModel) -> Self {
        Self { graph }
    }

    pub fn node(&self, id: &str) -> Option<&'a Node> {
        self.graph.node(id)
    }

    /// Existing source nodes of `node_id`'s incoming edges whose type is `node_type`,
    /// in edge order, each listed once.
    pub fn incoming_nodes_of_type(&self, node_id: &str, node_type: &NodeType) -> Vec<&'a Node> {
        let mut found: Vec<&'a Node> = Vec::new();
        for edge in self.graph.incoming(node_id) {
            if let Some(source) = self.graph.node(&edge.source) {
                if &source.node_type == node_type && !found.iter().any(|n| n.id == source.id) {
                    found.push(source);
                }
            }
        }
        found
    }
}
