// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::graph::{Edge, GraphModel, Node, NodeId};

/// The editable, persisted form of a graph.
///
/// This is what the editor saves and what the connection gate mutates. An evaluation
/// pass never works on the document directly; it takes an immutable [`GraphModel`]
/// snapshot via [`GraphDocument::to_model`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

/// A deferred change to one key of a node's data.
///
/// `value: None` removes the key.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeUpdate {
    pub node_id: NodeId,
    pub key: String,
    pub value: Option<Value>,
}

impl NodeUpdate {
    pub fn set(node_id: impl Into<NodeId>, key: &str, value: impl Into<Value>) -> Self {
        Self {
            node_id: node_id.into(),
            key: key.to_string(),
            value: Some(value.into()),
        }
    }

    pub fn remove(node_id: impl Into<NodeId>, key: &str) -> Self {
        Self {
            node_id: node_id.into(),
            key: key.to_string(),
            value: None,
        }
    }
}

impl GraphDocument {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn is_connected(&self, source: &str, target: &str) -> bool {
        self.edges.iter().any(|e| e.source == source && e.target == target)
    }

    /// Append `edge` unless the same source/target pair is already connected.
    pub fn add_edge(&mut self, edge: Edge) -> bool {
        if self.edges.iter().any(|e| e.joins(&edge)) {
            return false;
        }
        self.edges.push(edge);
        true
    }

    /// Apply handler-emitted updates, returning how many touched an existing node.
    pub fn apply_updates(&mut self, updates: &[NodeUpdate]) -> usize {
        let mut applied = 0;
        for update in updates {
            if let Some(node) = self.node_mut(&update.node_id) {
                match &update.value {
                    Some(value) => {
                        node.data.insert(update.key.clone(), value.clone());
                    }
                    None => {
                        node.data.remove(&update.key);
                    }
                }
                applied += 1;
            }
        }
        applied
    }

    /// Immutable snapshot for one evaluation pass.
    pub fn to_model(&self) -> GraphModel {
        GraphModel::new(self.nodes.clone(), self.edges.clone())
    }
}
