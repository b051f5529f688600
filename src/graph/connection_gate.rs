// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Deferred commit of image connections into rescene nodes.
//!
//! Connecting an `imageInput` to a `rerendering` node configured as `rescene` does not
//! add an edge right away. The connection is parked until a role is chosen:
//!
//! ```text
//! Idle ──on_pending_connection──▶ PendingClassification ──classify_and_commit──▶ Committed
//!                                          │
//!                                          └──abandon──▶ Idle (no edge ever exists)
//! ```
//!
//! The role is written into the source node's `imageType` before the edge is added, so
//! every image edge into a rescene node carries a resolved role by the time the graph
//! is executed. Connections that need no role are committed immediately.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::GateError;
use crate::graph::{Edge, GraphDocument, NodeType};
use crate::handlers::rerendering::RerenderingType;
use crate::observability::messages::{gate::*, StructuredLog};

/// Node data key holding the chosen role on the source image node.
pub const IMAGE_TYPE_KEY: &str = "imageType";

/// Role an image plays in a rescene composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageRole {
    Object,
    Scene,
    Fuse,
}

impl ImageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageRole::Object => "object",
            ImageRole::Scene => "scene",
            ImageRole::Fuse => "fuse",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "object" => Some(ImageRole::Object),
            "scene" => Some(ImageRole::Scene),
            "fuse" => Some(ImageRole::Fuse),
            _ => None,
        }
    }
}

impl fmt::Display for ImageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum GateState {
    #[default]
    Idle,
    PendingClassification { edge: Edge },
    Committed { edge: Edge, role: Option<ImageRole> },
}

/// What happened to an attempted connection.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionDecision {
    /// The edge was added to the document.
    Committed(Edge),
    /// The edge is held until [`ConnectionGate::classify_and_commit`] is called.
    PendingClassification(Edge),
}

#[derive(Debug, Default)]
pub struct ConnectionGate {
    state: GateState,
}

impl ConnectionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    pub fn pending(&self) -> Option<&Edge> {
        match &self.state {
            GateState::PendingClassification { edge } => Some(edge),
            _ => None,
        }
    }

    /// Whether connecting `edge` has to wait for a role.
    pub fn requires_classification(doc: &GraphDocument, edge: &Edge) -> bool {
        let (Some(source), Some(target)) = (doc.node(&edge.source), doc.node(&edge.target)) else {
            return false;
        };
        source.node_type == NodeType::ImageInput
            && target.node_type == NodeType::Rerendering
            && RerenderingType::of(target) == Some(RerenderingType::Rescene)
    }

    /// Editor callback for an attempted connection.
    ///
    /// A connection still pending from an earlier attempt is abandoned.
    pub fn on_pending_connection(
        &mut self,
        doc: &mut GraphDocument,
        edge: Edge,
    ) -> Result<ConnectionDecision, GateError> {
        for endpoint in [&edge.source, &edge.target] {
            if doc.node(endpoint).is_none() {
                return Err(GateError::UnknownNode(endpoint.clone()));
            }
        }
        if doc.is_connected(&edge.source, &edge.target) {
            return Err(GateError::AlreadyConnected {
                from: edge.source.clone(),
                to: edge.target.clone(),
            });
        }

        self.abandon();

        if Self::requires_classification(doc, &edge) {
            ConnectionPending {
                source: &edge.source,
                target: &edge.target,
            }
            .log();
            self.state = GateState::PendingClassification { edge: edge.clone() };
            return Ok(ConnectionDecision::PendingClassification(edge));
        }

        doc.add_edge(edge.clone());
        ConnectionCommitted {
            source: &edge.source,
            target: &edge.target,
            role: None,
        }
        .log();
        self.state = GateState::Committed {
            edge: edge.clone(),
            role: None,
        };
        Ok(ConnectionDecision::Committed(edge))
    }

    /// Editor callback once the user picked a role for the pending connection.
    pub fn classify_and_commit(
        &mut self,
        doc: &mut GraphDocument,
        role: ImageRole,
    ) -> Result<Edge, GateError> {
        let edge = match &self.state {
            GateState::PendingClassification { edge } => edge.clone(),
            _ => return Err(GateError::NothingPending),
        };

        let source = doc
            .node_mut(&edge.source)
            .ok_or_else(|| GateError::UnknownNode(edge.source.clone()))?;
        source
            .data
            .insert(IMAGE_TYPE_KEY.to_string(), role.as_str().into());
        doc.add_edge(edge.clone());

        ConnectionCommitted {
            source: &edge.source,
            target: &edge.target,
            role: Some(role.as_str()),
        }
        .log();
        self.state = GateState::Committed {
            edge: edge.clone(),
            role: Some(role),
        };
        Ok(edge)
    }

    /// Drop the pending connection, if any. The edge never reaches the document.
    pub fn abandon(&mut self) -> Option<Edge> {
        match std::mem::take(&mut self.state) {
            GateState::PendingClassification { edge } => {
                ConnectionAbandoned {
                    source: &edge.source,
                    target: &edge.target,
                }
                .log();
                Some(edge)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Node;

    fn rescene_doc() -> GraphDocument {
        GraphDocument::new(
            vec![
                Node::new("cup", NodeType::ImageInput).with("imageUrl", "https://img/cup.png"),
                Node::new("table", NodeType::ImageInput).with("imageUrl", "https://img/table.png"),
                Node::new("rs", NodeType::Rerendering).with("rerenderingType", "rescene"),
                Node::new("eng", NodeType::Engine),
            ],
            vec![],
        )
    }

    #[test]
    fn test_rescene_connection_waits_for_role() {
        let mut doc = rescene_doc();
        let mut gate = ConnectionGate::new();

        let decision = gate
            .on_pending_connection(&mut doc, Edge::new("e1", "cup", "rs"))
            .unwrap();

        assert!(matches!(decision, ConnectionDecision::PendingClassification(_)));
        assert!(doc.edges.is_empty());
        assert_eq!(gate.pending().map(|e| e.id.as_str()), Some("e1"));
        assert!(doc.node("cup").unwrap().data.get(IMAGE_TYPE_KEY).is_none());
    }

    #[test]
    fn test_classify_object_writes_role_and_adds_exactly_one_edge() {
        let mut doc = rescene_doc();
        let mut gate = ConnectionGate::new();
        gate.on_pending_connection(&mut doc, Edge::new("e1", "cup", "rs"))
            .unwrap();

        let edge = gate.classify_and_commit(&mut doc, ImageRole::Object).unwrap();

        assert_eq!(edge.id, "e1");
        assert_eq!(doc.edges.len(), 1);
        assert_eq!(doc.node("cup").unwrap().str_field(IMAGE_TYPE_KEY), Some("object"));
        assert!(matches!(
            gate.state(),
            GateState::Committed { role: Some(ImageRole::Object), .. }
        ));
        assert!(gate.pending().is_none());
    }

    #[test]
    fn test_abandoned_classification_never_creates_edge() {
        let mut doc = rescene_doc();
        let mut gate = ConnectionGate::new();
        gate.on_pending_connection(&mut doc, Edge::new("e1", "cup", "rs"))
            .unwrap();

        let dropped = gate.abandon();

        assert_eq!(dropped.map(|e| e.id), Some("e1".to_string()));
        assert!(doc.edges.is_empty());
        assert_eq!(gate.state(), &GateState::Idle);
        assert!(matches!(
            gate.classify_and_commit(&mut doc, ImageRole::Scene),
            Err(GateError::NothingPending)
        ));
    }

    #[test]
    fn test_new_attempt_replaces_pending_connection() {
        let mut doc = rescene_doc();
        let mut gate = ConnectionGate::new();
        gate.on_pending_connection(&mut doc, Edge::new("e1", "cup", "rs"))
            .unwrap();
        gate.on_pending_connection(&mut doc, Edge::new("e2", "table", "rs"))
            .unwrap();

        let edge = gate.classify_and_commit(&mut doc, ImageRole::Scene).unwrap();

        assert_eq!(edge.source, "table");
        assert_eq!(doc.edges.len(), 1);
        assert!(doc.node("cup").unwrap().data.get(IMAGE_TYPE_KEY).is_none());
    }

    #[test]
    fn test_ungated_connection_commits_immediately() {
        let mut doc = rescene_doc();
        let mut gate = ConnectionGate::new();

        let decision = gate
            .on_pending_connection(&mut doc, Edge::new("e1", "cup", "eng"))
            .unwrap();

        assert!(matches!(decision, ConnectionDecision::Committed(_)));
        assert_eq!(doc.edges.len(), 1);
    }

    #[test]
    fn test_rejects_unknown_and_duplicate_connections() {
        let mut doc = rescene_doc();
        let mut gate = ConnectionGate::new();

        assert!(matches!(
            gate.on_pending_connection(&mut doc, Edge::new("e1", "ghost", "rs")),
            Err(GateError::UnknownNode(id)) if id == "ghost"
        ));

        gate.on_pending_connection(&mut doc, Edge::new("e2", "cup", "eng"))
            .unwrap();
        assert!(matches!(
            gate.on_pending_connection(&mut doc, Edge::new("e3", "cup", "eng")),
            Err(GateError::AlreadyConnected { .. })
        ));
    }

    #[test]
    fn test_image_role_parse() {
        assert_eq!(ImageRole::parse(" Scene "), Some(ImageRole::Scene));
        assert_eq!(ImageRole::parse("fuse"), Some(ImageRole::Fuse));
        assert_eq!(ImageRole::parse("background"), None);
    }
}
