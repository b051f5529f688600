// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Identifier of a node, unique within one graph.
pub type NodeId = String;

/// Type-specific node configuration (`prompt`, `imageUrl`, `preprocessor`, ...).
pub type NodeData = Map<String, Value>;

/// The kind of processing a node performs.
///
/// The eight known tags map onto handler strategies. Any other tag is kept as
/// [`NodeType::Other`] so that documents written by newer editors still load; the
/// executor reports such nodes as unhandled instead of refusing the whole graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeType {
    TextInput,
    ImageInput,
    ControlNet,
    Rerendering,
    Tool,
    Engine,
    Gear,
    Output,
    Other(String),
}

impl NodeType {
    pub fn as_str(&self) -> &str {
        match self {
            NodeType::TextInput => "textInput",
            NodeType::ImageInput => "imageInput",
            NodeType::ControlNet => "controlNet",
            NodeType::Rerendering => "rerendering",
            NodeType::Tool => "tool",
            NodeType::Engine => "engine",
            NodeType::Gear => "gear",
            NodeType::Output => "output",
            NodeType::Other(tag) => tag,
        }
    }

    /// All tags the built-in handler registry knows about.
    pub fn known() -> [NodeType; 8] {
        [
            NodeType::TextInput,
            NodeType::ImageInput,
            NodeType::ControlNet,
            NodeType::Rerendering,
            NodeType::Tool,
            NodeType::Engine,
            NodeType::Gear,
            NodeType::Output,
        ]
    }
}

impl From<String> for NodeType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "textInput" => NodeType::TextInput,
            "imageInput" => NodeType::ImageInput,
            "controlNet" => NodeType::ControlNet,
            "rerendering" => NodeType::Rerendering,
            "tool" => NodeType::Tool,
            "engine" => NodeType::Engine,
            "gear" => NodeType::Gear,
            "output" => NodeType::Output,
            _ => NodeType::Other(tag),
        }
    }
}

impl From<&str> for NodeType {
    fn from(tag: &str) -> Self {
        NodeType::from(tag.to_string())
    }
}

impl From<NodeType> for String {
    fn from(node_type: NodeType) -> Self {
        node_type.as_str().to_string()
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A vertex of the authored processing graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub data: NodeData,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            node_type,
            data: NodeData::new(),
        }
    }

    /// Builder-style helper used by tests and the connection gate.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    /// Non-blank string field.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.data
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Numeric field; numeric strings written by form controls are accepted too.
    pub fn f64_field(&self, key: &str) -> Option<f64> {
        match self.data.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn u32_field(&self, key: &str) -> Option<u32> {
        self.f64_field(key)
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v.round() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_node_type_round_trips_known_and_unknown_tags() {
        for node_type in NodeType::known() {
            let tag: String = node_type.clone().into();
            assert_eq!(NodeType::from(tag), node_type);
        }

        let custom = NodeType::from("videoInput");
        assert_eq!(custom, NodeType::Other("videoInput".to_string()));
        assert_eq!(custom.as_str(), "videoInput");
    }

    #[test]
    fn test_node_deserializes_from_editor_json() {
        let node: Node = serde_json::from_value(json!({
            "id": "n1",
            "type": "engine",
            "data": { "model": "sdxl", "steps": "25", "cfgScale": 6.5 }
        }))
        .unwrap();

        assert_eq!(node.node_type, NodeType::Engine);
        assert_eq!(node.str_field("model"), Some("sdxl"));
        assert_eq!(node.u32_field("steps"), Some(25));
        assert_eq!(node.f64_field("cfgScale"), Some(6.5));
    }

    #[test]
    fn test_str_field_ignores_blank_values() {
        let node = Node::new("t", NodeType::TextInput).with("prompt", "   ");
        assert_eq!(node.str_field("prompt"), None);
        assert_eq!(node.str_field("missing"), None);
    }

    #[test]
    fn test_missing_data_defaults_to_empty() {
        let node: Node = serde_json::from_value(json!({ "id": "o", "type": "output" })).unwrap();
        assert!(node.data.is_empty());
    }
}
