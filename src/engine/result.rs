// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::graph::{NodeId, NodeType};

/// Value carried along an edge.
///
/// Handlers match on the variant instead of guessing from the string contents, so a
/// prompt that happens to start with `http` is still text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum ExecutionResult {
    Text(String),
    ImageRef(String),
}

impl ExecutionResult {
    pub fn text(value: impl Into<String>) -> Self {
        ExecutionResult::Text(value.into())
    }

    pub fn image(url: impl Into<String>) -> Self {
        ExecutionResult::ImageRef(url.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ExecutionResult::Text(text) => Some(text),
            ExecutionResult::ImageRef(_) => None,
        }
    }

    pub fn as_image(&self) -> Option<&str> {
        match self {
            ExecutionResult::ImageRef(url) => Some(url),
            ExecutionResult::Text(_) => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ExecutionResult::Text(_) => "text",
            ExecutionResult::ImageRef(_) => "image",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            ExecutionResult::Text(v) | ExecutionResult::ImageRef(v) => v,
        }
    }
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind(), self.value())
    }
}

/// Why a node produced nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EmptyReason {
    /// The handler's own precondition wasn't met although every upstream produced a value.
    Skipped { reason: String },
    /// The handler couldn't run because these upstream nodes produced nothing.
    Blocked { upstream: Vec<NodeId> },
    /// A remote call or I/O operation failed.
    Failed { reason: String },
    /// No handler is registered for the node's type.
    Unhandled { node_type: String },
    /// The node doesn't exist.
    Dangling,
}

impl EmptyReason {
    pub fn is_failure(&self) -> bool {
        matches!(self, EmptyReason::Failed { .. })
    }
}

impl fmt::Display for EmptyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyReason::Skipped { reason } => write!(f, "skipped: {}", reason),
            EmptyReason::Blocked { upstream } => {
                write!(f, "blocked by upstream: {}", upstream.join(", "))
            }
            EmptyReason::Failed { reason } => write!(f, "failed: {}", reason),
            EmptyReason::Unhandled { node_type } => {
                write!(f, "no handler for node type '{}'", node_type)
            }
            EmptyReason::Dangling => write!(f, "node does not exist"),
        }
    }
}

/// Terminal state of one node in one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum NodeOutcome {
    Produced { result: ExecutionResult },
    Empty { why: EmptyReason },
}

impl NodeOutcome {
    pub fn produced(result: ExecutionResult) -> Self {
        NodeOutcome::Produced { result }
    }

    pub fn empty(why: EmptyReason) -> Self {
        NodeOutcome::Empty { why }
    }

    pub fn result(&self) -> Option<&ExecutionResult> {
        match self {
            NodeOutcome::Produced { result } => Some(result),
            NodeOutcome::Empty { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<&EmptyReason> {
        match self {
            NodeOutcome::Produced { .. } => None,
            NodeOutcome::Empty { why } => Some(why),
        }
    }

    pub fn is_produced(&self) -> bool {
        matches!(self, NodeOutcome::Produced { .. })
    }
}

/// One evaluated upstream value, tagged with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeInput {
    pub source: NodeId,
    pub source_type: NodeType,
    pub result: ExecutionResult,
}

/// Evaluated inputs of a node, in edge-list order with one entry per source node.
///
/// Upstream nodes that produced nothing are listed separately in [`NodeInputs::missing`]
/// so the executor can tell a blocked node from one that skipped on its own.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeInputs {
    inputs: Vec<NodeInput>,
    missing: Vec<NodeId>,
}

impl NodeInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of `source`. Sources already recorded are ignored.
    pub fn push(&mut self, source: &str, source_type: Option<&NodeType>, outcome: &NodeOutcome) {
        if self.contains(source) {
            return;
        }
        match (outcome.result(), source_type) {
            (Some(result), Some(source_type)) => self.inputs.push(NodeInput {
                source: source.to_string(),
                source_type: source_type.clone(),
                result: result.clone(),
            }),
            _ => self.missing.push(source.to_string()),
        }
    }

    /// Builder-style helper for handler tests.
    pub fn with(mut self, source: &str, source_type: NodeType, result: ExecutionResult) -> Self {
        self.push(source, Some(&source_type), &NodeOutcome::produced(result));
        self
    }

    pub fn contains(&self, source: &str) -> bool {
        self.inputs.iter().any(|i| i.source == source) || self.missing.iter().any(|m| m == source)
    }

    pub fn get(&self, source: &str) -> Option<&ExecutionResult> {
        self.inputs
            .iter()
            .find(|i| i.source == source)
            .map(|i| &i.result)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeInput> {
        self.inputs.iter()
    }

    /// Image-valued inputs, paired with their URL.
    pub fn images(&self) -> impl Iterator<Item = (&NodeInput, &str)> {
        self.inputs
            .iter()
            .filter_map(|i| i.result.as_image().map(|url| (i, url)))
    }

    pub fn first_image(&self) -> Option<&str> {
        self.images().next().map(|(_, url)| url)
    }

    /// Non-empty texts produced by upstream nodes of `source_type`.
    pub fn texts_from<'a>(&'a self, source_type: &'a NodeType) -> impl Iterator<Item = &'a str> {
        self.inputs
            .iter()
            .filter(move |i| &i.source_type == source_type)
            .filter_map(|i| i.result.as_text())
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    pub fn missing(&self) -> &[NodeId] {
        &self.missing
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_starting_with_http_stays_text() {
        let result = ExecutionResult::text("http is a protocol");
        assert_eq!(result.as_text(), Some("http is a protocol"));
        assert_eq!(result.as_image(), None);
    }

    #[test]
    fn test_inputs_dedupe_by_source_and_track_missing() {
        let mut inputs = NodeInputs::new();
        let image = NodeOutcome::produced(ExecutionResult::image("https://img/a.png"));
        let empty = NodeOutcome::empty(EmptyReason::Failed {
            reason: "timeout".to_string(),
        });

        inputs.push("a", Some(&NodeType::ImageInput), &image);
        inputs.push("a", Some(&NodeType::ImageInput), &image);
        inputs.push("b", Some(&NodeType::Tool), &empty);
        inputs.push("ghost", None, &NodeOutcome::empty(EmptyReason::Dangling));

        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs.missing(), &["b".to_string(), "ghost".to_string()]);
        assert_eq!(inputs.first_image(), Some("https://img/a.png"));
    }

    #[test]
    fn test_texts_from_filters_by_source_type() {
        let inputs = NodeInputs::new()
            .with("t1", NodeType::TextInput, ExecutionResult::text("red fox"))
            .with("t2", NodeType::TextInput, ExecutionResult::text("  "))
            .with("g", NodeType::Gear, ExecutionResult::text("lora:ink:1"));

        let texts: Vec<&str> = inputs.texts_from(&NodeType::TextInput).collect();
        assert_eq!(texts, vec!["red fox"]);
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let outcome = NodeOutcome::produced(ExecutionResult::image("https://img/x.png"));
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "produced");
        assert_eq!(json["result"]["kind"], "imageRef");
        assert_eq!(json["result"]["value"], "https://img/x.png");
    }
}
