// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Node handler strategies, one per node type.
//!
//! Subtypes (`rerenderingType`, `toolType`) are parsed into enums and dispatched
//! inside the owning handler, so adding a subtype is a compile-checked change to one
//! match rather than a new string case somewhere in the executor.

use std::collections::HashMap;
use std::sync::Arc;

use crate::engine::NodeInputs;
use crate::graph::{Node, NodeType};
use crate::traits::NodeHandler;

pub mod control_net;
pub mod engine;
pub mod gear;
pub mod image_input;
pub mod output;
pub mod rerendering;
pub mod text_input;
pub mod tool;

pub use control_net::ControlNetHandler;
pub use engine::EngineHandler;
pub use gear::GearHandler;
pub use image_input::ImageInputHandler;
pub use output::OutputHandler;
pub use rerendering::{RerenderingHandler, RerenderingType};
pub use text_input::TextInputHandler;
pub use tool::{ToolHandler, ToolType};

/// Node type → handler lookup, populated at startup.
#[derive(Clone, Default)]
pub struct HandlerRegistry(pub HashMap<NodeType, Arc<dyn NodeHandler>>);

impl HandlerRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Registry with a handler for each of the eight built-in node types.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(NodeType::TextInput, Arc::new(TextInputHandler));
        registry.register(NodeType::ImageInput, Arc::new(ImageInputHandler));
        registry.register(NodeType::ControlNet, Arc::new(ControlNetHandler));
        registry.register(NodeType::Rerendering, Arc::new(RerenderingHandler));
        registry.register(NodeType::Tool, Arc::new(ToolHandler));
        registry.register(NodeType::Engine, Arc::new(EngineHandler));
        registry.register(NodeType::Gear, Arc::new(GearHandler));
        registry.register(NodeType::Output, Arc::new(OutputHandler));
        registry
    }

    /// Insert or replace the handler for `node_type`
    pub fn register(&mut self, node_type: NodeType, handler: Arc<dyn NodeHandler>) {
        self.0.insert(node_type, handler);
    }

    pub fn get(&self, node_type: &NodeType) -> Option<&Arc<dyn NodeHandler>> {
        self.0.get(node_type)
    }

    pub fn contains(&self, node_type: &NodeType) -> bool {
        self.0.contains_key(node_type)
    }

    pub fn types(&self) -> impl Iterator<Item = &NodeType> {
        self.0.keys()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut handlers: Vec<(&str, &str)> = self
            .0
            .iter()
            .map(|(t, h)| (t.as_str(), h.name()))
            .collect();
        handlers.sort();
        f.debug_struct("HandlerRegistry")
            .field("handler_count", &self.0.len())
            .field("handlers", &handlers)
            .finish()
    }
}

impl From<HashMap<NodeType, Arc<dyn NodeHandler>>> for HandlerRegistry {
    fn from(map: HashMap<NodeType, Arc<dyn NodeHandler>>) -> Self {
        Self(map)
    }
}

/// The node's own `prompt`, else the texts of connected `textInput` nodes joined by ", ".
pub(crate) fn resolve_prompt(node: &Node, inputs: &NodeInputs) -> Option<String> {
    if let Some(prompt) = node.str_field("prompt") {
        return Some(prompt.to_string());
    }
    let joined = inputs
        .texts_from(&NodeType::TextInput)
        .collect::<Vec<_>>()
        .join(", ");
    (!joined.is_empty()).then_some(joined)
}

#[cfg(test)]
pub(crate) mod test_support {
    use tokio::sync::Mutex;

    use crate::engine::{ExecutionResult, NodeInputs};
    use crate::errors::HandlerError;
    use crate::graph::{Edge, GraphContext, GraphModel, Node, NodeUpdate};
    use crate::service::GenerationService;
    use crate::traits::{HandlerContext, NodeHandler};

    pub struct HandlerRun {
        pub result: Result<Option<ExecutionResult>, HandlerError>,
        pub updates: Vec<NodeUpdate>,
    }

    /// Run `handler` for node `node_id` of a graph built from `nodes`/`edges`.
    pub async fn run_handler(
        handler: &dyn NodeHandler,
        nodes: Vec<Node>,
        edges: Vec<Edge>,
        node_id: &str,
        inputs: NodeInputs,
        service: &dyn GenerationService,
    ) -> HandlerRun {
        let graph = GraphModel::new(nodes, edges);
        let updates = Mutex::new(Vec::new());
        let node = graph.node(node_id).expect("node under test must exist").clone();
        let ctx = HandlerContext::new(GraphContext::new(&graph), service, &updates);

        let result = handler.handle(&node, &inputs, &ctx).await;
        HandlerRun {
            result,
            updates: updates.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ExecutionResult;

    #[test]
    fn test_default_registry_covers_known_types() {
        let registry = HandlerRegistry::with_defaults();
        for node_type in NodeType::known() {
            assert!(registry.contains(&node_type), "missing {}", node_type);
        }
        assert!(!registry.contains(&NodeType::from("videoInput")));
    }

    #[test]
    fn test_resolve_prompt_prefers_node_prompt() {
        let node = Node::new("e", NodeType::Engine).with("prompt", "castle");
        let inputs = NodeInputs::new().with("t", NodeType::TextInput, ExecutionResult::text("moat"));
        assert_eq!(resolve_prompt(&node, &inputs).as_deref(), Some("castle"));
    }

    #[test]
    fn test_resolve_prompt_joins_text_inputs() {
        let node = Node::new("e", NodeType::Engine);
        let inputs = NodeInputs::new()
            .with("t1", NodeType::TextInput, ExecutionResult::text("castle"))
            .with("g", NodeType::Gear, ExecutionResult::text("lora:ink:1"))
            .with("t2", NodeType::TextInput, ExecutionResult::text("moat"));
        assert_eq!(resolve_prompt(&node, &inputs).as_deref(), Some("castle, moat"));
        assert_eq!(resolve_prompt(&node, &NodeInputs::new()), None);
    }
}
