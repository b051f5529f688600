// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::Value;

use crate::engine::{ExecutionResult, NodeInputs};
use crate::errors::HandlerError;
use crate::graph::Node;
use crate::traits::{HandlerContext, NodeHandler};

/// Emits the node's `prompt` as text. A node without a prompt yields empty text.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextInputHandler;

#[async_trait]
impl NodeHandler for TextInputHandler {
    async fn handle(
        &self,
        node: &Node,
        _inputs: &NodeInputs,
        _ctx: &HandlerContext<'_>,
    ) -> Result<Option<ExecutionResult>, HandlerError> {
        let prompt = node.data.get("prompt").and_then(Value::as_str).unwrap_or("");
        Ok(Some(ExecutionResult::text(prompt)))
    }

    fn name(&self) -> &'static str {
        "text_input"
    }
}
