// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::config::consts::DEFAULT_LORA_WEIGHT;
use crate::engine::{ExecutionResult, NodeInputs};
use crate::errors::HandlerError;
use crate::graph::Node;
use crate::service::LoraSpec;
use crate::traits::{HandlerContext, NodeHandler};

pub const LORA_MODEL_KEY: &str = "loraModel";

/// LoRA settings of a gear node, if it names a model.
pub fn lora_of(node: &Node) -> Option<LoraSpec> {
    let model = node.str_field(LORA_MODEL_KEY)?;
    Some(LoraSpec {
        model: model.to_string(),
        weight: node.f64_field("weight").unwrap_or(DEFAULT_LORA_WEIGHT),
    })
}

/// Configuration-only node carrying one LoRA modifier.
///
/// Its text result (`lora:<model>:<weight>`) is informational. Engines read gear
/// settings straight from connected gear nodes through the graph context.
#[derive(Debug, Default, Clone, Copy)]
pub struct GearHandler;

#[async_trait]
impl NodeHandler for GearHandler {
    async fn handle(
        &self,
        node: &Node,
        _inputs: &NodeInputs,
        _ctx: &HandlerContext<'_>,
    ) -> Result<Option<ExecutionResult>, HandlerError> {
        let lora = lora_of(node).ok_or(HandlerError::MissingConfiguration(LORA_MODEL_KEY))?;
        Ok(Some(ExecutionResult::text(format!(
            "lora:{}:{}",
            lora.model, lora.weight
        ))))
    }

    fn name(&self) -> &'static str {
        "gear"
    }
}
