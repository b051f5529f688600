// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::engine::{ExecutionResult, NodeInputs};
use crate::errors::HandlerError;
use crate::graph::Node;
use crate::traits::{HandlerContext, NodeHandler};

/// Terminal sink: passes the first image input through unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct OutputHandler;

#[async_trait]
impl NodeHandler for OutputHandler {
    async fn handle(
        &self,
        _node: &Node,
        inputs: &NodeInputs,
        _ctx: &HandlerContext<'_>,
    ) -> Result<Option<ExecutionResult>, HandlerError> {
        inputs
            .first_image()
            .map(|url| Some(ExecutionResult::image(url)))
            .ok_or_else(|| HandlerError::MissingInput("image".to_string()))
    }

    fn name(&self) -> &'static str {
        "output"
    }
}
