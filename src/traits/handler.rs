// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::engine::{ExecutionResult, NodeInputs};
use crate::errors::HandlerError;
use crate::graph::{GraphContext, Node, NodeUpdate};
use crate::service::GenerationService;

/// Everything a handler may touch besides its node and evaluated inputs.
pub struct HandlerContext<'a> {
    /// Read-only view of the graph being evaluated
    pub graph: GraphContext<'a>,
    pub service: &'a dyn GenerationService,
    updates: &'a Mutex<Vec<NodeUpdate>>,
}

impl<'a> HandlerContext<'a> {
    pub fn new(
        graph: GraphContext<'a>,
        service: &'a dyn GenerationService,
        updates: &'a Mutex<Vec<NodeUpdate>>,
    ) -> Self {
        Self {
            graph,
            service,
            updates,
        }
    }

    /// Queue a change to node data. Applied by the caller after the run.
    pub async fn emit(&self, update: NodeUpdate) {
        self.updates.lock().await.push(update);
    }
}

/// Strategy for one node type.
///
/// `Ok(None)` and precondition errors (see [`HandlerError::is_precondition`]) both mean
/// "nothing to produce"; the executor records them as skipped or blocked. Any other
/// error is recorded as a failure. Handlers never panic on bad node data.
#[async_trait]
pub trait NodeHandler: Send + Sync {
    async fn handle(
        &self,
        node: &Node,
        inputs: &NodeInputs,
        ctx: &HandlerContext<'_>,
    ) -> Result<Option<ExecutionResult>, HandlerError>;

    fn name(&self) -> &'static str;
}
