// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

use crate::engine::NodeOutcome;
use crate::graph::NodeId;

/// Per-run memo of node outcomes, single-flight per node.
///
/// Every node ID owns one `OnceCell`. The first caller to reach a node runs its
/// initializer; concurrent callers for the same node wait on the same cell and receive
/// the same outcome. That gives at-most-one handler invocation per node per run under
/// both evaluation strategies, and makes shared ancestors ("diamonds") compute once.
///
/// Empty outcomes are memoized as well, so a failed node is not retried by a second
/// consumer within the same run.
#[derive(Debug, Default)]
pub struct ExecutionCache {
    cells: Mutex<HashMap<NodeId, Arc<OnceCell<NodeOutcome>>>>,
}

impl ExecutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    async fn cell(&self, id: &str) -> Arc<OnceCell<NodeOutcome>> {
        let mut cells = self.cells.lock().await;
        cells.entry(id.to_string()).or_default().clone()
    }

    /// Settled outcome for `id`, if any. Nodes still in flight report `None`.
    pub async fn get(&self, id: &str) -> Option<NodeOutcome> {
        let cells = self.cells.lock().await;
        cells.get(id).and_then(|cell| cell.get().cloned())
    }

    /// Store an outcome. Returns `false` when `id` was already settled (write-once).
    pub async fn put(&self, id: &str, outcome: NodeOutcome) -> bool {
        self.cell(id).await.set(outcome).is_ok()
    }

    /// Return the memoized outcome for `id`, running `init` if no one has yet.
    ///
    /// The flag is `true` only for the caller whose `init` actually ran.
    pub async fn get_or_init<F, Fut>(&self, id: &str, init: F) -> (NodeOutcome, bool)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = NodeOutcome>,
    {
        let cell = self.cell(id).await;
        let mut computed = false;
        let flag = &mut computed;
        let outcome = cell
            .get_or_init(move || async move {
                *flag = true;
                init().await
            })
            .await
            .clone();
        (outcome, computed)
    }

    /// Drop every memoized outcome.
    pub async fn clear(&self) {
        self.cells.lock().await.clear();
    }

    /// All settled outcomes.
    pub async fn snapshot(&self) -> HashMap<NodeId, NodeOutcome> {
        let cells = self.cells.lock().await;
        cells
            .iter()
            .filter_map(|(id, cell)| cell.get().map(|o| (id.clone(), o.clone())))
            .collect()
    }

    pub async fn len(&self) -> usize {
        let cells = self.cells.lock().await;
        cells.values().filter(|cell| cell.initialized()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
