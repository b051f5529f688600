// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Recursive, memoized graph evaluation.
//!
//! Evaluation is triggered top-down from a target and computed bottom-up:
//!
//! 1. A node's outcome is taken from the [`ExecutionCache`] if it is settled (or awaited
//!    if another branch is computing it).
//! 2. A node missing from the graph is an empty contribution (`Dangling`).
//! 3. Every distinct source of the node's incoming edges is evaluated first, one at a
//!    time in edge order (`sequential`) or all at once (`concurrent`).
//! 4. The handler registered for the node's type runs with the collected inputs.
//! 5. A value is memoized and reported to observers; nothing is memoized too, with the
//!    reason, and consumers apply their own missing-input policy.
//!
//! No node failure aborts a run. The only run-level error is a dependency cycle, which
//! is detected before any handler runs.

use futures::future::{join_all, BoxFuture, FutureExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Semaphore};
use tracing::Instrument;

use crate::config::consts::DEFAULT_MAX_CONCURRENCY;
use crate::config::{find_cycle_from, EvaluationStrategy};
use crate::engine::{EmptyReason, ExecutionCache, ExecutionResult, NodeInputs, NodeOutcome};
use crate::errors::ExecutionError;
use crate::graph::{GraphContext, GraphModel, Node, NodeId, NodeType, NodeUpdate};
use crate::handlers::HandlerRegistry;
use crate::observability::messages::engine::{
    CacheHit, DanglingReference, ExecutionCompleted, ExecutionFailed, ExecutionStarted,
    NodeEvaluation, NodeProducedNothing, NodeResultProduced, UnhandledNodeType,
};
use crate::observability::messages::handler::{HandlerCompleted, HandlerFailed, HandlerStarted};
use crate::observability::messages::validation::CyclicDependencyDetected;
use crate::observability::messages::StructuredLog;
use crate::service::GenerationService;
use crate::traits::{HandlerContext, NodeHandler};

/// Notified whenever a node produces a value.
pub trait ExecutionObserver: Send + Sync {
    fn on_node_result(&self, node_id: &str, result: &ExecutionResult);
}

/// Default observer: one structured log line per produced value.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ExecutionObserver for TracingObserver {
    fn on_node_result(&self, node_id: &str, result: &ExecutionResult) {
        NodeResultProduced {
            node_id,
            kind: result.kind(),
            value: result.value(),
        }
        .log();
    }
}

/// What one evaluation of a target left behind.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub target: NodeId,
    pub outcome: NodeOutcome,
    /// Every node settled so far in the cache used for this run
    pub outcomes: HashMap<NodeId, NodeOutcome>,
    /// Node data changes requested by handlers, for the caller to persist
    pub node_updates: Vec<NodeUpdate>,
    pub duration: Duration,
}

impl RunReport {
    pub fn result(&self) -> Option<&ExecutionResult> {
        self.outcome.result()
    }

    pub fn outcome_of(&self, node_id: &str) -> Option<&NodeOutcome> {
        self.outcomes.get(node_id)
    }
}

/// State shared by every node of one run.
struct RunState<'g> {
    graph: &'g GraphModel,
    cache: &'g ExecutionCache,
    updates: Mutex<Vec<NodeUpdate>>,
    permits: Semaphore,
}

pub struct GraphExecutor {
    registry: HandlerRegistry,
    service: Arc<dyn GenerationService>,
    strategy: EvaluationStrategy,
    max_concurrency: usize,
    observers: Vec<Arc<dyn ExecutionObserver>>,
}

impl std::fmt::Debug for GraphExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphExecutor")
            .field("registry", &self.registry)
            .field("strategy", &self.strategy)
            .field("max_concurrency", &self.max_concurrency)
            .field("observer_count", &self.observers.len())
            .finish()
    }
}

impl GraphExecutor {
    /// Sequential executor with the tracing observer installed.
    pub fn new(registry: HandlerRegistry, service: Arc<dyn GenerationService>) -> Self {
        Self {
            registry,
            service,
            strategy: EvaluationStrategy::Sequential,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            observers: vec![Arc::new(TracingObserver)],
        }
    }

    pub fn with_strategy(mut self, strategy: EvaluationStrategy, max_concurrency: usize) -> Self {
        self.strategy = strategy;
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn strategy(&self) -> EvaluationStrategy {
        self.strategy
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Evaluate `target` with a fresh cache.
    pub async fn run(&self, graph: &GraphModel, target: &str) -> Result<RunReport, ExecutionError> {
        let cache = ExecutionCache::new();
        self.run_with_cache(graph, target, &cache).await
    }

    /// Evaluate every `output` node in document order, sharing one cache.
    pub async fn run_outputs(&self, graph: &GraphModel) -> Result<Vec<RunReport>, ExecutionError> {
        let cache = ExecutionCache::new();
        let targets: Vec<NodeId> = graph
            .nodes_of_type(&NodeType::Output)
            .map(|n| n.id.clone())
            .collect();

        let mut reports = Vec::with_capacity(targets.len());
        for target in &targets {
            reports.push(self.run_with_cache(graph, target, &cache).await?);
        }
        Ok(reports)
    }

    /// Evaluate `target`, reusing (and filling) a caller-owned cache.
    pub async fn run_with_cache(
        &self,
        graph: &GraphModel,
        target: &str,
        cache: &ExecutionCache,
    ) -> Result<RunReport, ExecutionError> {
        if let Some(cycle) = find_cycle_from(graph, target) {
            CyclicDependencyDetected { cycle: &cycle }.log();
            let error = ExecutionError::CyclicDependency { cycle };
            ExecutionFailed {
                target,
                error: &error,
            }
            .log();
            return Err(error);
        }

        let started = ExecutionStarted {
            target,
            strategy: self.strategy.as_str(),
            node_count: graph.len(),
        };
        started.log();
        let start = Instant::now();

        let run = RunState {
            graph,
            cache,
            updates: Mutex::new(Vec::new()),
            permits: Semaphore::new(self.max_concurrency),
        };
        let outcome = self
            .evaluate(&run, target)
            .instrument(started.span("run"))
            .await;

        let outcomes = cache.snapshot().await;
        let duration = start.elapsed();
        ExecutionCompleted {
            target,
            produced: outcome.is_produced(),
            evaluated: outcomes.len(),
            duration,
        }
        .log();

        Ok(RunReport {
            target: target.to_string(),
            outcome,
            outcomes,
            node_updates: run.updates.into_inner(),
            duration,
        })
    }

    fn evaluate<'a>(&'a self, run: &'a RunState<'a>, node_id: &'a str) -> BoxFuture<'a, NodeOutcome> {
        async move {
            let (outcome, computed) = run
                .cache
                .get_or_init(node_id, || self.compute(run, node_id))
                .await;
            if !computed {
                CacheHit { node_id }.log();
            }
            outcome
        }
        .boxed()
    }

    async fn compute(&self, run: &RunState<'_>, node_id: &str) -> NodeOutcome {
        let Some(node) = run.graph.node(node_id) else {
            DanglingReference { node_id }.log();
            return NodeOutcome::empty(EmptyReason::Dangling);
        };

        let span = NodeEvaluation {
            node_id,
            node_type: node.node_type.as_str(),
            input_count: run.graph.incoming(node_id).len(),
        }
        .span("evaluate_node");

        async {
            let inputs = self.gather_inputs(run, node_id).await;
            let outcome = match self.registry.get(&node.node_type) {
                Some(handler) => self.invoke(run, handler.as_ref(), node, &inputs).await,
                None => {
                    UnhandledNodeType {
                        node_id,
                        node_type: node.node_type.as_str(),
                    }
                    .log();
                    NodeOutcome::empty(EmptyReason::Unhandled {
                        node_type: node.node_type.to_string(),
                    })
                }
            };

            match &outcome {
                NodeOutcome::Produced { result } => {
                    for observer in &self.observers {
                        observer.on_node_result(node_id, result);
                    }
                }
                NodeOutcome::Empty { why } => NodeProducedNothing {
                    node_id,
                    node_type: node.node_type.as_str(),
                    reason: why,
                    failed: why.is_failure(),
                }
                .log(),
            }
            outcome
        }
        .instrument(span)
        .await
    }

    /// Outcomes of the node's distinct sources, in edge order.
    async fn gather_inputs(&self, run: &RunState<'_>, node_id: &str) -> NodeInputs {
        let mut sources: Vec<&str> = Vec::new();
        for edge in run.graph.incoming(node_id) {
            if !sources.contains(&edge.source.as_str()) {
                sources.push(edge.source.as_str());
            }
        }

        let outcomes: Vec<NodeOutcome> = match self.strategy {
            EvaluationStrategy::Sequential => {
                let mut outcomes = Vec::with_capacity(sources.len());
                for source in &sources {
                    outcomes.push(self.evaluate(run, source).await);
                }
                outcomes
            }
            EvaluationStrategy::Concurrent => {
                join_all(sources.iter().map(|source| self.evaluate(run, source))).await
            }
        };

        let mut inputs = NodeInputs::new();
        for (source, outcome) in sources.iter().zip(&outcomes) {
            let source_type = run.graph.node(source).map(|n| &n.node_type);
            inputs.push(source, source_type, outcome);
        }
        inputs
    }

    async fn invoke(
        &self,
        run: &RunState<'_>,
        handler: &dyn NodeHandler,
        node: &Node,
        inputs: &NodeInputs,
    ) -> NodeOutcome {
        let _permit = match self.strategy {
            EvaluationStrategy::Concurrent => run.permits.acquire().await.ok(),
            EvaluationStrategy::Sequential => None,
        };
        let ctx = HandlerContext::new(
            GraphContext::new(run.graph),
            self.service.as_ref(),
            &run.updates,
        );

        HandlerStarted {
            handler: handler.name(),
            node_id: &node.id,
            input_count: inputs.len(),
        }
        .log();
        let start = Instant::now();
        let result = handler.handle(node, inputs, &ctx).await;
        HandlerCompleted {
            handler: handler.name(),
            node_id: &node.id,
            produced: matches!(result, Ok(Some(_))),
            duration: start.elapsed(),
        }
        .log();

        match result {
            Ok(Some(value)) => NodeOutcome::produced(value),
            Ok(None) => Self::unproduced(inputs, "handler produced no result".to_string()),
            Err(error) if error.is_precondition() => Self::unproduced(inputs, error.to_string()),
            Err(error) => {
                HandlerFailed {
                    handler: handler.name(),
                    node_id: &node.id,
                    error: &error,
                }
                .log();
                NodeOutcome::empty(EmptyReason::Failed {
                    reason: error.to_string(),
                })
            }
        }
    }

    /// Blocked when an upstream produced nothing, otherwise skipped on its own account.
    fn unproduced(inputs: &NodeInputs, reason: String) -> NodeOutcome {
        if inputs.missing().is_empty() {
            NodeOutcome::empty(EmptyReason::Skipped { reason })
        } else {
            NodeOutcome::empty(EmptyReason::Blocked {
                upstream: inputs.missing().to_vec(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, Node};
    use crate::service::RecordingService;

    fn executor() -> GraphExecutor {
        GraphExecutor::new(HandlerRegistry::with_defaults(), Arc::new(RecordingService::new()))
    }

    #[tokio::test]
    async fn test_missing_target_is_dangling_not_error() {
        let graph = GraphModel::new(vec![], vec![]);

        let report = executor().run(&graph, "nowhere").await.unwrap();

        assert_eq!(report.outcome, NodeOutcome::empty(EmptyReason::Dangling));
        assert!(report.result().is_none());
    }

    #[tokio::test]
    async fn test_cycle_fails_before_any_handler() {
        let service = Arc::new(RecordingService::new());
        let executor = GraphExecutor::new(HandlerRegistry::with_defaults(), service.clone());
        let graph = GraphModel::new(
            vec![
                Node::new("a", NodeType::Engine),
                Node::new("b", NodeType::Engine),
            ],
            vec![Edge::new("e1", "a", "b"), Edge::new("e2", "b", "a")],
        );

        let err = executor.run(&graph, "b").await.unwrap_err();

        assert!(matches!(err, ExecutionError::CyclicDependency { ref cycle } if cycle.len() == 3));
        assert_eq!(service.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_type_is_unhandled() {
        let graph = GraphModel::new(vec![Node::new("v", NodeType::from("videoInput"))], vec![]);

        let report = executor().run(&graph, "v").await.unwrap();

        assert_eq!(
            report.outcome,
            NodeOutcome::empty(EmptyReason::Unhandled {
                node_type: "videoInput".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_blocked_vs_skipped() {
        let graph = GraphModel::new(
            vec![
                Node::new("img", NodeType::ImageInput),
                Node::new("out1", NodeType::Output),
                Node::new("out2", NodeType::Output),
            ],
            vec![Edge::new("e1", "img", "out1")],
        );
        let executor = executor();

        let blocked = executor.run(&graph, "out1").await.unwrap();
        let skipped = executor.run(&graph, "out2").await.unwrap();

        assert_eq!(
            blocked.outcome,
            NodeOutcome::empty(EmptyReason::Blocked {
                upstream: vec!["img".to_string()]
            })
        );
        assert!(matches!(
            skipped.outcome,
            NodeOutcome::Empty {
                why: EmptyReason::Skipped { .. }
            }
        ));
    }

    #[test]
    fn test_with_strategy_clamps_concurrency() {
        let executor = executor().with_strategy(EvaluationStrategy::Concurrent, 0);
        assert_eq!(executor.strategy(), EvaluationStrategy::Concurrent);
        assert_eq!(executor.max_concurrency, 1);
    }
}
