// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for graph evaluation events.
//!
//! This module contains message types for logging events related to:
//! * Run lifecycle (start, completion, abort)
//! * Per-node outcomes (produced, empty, cached)
//! * Dangling references and unhandled node types

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Evaluation of a target node started.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use render_graph::observability::messages::engine::ExecutionStarted;
///
/// let msg = ExecutionStarted {
///     target: "output-1",
///     strategy: "sequential",
///     node_count: 6,
/// };
///
/// assert!(msg.to_string().contains("output-1"));
/// ```
pub struct ExecutionStarted<'a> {
    pub target: &'a str,
    pub strategy: &'a str,
    pub node_count: usize,
}

impl Display for ExecutionStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Evaluating '{}' with {} strategy over {} nodes",
            self.target, self.strategy, self.node_count
        )
    }
}

impl StructuredLog for ExecutionStarted<'_> {
    fn log(&self) {
        tracing::info!(
            target_node = self.target,
            strategy = self.strategy,
            node_count = self.node_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "execution",
            span_name = name,
            target_node = self.target,
            strategy = self.strategy,
            node_count = self.node_count,
        )
    }
}

/// Evaluation of a target node finished (with or without a result).
///
/// # Log Level
/// `info!` - Important operational event
pub struct ExecutionCompleted<'a> {
    pub target: &'a str,
    pub produced: bool,
    pub evaluated: usize,
    pub duration: std::time::Duration,
}

impl Display for ExecutionCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let verdict = if self.produced { "produced a result" } else { "produced nothing" };
        write!(
            f,
            "Evaluation of '{}' {}: {} nodes evaluated in {:?}",
            self.target, verdict, self.evaluated, self.duration
        )
    }
}

impl StructuredLog for ExecutionCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            target_node = self.target,
            produced = self.produced,
            evaluated = self.evaluated,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "execution_completed",
            span_name = name,
            target_node = self.target,
            produced = self.produced,
            duration = ?self.duration,
        )
    }
}

/// Evaluation aborted before any handler ran.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ExecutionFailed<'a> {
    pub target: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for ExecutionFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Evaluation of '{}' aborted: {}", self.target, self.error)
    }
}

impl StructuredLog for ExecutionFailed<'_> {
    fn log(&self) {
        tracing::error!(target_node = self.target, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "execution_failed",
            span_name = name,
            target_node = self.target,
            error = %self.error,
        )
    }
}

/// A node is about to be evaluated. Mostly useful as a span around the node's work.
///
/// # Log Level
/// `debug!` - Diagnostic detail
pub struct NodeEvaluation<'a> {
    pub node_id: &'a str,
    pub node_type: &'a str,
    pub input_count: usize,
}

impl Display for NodeEvaluation<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Evaluating node '{}' ({}) with {} incoming edges",
            self.node_id, self.node_type, self.input_count
        )
    }
}

impl StructuredLog for NodeEvaluation<'_> {
    fn log(&self) {
        tracing::debug!(
            node_id = self.node_id,
            node_type = self.node_type,
            input_count = self.input_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "node",
            span_name = name,
            node_id = self.node_id,
            node_type = self.node_type,
        )
    }
}

/// A node produced a value that was memoized for the rest of the run.
///
/// # Log Level
/// `info!` - Important operational event
pub struct NodeResultProduced<'a> {
    pub node_id: &'a str,
    pub kind: &'a str,
    pub value: &'a str,
}

impl Display for NodeResultProduced<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Node '{}' produced {}: {}", self.node_id, self.kind, self.value)
    }
}

impl StructuredLog for NodeResultProduced<'_> {
    fn log(&self) {
        tracing::info!(
            node_id = self.node_id,
            kind = self.kind,
            value = self.value,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "node_result",
            span_name = name,
            node_id = self.node_id,
            kind = self.kind,
        )
    }
}

/// A node produced nothing.
///
/// # Log Level
/// `error!` when the node failed, `warn!` otherwise
pub struct NodeProducedNothing<'a> {
    pub node_id: &'a str,
    pub node_type: &'a str,
    pub reason: &'a dyn Display,
    pub failed: bool,
}

impl Display for NodeProducedNothing<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' ({}) produced no result: {}",
            self.node_id, self.node_type, self.reason
        )
    }
}

impl StructuredLog for NodeProducedNothing<'_> {
    fn log(&self) {
        if self.failed {
            tracing::error!(
                node_id = self.node_id,
                node_type = self.node_type,
                reason = %self.reason,
                "{}", self
            );
        } else {
            tracing::warn!(
                node_id = self.node_id,
                node_type = self.node_type,
                reason = %self.reason,
                "{}", self
            );
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "node_empty",
            span_name = name,
            node_id = self.node_id,
            node_type = self.node_type,
            reason = %self.reason,
        )
    }
}

/// A node's memoized outcome was reused by another consumer.
///
/// # Log Level
/// `debug!` - Diagnostic detail
pub struct CacheHit<'a> {
    pub node_id: &'a str,
}

impl Display for CacheHit<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Reusing memoized outcome of node '{}'", self.node_id)
    }
}

impl StructuredLog for CacheHit<'_> {
    fn log(&self) {
        tracing::debug!(node_id = self.node_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("cache_hit", span_name = name, node_id = self.node_id)
    }
}

/// An edge points at a node that isn't in the graph.
///
/// # Log Level
/// `warn!` - Recoverable condition
pub struct DanglingReference<'a> {
    pub node_id: &'a str,
}

impl Display for DanglingReference<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' does not exist; treating it as an empty contribution",
            self.node_id
        )
    }
}

impl StructuredLog for DanglingReference<'_> {
    fn log(&self) {
        tracing::warn!(node_id = self.node_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("dangling_reference", span_name = name, node_id = self.node_id)
    }
}

/// No handler is registered for a node's type.
///
/// # Log Level
/// `warn!` - Recoverable condition
pub struct UnhandledNodeType<'a> {
    pub node_id: &'a str,
    pub node_type: &'a str,
}

impl Display for UnhandledNodeType<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "No handler registered for node '{}' of type '{}'",
            self.node_id, self.node_type
        )
    }
}

impl StructuredLog for UnhandledNodeType<'_> {
    fn log(&self) {
        tracing::warn!(node_id = self.node_id, node_type = self.node_type, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "unhandled_node_type",
            span_name = name,
            node_id = self.node_id,
            node_type = self.node_type,
        )
    }
}
