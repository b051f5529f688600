// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for node handler execution.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Handler execution started.
///
/// # Log Level
/// `debug!` - Diagnostic detail
pub struct HandlerStarted<'a> {
    pub handler: &'a str,
    pub node_id: &'a str,
    pub input_count: usize,
}

impl Display for HandlerStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Handler '{}' started for node '{}' with {} inputs",
            self.handler, self.node_id, self.input_count
        )
    }
}

impl StructuredLog for HandlerStarted<'_> {
    fn log(&self) {
        tracing::debug!(
            handler = self.handler,
            node_id = self.node_id,
            input_count = self.input_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "handler",
            span_name = name,
            handler = self.handler,
            node_id = self.node_id,
        )
    }
}

/// Handler finished, with or without a value.
///
/// # Log Level
/// `debug!` - Diagnostic detail
pub struct HandlerCompleted<'a> {
    pub handler: &'a str,
    pub node_id: &'a str,
    pub produced: bool,
    pub duration: std::time::Duration,
}

impl Display for HandlerCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Handler '{}' completed for node '{}': produced={}, duration={:?}",
            self.handler, self.node_id, self.produced, self.duration
        )
    }
}

impl StructuredLog for HandlerCompleted<'_> {
    fn log(&self) {
        tracing::debug!(
            handler = self.handler,
            node_id = self.node_id,
            produced = self.produced,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "handler_completed",
            span_name = name,
            handler = self.handler,
            node_id = self.node_id,
        )
    }
}

/// Handler gave up.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use render_graph::observability::messages::handler::HandlerFailed;
///
/// let error = std::io::Error::new(std::io::ErrorKind::NotFound, "mask.png");
/// let msg = HandlerFailed {
///     handler: "tool",
///     node_id: "inpaint-1",
///     error: &error,
/// };
///
/// assert_eq!(msg.to_string(), "Handler 'tool' failed for node 'inpaint-1': mask.png");
/// ```
pub struct HandlerFailed<'a> {
    pub handler: &'a str,
    pub node_id: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for HandlerFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Handler '{}' failed for node '{}': {}",
            self.handler, self.node_id, self.error
        )
    }
}

impl StructuredLog for HandlerFailed<'_> {
    fn log(&self) {
        tracing::error!(
            handler = self.handler,
            node_id = self.node_id,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "handler_failed",
            span_name = name,
            handler = self.handler,
            node_id = self.node_id,
            error = %self.error,
        )
    }
}

/// An upstream value was not usable by a handler and was left out.
///
/// # Log Level
/// `debug!` - Diagnostic detail
pub struct InputIgnored<'a> {
    pub node_id: &'a str,
    pub source_id: &'a str,
    pub source_type: &'a str,
}

impl Display for InputIgnored<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' ignores input from '{}' ({})",
            self.node_id, self.source_id, self.source_type
        )
    }
}

impl StructuredLog for InputIgnored<'_> {
    fn log(&self) {
        tracing::debug!(
            node_id = self.node_id,
            source_id = self.source_id,
            source_type = self.source_type,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "input_ignored",
            span_name = name,
            node_id = self.node_id,
            source_id = self.source_id,
        )
    }
}
