// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for connection gate transitions.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// # Log Level
/// `info!` - Important operational event
pub struct ConnectionPending<'a> {
    pub source: &'a str,
    pub target: &'a str,
}

impl Display for ConnectionPending<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Connection '{}' -> '{}' is waiting for an image role",
            self.source, self.target
        )
    }
}

impl StructuredLog for ConnectionPending<'_> {
    fn log(&self) {
        tracing::info!(source = self.source, target_node = self.target, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "connection_pending",
            span_name = name,
            source = self.source,
            target_node = self.target,
        )
    }
}

/// # Log Level
/// `info!` - Important operational event
pub struct ConnectionCommitted<'a> {
    pub source: &'a str,
    pub target: &'a str,
    pub role: Option<&'a str>,
}

impl Display for ConnectionCommitted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Connected '{}' -> '{}'", self.source, self.target)?;
        if let Some(role) = self.role {
            write!(f, " as {}", role)?;
        }
        Ok(())
    }
}

impl StructuredLog for ConnectionCommitted<'_> {
    fn log(&self) {
        tracing::info!(
            source = self.source,
            target_node = self.target,
            role = self.role,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "connection_committed",
            span_name = name,
            source = self.source,
            target_node = self.target,
        )
    }
}

/// # Log Level
/// `info!` - Important operational event
pub struct ConnectionAbandoned<'a> {
    pub source: &'a str,
    pub target: &'a str,
}

impl Display for ConnectionAbandoned<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Pending connection '{}' -> '{}' abandoned",
            self.source, self.target
        )
    }
}

impl StructuredLog for ConnectionAbandoned<'_> {
    fn log(&self) {
        tracing::info!(source = self.source, target_node = self.target, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "connection_abandoned",
            span_name = name,
            source = self.source,
            target_node = self.target,
        )
    }
}
