// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for generation service calls.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// # Log Level
/// `debug!` - Diagnostic detail
pub struct ServiceCallStarted<'a> {
    pub operation: &'a str,
    pub endpoint: &'a str,
}

impl Display for ServiceCallStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Calling '{}' at {}", self.operation, self.endpoint)
    }
}

impl StructuredLog for ServiceCallStarted<'_> {
    fn log(&self) {
        tracing::debug!(operation = self.operation, endpoint = self.endpoint, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "service_call",
            span_name = name,
            operation = self.operation,
            endpoint = self.endpoint,
        )
    }
}

/// # Log Level
/// `info!` - Important operational event
pub struct ServiceCallCompleted<'a> {
    pub operation: &'a str,
    pub image_url: &'a str,
    pub cost: Option<f64>,
    pub duration: std::time::Duration,
}

impl Display for ServiceCallCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "'{}' returned {} in {:?}",
            self.operation, self.image_url, self.duration
        )?;
        if let Some(cost) = self.cost {
            write!(f, " (cost {})", cost)?;
        }
        Ok(())
    }
}

impl StructuredLog for ServiceCallCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            operation = self.operation,
            image_url = self.image_url,
            cost = self.cost,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "service_call_completed",
            span_name = name,
            operation = self.operation,
        )
    }
}

/// # Log Level
/// `error!` - Failure requiring attention
pub struct ServiceCallFailed<'a> {
    pub operation: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for ServiceCallFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "'{}' failed: {}", self.operation, self.error)
    }
}

impl StructuredLog for ServiceCallFailed<'_> {
    fn log(&self) {
        tracing::error!(operation = self.operation, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "service_call_failed",
            span_name = name,
            operation = self.operation,
            error = %self.error,
        )
    }
}

/// A call recorded instead of sent (dry runs).
///
/// # Log Level
/// `info!` - Important operational event
pub struct ServiceCallRecorded<'a> {
    pub operation: &'a str,
    pub params: &'a str,
    pub image_url: &'a str,
}

impl Display for ServiceCallRecorded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Recorded '{}' -> {} with {}",
            self.operation, self.image_url, self.params
        )
    }
}

impl StructuredLog for ServiceCallRecorded<'_> {
    fn log(&self) {
        tracing::info!(
            operation = self.operation,
            params = self.params,
            image_url = self.image_url,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("service_call_recorded", span_name = name, operation = self.operation)
    }
}
