// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::Config;
use crate::engine::{ExecutorFactory, GraphExecutor};
use crate::errors::ServiceError;
use crate::handlers::HandlerRegistry;
use crate::service;

/// Runtime builder - wires the handler registry, generation service, and executor from
/// configuration.
///
/// # Examples
///
/// ```
/// use render_graph::config::{Config, EvaluationStrategy, RuntimeBuilder};
///
/// let executor = RuntimeBuilder::from_config(&Config::default(), true).unwrap();
///
/// assert_eq!(executor.strategy(), EvaluationStrategy::Sequential);
/// assert_eq!(executor.registry().types().count(), 8);
/// ```
pub struct RuntimeBuilder;

impl RuntimeBuilder {
    /// Build an executor with every built-in handler registered.
    ///
    /// `dry_run` forces the recording service regardless of the configured backend.
    pub fn from_config(cfg: &Config, dry_run: bool) -> Result<GraphExecutor, ServiceError> {
        let service = service::from_config(&cfg.service, dry_run)?;
        Ok(ExecutorFactory::from_config(
            cfg,
            HandlerRegistry::with_defaults(),
            service,
        ))
    }
}
