// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::config::Config;
use crate::engine::GraphExecutor;
use crate::handlers::HandlerRegistry;
use crate::service::GenerationService;

/// Factory for creating graph executors from configuration
pub struct ExecutorFactory;

impl ExecutorFactory {
    /// Create an executor with the configured evaluation strategy and concurrency bound
    pub fn from_config(
        cfg: &Config,
        registry: HandlerRegistry,
        service: Arc<dyn GenerationService>,
    ) -> GraphExecutor {
        GraphExecutor::new(registry, service)
            .with_strategy(cfg.strategy, cfg.executor_options.max_concurrency())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EvaluationStrategy, ExecutorOptions};
    use crate::service::RecordingService;

    #[test]
    fn test_from_config_applies_strategy() {
        let cfg = Config {
            strategy: EvaluationStrategy::Concurrent,
            executor_options: ExecutorOptions {
                max_concurrency: Some(2),
            },
            ..Config::default()
        };

        let executor = ExecutorFactory::from_config(
            &cfg,
            HandlerRegistry::with_defaults(),
            Arc::new(RecordingService::new()),
        );

        assert_eq!(executor.strategy(), EvaluationStrategy::Concurrent);
    }

    #[test]
    fn test_default_config_is_sequential() {
        let executor = ExecutorFactory::from_config(
            &Config::default(),
            HandlerRegistry::new(),
            Arc::new(RecordingService::new()),
        );
        assert_eq!(executor.strategy(), EvaluationStrategy::Sequential);
    }
}
