// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod dependency_index;
mod loader;
mod runtime;
mod validation;

pub mod consts;

pub use dependency_index::DependencyIndex;
pub use loader::{
    load_and_validate_graph, load_config, load_graph, persist_updates, save_graph, Config,
    EvaluationStrategy, ExecutorOptions, ServiceBackend, ServiceConfig,
};
pub use runtime::RuntimeBuilder;
pub use validation::{find_cycle_from, validate_graph};
