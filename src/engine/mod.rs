// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Graph evaluation: node outcomes, the memoization cache, and the executor.

pub mod cache;
pub mod executor;
pub mod factory;
pub mod result;

pub use cache::ExecutionCache;
pub use executor::{ExecutionObserver, GraphExecutor, RunReport, TracingObserver};
pub use factory::ExecutorFactory;
pub use result::{EmptyReason, ExecutionResult, NodeInput, NodeInputs, NodeOutcome};
