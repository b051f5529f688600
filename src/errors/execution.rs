// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Run-level failures.
///
/// Node-level problems never surface here; they degrade to an empty outcome for the
/// node (see `engine::EmptyReason`). Only conditions that make the whole evaluation
/// meaningless abort a run.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Cyclic dependency detected: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },
}
