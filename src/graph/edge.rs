// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};

use crate::graph::NodeId;

/// A directed arc carrying the result of `source` into `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: NodeId,
    pub target: NodeId,
}

impl Edge {
    pub fn new(id: impl Into<String>, source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
        }
    }

    /// Edge with a freshly generated id, as created by an interactive connection.
    pub fn connect(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), source, target)
    }

    /// Same endpoints, ignoring the id.
    pub fn joins(&self, other: &Edge) -> bool {
        self.source == other.source && self.target == other.target
    }
}
