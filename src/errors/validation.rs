// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

/// Problems found while validating a graph document
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A circular dependency was detected between nodes
    CyclicDependency {
        /// The cycle path, first node repeated at the end
        cycle: Vec<String>,
    },
    /// Two nodes share the same ID
    DuplicateNodeId {
        /// The duplicate node ID
        node_id: String,
    },
    /// An edge references a node that doesn't exist.
    ///
    /// Reported as a warning: at run time the missing node simply contributes nothing.
    DanglingEdge {
        /// The edge holding the reference
        edge_id: String,
        /// The endpoint that couldn't be resolved
        missing_node: String,
    },
    /// A node has a type no handler is registered for (warning)
    UnknownNodeType {
        node_id: String,
        node_type: String,
    },
}

impl ValidationError {
    /// Warnings are logged but don't make a document unusable.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            ValidationError::DanglingEdge { .. } | ValidationError::UnknownNodeType { .. }
        )
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::CyclicDependency { cycle } => {
                write!(f, "Cyclic dependency detected: {}", cycle.join(" -> "))
            }
            ValidationError::DuplicateNodeId { node_id } => {
                write!(f, "Duplicate node ID: '{}'", node_id)
            }
            ValidationError::DanglingEdge {
                edge_id,
                missing_node,
            } => {
                write!(
                    f,
                    "Edge '{}' references node '{}' which does not exist",
                    edge_id, missing_node
                )
            }
            ValidationError::UnknownNodeType { node_id, node_type } => {
                write!(
                    f,
                    "Node '{}' has unknown type '{}' and will produce no result",
                    node_id, node_type
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}
