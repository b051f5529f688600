// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Node graph data model.
//!
//! * [`GraphDocument`] - the editable, persisted form
//! * [`GraphModel`] - immutable snapshot evaluated by the executor
//! * [`GraphContext`] - read-only view handed to node handlers
//! * [`ConnectionGate`] - deferred commit of role-bearing image connections

pub mod connection_gate;
mod document;
mod edge;
mod model;
mod node;

pub use connection_gate::{ConnectionDecision, ConnectionGate, GateState, ImageRole, IMAGE_TYPE_KEY};
pub use document::{GraphDocument, NodeUpdate};
pub use edge::Edge;
pub use model::{GraphContext, GraphModel};
pub use node::{Node, NodeData, NodeId, NodeType};
