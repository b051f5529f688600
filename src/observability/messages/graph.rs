// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A second node with an already-seen ID was dropped from the evaluation model.
///
/// # Log Level
/// `warn!` - Recoverable condition
pub struct DuplicateNodeIgnored<'a> {
    pub node_id: &'a str,
}

impl Display for DuplicateNodeIgnored<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Ignoring duplicate node '{}'; the first definition wins", self.node_id)
    }
}

impl StructuredLog for DuplicateNodeIgnored<'_> {
    fn log(&self) {
        tracing::warn!(node_id = self.node_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("duplicate_node", span_name = name, node_id = self.node_id)
    }
}
