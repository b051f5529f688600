// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use crate::errors::ServiceError;

/// Why a handler could not produce a result.
///
/// The executor turns every variant into an empty node outcome; the split between
/// precondition errors and failures decides whether that outcome reads as skipped
/// (or blocked) versus failed.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// A required input wired through an edge is absent.
    #[error("missing input: {0}")]
    MissingInput(String),

    /// A required field in the node's own data is absent.
    #[error("missing configuration field '{0}'")]
    MissingConfiguration(&'static str),

    #[error("invalid value '{value}' for '{field}'")]
    InvalidConfiguration { field: &'static str, value: String },

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HandlerError {
    /// True when the handler gave up before attempting any work.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            HandlerError::MissingInput(_)
                | HandlerError::MissingConfiguration(_)
                | HandlerError::InvalidConfiguration { .. }
        )
    }
}
