// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Messages are organized by subsystem:
//!
//! * `engine` - run lifecycle and per-node outcomes
//! * `handler` - node handler execution
//! * `service` - calls to the generation service
//! * `validation` - graph validation warnings and errors
//! * `graph` - graph model construction
//! * `gate` - connection gate transitions

use std::fmt::Display;
use tracing::Span;

pub mod engine;
pub mod gate;
pub mod graph;
pub mod handler;
pub mod service;
pub mod validation;

/// A log message that knows its level and structured fields.
pub trait StructuredLog: Display {
    /// Emit the message as a tracing event at its natural level.
    fn log(&self);

    /// A span carrying the same fields, for wrapping the work the message describes.
    fn span(&self, name: &str) -> Span;
}
