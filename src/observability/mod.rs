// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! All diagnostic and operational logging goes through message types defined in
//! [`messages`]. Each message is a small struct implementing `Display` (the human
//! readable line) and [`messages::StructuredLog`] (the tracing event with fields, plus
//! a matching span), which keeps log text out of the engine and handler code.
//!
//! # Usage
//!
//! ```rust
//! use render_graph::observability::messages::{handler::HandlerFailed, StructuredLog};
//!
//! let error = std::io::Error::new(std::io::ErrorKind::Other, "connection reset");
//! let msg = HandlerFailed {
//!     handler: "engine",
//!     node_id: "engine-1",
//!     error: &error,
//! };
//!
//! msg.log();
//! assert!(msg.to_string().contains("engine-1"));
//! ```

pub mod messages;
