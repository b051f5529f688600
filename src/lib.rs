// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod config;     // config, graph loading + validation
pub mod engine;     // graph executor
pub mod errors;     // error handling
pub mod graph;      // node graph model
pub mod handlers;   // per-node-type behavior
pub mod observability;
pub mod service;    // remote generation service
pub mod traits;     // unified abstractions
