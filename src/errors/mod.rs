// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod execution;
mod gate;
mod handler;
mod service;
mod validation;

pub use config::ConfigError;
pub use execution::ExecutionError;
pub use gate::GateError;
pub use handler::HandlerError;
pub use service::ServiceError;
pub use validation::ValidationError;
