// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GateError {
    #[error("No connection is waiting for classification")]
    NothingPending,

    #[error("Node '{0}' does not exist")]
    UnknownNode(String),

    #[error("'{from}' is already connected to '{to}'")]
    AlreadyConnected { from: String, to: String },
}
