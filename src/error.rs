// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AclInitError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Failed to render node agent template: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Consul request failed: {0}")]
    Transport(String),

    #[error("Consul API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Consul returned an empty secret for {0}")]
    EmptySecret(String),

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AclInitError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AclInitError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, AclInitError>;
