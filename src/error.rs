//! Error types for Flowrepo.
//!
//! All errors in Flowrepo are represented by the `FlowRepoError` enum,
//! which provides specific variants for different error categories.

use std::{io::ErrorKind, string::FromUtf8Error};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for all Flowrepo operations.
#[derive(Deserialize, Serialize, Error, Debug, Clone, PartialEq)]
pub enum FlowRepoError {
    /// A path, project, script, vertex or commit is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Declarative text failed to parse or lacks required structure.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// A project name or a script file stem is already taken.
    #[error("duplicate name: {0}")]
    DuplicateName(String),

    /// A single path could not be staged during a commit.
    ///
    /// Never returned from a commit; carried by [`crate::StageFailure`].
    #[error("stage failure: {0}")]
    PartialStage(String),

    /// Invalid operation on the project or pipeline model.
    #[error("{0}")]
    Project(String),

    /// Data conversion errors (JSON, YAML).
    #[error("{0}")]
    Convert(String),

    /// Configuration parsing or validation errors.
    #[error("{0}")]
    Config(String),

    /// Storage operation errors.
    #[error("{0}")]
    Store(String),

    /// I/O operation errors.
    #[error("{0}")]
    IoError(String),
}

impl From<FlowRepoError> for String {
    fn from(val: FlowRepoError) -> Self {
        val.to_string()
    }
}

impl From<std::io::Error> for FlowRepoError {
    fn from(error: std::io::Error) -> Self {
        FlowRepoError::IoError(error.to_string())
    }
}

impl From<FlowRepoError> for std::io::Error {
    fn from(val: FlowRepoError) -> Self {
        match val {
            FlowRepoError::NotFound(_) => std::io::Error::new(ErrorKind::NotFound, val.to_string()),
            _ => std::io::Error::other(val.to_string()),
        }
    }
}

impl From<FromUtf8Error> for FlowRepoError {
    fn from(_: FromUtf8Error) -> Self {
        FlowRepoError::Convert("Error with utf-8 string convert".to_string())
    }
}

impl From<serde_json::Error> for FlowRepoError {
    fn from(error: serde_json::Error) -> Self {
        FlowRepoError::Convert(error.to_string())
    }
}

impl From<serde_yaml::Error> for FlowRepoError {
    fn from(error: serde_yaml::Error) -> Self {
        FlowRepoError::Convert(error.to_string())
    }
}

impl From<toml::de::Error> for FlowRepoError {
    fn from(error: toml::de::Error) -> Self {
        FlowRepoError::Config(error.to_string())
    }
}
