//! Error types for the simulator.
//!
//! Only two classes of failure are fatal: bad input detected before the first
//! step, and snapshot output that cannot be persisted (its directory or a
//! single step's file). Coincident
//! particles and an implicit iteration that hits its cap are not errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("failed to read scenario {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML scenario {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to parse JSON scenario {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write snapshot for step {step} to {path}: {source}")]
    OutputWrite {
        step: usize,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SimError {
    pub fn config(msg: impl Into<String>) -> Self {
        SimError::Configuration(msg.into())
    }

    /// True for errors in the scenario input. Output failures are not.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, SimError::OutputDir { .. } | SimError::OutputWrite { .. })
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
