use std::path::PathBuf;

use thiserror::Error;

/// Startup failures. All of these are fatal; `main` propagates them and exits.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    MissingVar(&'static str),

    #[error("{var} has an invalid value: {value}")]
    InvalidVar { var: &'static str, value: String },

    #[error("Credential file {path} could not be read: {source}")]
    CredentialsUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Credential file {path} is malformed: {source}")]
    CredentialsMalformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures from the graph gateway or from validating its rows.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Neo4j error: {0}")]
    Neo4j(String),

    #[error("Row from {query} is missing field `{field}`")]
    MissingField { query: &'static str, field: String },

    #[error("Field `{field}` is not a valid {expected}")]
    InvalidField { field: String, expected: &'static str },
}

#[derive(Error, Debug, PartialEq)]
pub enum ProjectionError {
    #[error("Vector for {label} has dimension {actual}, expected {expected}")]
    DimensionMismatch {
        label: String,
        expected: usize,
        actual: usize,
    },
}
