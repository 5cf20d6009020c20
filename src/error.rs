use thiserror::Error;

use std::path::PathBuf;

#[derive(Debug, Error)]
pub enum QoscError {
    #[error("policy file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("invalid YAML format: {0}")]
    Format(String),

    #[error("empty policy document")]
    EmptyDocument,

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid {section} section: {source}")]
    InvalidSection {
        section: &'static str,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("missing setting '{0}' (set it in the config file, on the command line or in the environment)")]
    MissingSetting(&'static str),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("policy {id} not found")]
    PolicyNotFound { id: String },

    #[error("policy {id} is {status} and cannot be deployed")]
    NotDeployable { id: String, status: String },

    #[error("failed to connect to switch")]
    DeviceUnreachable,

    #[error("failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, QoscError>;
