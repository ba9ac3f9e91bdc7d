//! Error types for automation documents.

use thiserror::Error;

/// Errors raised while reading an automation document.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("document root must be a mapping")]
    NotAMapping,

    #[error("{section} #{position} is not a mapping")]
    MalformedEntry {
        section: &'static str,
        position: usize,
    },
}
