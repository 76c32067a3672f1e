use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapError {
    #[error("Site configuration not found: {0}")]
    MissingConfig(PathBuf),

    #[error("Malformed metadata header in {path}: {reason}")]
    MalformedHeader { path: PathBuf, reason: String },

    #[error("Site directory already exists: {0}")]
    SiteExists(PathBuf),

    #[error("Refusing to clear output directory {0}: it contains the site sources")]
    UnsafeOutput(PathBuf),

    #[error("Invalid timestamp token: {0}")]
    InvalidToken(String),

    #[error("Collection not found: {0}")]
    UnknownCollection(String),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Template error: {0}")]
    Template(#[from] stencil::Error),
}

pub type Result<T> = std::result::Result<T, SnapError>;
