use thiserror::Error;

pub type WrunnerResult<T> = Result<T, WrunnerError>;

#[derive(Error, Debug)]
pub enum WrunnerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// A binary, directory, or required file the operation depends on is absent.
    #[error("Missing prerequisite: {0}")]
    MissingPrerequisite(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Component error: {0}")]
    Component(String),

    #[error("Prefix error: {0}")]
    Prefix(String),
}
