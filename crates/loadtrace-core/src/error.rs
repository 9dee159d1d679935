use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read log file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid log structure: {0}")]
    InvalidStructure(String),

    #[error("Invalid host pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
