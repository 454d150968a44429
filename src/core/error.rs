use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuizError {
    #[error("Content error: {0}")]
    Content(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Match is closed")]
    MatchClosed,

    #[error("Match stalled: {0}")]
    Stalled(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, QuizError>;
