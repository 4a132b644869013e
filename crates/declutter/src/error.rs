use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeclutterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Cannot read {path}: {source}")]
    UnreadableFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse message {path}: {message}")]
    MalformedMessage { path: PathBuf, message: String },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Action failed for {path}: {message}")]
    ActionFailed { path: PathBuf, message: String },

    #[error("User input error: {0}")]
    UserInput(String),
}

impl From<dialoguer::Error> for DeclutterError {
    fn from(err: dialoguer::Error) -> Self {
        DeclutterError::UserInput(err.to_string())
    }
}

impl DeclutterError {
    pub fn unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DeclutterError::UnreadableFile {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, DeclutterError>;
