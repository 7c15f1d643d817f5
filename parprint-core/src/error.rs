use thiserror::Error;

use crate::runner::Stage;

#[derive(Error, Debug)]
pub enum ParprintError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SSH error: {0}")]
    Ssh(#[from] ssh2::Error),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("authentication failed for {user}@{host}")]
    Auth { user: String, host: String },

    #[error("{stage} stage exited with status {status}: {stderr}")]
    RemoteCommand {
        stage: Stage,
        status: i32,
        stderr: String,
    },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unknown print queue: {0}")]
    UnknownQueue(String),

    #[error("session pool error: {0}")]
    Pool(String),

    #[error("config error: {0}")]
    Config(String),
}

// Convenient crate-wide result type
pub type Result<T> = std::result::Result<T, ParprintError>;
