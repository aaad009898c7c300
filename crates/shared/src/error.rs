use std::path::PathBuf;

/// A single incoming record could not be used. Recoverable: the record is dropped.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("record is empty")]
    Empty,

    #[error("record is not valid UTF-8: {0}")]
    Utf8(#[source] std::str::Utf8Error),

    #[error("record exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("record is not valid JSON: {0}")]
    Json(#[source] serde_json::Error),

    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("record has an unexpected shape: {0}")]
    Shape(#[source] serde_json::Error),

    #[error("record has no text")]
    MissingText,
}

/// Persisting a collected batch failed.
#[derive(Debug, thiserror::Error)]
pub enum SinkWriteError {
    #[error("failed to serialize batch for {}", .path.display())]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to write batch to {}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    #[error("account not found: {account}")]
    AccountNotFound { account: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("timeline API returned error: {status} - {body}")]
    Api { status: u16, body: String },
}

#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("stream connection failed: {0}")]
    Http(#[from] reqwest::Error),
}
