use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Failed to read history file {path}. {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("History file is not valid JSON. {0}")]
    Parse(#[from] serde_json::Error),
    #[error("History contains no commits")]
    Empty,
    #[error("History asset failed to load. {0}")]
    Asset(String),
}

pub type HistoryResult<T> = Result<T, HistoryError>;
