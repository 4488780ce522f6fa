use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed or truncated JSON. Fatal; records emitted before the
    /// failure stay committed.
    #[error("{path}: malformed JSON: {source}")]
    Stream {
        path: PathBuf,
        #[source]
        source: json_event_parser::JsonParseError,
    },

    /// The index destination could not be opened. Raised before any
    /// input token is read.
    #[error("cannot open index at {path}: {reason}")]
    Destination { path: PathBuf, reason: String },

    /// The index could not be finalized. Reported, never fatal; records
    /// already committed remain valid.
    #[error("failed to finalize index: {0}")]
    Flush(#[source] tantivy::TantivyError),

    #[error("index error: {0}")]
    Index(#[from] tantivy::TantivyError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("data directory does not exist and could not be created: {0}")]
    DataDir(PathBuf),
}
