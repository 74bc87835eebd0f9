use graphwire_proto::CodecError;
use std::path::PathBuf;
use thiserror::Error;

/// Core error type for graphwire operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read config at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Registry(#[from] crate::registry::RegistryError),
}

/// Result alias for graphwire operations.
pub type Result<T> = std::result::Result<T, Error>;
