use thiserror::Error;

/// Gateway server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("Gateway already started")]
    AlreadyStarted,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("User store error: {0}")]
    Dao(String),

    #[error("Ban store error: {0}")]
    BanStore(String),
}

pub type Result<T> = std::result::Result<T, ServerError>;
