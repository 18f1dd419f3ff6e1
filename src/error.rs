use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(&'static str),

    #[error("File '{0}' not found in archive")]
    NotFound(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Input is empty")]
    EmptyInput,

    #[error("Invalid archive format: {0}")]
    InvalidFormat(String),

    #[error("Encoded stream of {0} bits exceeds the 32-bit length field")]
    TooLarge(u64),
}
