use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// The input as a whole is not a sequence of record objects.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}
