use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid tag length {got}: expected 1 to 32 bytes")]
    InvalidTagLength { got: usize },

    #[error("tag mismatch")]
    TagMismatch,
}
