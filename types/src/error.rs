use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid address length: expected 26 bytes, got {0}")]
    InvalidAddressLength(usize),

    #[error("invalid identifier length: expected {expected} bytes, got {got}")]
    InvalidIdLength { expected: usize, got: usize },

    #[error("invalid alias '{0}': must be 4-30 lowercase latin letters, digits or . _ @ -")]
    InvalidAlias(String),

    #[error("alias bytes are not valid UTF-8")]
    AliasNotUtf8,
}
