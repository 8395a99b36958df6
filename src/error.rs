//! Error taxonomy shared by compression and decompression.
//!
//! Every failure aborts the whole operation. There is no resumable state: a caller that
//! gets an error must start over from the beginning of the input.

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum XpressError {
    /// The destination buffer cannot hold the output.
    #[error("insufficient buffer")]
    InsufficientBuffer,
    /// The compressed input is malformed.
    #[error("invalid data: {0}")]
    InvalidData(&'static str),
    /// An internal invariant was broken. Never caused by input data.
    #[error("internal error: {0}")]
    Internal(&'static str),
}

impl From<XpressError> for std::io::Error {
    fn from(e: XpressError) -> Self {
        let kind = match e {
            XpressError::InsufficientBuffer => std::io::ErrorKind::OutOfMemory,
            XpressError::InvalidData(_) => std::io::ErrorKind::InvalidData,
            XpressError::Internal(_) => std::io::ErrorKind::Other,
        };
        std::io::Error::new(kind, e)
    }
}
