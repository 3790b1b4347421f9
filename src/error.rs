use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::result;

/// The error type for operations that can be expressed as a pure
/// `Result`, namely `FsLevel` translation.
///
/// Everything downstream of level translation (pool exhaustion, codec
/// failure, header corruption) is reported as a return code per the
/// adapter's block-in/block-out contract, not as an `Error` — see
/// `compress::compress` and `decompress::decompress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The `FsLevel` ordinal does not fall in the normal `1..=19` range
    /// nor in the fixed fast-level set.
    InvalidLevel,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match *self {
            Error::InvalidLevel => write!(f, "invalid compression level"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        None
    }
}

pub type Result<T> = result::Result<T, Error>;
