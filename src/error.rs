use std::fmt;

/// Error taxonomy for the whole crate.
///
/// Decryption callers that want a single boolean to branch on should use
/// [`crate::pipeline::decrypt_file`], which folds [`Self::CipherFailure`]
/// and unclassified failures into `false` and logs the root cause, while
/// letting [`Self::InputMissing`] and [`Self::Cancelled`] propagate.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// The input file does not exist.
    InputMissing(String),
    /// Header magic or version mismatch.
    InvalidContainer,
    /// Key file is empty or could not be parsed in any supported format.
    InvalidKey,
    /// The cipher rejected the ciphertext (decryption only).
    CipherFailure(String),
    /// The operation observed a cancellation signal.
    Cancelled,
    /// A read or write failed for a reason other than the above.
    IOFailure(String),
    /// An invariant the code relies on was violated; this is a bug.
    Internal(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InputMissing(path) => write!(f, "input file not found: {path}"),
            Self::InvalidContainer => write!(
                f,
                "not a valid container: magic or version did not match"
            ),
            Self::InvalidKey => write!(f, "key is empty or not in a supported format"),
            Self::CipherFailure(reason) => write!(f, "cipher operation failed: {reason}"),
            Self::Cancelled => write!(f, "operation was cancelled"),
            Self::IOFailure(reason) => write!(f, "i/o failure: {reason}"),
            Self::Internal(reason) => write!(f, "internal error: {reason}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::IOFailure(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
