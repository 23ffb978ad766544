use crate::binarize::BinarizeError;
use crate::coder::RangeCoderError;
use std::error::Error;
use std::fmt;
use std::io;

/// Main error type for the coefficient coder.
#[derive(Debug)]
pub enum CabacError {
    /// An I/O error occurred on the byte sink or source
    Io(io::Error),
    /// An invalid argument was provided
    InvalidArg(String),
    /// A probability table or CDF was rejected
    Config(String),
    /// The coded data is truncated or inconsistent
    Corrupt(String),
    /// The coder was driven incorrectly (e.g. used after flush)
    Encoding(String),
}

impl CabacError {
    /// True for errors caused by bad coded data rather than bad usage.
    pub fn is_corruption(&self) -> bool {
        matches!(self, CabacError::Corrupt(_))
    }
}

impl fmt::Display for CabacError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CabacError::Io(err) => write!(f, "I/O error: {}", err),
            CabacError::InvalidArg(msg) => write!(f, "Invalid argument: {}", msg),
            CabacError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CabacError::Corrupt(msg) => write!(f, "Corrupt stream: {}", msg),
            CabacError::Encoding(msg) => write!(f, "Encoding error: {}", msg),
        }
    }
}

impl Error for CabacError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CabacError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for CabacError {
    fn from(err: io::Error) -> Self {
        CabacError::Io(err)
    }
}

impl From<RangeCoderError> for CabacError {
    fn from(err: RangeCoderError) -> Self {
        match err {
            RangeCoderError::Io(e) => CabacError::Io(e),
            e if e.is_corruption() => CabacError::Corrupt(e.to_string()),
            e => CabacError::Encoding(e.to_string()),
        }
    }
}

impl From<BinarizeError> for CabacError {
    fn from(err: BinarizeError) -> Self {
        match err {
            BinarizeError::Coder(e) => e.into(),
            e if e.is_config() => CabacError::Config(e.to_string()),
            e if e.is_corruption() => CabacError::Corrupt(e.to_string()),
            e => CabacError::Encoding(e.to_string()),
        }
    }
}

/// A specialized `Result` type for coefficient coding operations.
pub type Result<T> = std::result::Result<T, CabacError>;
