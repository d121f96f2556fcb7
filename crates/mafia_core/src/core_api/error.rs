use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreErrorCode {
    Io,
    /// Wrong total length for a fixed-layout variant.
    SizeMismatch,
    /// Magic or version check failed after decryption.
    Integrity,
    /// A length-prefixed or counted structure would read past the buffer.
    Overrun,
    /// A decoded value failed a shape check.
    Rejected,
    /// Every format, offset or record was rejected.
    NoViableCandidate,
    UnsupportedOperation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreError {
    pub code: CoreErrorCode,
    pub message: String,
}

impl CoreError {
    pub fn new(code: CoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn size_mismatch(message: impl Into<String>) -> Self {
        Self::new(CoreErrorCode::SizeMismatch, message)
    }

    pub fn overrun(message: impl Into<String>) -> Self {
        Self::new(CoreErrorCode::Overrun, message)
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl Error for CoreError {}
