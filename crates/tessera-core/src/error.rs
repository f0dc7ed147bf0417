use std::fmt;

/// Broad failure category shared by every Tessera crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Wrong shape or tag for a value or configuration field.
    Type,
    /// Numeric value or interval outside permitted bounds.
    Range,
    /// A name, cross-reference, or list name does not resolve.
    Reference,
    /// Everything else (contradictions, missing artifacts, catalog conflicts).
    General,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type => write!(f, "TypeError"),
            Self::Range => write!(f, "RangeError"),
            Self::Reference => write!(f, "ReferenceError"),
            Self::General => write!(f, "Error"),
        }
    }
}

/// Core value-model errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("type error: {0}")]
    TypeError(String),

    #[error("range error: {0}")]
    RangeError(String),

    #[error("invalid name: {0}")]
    InvalidName(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// The taxonomy category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TypeError(_) | Self::InvalidName(_) | Self::Serialization(_) => ErrorKind::Type,
            Self::RangeError(_) => ErrorKind::Range,
            Self::Config(_) | Self::Io(_) => ErrorKind::General,
        }
    }
}
