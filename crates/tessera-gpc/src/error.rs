use tessera_core::{CoreError, ErrorKind};
use tessera_pod::PodError;

/// Proof configuration, input, and circuit selection errors.
#[derive(Debug, thiserror::Error)]
pub enum GpcError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Pod(#[from] PodError),

    #[error("type error: {0}")]
    TypeError(String),

    #[error("range error: {0}")]
    RangeError(String),

    #[error("reference error: {0}")]
    ReferenceError(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("constraint violated: {0}")]
    ConstraintViolation(String),

    #[error("conflicting tuple arities: {0}")]
    TupleConflict(String),

    #[error("catalog error: {0}")]
    Catalog(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl GpcError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Core(e) => e.kind(),
            Self::Pod(e) => e.kind(),
            Self::TypeError(_) | Self::Serialization(_) => ErrorKind::Type,
            Self::RangeError(_) => ErrorKind::Range,
            Self::ReferenceError(_) => ErrorKind::Reference,
            Self::InvalidConfig(_)
            | Self::ConstraintViolation(_)
            | Self::TupleConflict(_)
            | Self::Catalog(_)
            | Self::Backend(_)
            | Self::Io(_) => ErrorKind::General,
        }
    }
}
