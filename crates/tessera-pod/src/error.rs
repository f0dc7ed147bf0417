use tessera_core::{CoreError, ErrorKind};
use tessera_crypto::CryptoError;

/// POD construction, parsing, and commitment errors.
#[derive(Debug, thiserror::Error)]
pub enum PodError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("invalid pod: {0}")]
    InvalidPod(String),

    #[error("entry not found: {0}")]
    EntryNotFound(String),

    #[error("missing type mapping for entry {0:?}")]
    MissingTypeMapping(String),

    #[error("cannot encode entry {entry:?} as {abi_type}: {reason}")]
    Encoding {
        entry: String,
        abi_type: String,
        reason: String,
    },

    #[error("value out of range for entry {entry:?}: {reason}")]
    EncodingRange { entry: String, reason: String },

    #[error("external commitment has no entries to commit")]
    NoCommitmentLeaves,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PodError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Core(e) => e.kind(),
            Self::InvalidPod(_) | Self::Encoding { .. } | Self::Serialization(_) => ErrorKind::Type,
            Self::EncodingRange { .. } => ErrorKind::Range,
            Self::EntryNotFound(_) | Self::MissingTypeMapping(_) => ErrorKind::Reference,
            Self::Crypto(_) | Self::NoCommitmentLeaves => ErrorKind::General,
        }
    }
}
