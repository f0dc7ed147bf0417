/// Cryptographic operation errors.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("signature verification failed")]
    SignatureVerificationFailed,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("merkle tree has no leaves")]
    EmptyTree,

    #[error("merkle tree too deep: {entries} leaves need depth {depth}, maximum is {max}")]
    TreeTooDeep {
        entries: usize,
        depth: usize,
        max: usize,
    },

    #[error("invalid merkle proof: {0}")]
    InvalidProof(String),
}
