use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChainpointError {
    #[error("Unsupported hash algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Invalid leaf encoding: {0}")]
    InvalidLeafEncoding(String),

    #[error("Cannot build a Merkle tree with no leaves")]
    EmptyTree,

    #[error("Merkle tree is not built; call build() first")]
    TreeNotReady,

    #[error("Leaf index {index} out of range for {count} leaves")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("Malformed receipt: {0}")]
    MalformedReceipt(String),

    #[error("Unsupported receipt hash type: {0}")]
    UnsupportedHashType(String),

    #[error("Output script carries no OP_RETURN data payload")]
    NoDataPayload,

    #[error("Malformed anchor payload: {0}")]
    MalformedAnchorPayload(String),

    #[error("Anchor fetch failed: {0}")]
    AnchorFetchFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ChainpointError>;
