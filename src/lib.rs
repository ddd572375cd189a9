pub mod anchor;
pub mod crypto;
pub mod error;
pub mod merkle;
pub mod receipt;
pub mod validator;

pub use crypto::HashAlgorithm;
pub use error::{ChainpointError, Result};
pub use merkle::MerkleTree;
pub use receipt::Receipt;
pub use validator::{ReceiptValidator, Verdict};
