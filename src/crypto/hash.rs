/// Hash algorithm registry for Chainpoint v2 receipts.
///
/// Chainpoint fixes a closed set of eight digest algorithms (the SHA-2
/// and SHA-3 families). Each algorithm maps to a pure digest function
/// and to the `Chainpoint*v2` type URI used in the receipt `type` field.
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use sha3::{Sha3_224, Sha3_256, Sha3_384, Sha3_512};

use crate::error::{ChainpointError, Result};

/// A Chainpoint v2 hash algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Sha3_224,
    Sha3_256,
    Sha3_384,
    Sha3_512,
}

/// All supported algorithms, in tag order.
pub const ALL_ALGORITHMS: [HashAlgorithm; 8] = [
    HashAlgorithm::Sha224,
    HashAlgorithm::Sha256,
    HashAlgorithm::Sha384,
    HashAlgorithm::Sha512,
    HashAlgorithm::Sha3_224,
    HashAlgorithm::Sha3_256,
    HashAlgorithm::Sha3_384,
    HashAlgorithm::Sha3_512,
];

impl HashAlgorithm {
    /// Parse an algorithm tag such as `"sha256"` or `"sha3-512"`.
    /// The underscore form (`"sha3_512"`) is accepted as well.
    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag.to_ascii_lowercase().replace('_', "-").as_str() {
            "sha224" => Ok(Self::Sha224),
            "sha256" => Ok(Self::Sha256),
            "sha384" => Ok(Self::Sha384),
            "sha512" => Ok(Self::Sha512),
            "sha3-224" => Ok(Self::Sha3_224),
            "sha3-256" => Ok(Self::Sha3_256),
            "sha3-384" => Ok(Self::Sha3_384),
            "sha3-512" => Ok(Self::Sha3_512),
            _ => Err(ChainpointError::UnsupportedAlgorithm(tag.to_string())),
        }
    }

    /// Resolve a receipt `type` tag (e.g. `"ChainpointSHA256v2"`).
    pub fn from_chainpoint_type(tag: &str) -> Result<Self> {
        ALL_ALGORITHMS
            .iter()
            .find(|a| a.chainpoint_type() == tag)
            .copied()
            .ok_or_else(|| ChainpointError::UnsupportedHashType(tag.to_string()))
    }

    /// The algorithm tag (`"sha256"`, `"sha3-512"`, ...).
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Sha224 => "sha224",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
            Self::Sha3_224 => "sha3-224",
            Self::Sha3_256 => "sha3-256",
            Self::Sha3_384 => "sha3-384",
            Self::Sha3_512 => "sha3-512",
        }
    }

    /// The Chainpoint v2 receipt type URI for this algorithm.
    pub fn chainpoint_type(&self) -> &'static str {
        match self {
            Self::Sha224 => "ChainpointSHA224v2",
            Self::Sha256 => "ChainpointSHA256v2",
            Self::Sha384 => "ChainpointSHA384v2",
            Self::Sha512 => "ChainpointSHA512v2",
            Self::Sha3_224 => "ChainpointSHA3-224v2",
            Self::Sha3_256 => "ChainpointSHA3-256v2",
            Self::Sha3_384 => "ChainpointSHA3-384v2",
            Self::Sha3_512 => "ChainpointSHA3-512v2",
        }
    }

    /// Digest output length in bytes.
    pub fn digest_len(&self) -> usize {
        match self {
            Self::Sha224 | Self::Sha3_224 => 28,
            Self::Sha256 | Self::Sha3_256 => 32,
            Self::Sha384 | Self::Sha3_384 => 48,
            Self::Sha512 | Self::Sha3_512 => 64,
        }
    }

    /// Hash arbitrary data. Pure and stateless.
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha224 => Sha224::digest(data).to_vec(),
            Self::Sha256 => Sha256::digest(data).to_vec(),
            Self::Sha384 => Sha384::digest(data).to_vec(),
            Self::Sha512 => Sha512::digest(data).to_vec(),
            Self::Sha3_224 => Sha3_224::digest(data).to_vec(),
            Self::Sha3_256 => Sha3_256::digest(data).to_vec(),
            Self::Sha3_384 => Sha3_384::digest(data).to_vec(),
            Self::Sha3_512 => Sha3_512::digest(data).to_vec(),
        }
    }
}

impl Default for HashAlgorithm {
    fn default() -> Self {
        Self::Sha256
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_deterministic() {
        let data = b"proof of existence";
        assert_eq!(
            HashAlgorithm::Sha256.digest(data),
            HashAlgorithm::Sha256.digest(data)
        );
    }

    #[test]
    fn test_sha256_known_answer() {
        let digest = HashAlgorithm::Sha256.digest(b"a");
        assert_eq!(
            hex::encode(digest),
            "ca978112ca1bbdcafac231b39a23dc4da786eff8147c4e72b9807785afee48bb"
        );
    }

    #[test]
    fn test_digest_lengths() {
        for algo in ALL_ALGORITHMS {
            assert_eq!(algo.digest(b"x").len(), algo.digest_len());
        }
    }

    #[test]
    fn test_sha2_and_sha3_differ() {
        assert_ne!(
            HashAlgorithm::Sha256.digest(b"x"),
            HashAlgorithm::Sha3_256.digest(b"x")
        );
    }

    #[test]
    fn test_tag_round_trip() {
        for algo in ALL_ALGORITHMS {
            assert_eq!(HashAlgorithm::from_tag(algo.tag()).unwrap(), algo);
        }
    }

    #[test]
    fn test_underscore_tag_accepted() {
        assert_eq!(
            HashAlgorithm::from_tag("sha3_256").unwrap(),
            HashAlgorithm::Sha3_256
        );
    }

    #[test]
    fn test_unknown_tag_rejected() {
        assert!(matches!(
            HashAlgorithm::from_tag("md5"),
            Err(ChainpointError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn test_chainpoint_type_round_trip() {
        for algo in ALL_ALGORITHMS {
            assert_eq!(
                HashAlgorithm::from_chainpoint_type(algo.chainpoint_type()).unwrap(),
                algo
            );
        }
    }

    #[test]
    fn test_unknown_chainpoint_type_rejected() {
        assert!(matches!(
            HashAlgorithm::from_chainpoint_type("ChainpointMD5v2"),
            Err(ChainpointError::UnsupportedHashType(_))
        ));
    }
}
