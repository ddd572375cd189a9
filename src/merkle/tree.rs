/// Binary Merkle tree over an ordered batch of leaves.
///
/// Hashing follows the Chainpoint convention:
///   leaf digest     = H(data)            (or the pre-hashed digest as-is)
///   internal digest = H(left || right)   (raw digest bytes, not hex)
///
/// If the number of nodes at any level is odd, the last node is promoted
/// (not duplicated) to the next level unchanged.
///
/// The tree has a build lifecycle: leaves accumulate first, `build()`
/// fixes the root, and any mutation drops the tree back to not-ready.
/// Once built it is safe to read concurrently; building and reading
/// must not overlap.
use crate::crypto::HashAlgorithm;
use crate::error::{ChainpointError, Result};

/// A Merkle tree bound to one hash algorithm.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    algorithm: HashAlgorithm,
    /// All levels once built. levels[0] = leaf digests, levels[last] = [root].
    pub(crate) levels: Vec<Vec<Vec<u8>>>,
    /// Leaf digests in insertion order.
    leaves: Vec<Vec<u8>>,
    ready: bool,
}

impl MerkleTree {
    /// Create an empty, not-ready tree.
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            levels: Vec::new(),
            leaves: Vec::new(),
            ready: false,
        }
    }

    /// The hash algorithm this tree was created with.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Clear all leaves and the built tree, returning to the empty state.
    pub fn reset(&mut self) {
        self.leaves.clear();
        self.levels.clear();
        self.ready = false;
    }

    /// Append a raw leaf; its digest is computed with the tree's algorithm.
    pub fn add_leaf(&mut self, data: &[u8]) {
        self.leaves.push(self.algorithm.digest(data));
        self.ready = false;
    }

    /// Append a pre-hashed leaf supplied as a hex-encoded digest.
    ///
    /// The digest must decode to exactly the algorithm's output length.
    pub fn add_leaf_digest(&mut self, digest_hex: &str) -> Result<()> {
        let digest = hex::decode(digest_hex).map_err(|e| {
            ChainpointError::InvalidLeafEncoding(format!("not valid hex: {e}"))
        })?;
        if digest.len() != self.algorithm.digest_len() {
            return Err(ChainpointError::InvalidLeafEncoding(format!(
                "expected {} digest bytes for {}, got {}",
                self.algorithm.digest_len(),
                self.algorithm,
                digest.len()
            )));
        }
        self.leaves.push(digest);
        self.ready = false;
        Ok(())
    }

    /// Append a batch of raw leaves in order.
    pub fn add_leaves<'a, I>(&mut self, values: I)
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        for value in values {
            self.add_leaf(value);
        }
    }

    /// Append a batch of pre-hashed hex digests in order.
    ///
    /// Stops at the first invalid digest; leaves added before the failure
    /// remain in the tree.
    pub fn add_leaf_digests<'a, I>(&mut self, digests: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        for digest in digests {
            self.add_leaf_digest(digest)?;
        }
        Ok(())
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Digest of the leaf at `index`.
    pub fn leaf(&self, index: usize) -> Result<&[u8]> {
        self.leaves
            .get(index)
            .map(Vec::as_slice)
            .ok_or(ChainpointError::IndexOutOfRange {
                index,
                count: self.leaves.len(),
            })
    }

    /// Whether `build()` has succeeded since the last reset/mutation.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Build the tree bottom-up and fix the root digest.
    ///
    /// Pairs adjacent nodes left-to-right at each level; an unpaired
    /// trailing node is promoted to the next level unchanged. Idempotent
    /// when the leaves have not changed.
    pub fn build(&mut self) -> Result<()> {
        if self.leaves.is_empty() {
            return Err(ChainpointError::EmptyTree);
        }
        if self.ready {
            return Ok(());
        }

        let mut levels = vec![self.leaves.clone()];
        while levels.last().expect("at least one level").len() > 1 {
            let current = levels.last().expect("at least one level");
            let mut next = Vec::with_capacity(current.len().div_ceil(2));

            let mut i = 0;
            while i + 1 < current.len() {
                next.push(self.hash_pair(&current[i], &current[i + 1]));
                i += 2;
            }
            // Odd node: promote without duplication
            if i < current.len() {
                next.push(current[i].clone());
            }

            levels.push(next);
        }

        self.levels = levels;
        self.ready = true;
        Ok(())
    }

    /// The root digest. Fails until `build()` has succeeded.
    pub fn root(&self) -> Result<&[u8]> {
        if !self.ready {
            return Err(ChainpointError::TreeNotReady);
        }
        Ok(self
            .levels
            .last()
            .and_then(|l| l.first())
            .expect("ready tree has a root")
            .as_slice())
    }

    /// The root digest, hex-encoded.
    pub fn root_hex(&self) -> Result<String> {
        self.root().map(hex::encode)
    }

    fn hash_pair(&self, left: &[u8], right: &[u8]) -> Vec<u8> {
        let mut input = Vec::with_capacity(left.len() + right.len());
        input.extend_from_slice(left);
        input.extend_from_slice(right);
        self.algorithm.digest(&input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sha256(data: &[u8]) -> Vec<u8> {
        HashAlgorithm::Sha256.digest(data)
    }

    fn sha256_pair(left: &[u8], right: &[u8]) -> Vec<u8> {
        let mut input = left.to_vec();
        input.extend_from_slice(right);
        sha256(&input)
    }

    #[test]
    fn test_single_leaf_root_is_leaf() {
        let mut tree = MerkleTree::new(HashAlgorithm::Sha256);
        tree.add_leaf(b"hello");
        tree.build().unwrap();
        assert_eq!(tree.root().unwrap(), sha256(b"hello").as_slice());
    }

    #[test]
    fn test_two_leaves() {
        let mut tree = MerkleTree::new(HashAlgorithm::Sha256);
        tree.add_leaves([b"a".as_slice(), b"b".as_slice()]);
        tree.build().unwrap();
        let expected = sha256_pair(&sha256(b"a"), &sha256(b"b"));
        assert_eq!(tree.root().unwrap(), expected.as_slice());
    }

    #[test]
    fn test_three_leaves_known_root() {
        // sha256 tree over "a", "b", "c": the unpaired third leaf is
        // promoted, giving root H(H(H(a)||H(b)) || H(c)).
        let mut tree = MerkleTree::new(HashAlgorithm::Sha256);
        tree.add_leaves([b"a".as_slice(), b"b".as_slice(), b"c".as_slice()]);
        tree.build().unwrap();
        assert_eq!(tree.leaf_count(), 3);
        assert_eq!(
            tree.root_hex().unwrap(),
            "7075152d03a5cd92104887b476862778ec0c87be5c2fa1c0a90f87c49fad6eff"
        );
    }

    #[test]
    fn test_promotion_differs_from_duplication() {
        let mut tree = MerkleTree::new(HashAlgorithm::Sha256);
        tree.add_leaves([b"a".as_slice(), b"b".as_slice(), b"c".as_slice()]);
        tree.build().unwrap();

        // Root a duplicating implementation would produce:
        // H(H(H(a)||H(b)) || H(H(c)||H(c)))
        let h_ab = sha256_pair(&sha256(b"a"), &sha256(b"b"));
        let h_cc = sha256_pair(&sha256(b"c"), &sha256(b"c"));
        let duplicated_root = sha256_pair(&h_ab, &h_cc);
        assert_eq!(
            hex::encode(&duplicated_root),
            "d31a37ef6ac14a2db1470c4316beb5592e6afd4465022339adafda76a18ffabe"
        );
        assert_ne!(tree.root().unwrap(), duplicated_root.as_slice());
    }

    #[test]
    fn test_empty_tree_fails() {
        let mut tree = MerkleTree::new(HashAlgorithm::Sha256);
        assert!(matches!(tree.build(), Err(ChainpointError::EmptyTree)));
        assert!(matches!(tree.root(), Err(ChainpointError::TreeNotReady)));
    }

    #[test]
    fn test_not_ready_until_built() {
        let mut tree = MerkleTree::new(HashAlgorithm::Sha256);
        tree.add_leaf(b"a");
        assert!(!tree.is_ready());
        assert!(matches!(tree.root(), Err(ChainpointError::TreeNotReady)));
        tree.build().unwrap();
        assert!(tree.is_ready());
    }

    #[test]
    fn test_mutation_clears_readiness() {
        let mut tree = MerkleTree::new(HashAlgorithm::Sha256);
        tree.add_leaf(b"a");
        tree.build().unwrap();
        tree.add_leaf(b"b");
        assert!(!tree.is_ready());
        assert!(matches!(tree.root(), Err(ChainpointError::TreeNotReady)));
    }

    #[test]
    fn test_build_idempotent() {
        let mut tree = MerkleTree::new(HashAlgorithm::Sha256);
        tree.add_leaves([b"a".as_slice(), b"b".as_slice(), b"c".as_slice()]);
        tree.build().unwrap();
        let first = tree.root().unwrap().to_vec();
        tree.build().unwrap();
        assert_eq!(tree.root().unwrap(), first.as_slice());
    }

    #[test]
    fn test_reset() {
        let mut tree = MerkleTree::new(HashAlgorithm::Sha256);
        tree.add_leaf(b"a");
        tree.build().unwrap();
        tree.reset();
        assert_eq!(tree.leaf_count(), 0);
        assert!(!tree.is_ready());
    }

    #[test]
    fn test_leaf_accessors() {
        let mut tree = MerkleTree::new(HashAlgorithm::Sha256);
        tree.add_leaf(b"a");
        assert_eq!(tree.leaf(0).unwrap(), sha256(b"a").as_slice());
        assert!(matches!(
            tree.leaf(1),
            Err(ChainpointError::IndexOutOfRange { index: 1, count: 1 })
        ));
    }

    #[test]
    fn test_pre_hashed_leaves() {
        let mut tree = MerkleTree::new(HashAlgorithm::Sha256);
        tree.add_leaf_digests([
            hex::encode(sha256(b"a")).as_str(),
            hex::encode(sha256(b"b")).as_str(),
            hex::encode(sha256(b"c")).as_str(),
        ])
        .unwrap();
        tree.build().unwrap();
        assert_eq!(
            tree.root_hex().unwrap(),
            "7075152d03a5cd92104887b476862778ec0c87be5c2fa1c0a90f87c49fad6eff"
        );
    }

    #[test]
    fn test_pre_hashed_leaf_bad_hex() {
        let mut tree = MerkleTree::new(HashAlgorithm::Sha256);
        assert!(matches!(
            tree.add_leaf_digest("zz"),
            Err(ChainpointError::InvalidLeafEncoding(_))
        ));
    }

    #[test]
    fn test_pre_hashed_leaf_wrong_length() {
        let mut tree = MerkleTree::new(HashAlgorithm::Sha256);
        // 28 bytes: a sha224-length digest fed to a sha256 tree
        let short = hex::encode([0u8; 28]);
        assert!(matches!(
            tree.add_leaf_digest(&short),
            Err(ChainpointError::InvalidLeafEncoding(_))
        ));
    }

    #[test]
    fn test_deterministic_across_builds() {
        let mut t1 = MerkleTree::new(HashAlgorithm::Sha3_256);
        let mut t2 = MerkleTree::new(HashAlgorithm::Sha3_256);
        for t in [&mut t1, &mut t2] {
            t.add_leaves([b"x".as_slice(), b"y".as_slice(), b"z".as_slice()]);
            t.build().unwrap();
        }
        assert_eq!(t1.root().unwrap(), t2.root().unwrap());
    }
}
