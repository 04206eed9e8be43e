//! Hash function implementations using `sha2`.

use palisade_crypto::{Hash, HashAlgorithm, Result};
use sha2::Digest;

/// Create a hash instance for the specified algorithm.
pub fn create_hash(algorithm: HashAlgorithm) -> Result<Box<dyn Hash>> {
    match algorithm {
        HashAlgorithm::Sha256 => Ok(Box::new(Sha256Hash::default())),
        HashAlgorithm::Sha384 => Ok(Box::new(Sha384Hash::default())),
    }
}

#[derive(Default)]
struct Sha256Hash {
    hasher: sha2::Sha256,
}

impl Hash for Sha256Hash {
    fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.hasher.finalize().to_vec()
    }

    fn output_size(&self) -> usize {
        32
    }

    fn algorithm(&self) -> HashAlgorithm {
        HashAlgorithm::Sha256
    }
}

#[derive(Default)]
struct Sha384Hash {
    hasher: sha2::Sha384,
}

impl Hash for Sha384Hash {
    fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.hasher.finalize().to_vec()
    }

    fn output_size(&self) -> usize {
        48
    }

    fn algorithm(&self) -> HashAlgorithm {
        HashAlgorithm::Sha384
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_empty() {
        let hash = create_hash(HashAlgorithm::Sha256).unwrap();
        let digest = hash.finalize();
        // SHA-256("")
        assert_eq!(
            digest[..4],
            [0xe3, 0xb0, 0xc4, 0x42],
        );
        assert_eq!(digest.len(), 32);
    }

    #[test]
    fn test_sha384_output_size() {
        let mut hash = create_hash(HashAlgorithm::Sha384).unwrap();
        hash.update(b"abc");
        assert_eq!(hash.finalize().len(), 48);
    }
}
