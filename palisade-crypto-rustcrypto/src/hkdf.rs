//! HKDF implementations using the `hkdf` crate.

use hkdf::Hkdf;
use palisade_crypto::{Error, Kdf, KdfAlgorithm, Result};
use sha2::{Sha256, Sha384};

/// Create a KDF instance for the specified algorithm.
pub fn create_kdf(algorithm: KdfAlgorithm) -> Result<Box<dyn Kdf>> {
    match algorithm {
        KdfAlgorithm::HkdfSha256 => Ok(Box::new(HkdfSha256)),
        KdfAlgorithm::HkdfSha384 => Ok(Box::new(HkdfSha384)),
    }
}

struct HkdfSha256;

impl Kdf for HkdfSha256 {
    fn extract(&self, salt: &[u8], ikm: &[u8]) -> Vec<u8> {
        let (prk, _) = Hkdf::<Sha256>::extract(Some(salt), ikm);
        prk.to_vec()
    }

    fn expand(&self, prk: &[u8], info: &[u8], length: usize) -> Result<Vec<u8>> {
        let hk = Hkdf::<Sha256>::from_prk(prk).map_err(|_| Error::InvalidLength)?;
        let mut okm = vec![0u8; length];
        hk.expand(info, &mut okm).map_err(|_| Error::InvalidLength)?;
        Ok(okm)
    }

    fn algorithm(&self) -> KdfAlgorithm {
        KdfAlgorithm::HkdfSha256
    }
}

struct HkdfSha384;

impl Kdf for HkdfSha384 {
    fn extract(&self, salt: &[u8], ikm: &[u8]) -> Vec<u8> {
        let (prk, _) = Hkdf::<Sha384>::extract(Some(salt), ikm);
        prk.to_vec()
    }

    fn expand(&self, prk: &[u8], info: &[u8], length: usize) -> Result<Vec<u8>> {
        let hk = Hkdf::<Sha384>::from_prk(prk).map_err(|_| Error::InvalidLength)?;
        let mut okm = vec![0u8; length];
        hk.expand(info, &mut okm).map_err(|_| Error::InvalidLength)?;
        Ok(okm)
    }

    fn algorithm(&self) -> KdfAlgorithm {
        KdfAlgorithm::HkdfSha384
    }
}
