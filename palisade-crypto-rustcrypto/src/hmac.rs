//! HMAC implementations using the `hmac` crate.

use hmac::Mac;
use palisade_crypto::{Error, HashAlgorithm, Hmac, Result};

type HmacSha256 = hmac::Hmac<sha2::Sha256>;
type HmacSha384 = hmac::Hmac<sha2::Sha384>;

/// Create a keyed HMAC instance for the specified algorithm.
pub fn create_hmac(algorithm: HashAlgorithm, key: &[u8]) -> Result<Box<dyn Hmac>> {
    match algorithm {
        HashAlgorithm::Sha256 => {
            let mac = HmacSha256::new_from_slice(key)
                .map_err(|_| Error::Internal("HMAC key setup failed".into()))?;
            Ok(Box::new(HmacSha256Impl { mac }))
        }
        HashAlgorithm::Sha384 => {
            let mac = HmacSha384::new_from_slice(key)
                .map_err(|_| Error::Internal("HMAC key setup failed".into()))?;
            Ok(Box::new(HmacSha384Impl { mac }))
        }
    }
}

struct HmacSha256Impl {
    mac: HmacSha256,
}

impl Hmac for HmacSha256Impl {
    fn update(&mut self, data: &[u8]) {
        self.mac.update(data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.mac.finalize().into_bytes().to_vec()
    }

    fn output_size(&self) -> usize {
        32
    }

    fn algorithm(&self) -> HashAlgorithm {
        HashAlgorithm::Sha256
    }
}

struct HmacSha384Impl {
    mac: HmacSha384,
}

impl Hmac for HmacSha384Impl {
    fn update(&mut self, data: &[u8]) {
        self.mac.update(data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.mac.finalize().into_bytes().to_vec()
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
    fn test_hmac_sha256_deterministic() {
        let mut a = create_hmac(HashAlgorithm::Sha256, b"key").unwrap();
        a.update(b"message");
        let mut b = create_hmac(HashAlgorithm::Sha256, b"key").unwrap();
        b.update(b"message");
        assert_eq!(a.finalize(), b.finalize());
    }

    #[test]
    fn test_hmac_key_sensitivity() {
        let mut a = create_hmac(HashAlgorithm::Sha256, b"key-1").unwrap();
        a.update(b"message");
        let mut b = create_hmac(HashAlgorithm::Sha256, b"key-2").unwrap();
        b.update(b"message");
        assert_ne!(a.finalize(), b.finalize());
    }
}
