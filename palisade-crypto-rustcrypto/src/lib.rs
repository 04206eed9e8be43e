//! # RustCrypto-backed Provider for Palisade
//!
//! This crate implements the [`palisade_crypto`] provider interface on top of
//! the RustCrypto ecosystem (`sha2`, `hmac`, `hkdf`) and the dalek/NIST curve
//! crates (`x25519-dalek`, `p256`).
//!
//! ## Supported Algorithms
//!
//! - **Hash**: SHA-256, SHA-384
//! - **HMAC**: with SHA-256, SHA-384
//! - **KDF**: HKDF-Extract / HKDF-Expand
//! - **Key Exchange**: X25519, ECDH P-256
//! - **Signatures**: ECDSA P-256 (DER-encoded)
//! - **RNG**: operating system CSPRNG
//!
//! ## Example
//!
//! ```rust
//! use palisade_crypto::{CryptoProvider, HashAlgorithm};
//! use palisade_crypto_rustcrypto::RustCryptoProvider;
//!
//! let provider = RustCryptoProvider::new();
//! let mut hash = provider.hash(HashAlgorithm::Sha256).unwrap();
//! hash.update(b"hello");
//! assert_eq!(hash.finalize().len(), 32);
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    unused_qualifications,
    missing_debug_implementations
)]

use palisade_crypto::{
    CryptoProvider, Hash, HashAlgorithm, Hmac, Kdf, KdfAlgorithm, KeyExchange,
    KeyExchangeAlgorithm, Random, Result, Signature, SignatureScheme,
};

pub mod hash;
pub mod hkdf;
pub mod hmac;
pub mod kex;
pub mod random;
pub mod signature;

/// Crypto provider backed by the RustCrypto ecosystem.
#[derive(Debug, Default)]
pub struct RustCryptoProvider {
    random: random::OsRandom,
}

impl RustCryptoProvider {
    /// Create a new provider instance.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CryptoProvider for RustCryptoProvider {
    fn hash(&self, algorithm: HashAlgorithm) -> Result<Box<dyn Hash>> {
        hash::create_hash(algorithm)
    }

    fn hmac(&self, algorithm: HashAlgorithm, key: &[u8]) -> Result<Box<dyn Hmac>> {
        hmac::create_hmac(algorithm, key)
    }

    fn kdf(&self, algorithm: KdfAlgorithm) -> Result<Box<dyn Kdf>> {
        hkdf::create_kdf(algorithm)
    }

    fn random(&self) -> &dyn Random {
        &self.random
    }

    fn key_exchange(&self, algorithm: KeyExchangeAlgorithm) -> Result<Box<dyn KeyExchange>> {
        kex::create_key_exchange(algorithm)
    }

    fn signature(&self, scheme: SignatureScheme) -> Result<Box<dyn Signature>> {
        signature::create_signature(scheme)
    }
}
