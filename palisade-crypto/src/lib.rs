//! # Palisade Cryptographic Provider Interface
//!
//! This crate defines the cryptographic abstraction layer consumed by the
//! palisade handshake core. It provides trait-based interfaces that allow
//! pluggable cryptographic backends; the core itself never touches a
//! concrete primitive.
//!
//! ## Architecture
//!
//! ```text
//! CryptoProvider (main trait)
//! ├── Hash (SHA-256, SHA-384)
//! ├── Hmac (HMAC with the suite's hash)
//! ├── Kdf (HKDF extract/expand)
//! ├── Random (CSPRNG)
//! ├── KeyExchange (X25519, ECDHE)
//! └── Signature (ECDSA, EdDSA, RSA-PSS)
//! ```
//!
//! All key material handed out by a provider is wrapped in zeroize-on-drop
//! types so secrets do not outlive their use.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    unused_qualifications,
    missing_debug_implementations
)]

pub mod error;
pub mod hash;
pub mod hmac;
pub mod kdf;
pub mod key_exchange;
pub mod random;
pub mod signature;

pub use error::{Error, Result};
pub use hash::{Hash, HashAlgorithm};
pub use hmac::Hmac;
pub use kdf::{Kdf, KdfAlgorithm};
pub use key_exchange::{KeyExchange, KeyExchangeAlgorithm, PrivateKey, PublicKey, SharedSecret};
pub use random::Random;
pub use signature::{Signature, SignatureScheme};

/// The main cryptographic provider trait.
///
/// Implementations of this trait supply every cryptographic operation the
/// handshake core needs. The trait is object-safe so a provider can be
/// passed around as `&dyn CryptoProvider`.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`.
pub trait CryptoProvider: Send + Sync {
    /// Get a hash function instance.
    fn hash(&self, algorithm: HashAlgorithm) -> Result<Box<dyn Hash>>;

    /// Get a keyed HMAC instance.
    fn hmac(&self, algorithm: HashAlgorithm, key: &[u8]) -> Result<Box<dyn Hmac>>;

    /// Get a KDF (key derivation function) instance.
    fn kdf(&self, algorithm: KdfAlgorithm) -> Result<Box<dyn Kdf>>;

    /// Get the random number generator.
    fn random(&self) -> &dyn Random;

    /// Get a key exchange instance.
    fn key_exchange(&self, algorithm: KeyExchangeAlgorithm) -> Result<Box<dyn KeyExchange>>;

    /// Get a signature scheme instance.
    fn signature(&self, scheme: SignatureScheme) -> Result<Box<dyn Signature>>;

    /// Check if the provider supports a specific key exchange algorithm.
    fn supports_key_exchange(&self, algorithm: KeyExchangeAlgorithm) -> bool {
        self.key_exchange(algorithm).is_ok()
    }

    /// Check if the provider supports a specific signature scheme.
    fn supports_signature(&self, scheme: SignatureScheme) -> bool {
        self.signature(scheme).is_ok()
    }
}
