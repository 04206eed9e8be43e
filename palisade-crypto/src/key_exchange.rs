//! Key exchange algorithms for the TLS 1.3 handshake.

use crate::Result;
use zeroize::Zeroize;

/// Key exchange groups supported by palisade.
///
/// Values correspond to the IANA `supported_groups` registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyExchangeAlgorithm {
    /// X25519 (Curve25519 ECDHE) - TLS 1.3 preferred
    X25519,
    /// secp256r1 (P-256, NIST curve)
    Secp256r1,
    /// secp384r1 (P-384, NIST curve)
    Secp384r1,
    /// X448 (Curve448)
    X448,
}

impl KeyExchangeAlgorithm {
    /// Get the public key size in bytes for this algorithm.
    pub const fn public_key_size(self) -> usize {
        match self {
            KeyExchangeAlgorithm::X25519 => 32,
            KeyExchangeAlgorithm::Secp256r1 => 65, // Uncompressed point
            KeyExchangeAlgorithm::Secp384r1 => 97,
            KeyExchangeAlgorithm::X448 => 56,
        }
    }

    /// Get the shared secret size in bytes.
    pub const fn shared_secret_size(self) -> usize {
        match self {
            KeyExchangeAlgorithm::X25519 => 32,
            KeyExchangeAlgorithm::Secp256r1 => 32,
            KeyExchangeAlgorithm::Secp384r1 => 48,
            KeyExchangeAlgorithm::X448 => 56,
        }
    }

    /// Convert to the wire codepoint (u16 big-endian).
    pub const fn to_u16(self) -> u16 {
        match self {
            KeyExchangeAlgorithm::X25519 => 0x001D,
            KeyExchangeAlgorithm::Secp256r1 => 0x0017,
            KeyExchangeAlgorithm::Secp384r1 => 0x0018,
            KeyExchangeAlgorithm::X448 => 0x001E,
        }
    }

    /// Convert from the wire codepoint (u16 big-endian).
    pub const fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x001D => Some(KeyExchangeAlgorithm::X25519),
            0x0017 => Some(KeyExchangeAlgorithm::Secp256r1),
            0x0018 => Some(KeyExchangeAlgorithm::Secp384r1),
            0x001E => Some(KeyExchangeAlgorithm::X448),
            _ => None,
        }
    }

    /// Get the algorithm name.
    pub const fn name(self) -> &'static str {
        match self {
            KeyExchangeAlgorithm::X25519 => "X25519",
            KeyExchangeAlgorithm::Secp256r1 => "secp256r1",
            KeyExchangeAlgorithm::Secp384r1 => "secp384r1",
            KeyExchangeAlgorithm::X448 => "X448",
        }
    }
}

/// Private key for key exchange.
///
/// Wraps the private key material and zeroizes it on drop.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct PrivateKey {
    bytes: Vec<u8>,
}

impl core::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("bytes", &"<redacted>")
            .finish()
    }
}

impl PrivateKey {
    /// Create a new private key from bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Get the private key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Public key for key exchange.
#[derive(Debug, Clone)]
pub struct PublicKey {
    bytes: Vec<u8>,
}

impl PublicKey {
    /// Create a new public key from bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Get the public key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Convert to owned bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Shared secret from key exchange.
///
/// Wraps the shared secret and zeroizes it on drop.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct SharedSecret {
    bytes: Vec<u8>,
}

impl core::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SharedSecret")
            .field("bytes", &"<redacted>")
            .finish()
    }
}

impl SharedSecret {
    /// Create a new shared secret from bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Get the shared secret bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Key exchange trait.
///
/// ```rust,ignore
/// let kex = provider.key_exchange(KeyExchangeAlgorithm::X25519)?;
/// let (private_key, public_key) = kex.generate_keypair()?;
/// let shared = kex.exchange(&private_key, peer_public_key)?;
/// ```
pub trait KeyExchange: Send + Sync {
    /// Generate an ephemeral key pair.
    ///
    /// The private key MUST come from a CSPRNG and is zeroized on drop.
    fn generate_keypair(&self) -> Result<(PrivateKey, PublicKey)>;

    /// Perform key exchange against the peer's public key bytes.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidPublicKey`](crate::Error::InvalidPublicKey) if the
    ///   peer's public key does not parse for this group
    /// - [`Error::KeyExchangeFailed`](crate::Error::KeyExchangeFailed) otherwise
    fn exchange(&self, private_key: &PrivateKey, peer_public_key: &[u8]) -> Result<SharedSecret>;

    /// Get the algorithm this key exchange implements.
    fn algorithm(&self) -> KeyExchangeAlgorithm;

    /// Get the expected public key size in bytes.
    fn public_key_size(&self) -> usize {
        self.algorithm().public_key_size()
    }
}
