//! Signature schemes for TLS 1.3 authentication.

use crate::Result;

/// TLS 1.3 signature schemes (IANA `signature_algorithms` registry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureScheme {
    /// ECDSA with P-256 and SHA-256
    EcdsaSecp256r1Sha256,
    /// ECDSA with P-384 and SHA-384
    EcdsaSecp384r1Sha384,
    /// EdDSA with Curve25519
    Ed25519,
    /// RSA-PSS with SHA-256
    RsaPssRsaeSha256,
    /// RSA-PSS with SHA-384
    RsaPssRsaeSha384,
}

impl SignatureScheme {
    /// Convert to the wire codepoint (u16 big-endian).
    pub const fn to_u16(self) -> u16 {
        match self {
            SignatureScheme::EcdsaSecp256r1Sha256 => 0x0403,
            SignatureScheme::EcdsaSecp384r1Sha384 => 0x0503,
            SignatureScheme::Ed25519 => 0x0807,
            SignatureScheme::RsaPssRsaeSha256 => 0x0804,
            SignatureScheme::RsaPssRsaeSha384 => 0x0805,
        }
    }

    /// Convert from the wire codepoint (u16 big-endian).
    pub const fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0403 => Some(SignatureScheme::EcdsaSecp256r1Sha256),
            0x0503 => Some(SignatureScheme::EcdsaSecp384r1Sha384),
            0x0807 => Some(SignatureScheme::Ed25519),
            0x0804 => Some(SignatureScheme::RsaPssRsaeSha256),
            0x0805 => Some(SignatureScheme::RsaPssRsaeSha384),
            _ => None,
        }
    }

    /// Get the scheme name.
    pub const fn name(self) -> &'static str {
        match self {
            SignatureScheme::EcdsaSecp256r1Sha256 => "ecdsa_secp256r1_sha256",
            SignatureScheme::EcdsaSecp384r1Sha384 => "ecdsa_secp384r1_sha384",
            SignatureScheme::Ed25519 => "ed25519",
            SignatureScheme::RsaPssRsaeSha256 => "rsa_pss_rsae_sha256",
            SignatureScheme::RsaPssRsaeSha384 => "rsa_pss_rsae_sha384",
        }
    }
}

/// Signature scheme trait.
///
/// Sign and verify detached signatures over arbitrary messages. For ECDSA
/// schemes the signature is DER-encoded, matching the TLS wire format.
pub trait Signature: Send + Sync {
    /// Sign a message with the given private key.
    fn sign(&self, private_key: &[u8], message: &[u8]) -> Result<Vec<u8>>;

    /// Verify a signature over a message with the given public key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SignatureVerificationFailed`](crate::Error::SignatureVerificationFailed)
    /// if the signature does not verify.
    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<()>;

    /// Get the scheme this instance implements.
    fn scheme(&self) -> SignatureScheme;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_codepoints() {
        assert_eq!(SignatureScheme::EcdsaSecp256r1Sha256.to_u16(), 0x0403);
        assert_eq!(
            SignatureScheme::from_u16(0x0807),
            Some(SignatureScheme::Ed25519)
        );
        assert_eq!(SignatureScheme::from_u16(0x0000), None);
    }
}
