//! Signature implementations (ECDSA P-256).

use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature as EcdsaSignature, SigningKey, VerifyingKey};
use palisade_crypto::{Error, Result, Signature, SignatureScheme};

/// Create a signature instance for the specified scheme.
pub fn create_signature(scheme: SignatureScheme) -> Result<Box<dyn Signature>> {
    match scheme {
        SignatureScheme::EcdsaSecp256r1Sha256 => Ok(Box::new(EcdsaP256)),
        other => Err(Error::UnsupportedAlgorithm(other.name().into())),
    }
}

struct EcdsaP256;

impl Signature for EcdsaP256 {
    fn sign(&self, private_key: &[u8], message: &[u8]) -> Result<Vec<u8>> {
        let key = SigningKey::from_slice(private_key).map_err(|_| Error::InvalidPrivateKey)?;
        let signature: EcdsaSignature = key.sign(message);
        Ok(signature.to_der().as_bytes().to_vec())
    }

    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<()> {
        let key = VerifyingKey::from_sec1_bytes(public_key).map_err(|_| Error::InvalidPublicKey)?;
        let signature =
            EcdsaSignature::from_der(signature).map_err(|_| Error::InvalidSignature)?;
        key.verify(message, &signature)
            .map_err(|_| Error::SignatureVerificationFailed)
    }

    fn scheme(&self) -> SignatureScheme {
        SignatureScheme::EcdsaSecp256r1Sha256
    }
}
