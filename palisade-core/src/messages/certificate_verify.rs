//! CertificateVerify message.
//!
//! ```text
//! struct {
//!     SignatureScheme algorithm;
//!     opaque signature<0..2^16-1>;
//! } CertificateVerify;
//! ```
//!
//! Signature semantics are the verifier/signer collaborators' concern; this
//! codec keeps the scheme as a raw codepoint so the state machine can map an
//! unknown scheme to `illegal_parameter`.

use crate::error::{Error, Result};
use bytes::{Buf, BufMut, BytesMut};

/// CertificateVerify message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateVerify {
    /// Signature scheme codepoint
    pub scheme: u16,

    /// Signature bytes
    pub signature: Vec<u8>,
}

impl CertificateVerify {
    /// Create a new CertificateVerify.
    pub fn new(scheme: u16, signature: Vec<u8>) -> Self {
        Self { scheme, signature }
    }

    /// Encode to the message payload (without handshake framing).
    pub fn encode(&self) -> Result<Vec<u8>> {
        if self.signature.len() > 0xFFFF {
            return Err(Error::InvalidMessage("Signature too large".into()));
        }
        let mut buf = BytesMut::with_capacity(4 + self.signature.len());
        buf.put_u16(self.scheme);
        buf.put_u16(self.signature.len() as u16);
        buf.put_slice(&self.signature);
        Ok(buf.to_vec())
    }

    /// Decode from the message payload.
    pub fn decode(mut data: &[u8]) -> Result<Self> {
        if data.len() < 4 {
            return Err(Error::InvalidMessage("CertificateVerify too short".into()));
        }
        let scheme = data.get_u16();
        let sig_len = data.get_u16() as usize;
        if data.len() != sig_len {
            return Err(Error::InvalidMessage("Signature length".into()));
        }
        Ok(Self {
            scheme,
            signature: data.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_certificate_verify_encode_decode() {
        let cv = CertificateVerify::new(0x0403, vec![0xDE, 0xAD, 0xBE, 0xEF]);
        let decoded = CertificateVerify::decode(&cv.encode().unwrap()).unwrap();
        assert_eq!(decoded, cv);
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let cv = CertificateVerify::new(0x0403, vec![1, 2, 3]);
        let mut encoded = cv.encode().unwrap();
        encoded.push(0);
        assert!(CertificateVerify::decode(&encoded).is_err());
    }
}
