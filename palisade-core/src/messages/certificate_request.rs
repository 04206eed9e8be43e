//! CertificateRequest message.
//!
//! Sent by the server to request client authentication:
//!
//! ```text
//! struct {
//!     opaque certificate_request_context<0..2^8-1>;  /* empty in-handshake */
//!     SignatureScheme supported_signature_algorithms<2..2^16-2>;
//!     DistinguishedName certificate_authorities<0..2^16-1>;
//!     Extension extensions<0..2^16-1>;               /* ignored */
//! } CertificateRequest;
//! ```
//!
//! The request context must be empty during the handshake (post-handshake
//! authentication is not initiated from here) and the signature algorithm
//! list must be non-empty.

use crate::error::{Error, Result};
use crate::extensions::{ExtensionPolicy, Extensions};
use bytes::{Buf, BufMut, BytesMut};
use palisade_crypto::SignatureScheme;

/// CertificateRequest message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRequest {
    /// Signature schemes the server will accept, recognized ones only.
    ///
    /// The wire list must be non-empty, but may contain only schemes this
    /// implementation does not know.
    pub signature_algorithms: Vec<SignatureScheme>,

    /// Acceptable certificate authority names (raw DER DistinguishedNames)
    pub ca_names: Vec<Vec<u8>>,
}

impl CertificateRequest {
    /// Encode to the message payload (without handshake framing).
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = BytesMut::new();
        buf.put_u8(0); // empty request context

        buf.put_u16((self.signature_algorithms.len() * 2) as u16);
        for scheme in &self.signature_algorithms {
            buf.put_u16(scheme.to_u16());
        }

        let mut names = BytesMut::new();
        for name in &self.ca_names {
            names.put_u16(name.len() as u16);
            names.put_slice(name);
        }
        buf.put_u16(names.len() as u16);
        buf.put_slice(&names);

        buf.put_u16(0); // no extensions
        Ok(buf.to_vec())
    }

    /// Decode from the message payload.
    pub fn decode(mut data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::InvalidMessage("CertificateRequest too short".into()));
        }

        // The request context is always empty during the handshake.
        let context_len = data.get_u8() as usize;
        if context_len != 0 {
            return Err(Error::InvalidMessage(
                "CertificateRequest context not empty".into(),
            ));
        }

        if data.len() < 2 {
            return Err(Error::InvalidMessage("Missing signature algorithms".into()));
        }
        let sigalgs_len = data.get_u16() as usize;
        if sigalgs_len == 0 || sigalgs_len % 2 != 0 || data.len() < sigalgs_len {
            return Err(Error::InvalidMessage(
                "Signature algorithm list length".into(),
            ));
        }
        let mut signature_algorithms = Vec::new();
        for _ in 0..sigalgs_len / 2 {
            if let Some(scheme) = SignatureScheme::from_u16(data.get_u16()) {
                signature_algorithms.push(scheme);
            }
        }

        if data.len() < 2 {
            return Err(Error::InvalidMessage("Missing CA name list".into()));
        }
        let names_len = data.get_u16() as usize;
        if data.len() < names_len {
            return Err(Error::InvalidMessage("CA name list length".into()));
        }
        let mut names_data = &data[..names_len];
        data.advance(names_len);
        let mut ca_names = Vec::new();
        while !names_data.is_empty() {
            if names_data.len() < 2 {
                return Err(Error::InvalidMessage("Truncated CA name".into()));
            }
            let name_len = names_data.get_u16() as usize;
            if names_data.len() < name_len {
                return Err(Error::InvalidMessage("CA name length".into()));
            }
            ca_names.push(names_data[..name_len].to_vec());
            names_data.advance(name_len);
        }

        // Trailing extensions are ignored but must be well-formed and
        // account for the rest of the message exactly.
        Extensions::decode(data, &[], ExtensionPolicy::Lenient)?;

        Ok(Self {
            signature_algorithms,
            ca_names,
        })
    }
}
