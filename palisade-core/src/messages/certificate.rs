//! Certificate message.
//!
//! ```text
//! struct {
//!     opaque certificate_request_context<0..2^8-1>;
//!     CertificateEntry certificate_list<0..2^24-1>;
//! } Certificate;
//!
//! struct {
//!     opaque cert_data<1..2^24-1>;
//!     Extension extensions<0..2^16-1>;
//! } CertificateEntry;
//! ```
//!
//! This codec only sequences and length-checks the entries; interpreting
//! the DER and validating the chain is the certificate verifier
//! collaborator's job.

use crate::error::{Error, Result};
use crate::extensions::{ExtensionPolicy, Extensions};
use crate::messages::{get_u24, put_u24};
use bytes::{Buf, BufMut, BytesMut};

/// One certificate in the chain, leaf first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateEntry {
    /// DER-encoded certificate bytes (opaque to this core)
    pub data: Vec<u8>,
}

/// Certificate message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    /// Request context; empty during the handshake
    pub context: Vec<u8>,

    /// Certificate chain, leaf first
    pub entries: Vec<CertificateEntry>,
}

impl Certificate {
    /// Create a new Certificate message from a chain of DER blobs.
    pub fn new(context: Vec<u8>, chain: Vec<Vec<u8>>) -> Self {
        Self {
            context,
            entries: chain
                .into_iter()
                .map(|data| CertificateEntry { data })
                .collect(),
        }
    }

    /// Encode to the message payload (without handshake framing).
    pub fn encode(&self) -> Result<Vec<u8>> {
        if self.context.len() > 255 {
            return Err(Error::InvalidMessage("Request context too long".into()));
        }

        let mut list = BytesMut::new();
        for entry in &self.entries {
            if entry.data.is_empty() || entry.data.len() > 0x00FF_FFFF {
                return Err(Error::InvalidMessage("Certificate entry size".into()));
            }
            put_u24(&mut list, entry.data.len() as u32);
            list.put_slice(&entry.data);
            list.put_u16(0); // no per-entry extensions
        }

        let mut buf = BytesMut::new();
        buf.put_u8(self.context.len() as u8);
        buf.put_slice(&self.context);
        put_u24(&mut buf, list.len() as u32);
        buf.put_slice(&list);
        Ok(buf.to_vec())
    }

    /// Decode from the message payload.
    pub fn decode(mut data: &[u8]) -> Result<Self> {
        if data.len() < 4 {
            return Err(Error::InvalidMessage("Certificate too short".into()));
        }

        let context_len = data.get_u8() as usize;
        if data.len() < context_len {
            return Err(Error::InvalidMessage("Incomplete request context".into()));
        }
        let context = data[..context_len].to_vec();
        data.advance(context_len);

        if data.len() < 3 {
            return Err(Error::InvalidMessage("Missing certificate list".into()));
        }
        let list_len = get_u24(&mut data) as usize;
        if data.len() != list_len {
            return Err(Error::InvalidMessage("Certificate list length".into()));
        }

        let mut entries = Vec::new();
        while !data.is_empty() {
            if data.len() < 3 {
                return Err(Error::InvalidMessage("Truncated certificate entry".into()));
            }
            let cert_len = get_u24(&mut data) as usize;
            if cert_len == 0 || data.len() < cert_len {
                return Err(Error::InvalidMessage("Certificate entry length".into()));
            }
            let cert_data = data[..cert_len].to_vec();
            data.advance(cert_len);

            if data.len() < 2 {
                return Err(Error::InvalidMessage("Missing entry extensions".into()));
            }
            let ext_block_len = u16::from_be_bytes([data[0], data[1]]) as usize;
            if data.len() < 2 + ext_block_len {
                return Err(Error::InvalidMessage("Entry extensions length".into()));
            }
            // Per-entry extensions are tolerated and ignored, but still
            // validated for well-formedness.
            Extensions::decode(&data[..2 + ext_block_len], &[], ExtensionPolicy::Lenient)?;
            data.advance(2 + ext_block_len);

            entries.push(CertificateEntry { data: cert_data });
        }

        Ok(Self { context, entries })
    }

    /// The chain as raw DER blobs, leaf first.
    pub fn chain(&self) -> Vec<Vec<u8>> {
        self.entries.iter().map(|e| e.data.clone()).collect()
    }
}
