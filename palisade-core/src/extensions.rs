//! TLS extension block codec.
//!
//! Extension blocks are decoded against a caller-supplied table of
//! recognized types. Unknown types are rejected outright in
//! [`ExtensionPolicy::Strict`] (used for ServerHello and HelloRetryRequest)
//! or skipped in [`ExtensionPolicy::Lenient`] (used for ticket extensions).
//! A duplicate of the same type within one block is malformed in both modes,
//! and every length prefix must account for its payload exactly, with zero
//! trailing bytes after the final extension.

use crate::error::{Error, ProtocolError, Result};
use crate::protocol::ExtensionType;
use bytes::{Buf, BufMut, BytesMut};

/// Decoding policy for unrecognized extension types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionPolicy {
    /// Reject blocks containing types outside the recognized table.
    Strict,
    /// Skip types outside the recognized table.
    Lenient,
}

/// A single decoded extension: type plus owned raw payload.
///
/// The payload is copied out of the wire buffer at decode time; nothing
/// aliases the transport's memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    /// Extension type
    pub extension_type: ExtensionType,

    /// Extension payload
    pub data: Vec<u8>,
}

impl Extension {
    /// Create a new extension.
    pub fn new(extension_type: ExtensionType, data: Vec<u8>) -> Self {
        Self {
            extension_type,
            data,
        }
    }

    /// Encode the extension to bytes (type, length, payload).
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(4 + self.data.len());
        buf.put_u16(self.extension_type.to_u16());
        buf.put_u16(self.data.len() as u16);
        buf.put_slice(&self.data);
        buf.to_vec()
    }
}

/// A decoded extension block.
///
/// Holds the recognized extensions in wire order. Each recognized type
/// appears at most once; the decoder rejects a second occurrence as
/// malformed rather than silently overwriting the first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extensions {
    extensions: Vec<Extension>,
}

impl Extensions {
    /// Create a new empty extension block.
    pub fn new() -> Self {
        Self {
            extensions: Vec::new(),
        }
    }

    /// Add an extension to an outgoing block.
    ///
    /// Fails if the type is already present.
    pub fn add(&mut self, extension: Extension) -> Result<()> {
        if self.has(extension.extension_type) {
            return Err(Error::Protocol(ProtocolError::IllegalParameter));
        }
        self.extensions.push(extension);
        Ok(())
    }

    /// Get an extension payload by type.
    pub fn get(&self, ext_type: ExtensionType) -> Option<&[u8]> {
        self.extensions
            .iter()
            .find(|e| e.extension_type == ext_type)
            .map(|e| e.data.as_slice())
    }

    /// Check if an extension is present.
    pub fn has(&self, ext_type: ExtensionType) -> bool {
        self.get(ext_type).is_some()
    }

    /// Get the number of decoded extensions.
    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    /// Check if the block holds no extensions.
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Encode the block, including the 2-byte total length prefix.
    pub fn encode(&self) -> Vec<u8> {
        let mut body = BytesMut::new();
        for ext in &self.extensions {
            body.put_slice(&ext.encode());
        }

        let mut buf = BytesMut::with_capacity(2 + body.len());
        buf.put_u16(body.len() as u16);
        buf.put_slice(&body);
        buf.to_vec()
    }

    /// Decode an extension block.
    ///
    /// `data` must be exactly the block: a 2-byte total length prefix
    /// followed by that many bytes and nothing else. `recognized` is the
    /// table of types the caller expects; `policy` decides the fate of
    /// everything outside it.
    pub fn decode(
        mut data: &[u8],
        recognized: &[ExtensionType],
        policy: ExtensionPolicy,
    ) -> Result<Self> {
        if data.len() < 2 {
            return Err(Error::Protocol(ProtocolError::DecodeError));
        }
        let total = data.get_u16() as usize;
        if data.len() != total {
            return Err(Error::Protocol(ProtocolError::DecodeError));
        }

        let mut extensions = Vec::new();
        let mut seen = Vec::new();
        while !data.is_empty() {
            if data.len() < 4 {
                return Err(Error::Protocol(ProtocolError::DecodeError));
            }
            let raw_type = data.get_u16();
            let length = data.get_u16() as usize;
            if data.len() < length {
                return Err(Error::Protocol(ProtocolError::DecodeError));
            }

            if seen.contains(&raw_type) {
                return Err(Error::Protocol(ProtocolError::IllegalParameter));
            }
            seen.push(raw_type);

            let known = ExtensionType::from_u16(raw_type)
                .filter(|t| recognized.contains(t));
            match known {
                Some(extension_type) => {
                    extensions.push(Extension::new(extension_type, data[..length].to_vec()));
                }
                None if policy == ExtensionPolicy::Strict => {
                    return Err(Error::Protocol(ProtocolError::UnsupportedExtension));
                }
                None => {}
            }
            data.advance(length);
        }

        Ok(Self { extensions })
    }
}
