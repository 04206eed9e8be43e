//! EncryptedExtensions message.
//!
//! The server's responses to the client's extension offers, sent under the
//! handshake keys. Only extensions the client could have offered are
//! tolerated; anything else is a negotiation violation.

use crate::error::{Error, ProtocolError, Result};
use crate::extensions::{ExtensionPolicy, Extensions};
use crate::protocol::ExtensionType;
use bytes::Buf;

/// Extensions an EncryptedExtensions message may carry.
pub const ENCRYPTED_EXTENSIONS_EXTENSIONS: &[ExtensionType] = &[
    ExtensionType::ServerName,
    ExtensionType::SupportedGroups,
    ExtensionType::ApplicationLayerProtocolNegotiation,
    ExtensionType::EarlyData,
    ExtensionType::ChannelId,
];

/// EncryptedExtensions message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedExtensions {
    /// Extensions (strict set)
    pub extensions: Extensions,
}

impl EncryptedExtensions {
    /// Encode to the message payload (without handshake framing).
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(self.extensions.encode())
    }

    /// Decode from the message payload.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let extensions = Extensions::decode(
            data,
            ENCRYPTED_EXTENSIONS_EXTENSIONS,
            ExtensionPolicy::Strict,
        )?;
        Ok(Self { extensions })
    }

    /// Extract the negotiated ALPN protocol, if any.
    ///
    /// The server must select exactly one protocol:
    ///
    /// ```text
    /// ProtocolName protocol_name_list<2..2^16-1>;  /* one entry */
    /// ```
    pub fn alpn_protocol(&self) -> Result<Option<Vec<u8>>> {
        let Some(mut data) = self
            .extensions
            .get(ExtensionType::ApplicationLayerProtocolNegotiation)
        else {
            return Ok(None);
        };

        if data.len() < 2 {
            return Err(Error::Protocol(ProtocolError::DecodeError));
        }
        let list_len = data.get_u16() as usize;
        if data.len() != list_len || data.is_empty() {
            return Err(Error::Protocol(ProtocolError::DecodeError));
        }

        let name_len = data.get_u8() as usize;
        if name_len == 0 || data.len() != name_len {
            // Zero, truncated, or more than one protocol selected.
            return Err(Error::Protocol(ProtocolError::IllegalParameter));
        }
        Ok(Some(data.to_vec()))
    }

    /// Check whether the server accepted 0-RTT early data.
    pub fn early_data_accepted(&self) -> bool {
        self.extensions.has(ExtensionType::EarlyData)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extensions::Extension;
    use bytes::{BufMut, BytesMut};

    fn alpn_extension(protocol: &[u8]) -> Extension {
        let mut data = BytesMut::new();
        data.put_u16((protocol.len() + 1) as u16);
        data.put_u8(protocol.len() as u8);
        data.put_slice(protocol);
        Extension::new(
            ExtensionType::ApplicationLayerProtocolNegotiation,
            data.to_vec(),
        )
    }

    #[test]
    fn test_empty_encrypted_extensions() {
        let ee = EncryptedExtensions {
            extensions: Extensions::new(),
        };
        let decoded = EncryptedExtensions::decode(&ee.encode().unwrap()).unwrap();
        assert!(decoded.alpn_protocol().unwrap().is_none());
        assert!(!decoded.early_data_accepted());
    }

    #[test]
    fn test_alpn_round_trip() {
        let mut extensions = Extensions::new();
        extensions.add(alpn_extension(b"h2")).unwrap();
        let ee = EncryptedExtensions { extensions };
        let decoded = EncryptedExtensions::decode(&ee.encode().unwrap()).unwrap();
        assert_eq!(decoded.alpn_protocol().unwrap(), Some(b"h2".to_vec()));
    }

    #[test]
    fn test_alpn_with_two_protocols_rejected() {
        let mut data = BytesMut::new();
        data.put_u16(8);
        data.put_u8(2);
        data.put_slice(b"h2");
        data.put_u8(3);
        data.put_slice(b"spd");
        let mut extensions = Extensions::new();
        extensions
            .add(Extension::new(
                ExtensionType::ApplicationLayerProtocolNegotiation,
                data.to_vec(),
            ))
            .unwrap();
        let ee = EncryptedExtensions { extensions };
        assert!(ee.alpn_protocol().is_err());
    }

    #[test]
    fn test_early_data_flag() {
        let mut extensions = Extensions::new();
        extensions
            .add(Extension::new(ExtensionType::EarlyData, Vec::new()))
            .unwrap();
        let ee = EncryptedExtensions { extensions };
        assert!(ee.early_data_accepted());
    }
}
