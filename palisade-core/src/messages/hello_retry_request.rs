//! HelloRetryRequest message.
//!
//! Sent by the server when it wants the client to resend ClientHello with
//! different parameters, typically a different key-exchange group:
//!
//! ```text
//! struct {
//!     ProtocolVersion version;
//!     Extension extensions<2..2^16-1>;    /* key_share, cookie */
//! } HelloRetryRequest;
//! ```
//!
//! An empty extension block is malformed: a retry that asks for nothing is
//! never legitimate.

use crate::error::{Error, Result};
use crate::extensions::{ExtensionPolicy, Extensions};
use crate::protocol::ExtensionType;
use bytes::{Buf, BufMut, BytesMut};

/// Extensions a HelloRetryRequest may carry; anything else is rejected.
pub const HELLO_RETRY_REQUEST_EXTENSIONS: &[ExtensionType] =
    &[ExtensionType::KeyShare, ExtensionType::Cookie];

/// HelloRetryRequest message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelloRetryRequest {
    /// Protocol version codepoint
    pub version: u16,

    /// Extensions (strict set, never empty)
    pub extensions: Extensions,
}

impl HelloRetryRequest {
    /// Encode to the message payload (without handshake framing).
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = BytesMut::new();
        buf.put_u16(self.version);
        buf.put_slice(&self.extensions.encode());
        Ok(buf.to_vec())
    }

    /// Decode from the message payload.
    pub fn decode(mut data: &[u8]) -> Result<Self> {
        if data.len() < 4 {
            return Err(Error::InvalidMessage("HelloRetryRequest too short".into()));
        }

        let version = data.get_u16();

        // HelloRetryRequest may not be empty.
        let block_len = u16::from_be_bytes([data[0], data[1]]) as usize;
        if block_len == 0 {
            return Err(Error::InvalidMessage(
                "HelloRetryRequest with empty extension block".into(),
            ));
        }

        let extensions = Extensions::decode(
            data,
            HELLO_RETRY_REQUEST_EXTENSIONS,
            ExtensionPolicy::Strict,
        )?;

        Ok(Self {
            version,
            extensions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AlertDescription;
    use crate::extensions::Extension;

    #[test]
    fn test_hello_retry_request_encode_decode() {
        let mut extensions = Extensions::new();
        extensions
            .add(Extension::new(ExtensionType::KeyShare, vec![0x00, 0x17]))
            .unwrap();
        extensions
            .add(Extension::new(
                ExtensionType::Cookie,
                vec![0x00, 0x02, 0xAA, 0xBB],
            ))
            .unwrap();
        let hrr = HelloRetryRequest {
            version: 0x0304,
            extensions,
        };

        let encoded = hrr.encode().unwrap();
        let decoded = HelloRetryRequest::decode(&encoded).unwrap();
        assert_eq!(decoded, hrr);
        assert_eq!(
            decoded.extensions.get(ExtensionType::KeyShare),
            Some(&[0x00, 0x17][..])
        );
    }

    #[test]
    fn test_empty_extension_block_is_decode_error() {
        let hrr = HelloRetryRequest {
            version: 0x0304,
            extensions: Extensions::new(),
        };
        let encoded = hrr.encode().unwrap();
        let err = HelloRetryRequest::decode(&encoded).unwrap_err();
        assert_eq!(err.alert(), AlertDescription::DecodeError);
    }

    #[test]
    fn test_truncated_rejected() {
        assert!(HelloRetryRequest::decode(&[0x03]).is_err());
    }
}
