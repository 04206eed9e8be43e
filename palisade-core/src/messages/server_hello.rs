//! ServerHello message.
//!
//! ```text
//! struct {
//!     ProtocolVersion version;
//!     Random random;                      /* 32 bytes */
//!     CipherSuite cipher_suite;
//!     Extension extensions<0..2^16-1>;    /* key_share, pre_shared_key,
//!                                            supported_versions */
//! } ServerHello;
//! ```
//!
//! Version and cipher suite are kept as raw codepoints; the state machine
//! validates them against the negotiated parameters so the failure maps to
//! the right alert (`illegal_parameter` rather than `decode_error`).

use crate::error::{Error, Result};
use crate::extensions::{ExtensionPolicy, Extensions};
use crate::protocol::ExtensionType;
use bytes::{Buf, BufMut, BytesMut};

/// Extensions a ServerHello may carry; anything else is rejected.
pub const SERVER_HELLO_EXTENSIONS: &[ExtensionType] = &[
    ExtensionType::KeyShare,
    ExtensionType::PreSharedKey,
    ExtensionType::SupportedVersions,
];

/// ServerHello message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerHello {
    /// Protocol version codepoint
    pub version: u16,

    /// Server random (32 bytes)
    pub random: [u8; 32],

    /// Selected cipher suite codepoint
    pub cipher_suite: u16,

    /// Extensions (strict set)
    pub extensions: Extensions,
}

impl ServerHello {
    /// Encode to the message payload (without handshake framing).
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = BytesMut::new();
        buf.put_u16(self.version);
        buf.put_slice(&self.random);
        buf.put_u16(self.cipher_suite);
        buf.put_slice(&self.extensions.encode());
        Ok(buf.to_vec())
    }

    /// Decode from the message payload.
    pub fn decode(mut data: &[u8]) -> Result<Self> {
        if data.len() < 2 + 32 + 2 + 2 {
            return Err(Error::InvalidMessage("ServerHello too short".into()));
        }

        let version = data.get_u16();

        let mut random = [0u8; 32];
        data.copy_to_slice(&mut random);

        let cipher_suite = data.get_u16();

        let extensions =
            Extensions::decode(data, SERVER_HELLO_EXTENSIONS, ExtensionPolicy::Strict)?;

        Ok(Self {
            version,
            random,
            cipher_suite,
            extensions,
        })
    }
}
