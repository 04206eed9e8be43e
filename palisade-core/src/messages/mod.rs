//! Handshake message framing and per-message codecs.
//!
//! Record-layer framing (fragmenting messages into TLS records) belongs to
//! the transport collaborator; this module only handles the handshake-level
//! framing and the typed payloads the client state machine consumes or
//! produces.

use crate::error::{Error, Result};
use crate::protocol::HandshakeType;
use bytes::{Buf, BufMut, BytesMut};

pub mod certificate;
pub mod certificate_request;
pub mod certificate_verify;
pub mod encrypted_extensions;
pub mod end_of_early_data;
pub mod finished;
pub mod hello_retry_request;
pub mod new_session_ticket;
pub mod server_hello;

pub use certificate::{Certificate, CertificateEntry};
pub use certificate_request::CertificateRequest;
pub use certificate_verify::CertificateVerify;
pub use encrypted_extensions::EncryptedExtensions;
pub use end_of_early_data::EndOfEarlyData;
pub use finished::Finished;
pub use hello_retry_request::HelloRetryRequest;
pub use new_session_ticket::NewSessionTicket;
pub use server_hello::ServerHello;

/// A framed handshake message.
///
/// ```text
/// struct {
///     HandshakeType msg_type;    /* handshake type */
///     uint24 length;             /* bytes in message */
///     opaque body[Handshake.length];
/// } Handshake;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeMessage {
    /// Message type
    pub msg_type: HandshakeType,
    /// Message body, without the 4-byte header
    pub payload: Vec<u8>,
}

impl HandshakeMessage {
    /// Create a new handshake message.
    pub fn new(msg_type: HandshakeType, payload: Vec<u8>) -> Self {
        Self { msg_type, payload }
    }

    /// Encode the message including the 4-byte header.
    pub fn encode(&self) -> Result<Vec<u8>> {
        if self.payload.len() > 0x00FF_FFFF {
            return Err(Error::InvalidMessage("Handshake message too large".into()));
        }
        let mut buf = BytesMut::with_capacity(4 + self.payload.len());
        buf.put_u8(self.msg_type.to_u8());
        put_u24(&mut buf, self.payload.len() as u32);
        buf.put_slice(&self.payload);
        Ok(buf.to_vec())
    }

    /// Decode a message from bytes; the input must be exactly one message.
    pub fn decode(mut data: &[u8]) -> Result<Self> {
        if data.len() < 4 {
            return Err(Error::InvalidMessage("Handshake message too short".into()));
        }
        let msg_type_raw = data.get_u8();
        let msg_type = HandshakeType::from_u8(msg_type_raw).ok_or_else(|| {
            Error::InvalidMessage(format!("Unknown handshake type: {}", msg_type_raw))
        })?;
        let length = get_u24(&mut data) as usize;
        if data.len() != length {
            return Err(Error::InvalidMessage("Incomplete handshake message".into()));
        }
        Ok(Self {
            msg_type,
            payload: data.to_vec(),
        })
    }
}

pub(crate) fn put_u24(buf: &mut BytesMut, value: u32) {
    buf.put_u8(((value >> 16) & 0xFF) as u8);
    buf.put_u8(((value >> 8) & 0xFF) as u8);
    buf.put_u8((value & 0xFF) as u8);
}

pub(crate) fn get_u24(data: &mut &[u8]) -> u32 {
    let high = data.get_u8() as u32;
    let mid = data.get_u8() as u32;
    let low = data.get_u8() as u32;
    (high << 16) | (mid << 8) | low
}
