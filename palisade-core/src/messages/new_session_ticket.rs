//! NewSessionTicket message.
//!
//! ```text
//! struct {
//!     uint32 ticket_lifetime;
//!     uint32 ticket_age_add;
//!     opaque ticket<1..2^16-1>;
//!     Extension extensions<0..2^16-2>;   /* ticket_early_data_info */
//! } NewSessionTicket;
//! ```
//!
//! Ticket extensions are decoded leniently: servers are free to attach
//! extensions this client does not understand.

use crate::error::{Error, ProtocolError, Result};
use crate::extensions::{ExtensionPolicy, Extensions};
use crate::protocol::ExtensionType;
use bytes::{Buf, BufMut, BytesMut};

/// Ticket extensions this client understands.
pub const NEW_SESSION_TICKET_EXTENSIONS: &[ExtensionType] =
    &[ExtensionType::TicketEarlyDataInfo];

/// NewSessionTicket message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSessionTicket {
    /// Server-advertised ticket lifetime in seconds
    pub ticket_lifetime: u32,

    /// Obfuscation value added to the ticket age on resumption
    pub ticket_age_add: u32,

    /// Opaque ticket blob
    pub ticket: Vec<u8>,

    /// Ticket extensions (lenient set)
    pub extensions: Extensions,
}

impl NewSessionTicket {
    /// Encode to the message payload (without handshake framing).
    pub fn encode(&self) -> Result<Vec<u8>> {
        if self.ticket.is_empty() || self.ticket.len() > 0xFFFF {
            return Err(Error::InvalidMessage("Ticket size".into()));
        }
        let mut buf = BytesMut::new();
        buf.put_u32(self.ticket_lifetime);
        buf.put_u32(self.ticket_age_add);
        buf.put_u16(self.ticket.len() as u16);
        buf.put_slice(&self.ticket);
        buf.put_slice(&self.extensions.encode());
        Ok(buf.to_vec())
    }

    /// Decode from the message payload.
    pub fn decode(mut data: &[u8]) -> Result<Self> {
        if data.len() < 4 + 4 + 2 + 2 {
            return Err(Error::InvalidMessage("NewSessionTicket too short".into()));
        }
        let ticket_lifetime = data.get_u32();
        let ticket_age_add = data.get_u32();

        let ticket_len = data.get_u16() as usize;
        if data.len() < ticket_len {
            return Err(Error::InvalidMessage("Incomplete ticket".into()));
        }
        let ticket = data[..ticket_len].to_vec();
        data.advance(ticket_len);

        let extensions = Extensions::decode(
            data,
            NEW_SESSION_TICKET_EXTENSIONS,
            ExtensionPolicy::Lenient,
        )?;

        Ok(Self {
            ticket_lifetime,
            ticket_age_add,
            ticket,
            extensions,
        })
    }

    /// Extract the `ticket_early_data_info` limit, if present.
    ///
    /// The extension payload is exactly a u32 `max_early_data_size`.
    pub fn max_early_data(&self) -> Result<Option<u32>> {
        let Some(data) = self.extensions.get(ExtensionType::TicketEarlyDataInfo) else {
            return Ok(None);
        };
        let bytes: [u8; 4] = data
            .try_into()
            .map_err(|_| Error::Protocol(ProtocolError::DecodeError))?;
        Ok(Some(u32::from_be_bytes(bytes)))
    }
}
