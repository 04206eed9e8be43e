//! Finished message.
//!
//! The body is exactly the HMAC over the transcript; its length must equal
//! the negotiated hash length, which only the state machine knows.

use crate::error::Result;

/// Finished message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finished {
    /// HMAC over the transcript hash
    pub verify_data: Vec<u8>,
}

impl Finished {
    /// Create a new Finished message.
    pub fn new(verify_data: Vec<u8>) -> Self {
        Self { verify_data }
    }

    /// Encode to the message payload (without handshake framing).
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(self.verify_data.clone())
    }

    /// Decode from the message payload.
    pub fn decode(data: &[u8]) -> Result<Self> {
        Ok(Self {
            verify_data: data.to_vec(),
        })
    }
}
