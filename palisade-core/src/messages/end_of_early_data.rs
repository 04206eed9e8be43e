//! EndOfEarlyData message.
//!
//! Sent by the client after its early data, before switching to the
//! handshake write keys. The body is empty.

use crate::error::{Error, Result};

/// EndOfEarlyData message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EndOfEarlyData;

impl EndOfEarlyData {
    /// Create a new EndOfEarlyData message.
    pub fn new() -> Self {
        Self
    }

    /// Encode to the message payload (empty).
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(Vec::new())
    }

    /// Decode from the message payload.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if !data.is_empty() {
            return Err(Error::InvalidMessage(
                "EndOfEarlyData carries no body".into(),
            ));
        }
        Ok(Self)
    }
}
