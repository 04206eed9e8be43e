//! 0-RTT early data negotiation state.
//!
//! Early data allows a client resuming a session to send application data in
//! its first flight. The server is free to reject it; rejection is a normal
//! negotiation outcome, not an error, and the caller is told to discard or
//! replay the buffered data.
//!
//! Transitions are one-directional: `NotOffered` never changes, and
//! `Offered` moves to exactly one of `Accepted` or `Rejected`, never back.

use crate::error::{Error, Result};

/// 0-RTT negotiation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EarlyDataState {
    /// Early data was not offered on this connection.
    NotOffered,

    /// Early data was offered in the ClientHello, awaiting the server.
    Offered,

    /// The server accepted the offer.
    Accepted,

    /// The server rejected the offer (or a retry made it moot).
    Rejected,
}

impl EarlyDataState {
    /// Check if early data was offered (in any terminal state).
    pub fn was_offered(self) -> bool {
        !matches!(self, EarlyDataState::NotOffered)
    }

    /// Check if early data was accepted.
    pub fn is_accepted(self) -> bool {
        matches!(self, EarlyDataState::Accepted)
    }

    /// Mark the offer accepted.
    pub fn accept(&mut self) -> Result<()> {
        if *self != EarlyDataState::Offered {
            return Err(Error::Internal(format!(
                "early data accept from {:?}",
                self
            )));
        }
        *self = EarlyDataState::Accepted;
        Ok(())
    }

    /// Mark the offer rejected.
    pub fn reject(&mut self) -> Result<()> {
        if *self != EarlyDataState::Offered {
            return Err(Error::Internal(format!(
                "early data reject from {:?}",
                self
            )));
        }
        *self = EarlyDataState::Rejected;
        Ok(())
    }
}
