//! # Palisade Core
//!
//! Client-side TLS 1.3 handshake protocol core: the message sequencing,
//! key-schedule evolution, and extension negotiation that establish an
//! authenticated, confidential channel.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │   Driver (caller)                           │
//! └───────────────┬─────────────────────────────┘
//!                 │ drive() / HandshakeStatus
//! ┌───────────────▼─────────────────────────────┐
//! │   palisade-core (this crate)                │
//! │  ┌───────────────────────────────────────┐  │
//! │  │  Handshake State Machine              │  │
//! │  ├───────────────────────────────────────┤  │
//! │  │  Key Schedule / Transcript Hash       │  │
//! │  ├───────────────────────────────────────┤  │
//! │  │  Extension Codec / Message Codecs     │  │
//! │  ├───────────────────────────────────────┤  │
//! │  │  Session / Ticket Manager             │  │
//! │  └───────────────────────────────────────┘  │
//! └───────┬─────────────────────────┬───────────┘
//!         │ capability traits       │
//! ┌───────▼──────────┐   ┌──────────▼──────────┐
//! │ record layer,    │   │ palisade-crypto     │
//! │ verifier, signer │   │ (trait interface)   │
//! └──────────────────┘   └─────────────────────┘
//! ```
//!
//! The record layer (framing, AEAD), certificate validation, private-key
//! operations, and session storage are collaborators behind the capability
//! traits in [`handshake`]; this crate owns only the protocol logic.
//!
//! ## Suspension model
//!
//! The state machine never blocks. [`ClientHandshake::drive`] returns a
//! [`HandshakeStatus`] telling the caller what to wait for — transport
//! input, a flush, or an external asynchronous result — and re-entering
//! with the same context resumes exactly where it suspended. Dropping the
//! context at any suspension point is always safe.
//!
//! [`ClientHandshake::drive`]: handshake::ClientHandshake::drive
//! [`HandshakeStatus`]: handshake::HandshakeStatus

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unused_qualifications
)]

pub mod alert;
pub mod cipher;
pub mod early_data;
pub mod error;
pub mod extensions;
pub mod handshake;
pub mod key_schedule;
pub mod messages;
pub mod protocol;
pub mod session;
pub mod transcript;

pub use cipher::{CipherSuite, DEFAULT_CIPHER_SUITES};
pub use error::{AlertDescription, Error, ProtocolError, Result};
pub use protocol::ProtocolVersion;

use palisade_crypto::KeyExchangeAlgorithm;

/// Default session lifetime in seconds (two hours).
pub const DEFAULT_SESSION_TIMEOUT: u64 = 7_200;

/// Read-only negotiation policy for a client handshake.
///
/// # Example
///
/// ```rust
/// use palisade_core::Config;
///
/// let config = Config::builder()
///     .with_early_data(true)
///     .build()
///     .unwrap();
/// assert!(config.enable_early_data);
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Key exchange groups the client supports, in preference order
    pub supported_groups: Vec<KeyExchangeAlgorithm>,

    /// Cipher suites the client offers, in preference order
    pub cipher_suites: Vec<CipherSuite>,

    /// Lifetime for sessions from full handshakes, in seconds
    pub session_timeout: u64,

    /// Refreshed lifetime granted on PSK-DHE resumption, in seconds
    pub psk_dhe_timeout: u64,

    /// Whether 0-RTT limits from tickets should be honored
    pub enable_early_data: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            supported_groups: vec![
                KeyExchangeAlgorithm::X25519,
                KeyExchangeAlgorithm::Secp256r1,
            ],
            cipher_suites: DEFAULT_CIPHER_SUITES.to_vec(),
            session_timeout: DEFAULT_SESSION_TIMEOUT,
            psk_dhe_timeout: DEFAULT_SESSION_TIMEOUT,
            enable_early_data: false,
        }
    }
}

impl Config {
    /// Create a new configuration builder.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the supported key exchange groups.
    pub fn with_supported_groups(mut self, groups: &[KeyExchangeAlgorithm]) -> Self {
        self.config.supported_groups = groups.to_vec();
        self
    }

    /// Set the offered cipher suites.
    pub fn with_cipher_suites(mut self, suites: &[CipherSuite]) -> Self {
        self.config.cipher_suites = suites.to_vec();
        self
    }

    /// Set the session timeout in seconds.
    pub fn with_session_timeout(mut self, timeout: u64) -> Self {
        self.config.session_timeout = timeout;
        self
    }

    /// Set the PSK-DHE resumption timeout in seconds.
    pub fn with_psk_dhe_timeout(mut self, timeout: u64) -> Self {
        self.config.psk_dhe_timeout = timeout;
        self
    }

    /// Enable or disable 0-RTT early data support.
    pub fn with_early_data(mut self, enable: bool) -> Self {
        self.config.enable_early_data = enable;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<Config> {
        if self.config.supported_groups.is_empty() {
            return Err(Error::InvalidConfig("no key exchange groups".into()));
        }
        if self.config.cipher_suites.is_empty() {
            return Err(Error::InvalidConfig("no cipher suites".into()));
        }
        Ok(self.config)
    }
}
