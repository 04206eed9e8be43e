//! Error types for the palisade handshake core.
//!
//! Every fatal condition carries enough information for the driver to queue
//! the matching protocol alert before tearing the connection down; see
//! [`Error::alert`].

use thiserror::Error;

/// Result type for handshake operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors that can occur while driving a handshake.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Protocol violation by the peer
    #[error("protocol error: {0}")]
    Protocol(ProtocolError),

    /// Cryptographic operation failed
    #[error("cryptographic error: {0}")]
    Crypto(String),

    /// A message arrived that is not legal in the current state
    #[error("unexpected message: {0}")]
    UnexpectedMessage(String),

    /// Malformed message contents
    #[error("malformed message: {0}")]
    InvalidMessage(String),

    /// Certificate chain rejected by the verifier
    #[error("certificate verification failed: {0}")]
    CertificateVerificationFailed(String),

    /// Fatal alert received from the peer
    #[error("alert received: {0:?}")]
    AlertReceived(AlertDescription),

    /// Internal contract violation (a bug, not a wire error)
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// The alert to send to the peer before tearing the connection down.
    pub fn alert(&self) -> AlertDescription {
        match self {
            Error::InvalidConfig(_) => AlertDescription::InternalError,
            Error::Protocol(e) => e.alert(),
            Error::Crypto(_) => AlertDescription::InternalError,
            Error::UnexpectedMessage(_) => AlertDescription::UnexpectedMessage,
            Error::InvalidMessage(_) => AlertDescription::DecodeError,
            Error::CertificateVerificationFailed(_) => AlertDescription::BadCertificate,
            Error::AlertReceived(_) => AlertDescription::CloseNotify,
            Error::Internal(_) => AlertDescription::InternalError,
        }
    }
}

impl From<palisade_crypto::Error> for Error {
    fn from(e: palisade_crypto::Error) -> Self {
        Error::Crypto(e.to_string())
    }
}

/// Protocol-level errors, each bound to a specific alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ProtocolError {
    /// Malformed lengths, trailing bytes, missing mandatory fields
    #[error("decode error")]
    DecodeError,

    /// Unexpected message type
    #[error("unexpected message")]
    UnexpectedMessage,

    /// A negotiated parameter is illegal or inconsistent
    #[error("illegal parameter")]
    IllegalParameter,

    /// A mandatory extension is absent
    #[error("missing extension")]
    MissingExtension,

    /// An extension arrived that was not offered or is not allowed here
    #[error("unsupported extension")]
    UnsupportedExtension,

    /// Protocol version mismatch
    #[error("protocol version mismatch")]
    ProtocolVersion,

    /// Finished or CertificateVerify did not verify
    #[error("decrypt error")]
    DecryptError,

    /// The peer did not present a certificate
    #[error("certificate required")]
    CertificateRequired,

    /// Negotiated parameters differ from the ones 0-RTT data was sent under
    #[error("ALPN mismatch on early data")]
    AlpnMismatchOnEarlyData,

    /// A channel-binding or custom extension arrived over accepted 0-RTT
    #[error("unexpected extension on early data")]
    UnexpectedExtensionOnEarlyData,
}

impl ProtocolError {
    /// The alert paired with this protocol error.
    pub const fn alert(self) -> AlertDescription {
        match self {
            ProtocolError::DecodeError => AlertDescription::DecodeError,
            ProtocolError::UnexpectedMessage => AlertDescription::UnexpectedMessage,
            ProtocolError::IllegalParameter => AlertDescription::IllegalParameter,
            ProtocolError::MissingExtension => AlertDescription::MissingExtension,
            ProtocolError::UnsupportedExtension => AlertDescription::UnsupportedExtension,
            ProtocolError::ProtocolVersion => AlertDescription::ProtocolVersion,
            ProtocolError::DecryptError => AlertDescription::DecryptError,
            ProtocolError::CertificateRequired => AlertDescription::CertificateRequired,
            ProtocolError::AlpnMismatchOnEarlyData => AlertDescription::IllegalParameter,
            ProtocolError::UnexpectedExtensionOnEarlyData => AlertDescription::IllegalParameter,
        }
    }
}

/// TLS alert descriptions (RFC 8446 Section 6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AlertDescription {
    /// Close notify
    CloseNotify = 0,

    /// Unexpected message
    UnexpectedMessage = 10,

    /// Handshake failure
    HandshakeFailure = 40,

    /// Bad certificate
    BadCertificate = 42,

    /// Certificate unknown
    CertificateUnknown = 46,

    /// Illegal parameter
    IllegalParameter = 47,

    /// Decode error
    DecodeError = 50,

    /// Decrypt error
    DecryptError = 51,

    /// Protocol version
    ProtocolVersion = 70,

    /// Internal error
    InternalError = 80,

    /// User canceled
    UserCanceled = 90,

    /// Missing extension
    MissingExtension = 109,

    /// Unsupported extension
    UnsupportedExtension = 110,

    /// Certificate required
    CertificateRequired = 116,

    /// No application protocol
    NoApplicationProtocol = 120,
}

impl AlertDescription {
    /// Convert from wire format (u8).
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(AlertDescription::CloseNotify),
            10 => Some(AlertDescription::UnexpectedMessage),
            40 => Some(AlertDescription::HandshakeFailure),
            42 => Some(AlertDescription::BadCertificate),
            46 => Some(AlertDescription::CertificateUnknown),
            47 => Some(AlertDescription::IllegalParameter),
            50 => Some(AlertDescription::DecodeError),
            51 => Some(AlertDescription::DecryptError),
            70 => Some(AlertDescription::ProtocolVersion),
            80 => Some(AlertDescription::InternalError),
            90 => Some(AlertDescription::UserCanceled),
            109 => Some(AlertDescription::MissingExtension),
            110 => Some(AlertDescription::UnsupportedExtension),
            116 => Some(AlertDescription::CertificateRequired),
            120 => Some(AlertDescription::NoApplicationProtocol),
            _ => None,
        }
    }

    /// Convert to wire format (u8).
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Check if this alert is fatal.
    ///
    /// All alerts except CloseNotify and UserCanceled are fatal in TLS 1.3.
    pub const fn is_fatal(self) -> bool {
        !matches!(
            self,
            AlertDescription::CloseNotify | AlertDescription::UserCanceled
        )
    }
}
