//! TLS protocol constants and types.

/// TLS protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum ProtocolVersion {
    /// TLS 1.2 (RFC 5246) - appears only as a legacy field value
    Tls12 = 0x0303,

    /// TLS 1.3 (RFC 8446)
    Tls13 = 0x0304,
}

impl ProtocolVersion {
    /// Create from wire format (u16 big-endian).
    pub const fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0303 => Some(ProtocolVersion::Tls12),
            0x0304 => Some(ProtocolVersion::Tls13),
            _ => None,
        }
    }

    /// Convert to wire format (u16 big-endian).
    pub const fn to_u16(self) -> u16 {
        self as u16
    }

    /// Get the protocol name.
    pub const fn name(self) -> &'static str {
        match self {
            ProtocolVersion::Tls12 => "TLS 1.2",
            ProtocolVersion::Tls13 => "TLS 1.3",
        }
    }
}

/// Handshake message type (RFC 8446 Section 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HandshakeType {
    /// ClientHello (1)
    ClientHello = 1,

    /// ServerHello (2)
    ServerHello = 2,

    /// NewSessionTicket (4)
    NewSessionTicket = 4,

    /// EndOfEarlyData (5)
    EndOfEarlyData = 5,

    /// HelloRetryRequest (6)
    HelloRetryRequest = 6,

    /// EncryptedExtensions (8)
    EncryptedExtensions = 8,

    /// Certificate (11)
    Certificate = 11,

    /// CertificateRequest (13)
    CertificateRequest = 13,

    /// CertificateVerify (15)
    CertificateVerify = 15,

    /// Finished (20)
    Finished = 20,

    /// ChannelId (203) - channel-binding identity assertion
    ChannelId = 203,
}

impl HandshakeType {
    /// Create from wire format (u8).
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(HandshakeType::ClientHello),
            2 => Some(HandshakeType::ServerHello),
            4 => Some(HandshakeType::NewSessionTicket),
            5 => Some(HandshakeType::EndOfEarlyData),
            6 => Some(HandshakeType::HelloRetryRequest),
            8 => Some(HandshakeType::EncryptedExtensions),
            11 => Some(HandshakeType::Certificate),
            13 => Some(HandshakeType::CertificateRequest),
            15 => Some(HandshakeType::CertificateVerify),
            20 => Some(HandshakeType::Finished),
            203 => Some(HandshakeType::ChannelId),
            _ => None,
        }
    }

    /// Convert to wire format (u8).
    pub const fn to_u8(self) -> u8 {
        self as u8
    }
}

/// TLS extension type (IANA registry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ExtensionType {
    /// server_name (0)
    ServerName = 0,

    /// supported_groups (10)
    SupportedGroups = 10,

    /// signature_algorithms (13)
    SignatureAlgorithms = 13,

    /// application_layer_protocol_negotiation (16) - ALPN
    ApplicationLayerProtocolNegotiation = 16,

    /// pre_shared_key (41)
    PreSharedKey = 41,

    /// early_data (42)
    EarlyData = 42,

    /// supported_versions (43)
    SupportedVersions = 43,

    /// cookie (44)
    Cookie = 44,

    /// psk_key_exchange_modes (45)
    PskKeyExchangeModes = 45,

    /// ticket_early_data_info (46) - NewSessionTicket 0-RTT limit
    TicketEarlyDataInfo = 46,

    /// certificate_authorities (47)
    CertificateAuthorities = 47,

    /// key_share (51)
    KeyShare = 51,

    /// channel_id (30032) - channel-binding identity assertion
    ChannelId = 30032,
}

impl ExtensionType {
    /// Create from wire format (u16).
    pub const fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 => Some(ExtensionType::ServerName),
            10 => Some(ExtensionType::SupportedGroups),
            13 => Some(ExtensionType::SignatureAlgorithms),
            16 => Some(ExtensionType::ApplicationLayerProtocolNegotiation),
            41 => Some(ExtensionType::PreSharedKey),
            42 => Some(ExtensionType::EarlyData),
            43 => Some(ExtensionType::SupportedVersions),
            44 => Some(ExtensionType::Cookie),
            45 => Some(ExtensionType::PskKeyExchangeModes),
            46 => Some(ExtensionType::TicketEarlyDataInfo),
            47 => Some(ExtensionType::CertificateAuthorities),
            51 => Some(ExtensionType::KeyShare),
            30032 => Some(ExtensionType::ChannelId),
            _ => None,
        }
    }

    /// Convert to wire format (u16).
    pub const fn to_u16(self) -> u16 {
        self as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_version() {
        assert_eq!(
            ProtocolVersion::from_u16(0x0304),
            Some(ProtocolVersion::Tls13)
        );
        assert_eq!(ProtocolVersion::Tls13.to_u16(), 0x0304);
        assert_eq!(ProtocolVersion::Tls13.name(), "TLS 1.3");
        assert_eq!(ProtocolVersion::from_u16(0x0301), None);
    }

    #[test]
    fn test_handshake_type() {
        assert_eq!(HandshakeType::from_u8(2), Some(HandshakeType::ServerHello));
        assert_eq!(
            HandshakeType::from_u8(6),
            Some(HandshakeType::HelloRetryRequest)
        );
        assert_eq!(HandshakeType::ServerHello.to_u8(), 2);
        assert_eq!(HandshakeType::from_u8(99), None);
    }

    #[test]
    fn test_extension_type() {
        assert_eq!(ExtensionType::from_u16(51), Some(ExtensionType::KeyShare));
        assert_eq!(ExtensionType::KeyShare.to_u16(), 51);
        assert_eq!(
            ExtensionType::from_u16(30032),
            Some(ExtensionType::ChannelId)
        );
    }
}
