//! Resumable session state and the session ticket manager.
//!
//! A [`Session`] captures negotiated state independent of any single
//! connection: the resumption secret, ticket material, and the carried-over
//! authentication of the peer. Sessions are created on every full handshake,
//! derived from NewSessionTicket messages, and invalidated when
//! authentication on them fails.

use crate::cipher::CipherSuite;
use crate::error::Result;
use crate::messages::NewSessionTicket;
use crate::protocol::ProtocolVersion;
use zeroize::Zeroizing;

/// Resumable negotiated state.
#[derive(Debug, Clone)]
pub struct Session {
    /// Negotiated cipher suite
    pub cipher_suite: CipherSuite,

    /// Negotiated protocol version
    pub version: ProtocolVersion,

    /// Resumption master secret (the PSK offered on resumption)
    pub master_secret: Zeroizing<Vec<u8>>,

    /// Opaque ticket blob from the server; empty until a ticket arrives
    pub ticket: Vec<u8>,

    /// Obfuscation value for the ticket age
    pub ticket_age_add: u32,

    /// Whether `ticket_age_add` came from a real ticket
    pub ticket_age_add_valid: bool,

    /// Maximum 0-RTT bytes the server will accept under this ticket
    pub ticket_max_early_data: u32,

    /// Negotiated ALPN protocol
    pub alpn_protocol: Option<Vec<u8>>,

    /// Set when the session must not be offered for resumption
    pub not_resumable: bool,

    /// Lifetime in seconds, counted from `created_at`
    pub timeout: u64,

    /// Creation time, seconds since the UNIX epoch
    pub created_at: u64,

    /// Peer certificate chain (leaf first), carried as authentication state
    pub peer_certificates: Vec<Vec<u8>>,

    /// Whether the peer chain passed verification
    pub peer_verified: bool,
}

impl Session {
    /// Create a fresh, not-yet-resumable session.
    pub fn new(
        cipher_suite: CipherSuite,
        version: ProtocolVersion,
        created_at: u64,
        timeout: u64,
    ) -> Self {
        Self {
            cipher_suite,
            version,
            master_secret: Zeroizing::new(Vec::new()),
            ticket: Vec::new(),
            ticket_age_add: 0,
            ticket_age_add_valid: false,
            ticket_max_early_data: 0,
            alpn_protocol: None,
            not_resumable: true,
            timeout,
            created_at,
            peer_certificates: Vec::new(),
            peer_verified: false,
        }
    }

    /// Duplicate only the authentication state (plus the secret needed to
    /// fold the PSK into the key schedule).
    ///
    /// Used when the server accepts resumption: everything else is
    /// renegotiated on this connection, only who the peer is carries over.
    pub fn dup_auth_only(&self) -> Self {
        let mut dup = Session::new(self.cipher_suite, self.version, self.created_at, self.timeout);
        dup.master_secret = self.master_secret.clone();
        dup.peer_certificates = self.peer_certificates.clone();
        dup.peer_verified = self.peer_verified;
        dup
    }

    /// Duplicate the entire session, non-authentication state included.
    ///
    /// Used as the basis of a ticket-derived session.
    pub fn dup_full(&self) -> Self {
        self.clone()
    }

    /// Re-base the creation time.
    pub fn rebase_time(&mut self, now: u64) {
        self.created_at = now;
    }

    /// Refresh the lifetime, re-basing the creation time.
    ///
    /// Called on successful resumption: fresh key material was incorporated,
    /// so the clock restarts.
    pub fn renew_timeout(&mut self, now: u64, timeout: u64) {
        self.created_at = now;
        self.timeout = timeout;
    }

    /// Whether this session may be offered for resumption at `now`.
    pub fn is_resumable(&self, now: u64) -> bool {
        !self.not_resumable && now.saturating_sub(self.created_at) < self.timeout
    }

    /// The obfuscated ticket age for a resumption offer at `now`.
    pub fn obfuscated_ticket_age(&self, now: u64) -> u32 {
        let age = now.saturating_sub(self.created_at) as u32;
        age.wrapping_add(self.ticket_age_add)
    }
}

/// Session cache callback.
///
/// Ownership of the session transfers with the call; the return value only
/// reports whether the cache kept it.
pub trait SessionCache {
    /// Offer a session to the cache. Returns `true` if it was stored.
    fn store_session(&mut self, session: Session) -> bool;
}

/// Build a resumable session from a NewSessionTicket message.
///
/// `established` is the connection's established session; its state (peer
/// authentication included) is copied, the creation time is re-based to
/// `now`, and the renewable lifetime is capped at the server-advertised
/// ticket lifetime. The server knows best when it will refuse the ticket;
/// extending past its advertisement would only waste bandwidth on 0-RTT
/// attempts it is going to reject.
///
/// The finished session is handed to `cache`, which decides whether to keep
/// it.
pub fn process_new_session_ticket(
    established: &Session,
    payload: &[u8],
    enable_early_data: bool,
    now: u64,
    cache: &mut dyn SessionCache,
) -> Result<()> {
    let message = NewSessionTicket::decode(payload)?;

    let mut session = established.dup_full();
    session.rebase_time(now);

    if session.timeout > u64::from(message.ticket_lifetime) {
        session.timeout = u64::from(message.ticket_lifetime);
    }

    session.ticket = message.ticket.clone();
    session.ticket_age_add = message.ticket_age_add;
    session.ticket_age_add_valid = true;

    if enable_early_data {
        if let Some(max_early_data) = message.max_early_data()? {
            session.ticket_max_early_data = max_early_data;
        }
    }

    session.not_resumable = false;

    let stored = cache.store_session(session);
    tracing::debug!(
        lifetime = message.ticket_lifetime,
        stored,
        "processed NewSessionTicket"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extensions::{Extension, Extensions};
    use crate::protocol::ExtensionType;

    fn established() -> Session {
        let mut session = Session::new(
            CipherSuite::Aes128GcmSha256,
            ProtocolVersion::Tls13,
            1_000,
            7_200,
        );
        session.master_secret = Zeroizing::new(vec![0x11; 32]);
        session.alpn_protocol = Some(b"h2".to_vec());
        session.peer_certificates = vec![b"leaf".to_vec()];
        session.peer_verified = true;
        session
    }

    #[derive(Default)]
    struct CapturingCache {
        sessions: Vec<Session>,
    }

    impl SessionCache for CapturingCache {
        fn store_session(&mut self, session: Session) -> bool {
            self.sessions.push(session);
            true
        }
    }

    #[test]
    fn test_dup_auth_only_strips_ticket_state() {
        let mut session = established();
        session.ticket = b"ticket".to_vec();
        session.ticket_age_add = 7;
        session.ticket_age_add_valid = true;
        session.not_resumable = false;

        let dup = session.dup_auth_only();
        assert!(dup.ticket.is_empty());
        assert!(!dup.ticket_age_add_valid);
        assert!(dup.not_resumable);
        // Authentication state and the resumption secret carry over.
        assert_eq!(dup.peer_certificates, session.peer_certificates);
        assert!(dup.peer_verified);
        assert_eq!(dup.master_secret.as_slice(), session.master_secret.as_slice());
    }

    #[test]
    fn test_resumability_window() {
        let mut session = established();
        session.not_resumable = false;
        assert!(session.is_resumable(1_000));
        assert!(session.is_resumable(8_199));
        assert!(!session.is_resumable(8_200));

        session.not_resumable = true;
        assert!(!session.is_resumable(1_000));
    }

    #[test]
    fn test_renew_timeout_rebases_clock() {
        let mut session = established();
        session.not_resumable = false;
        session.renew_timeout(10_000, 3_600);
        assert!(session.is_resumable(13_000));
        assert!(!session.is_resumable(13_600));
    }

    #[test]
    fn test_ticket_caps_lifetime() {
        let message = NewSessionTicket {
            ticket_lifetime: 3_600,
            ticket_age_add: 42,
            ticket: b"new-ticket".to_vec(),
            extensions: Extensions::new(),
        };
        let mut cache = CapturingCache::default();
        process_new_session_ticket(
            &established(),
            &message.encode().unwrap(),
            false,
            5_000,
            &mut cache,
        )
        .unwrap();

        let stored = &cache.sessions[0];
        // Local configuration said 7200; the server only promises 3600.
        assert_eq!(stored.timeout, 3_600);
        assert_eq!(stored.created_at, 5_000);
        assert_eq!(stored.ticket, b"new-ticket");
        assert!(stored.ticket_age_add_valid);
        assert!(!stored.not_resumable);
    }

    #[test]
    fn test_ticket_never_extends_lifetime() {
        let message = NewSessionTicket {
            ticket_lifetime: 86_400,
            ticket_age_add: 1,
            ticket: vec![1],
            extensions: Extensions::new(),
        };
        let mut cache = CapturingCache::default();
        process_new_session_ticket(
            &established(),
            &message.encode().unwrap(),
            false,
            5_000,
            &mut cache,
        )
        .unwrap();
        assert_eq!(cache.sessions[0].timeout, 7_200);
    }

    #[test]
    fn test_ticket_early_data_limit_gated_on_config() {
        let mut extensions = Extensions::new();
        extensions
            .add(Extension::new(
                ExtensionType::TicketEarlyDataInfo,
                16384u32.to_be_bytes().to_vec(),
            ))
            .unwrap();
        let payload = NewSessionTicket {
            ticket_lifetime: 3_600,
            ticket_age_add: 1,
            ticket: vec![1],
            extensions,
        }
        .encode()
        .unwrap();

        let mut cache = CapturingCache::default();
        process_new_session_ticket(&established(), &payload, true, 5_000, &mut cache).unwrap();
        assert_eq!(cache.sessions[0].ticket_max_early_data, 16_384);

        process_new_session_ticket(&established(), &payload, false, 5_000, &mut cache).unwrap();
        assert_eq!(cache.sessions[1].ticket_max_early_data, 0);
    }

    #[test]
    fn test_obfuscated_ticket_age() {
        let mut session = established();
        session.ticket_age_add = 10;
        assert_eq!(session.obfuscated_ticket_age(1_025), 35);
    }
}
