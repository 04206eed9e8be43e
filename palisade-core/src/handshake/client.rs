//! TLS 1.3 client handshake state machine.
//!
//! ## State transitions
//!
//! ```text
//! ReadHelloRetryRequest
//!   | retry received            | normal ServerHello
//!   v                           v
//! SendSecondClientHello ----> ReadServerHello
//!                               |
//!                               v
//!                             ProcessChangeCipherSpec
//!                               |
//!                               v
//!                             ReadEncryptedExtensions
//!                               |        (resumption: skip to ReadServerFinished)
//!                               v
//!                             ReadCertificateRequest (optional message)
//!                               v
//!                             ReadServerCertificate
//!                               v
//!                             ReadServerCertificateVerify
//!                               v
//!                             ReadServerFinished
//!                               v
//!                             SendEndOfEarlyData
//!                               v
//!                             SendClientCertificate (skipped w/o request)
//!                               v
//!                             SendClientCertificateVerify (skipped w/o cert)
//!                               v
//!                             CompleteSecondFlight
//!                               v
//!                             Done
//! ```
//!
//! Each handler consumes at most one incoming message and only consumes it
//! once every fallible step for that message has succeeded, so a suspended
//! handler (missing input, pending async verification or signing) re-enters
//! with the same message and without re-deriving secrets.

use crate::alert::Alert;
use crate::cipher::CipherSuite;
use crate::early_data::EarlyDataState;
use crate::error::{Error, ProtocolError, Result};
use crate::handshake::{
    AssertOutcome, ClientHelloOffer, Collaborators, HandshakeStatus, KeyShareKeys,
    PendingOperation, SelectOutcome, SignOutcome, TrafficLevel, VerifyOutcome,
};
use crate::key_schedule::KeySchedule;
use crate::messages::{
    Certificate, CertificateRequest, CertificateVerify, EncryptedExtensions, EndOfEarlyData,
    Finished, HandshakeMessage, HelloRetryRequest, ServerHello,
};
use crate::protocol::{ExtensionType, HandshakeType, ProtocolVersion};
use crate::session::Session;
use crate::transcript::{
    compute_verify_data, signature_content, TranscriptHash, CLIENT_CERTIFICATE_VERIFY_CONTEXT,
    SERVER_CERTIFICATE_VERIFY_CONTEXT,
};
use crate::Config;
use bytes::Buf;
use palisade_crypto::{KeyExchangeAlgorithm, SignatureScheme};
use subtle::ConstantTimeEq;

/// Client handshake state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// Waiting to see whether the first server message is a retry
    ReadHelloRetryRequest,
    /// Retransmitting the ClientHello with retry parameters
    SendSecondClientHello,
    /// Waiting for ServerHello
    ReadServerHello,
    /// Installing handshake traffic keys
    ProcessChangeCipherSpec,
    /// Waiting for EncryptedExtensions
    ReadEncryptedExtensions,
    /// Waiting for the optional CertificateRequest
    ReadCertificateRequest,
    /// Waiting for the server Certificate
    ReadServerCertificate,
    /// Waiting for the server CertificateVerify
    ReadServerCertificateVerify,
    /// Waiting for the server Finished
    ReadServerFinished,
    /// Emitting EndOfEarlyData and switching write keys
    SendEndOfEarlyData,
    /// Emitting the client Certificate
    SendClientCertificate,
    /// Emitting the client CertificateVerify
    SendClientCertificateVerify,
    /// Emitting Finished and installing application keys
    CompleteSecondFlight,
    /// Handshake complete
    Done,
}

/// Per-state handler outcome; `drive` maps these onto [`HandshakeStatus`].
enum StateResult {
    Advance,
    NeedRead,
    Flush,
    EarlyDataRejected,
    Pending(PendingOperation),
}

/// Negotiated parameters 0-RTT data was sent under, kept for the
/// cross-context check in ReadEncryptedExtensions.
#[derive(Debug, Clone)]
struct EarlySession {
    cipher_suite: CipherSuite,
    alpn_protocol: Option<Vec<u8>>,
}

/// Client handshake context.
///
/// Exclusively owned by the driving call stack for the duration of the
/// handshake; there is no interior locking and dropping it at any
/// suspension point is always safe.
pub struct ClientHandshake {
    config: Config,
    state: ClientState,
    negotiated_version: ProtocolVersion,
    cipher_suite: Option<CipherSuite>,
    key_share: Option<KeyShareKeys>,
    retry_group: Option<KeyExchangeAlgorithm>,
    cookie: Option<Vec<u8>>,
    received_hello_retry_request: bool,
    server_random: Option<[u8; 32]>,
    transcript: TranscriptHash,
    key_schedule: Option<KeySchedule>,
    offered_session: Option<Session>,
    pending_session: Option<Session>,
    session_reused: bool,
    early_data: EarlyDataState,
    early_data_offered: bool,
    early_session: Option<EarlySession>,
    cert_request: Option<CertificateRequest>,
    server_cert_chain: Vec<Vec<u8>>,
    client_cert_chain: Option<Vec<Vec<u8>>>,
    channel_binding_negotiated: bool,
}

impl core::fmt::Debug for ClientHandshake {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ClientHandshake")
            .field("state", &self.state)
            .field("cipher_suite", &self.cipher_suite)
            .field("session_reused", &self.session_reused)
            .field("early_data", &self.early_data)
            .finish_non_exhaustive()
    }
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

impl ClientHandshake {
    /// Create a handshake context for a ClientHello that was just sent.
    pub fn new(config: Config, offer: ClientHelloOffer) -> Result<Self> {
        if config.cipher_suites.is_empty() {
            return Err(Error::InvalidConfig("no cipher suites configured".into()));
        }
        if config.supported_groups.is_empty() {
            return Err(Error::InvalidConfig("no groups configured".into()));
        }
        if offer.early_data_offered && offer.session.is_none() {
            return Err(Error::InvalidConfig(
                "early data offered without a session".into(),
            ));
        }

        let initial_hash = offer
            .session
            .as_ref()
            .map(|s| s.cipher_suite.hash_algorithm())
            .unwrap_or_else(|| config.cipher_suites[0].hash_algorithm());
        let mut transcript = TranscriptHash::new(initial_hash);
        transcript.update(&offer.encoded);

        let early_session = if offer.early_data_offered {
            offer.session.as_ref().map(|s| EarlySession {
                cipher_suite: s.cipher_suite,
                alpn_protocol: s.alpn_protocol.clone(),
            })
        } else {
            None
        };

        Ok(Self {
            config,
            state: ClientState::ReadHelloRetryRequest,
            negotiated_version: ProtocolVersion::Tls13,
            cipher_suite: None,
            key_share: Some(offer.key_share),
            retry_group: None,
            cookie: None,
            received_hello_retry_request: false,
            server_random: None,
            transcript,
            key_schedule: None,
            offered_session: offer.session,
            pending_session: None,
            session_reused: false,
            early_data: if offer.early_data_offered {
                EarlyDataState::Offered
            } else {
                EarlyDataState::NotOffered
            },
            early_data_offered: offer.early_data_offered,
            early_session,
            cert_request: None,
            server_cert_chain: Vec::new(),
            client_cert_chain: None,
            channel_binding_negotiated: false,
        })
    }

    /// The current state.
    pub fn state(&self) -> ClientState {
        self.state
    }

    /// Whether the handshake has reached `Done`.
    pub fn is_done(&self) -> bool {
        self.state == ClientState::Done
    }

    /// Whether the server accepted PSK resumption.
    pub fn session_reused(&self) -> bool {
        self.session_reused
    }

    /// The negotiated cipher suite, once ServerHello has been processed.
    pub fn cipher_suite(&self) -> Option<CipherSuite> {
        self.cipher_suite
    }

    /// The 0-RTT negotiation state.
    pub fn early_data_state(&self) -> EarlyDataState {
        self.early_data
    }

    /// The group the server requested in HelloRetryRequest, if any.
    pub fn retry_group(&self) -> Option<KeyExchangeAlgorithm> {
        self.retry_group
    }

    /// Whether a HelloRetryRequest was processed on this connection.
    pub fn received_hello_retry_request(&self) -> bool {
        self.received_hello_retry_request
    }

    /// The server random, once ServerHello has been processed.
    pub fn server_random(&self) -> Option<&[u8; 32]> {
        self.server_random.as_ref()
    }

    /// The session being established.
    pub fn session(&self) -> Option<&Session> {
        self.pending_session.as_ref()
    }

    /// Hand off the established session. `None` before `Done`.
    pub fn into_session(self) -> Option<Session> {
        if self.state == ClientState::Done {
            self.pending_session
        } else {
            None
        }
    }

    /// Drive the state machine until it completes or suspends.
    ///
    /// On a fatal error, the matching alert is queued on the sink before
    /// the error is returned; the caller owns connection teardown.
    pub fn drive(&mut self, io: &mut Collaborators<'_>) -> Result<HandshakeStatus> {
        while self.state != ClientState::Done {
            let entered = self.state;
            let result = match entered {
                ClientState::ReadHelloRetryRequest => self.read_hello_retry_request(io),
                ClientState::SendSecondClientHello => self.send_second_client_hello(io),
                ClientState::ReadServerHello => self.read_server_hello(io),
                ClientState::ProcessChangeCipherSpec => self.process_change_cipher_spec(io),
                ClientState::ReadEncryptedExtensions => self.read_encrypted_extensions(io),
                ClientState::ReadCertificateRequest => self.read_certificate_request(io),
                ClientState::ReadServerCertificate => self.read_server_certificate(io),
                ClientState::ReadServerCertificateVerify => {
                    self.read_server_certificate_verify(io)
                }
                ClientState::ReadServerFinished => self.read_server_finished(io),
                ClientState::SendEndOfEarlyData => self.send_end_of_early_data(io),
                ClientState::SendClientCertificate => self.send_client_certificate(io),
                ClientState::SendClientCertificateVerify => {
                    self.send_client_certificate_verify(io)
                }
                ClientState::CompleteSecondFlight => self.complete_second_flight(io),
                ClientState::Done => unreachable!(),
            };

            let result = match result {
                Ok(result) => result,
                Err(err) => {
                    let _ = io.sink.add_alert(Alert::fatal(err.alert()));
                    tracing::debug!(state = ?entered, error = %err, "handshake failed");
                    return Err(err);
                }
            };

            if self.state != entered {
                tracing::debug!(from = ?entered, to = ?self.state, "handshake state transition");
            }

            match result {
                StateResult::Advance => continue,
                StateResult::NeedRead => return Ok(HandshakeStatus::NeedRead),
                StateResult::Flush => return Ok(HandshakeStatus::NeedFlush),
                StateResult::EarlyDataRejected => return Ok(HandshakeStatus::EarlyDataRejected),
                StateResult::Pending(op) => return Ok(HandshakeStatus::Pending(op)),
            }
        }
        Ok(HandshakeStatus::Complete)
    }

    fn fold_transcript(&mut self, msg: &HandshakeMessage) -> Result<()> {
        let encoded = msg.encode()?;
        self.transcript.update(&encoded);
        Ok(())
    }

    fn suite(&self) -> Result<CipherSuite> {
        self.cipher_suite
            .ok_or_else(|| Error::Internal("cipher suite not negotiated yet".into()))
    }

    fn key_schedule(&self) -> Result<&KeySchedule> {
        self.key_schedule
            .as_ref()
            .ok_or_else(|| Error::Internal("key schedule not initialized".into()))
    }

    fn pending_session_mut(&mut self) -> Result<&mut Session> {
        self.pending_session
            .as_mut()
            .ok_or_else(|| Error::Internal("no session in progress".into()))
    }

    fn read_hello_retry_request(&mut self, io: &mut Collaborators<'_>) -> Result<StateResult> {
        let Some(msg) = io.source.get_message() else {
            return Ok(StateResult::NeedRead);
        };
        if msg.msg_type != HandshakeType::HelloRetryRequest {
            self.state = ClientState::ReadServerHello;
            return Ok(StateResult::Advance);
        }

        let hrr = HelloRetryRequest::decode(&msg.payload)?;

        if let Some(cookie_data) = hrr.extensions.get(ExtensionType::Cookie) {
            self.cookie = Some(parse_cookie(cookie_data)?);
        }

        // A fresh key-share group is mandatory on a retry.
        let key_share = hrr
            .extensions
            .get(ExtensionType::KeyShare)
            .ok_or(Error::Protocol(ProtocolError::MissingExtension))?;
        let group = parse_retry_group(key_share)?;
        if !self.config.supported_groups.contains(&group) {
            return Err(Error::Protocol(ProtocolError::IllegalParameter));
        }
        // The server must not request the share it was already given.
        if self.key_share.as_ref().map(|k| k.group) == Some(group) {
            return Err(Error::Protocol(ProtocolError::IllegalParameter));
        }

        self.key_share = None;
        self.retry_group = Some(group);

        self.fold_transcript(&msg)?;
        io.source.next_message();
        self.received_hello_retry_request = true;
        self.state = ClientState::SendSecondClientHello;
        tracing::debug!(group = group.name(), "HelloRetryRequest accepted");

        // A retry is incompatible with continuing 0-RTT.
        if self.early_data == EarlyDataState::Offered {
            self.early_data.reject()?;
            return Ok(StateResult::EarlyDataRejected);
        }
        Ok(StateResult::Advance)
    }

    fn send_second_client_hello(&mut self, io: &mut Collaborators<'_>) -> Result<StateResult> {
        let group = self
            .retry_group
            .ok_or_else(|| Error::Internal("retry group not recorded".into()))?;

        // 0-RTT may have switched write protection; the retried ClientHello
        // goes out in plaintext.
        if self.early_data_offered {
            io.keys.reset_write_key()?;
        }

        let second = io.hello.build_retry_hello(group, self.cookie.as_deref())?;
        if second.key_share.group != group {
            return Err(Error::Internal(
                "builder produced a key share for the wrong group".into(),
            ));
        }

        let msg = HandshakeMessage::new(HandshakeType::ClientHello, second.payload);
        self.fold_transcript(&msg)?;
        io.sink.add_message(msg)?;
        self.key_share = Some(second.key_share);

        self.state = ClientState::ReadServerHello;
        Ok(StateResult::Flush)
    }

    fn read_server_hello(&mut self, io: &mut Collaborators<'_>) -> Result<StateResult> {
        let Some(msg) = io.source.get_message() else {
            return Ok(StateResult::NeedRead);
        };
        if msg.msg_type != HandshakeType::ServerHello {
            return Err(Error::UnexpectedMessage(format!(
                "expected ServerHello, got {:?}",
                msg.msg_type
            )));
        }

        let hello = ServerHello::decode(&msg.payload)?;

        if hello.version != self.negotiated_version.to_u16() {
            return Err(Error::Protocol(ProtocolError::ProtocolVersion));
        }
        self.server_random = Some(hello.random);

        let suite = CipherSuite::from_u16(hello.cipher_suite)
            .ok_or(Error::Protocol(ProtocolError::IllegalParameter))?;

        // supported_versions only existed for the transitional wire format.
        if hello.extensions.has(ExtensionType::SupportedVersions) {
            return Err(Error::Protocol(ProtocolError::UnsupportedExtension));
        }

        if let Some(psk_data) = hello.extensions.get(ExtensionType::PreSharedKey) {
            let selected_identity = parse_psk_identity(psk_data)?;
            if selected_identity != 0 {
                return Err(Error::Protocol(ProtocolError::IllegalParameter));
            }
            let offered = self
                .offered_session
                .take()
                .ok_or(Error::Protocol(ProtocolError::UnsupportedExtension))?;
            if offered.version != self.negotiated_version {
                return Err(Error::Protocol(ProtocolError::IllegalParameter));
            }
            if offered.cipher_suite.hash_algorithm() != suite.hash_algorithm() {
                return Err(Error::Protocol(ProtocolError::IllegalParameter));
            }

            // Only authentication information carries over.
            let mut session = offered.dup_auth_only();
            // Resumption incorporates fresh key material, so refresh the
            // timeout.
            session.renew_timeout(unix_now(), self.config.psk_dhe_timeout);
            self.session_reused = true;
            self.pending_session = Some(session);
            tracing::debug!("PSK resumption accepted");
        } else {
            self.pending_session = Some(Session::new(
                suite,
                self.negotiated_version,
                unix_now(),
                self.config.session_timeout,
            ));
        }

        self.cipher_suite = Some(suite);
        {
            let session = self.pending_session_mut()?;
            session.cipher_suite = suite;
        }
        self.transcript.set_algorithm(suite.hash_algorithm());

        // The PRF hash is now known; set up the key schedule and fold the
        // PSK (or zeros) as the early secret.
        let mut key_schedule = KeySchedule::new(suite);
        if self.session_reused {
            let psk = self.pending_session_mut()?.master_secret.clone();
            key_schedule.advance(io.provider, &psk)?;
        } else {
            let zeros = vec![0u8; key_schedule.hash_len()];
            key_schedule.advance(io.provider, &zeros)?;
        }

        // psk_ke is not supported; a key share is always required.
        let key_share_data = hello
            .extensions
            .get(ExtensionType::KeyShare)
            .ok_or(Error::Protocol(ProtocolError::MissingExtension))?;
        let (group, peer_public) = parse_server_key_share(key_share_data)?;
        let our_share = self
            .key_share
            .as_ref()
            .ok_or_else(|| Error::Internal("client key share missing".into()))?;
        if group != our_share.group {
            return Err(Error::Protocol(ProtocolError::IllegalParameter));
        }

        let kex = io.provider.key_exchange(group)?;
        let shared_secret = kex
            .exchange(&our_share.private_key, peer_public)
            .map_err(|_| Error::Protocol(ProtocolError::IllegalParameter))?;
        key_schedule.advance(io.provider, shared_secret.as_bytes())?;

        // The transcript at this exact point is the derivation context for
        // the handshake traffic secrets.
        self.fold_transcript(&msg)?;
        let transcript_hash = self.transcript.current_hash(io.provider)?;
        key_schedule.derive_client_handshake_traffic_secret(io.provider, &transcript_hash)?;
        key_schedule.derive_server_handshake_traffic_secret(io.provider, &transcript_hash)?;
        self.key_schedule = Some(key_schedule);

        io.source.next_message();
        self.state = ClientState::ProcessChangeCipherSpec;
        Ok(StateResult::Advance)
    }

    fn process_change_cipher_spec(&mut self, io: &mut Collaborators<'_>) -> Result<StateResult> {
        let suite = self.suite()?;
        let key_schedule = self.key_schedule()?;

        let server_secret = key_schedule
            .server_handshake_traffic_secret()
            .ok_or_else(|| Error::Internal("server handshake secret missing".into()))?;
        io.keys
            .install_read_key(suite, TrafficLevel::Handshake, server_secret)?;

        // While 0-RTT application data is still in flight the write keys
        // stay on the early secret; the switch happens in
        // SendEndOfEarlyData.
        if !self.early_data_offered {
            let client_secret = key_schedule
                .client_handshake_traffic_secret()
                .ok_or_else(|| Error::Internal("client handshake secret missing".into()))?;
            io.keys
                .install_write_key(suite, TrafficLevel::Handshake, client_secret)?;
        }

        self.state = ClientState::ReadEncryptedExtensions;
        Ok(StateResult::Advance)
    }

    fn read_encrypted_extensions(&mut self, io: &mut Collaborators<'_>) -> Result<StateResult> {
        let Some(msg) = io.source.get_message() else {
            return Ok(StateResult::NeedRead);
        };
        if msg.msg_type != HandshakeType::EncryptedExtensions {
            return Err(Error::UnexpectedMessage(format!(
                "expected EncryptedExtensions, got {:?}",
                msg.msg_type
            )));
        }

        let ee = EncryptedExtensions::decode(&msg.payload)?;

        let alpn = ee.alpn_protocol()?;
        if let Some(protocol) = &alpn {
            self.pending_session_mut()?.alpn_protocol = Some(protocol.clone());
        }

        if ee.extensions.has(ExtensionType::ChannelId) {
            self.channel_binding_negotiated = true;
        }

        if ee.early_data_accepted() {
            if self.early_data != EarlyDataState::Offered {
                return Err(Error::Protocol(ProtocolError::UnsupportedExtension));
            }
            self.early_data.accept()?;

            // 0-RTT data was sent under the early session's parameters;
            // anything else accepting it is cross-context confusion.
            let early = self
                .early_session
                .as_ref()
                .ok_or_else(|| Error::Internal("early session missing".into()))?;
            if early.cipher_suite != self.suite()? || early.alpn_protocol != alpn {
                return Err(Error::Protocol(ProtocolError::AlpnMismatchOnEarlyData));
            }
            if self.channel_binding_negotiated {
                return Err(Error::Protocol(
                    ProtocolError::UnexpectedExtensionOnEarlyData,
                ));
            }
            tracing::debug!("early data accepted");
        }

        self.fold_transcript(&msg)?;
        io.source.next_message();
        self.state = ClientState::ReadCertificateRequest;

        if self.early_data == EarlyDataState::Offered {
            self.early_data.reject()?;
            tracing::debug!("early data rejected by server");
            return Ok(StateResult::EarlyDataRejected);
        }
        Ok(StateResult::Advance)
    }

    fn read_certificate_request(&mut self, io: &mut Collaborators<'_>) -> Result<StateResult> {
        // CertificateRequest may only be sent in non-resumption handshakes.
        if self.session_reused {
            self.state = ClientState::ReadServerFinished;
            return Ok(StateResult::Advance);
        }

        let Some(msg) = io.source.get_message() else {
            return Ok(StateResult::NeedRead);
        };

        // CertificateRequest is optional.
        if msg.msg_type != HandshakeType::CertificateRequest {
            self.state = ClientState::ReadServerCertificate;
            return Ok(StateResult::Advance);
        }

        let request = CertificateRequest::decode(&msg.payload)?;
        self.cert_request = Some(request);

        self.fold_transcript(&msg)?;
        io.source.next_message();
        self.state = ClientState::ReadServerCertificate;
        Ok(StateResult::Advance)
    }

    fn read_server_certificate(&mut self, io: &mut Collaborators<'_>) -> Result<StateResult> {
        let Some(msg) = io.source.get_message() else {
            return Ok(StateResult::NeedRead);
        };
        if msg.msg_type != HandshakeType::Certificate {
            return Err(Error::UnexpectedMessage(format!(
                "expected Certificate, got {:?}",
                msg.msg_type
            )));
        }

        let certificate = Certificate::decode(&msg.payload)?;
        if certificate.entries.is_empty() {
            return Err(Error::Protocol(ProtocolError::CertificateRequired));
        }

        self.server_cert_chain = certificate.chain();
        self.pending_session_mut()?.peer_certificates = self.server_cert_chain.clone();

        self.fold_transcript(&msg)?;
        io.source.next_message();
        self.state = ClientState::ReadServerCertificateVerify;
        Ok(StateResult::Advance)
    }

    fn read_server_certificate_verify(
        &mut self,
        io: &mut Collaborators<'_>,
    ) -> Result<StateResult> {
        let Some(msg) = io.source.get_message() else {
            return Ok(StateResult::NeedRead);
        };

        match io.verifier.verify_chain(&self.server_cert_chain) {
            VerifyOutcome::Valid => {}
            VerifyOutcome::Invalid => {
                let session = self.pending_session_mut()?;
                session.not_resumable = true;
                return Err(Error::CertificateVerificationFailed(
                    "certificate chain rejected".into(),
                ));
            }
            VerifyOutcome::Retry => {
                return Ok(StateResult::Pending(PendingOperation::CertificateVerify))
            }
        }

        if msg.msg_type != HandshakeType::CertificateVerify {
            return Err(Error::UnexpectedMessage(format!(
                "expected CertificateVerify, got {:?}",
                msg.msg_type
            )));
        }

        let cert_verify = CertificateVerify::decode(&msg.payload)?;
        let scheme = SignatureScheme::from_u16(cert_verify.scheme)
            .ok_or(Error::Protocol(ProtocolError::IllegalParameter))?;

        // The signature covers the transcript up to, but not including,
        // the CertificateVerify message itself.
        let transcript_hash = self.transcript.current_hash(io.provider)?;
        let content = signature_content(SERVER_CERTIFICATE_VERIFY_CONTEXT, &transcript_hash);
        match io.verifier.verify_signature(
            &self.server_cert_chain,
            scheme,
            &content,
            &cert_verify.signature,
        ) {
            VerifyOutcome::Valid => {}
            VerifyOutcome::Invalid => {
                let session = self.pending_session_mut()?;
                session.not_resumable = true;
                return Err(Error::Protocol(ProtocolError::DecryptError));
            }
            VerifyOutcome::Retry => {
                return Ok(StateResult::Pending(PendingOperation::CertificateVerify))
            }
        }

        self.pending_session_mut()?.peer_verified = true;

        self.fold_transcript(&msg)?;
        io.source.next_message();
        self.state = ClientState::ReadServerFinished;
        Ok(StateResult::Advance)
    }

    fn read_server_finished(&mut self, io: &mut Collaborators<'_>) -> Result<StateResult> {
        let Some(msg) = io.source.get_message() else {
            return Ok(StateResult::NeedRead);
        };
        if msg.msg_type != HandshakeType::Finished {
            return Err(Error::UnexpectedMessage(format!(
                "expected Finished, got {:?}",
                msg.msg_type
            )));
        }

        let finished = Finished::decode(&msg.payload)?;
        let suite = self.suite()?;
        let transcript_hash = self.transcript.current_hash(io.provider)?;
        let server_secret = self
            .key_schedule()?
            .server_handshake_traffic_secret()
            .ok_or_else(|| Error::Internal("server handshake secret missing".into()))?
            .to_vec();
        let expected = compute_verify_data(
            io.provider,
            suite.hash_algorithm(),
            &server_secret,
            &transcript_hash,
        )?;
        if expected.len() != finished.verify_data.len()
            || !bool::from(expected.ct_eq(&finished.verify_data))
        {
            return Err(Error::Protocol(ProtocolError::DecryptError));
        }

        self.fold_transcript(&msg)?;

        // Update the secret to the master secret and derive the
        // application traffic secrets from the server-Finished transcript.
        let key_schedule = self
            .key_schedule
            .as_mut()
            .ok_or_else(|| Error::Internal("key schedule not initialized".into()))?;
        let zeros = vec![0u8; key_schedule.hash_len()];
        key_schedule.advance(io.provider, &zeros)?;
        let transcript_hash = self.transcript.current_hash(io.provider)?;
        key_schedule.derive_client_application_traffic_secret(io.provider, &transcript_hash)?;
        key_schedule.derive_server_application_traffic_secret(io.provider, &transcript_hash)?;

        io.source.next_message();
        self.state = ClientState::SendEndOfEarlyData;
        Ok(StateResult::Advance)
    }

    fn send_end_of_early_data(&mut self, io: &mut Collaborators<'_>) -> Result<StateResult> {
        if self.early_data.is_accepted() {
            let msg = HandshakeMessage::new(
                HandshakeType::EndOfEarlyData,
                EndOfEarlyData::new().encode()?,
            );
            self.fold_transcript(&msg)?;
            io.sink.add_message(msg)?;
        }

        if self.early_data_offered {
            let suite = self.suite()?;
            let client_secret = self
                .key_schedule()?
                .client_handshake_traffic_secret()
                .ok_or_else(|| Error::Internal("client handshake secret missing".into()))?
                .to_vec();
            io.keys
                .install_write_key(suite, TrafficLevel::Handshake, &client_secret)?;
        }

        self.state = ClientState::SendClientCertificate;
        Ok(StateResult::Advance)
    }

    fn send_client_certificate(&mut self, io: &mut Collaborators<'_>) -> Result<StateResult> {
        // The peer didn't request a certificate.
        let Some(request) = self.cert_request.as_ref() else {
            self.state = ClientState::CompleteSecondFlight;
            return Ok(StateResult::Advance);
        };

        match io.credentials.select_certificate(request) {
            SelectOutcome::Certificate(chain) if !chain.is_empty() => {
                let certificate = Certificate::new(Vec::new(), chain.clone());
                let msg =
                    HandshakeMessage::new(HandshakeType::Certificate, certificate.encode()?);
                self.fold_transcript(&msg)?;
                io.sink.add_message(msg)?;
                self.client_cert_chain = Some(chain);
                self.state = ClientState::SendClientCertificateVerify;
                Ok(StateResult::Advance)
            }
            SelectOutcome::Certificate(_) | SelectOutcome::NoCertificate => {
                self.state = ClientState::CompleteSecondFlight;
                Ok(StateResult::Advance)
            }
            SelectOutcome::Retry => Ok(StateResult::Pending(PendingOperation::CertificateSelect)),
            SelectOutcome::Failure => {
                Err(Error::Internal("certificate selection callback failed".into()))
            }
        }
    }

    fn send_client_certificate_verify(
        &mut self,
        io: &mut Collaborators<'_>,
    ) -> Result<StateResult> {
        // Don't send CertificateVerify if there is no certificate.
        if self.client_cert_chain.is_none() {
            self.state = ClientState::CompleteSecondFlight;
            return Ok(StateResult::Advance);
        }

        let schemes = self
            .cert_request
            .as_ref()
            .map(|r| r.signature_algorithms.clone())
            .ok_or_else(|| Error::Internal("certificate request missing".into()))?;

        let transcript_hash = self.transcript.current_hash(io.provider)?;
        let content = signature_content(CLIENT_CERTIFICATE_VERIFY_CONTEXT, &transcript_hash);

        match io.signer.sign(&schemes, &content) {
            SignOutcome::Signed { scheme, signature } => {
                let cert_verify = CertificateVerify::new(scheme.to_u16(), signature);
                let msg = HandshakeMessage::new(
                    HandshakeType::CertificateVerify,
                    cert_verify.encode()?,
                );
                self.fold_transcript(&msg)?;
                io.sink.add_message(msg)?;
                self.state = ClientState::CompleteSecondFlight;
                Ok(StateResult::Advance)
            }
            SignOutcome::Retry => Ok(StateResult::Pending(PendingOperation::PrivateKeySign)),
            SignOutcome::Failure => Err(Error::Crypto("private-key signing failed".into())),
        }
    }

    fn complete_second_flight(&mut self, io: &mut Collaborators<'_>) -> Result<StateResult> {
        // Send a channel-binding assertion if the server negotiated one.
        if self.channel_binding_negotiated {
            let transcript_hash = self.transcript.current_hash(io.provider)?;
            let assertor = io
                .assertor
                .as_deref_mut()
                .ok_or_else(|| Error::Internal("channel binding without an assertor".into()))?;
            match assertor.assert_identity(&transcript_hash) {
                AssertOutcome::Assertion(payload) => {
                    let msg = HandshakeMessage::new(HandshakeType::ChannelId, payload);
                    self.fold_transcript(&msg)?;
                    io.sink.add_message(msg)?;
                    self.channel_binding_negotiated = false;
                }
                AssertOutcome::Retry => {
                    return Ok(StateResult::Pending(PendingOperation::IdentityAssertion))
                }
                AssertOutcome::Failure => {
                    return Err(Error::Internal("identity assertion failed".into()))
                }
            }
        }

        let suite = self.suite()?;
        let transcript_hash = self.transcript.current_hash(io.provider)?;
        let key_schedule = self.key_schedule()?;
        let client_secret = key_schedule
            .client_handshake_traffic_secret()
            .ok_or_else(|| Error::Internal("client handshake secret missing".into()))?
            .to_vec();
        let verify_data = compute_verify_data(
            io.provider,
            suite.hash_algorithm(),
            &client_secret,
            &transcript_hash,
        )?;
        let msg = HandshakeMessage::new(HandshakeType::Finished, Finished::new(verify_data).encode()?);
        self.fold_transcript(&msg)?;
        io.sink.add_message(msg)?;

        // Derive the final keys and enable them.
        let key_schedule = self.key_schedule()?;
        let server_app = key_schedule
            .server_application_traffic_secret()
            .ok_or_else(|| Error::Internal("server application secret missing".into()))?
            .to_vec();
        let client_app = key_schedule
            .client_application_traffic_secret()
            .ok_or_else(|| Error::Internal("client application secret missing".into()))?
            .to_vec();
        io.keys
            .install_read_key(suite, TrafficLevel::Application, &server_app)?;
        io.keys
            .install_write_key(suite, TrafficLevel::Application, &client_app)?;

        // The resumption secret covers the transcript through the client
        // Finished.
        let transcript_hash = self.transcript.current_hash(io.provider)?;
        let resumption = self
            .key_schedule()?
            .derive_resumption_master_secret(io.provider, &transcript_hash)?;
        self.pending_session_mut()?.master_secret = zeroize::Zeroizing::new(resumption);

        self.state = ClientState::Done;
        Ok(StateResult::Flush)
    }
}

/// Parse the HelloRetryRequest cookie extension: a length-prefixed,
/// non-empty opaque value.
fn parse_cookie(mut data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < 2 {
        return Err(Error::Protocol(ProtocolError::DecodeError));
    }
    let len = data.get_u16() as usize;
    if len == 0 || data.len() != len {
        return Err(Error::Protocol(ProtocolError::DecodeError));
    }
    Ok(data.to_vec())
}

/// Parse the HelloRetryRequest key_share extension: exactly one group id.
fn parse_retry_group(mut data: &[u8]) -> Result<KeyExchangeAlgorithm> {
    if data.len() != 2 {
        return Err(Error::Protocol(ProtocolError::DecodeError));
    }
    let group_id = data.get_u16();
    KeyExchangeAlgorithm::from_u16(group_id)
        .ok_or(Error::Protocol(ProtocolError::IllegalParameter))
}

/// Parse the ServerHello pre_shared_key extension: the selected identity.
fn parse_psk_identity(mut data: &[u8]) -> Result<u16> {
    if data.len() != 2 {
        return Err(Error::Protocol(ProtocolError::DecodeError));
    }
    Ok(data.get_u16())
}

/// Parse the ServerHello key_share extension: one entry, byte-exact.
fn parse_server_key_share(mut data: &[u8]) -> Result<(KeyExchangeAlgorithm, &[u8])> {
    if data.len() < 4 {
        return Err(Error::Protocol(ProtocolError::DecodeError));
    }
    let group_id = data.get_u16();
    let key_len = data.get_u16() as usize;
    if data.len() != key_len || key_len == 0 {
        return Err(Error::Protocol(ProtocolError::DecodeError));
    }
    let group = KeyExchangeAlgorithm::from_u16(group_id)
        .ok_or(Error::Protocol(ProtocolError::IllegalParameter))?;
    Ok((group, data))
}
