//! Shared harness for handshake integration tests.
//!
//! The "server" here is scripted: tests build the server's messages by hand
//! and mirror the key-schedule derivations through the crate's own public
//! primitives, so Finished MACs and traffic secrets are real.

#![allow(dead_code)]

use std::collections::VecDeque;

use palisade_core::alert::Alert;
use palisade_core::cipher::CipherSuite;
use palisade_core::error::Result;
use palisade_core::extensions::{Extension, Extensions};
use palisade_core::handshake::{
    AssertOutcome, ClientCredentials, ClientHandshake, ClientHelloBuilder, ClientHelloOffer,
    Collaborators, HandshakeStatus, IdentityAssertor, KeyInstaller, KeyShareKeys, MessageSink,
    MessageSource, PrivateKeySigner, SecondClientHello, SelectOutcome, SignOutcome,
    TrafficLevel, VerifyOutcome,
};
use palisade_core::key_schedule::KeySchedule;
use palisade_core::messages::{
    CertificateRequest, Finished, HandshakeMessage, ServerHello,
};
use palisade_core::protocol::{ExtensionType, HandshakeType};
use palisade_core::session::Session;
use palisade_core::transcript::{compute_verify_data, TranscriptHash};
use palisade_core::ProtocolVersion;
use palisade_crypto::{CryptoProvider, KeyExchangeAlgorithm, SignatureScheme};
use palisade_crypto_rustcrypto::RustCryptoProvider;

/// Scripted message source: the messages the "server" has sent.
#[derive(Default)]
pub struct ServerMessages {
    queue: VecDeque<HandshakeMessage>,
}

impl ServerMessages {
    pub fn push(&mut self, message: HandshakeMessage) {
        self.queue.push_back(message);
    }
}

impl MessageSource for ServerMessages {
    fn get_message(&mut self) -> Option<HandshakeMessage> {
        self.queue.front().cloned()
    }

    fn next_message(&mut self) {
        self.queue.pop_front();
    }
}

/// Captures everything the client queues for transmission.
#[derive(Default)]
pub struct Outbox {
    pub messages: Vec<HandshakeMessage>,
    pub alerts: Vec<Alert>,
}

impl MessageSink for Outbox {
    fn add_message(&mut self, message: HandshakeMessage) -> Result<()> {
        self.messages.push(message);
        Ok(())
    }

    fn add_alert(&mut self, alert: Alert) -> Result<()> {
        self.alerts.push(alert);
        Ok(())
    }
}

/// Records traffic-secret installations in order.
#[derive(Default)]
pub struct KeyLog {
    pub installed: Vec<(&'static str, TrafficLevel, Vec<u8>)>,
    pub resets: usize,
}

impl KeyInstaller for KeyLog {
    fn install_read_key(
        &mut self,
        _suite: CipherSuite,
        level: TrafficLevel,
        secret: &[u8],
    ) -> Result<()> {
        self.installed.push(("read", level, secret.to_vec()));
        Ok(())
    }

    fn install_write_key(
        &mut self,
        _suite: CipherSuite,
        level: TrafficLevel,
        secret: &[u8],
    ) -> Result<()> {
        self.installed.push(("write", level, secret.to_vec()));
        Ok(())
    }

    fn reset_write_key(&mut self) -> Result<()> {
        self.resets += 1;
        Ok(())
    }
}

/// Certificate verifier with scripted outcomes (defaults to `Valid`).
#[derive(Default)]
pub struct StubVerifier {
    pub chain_outcomes: VecDeque<VerifyOutcome>,
    pub signature_outcomes: VecDeque<VerifyOutcome>,
    pub chain_calls: usize,
    pub signature_calls: usize,
}

impl palisade_core::handshake::CertificateVerifier for StubVerifier {
    fn verify_chain(&mut self, _chain: &[Vec<u8>]) -> VerifyOutcome {
        self.chain_calls += 1;
        self.chain_outcomes.pop_front().unwrap_or(VerifyOutcome::Valid)
    }

    fn verify_signature(
        &mut self,
        _chain: &[Vec<u8>],
        _scheme: SignatureScheme,
        _message: &[u8],
        _signature: &[u8],
    ) -> VerifyOutcome {
        self.signature_calls += 1;
        self.signature_outcomes
            .pop_front()
            .unwrap_or(VerifyOutcome::Valid)
    }
}

/// Client credential source with scripted outcomes (defaults to
/// `NoCertificate`).
#[derive(Default)]
pub struct StubCredentials {
    pub outcomes: VecDeque<SelectOutcome>,
    pub calls: usize,
}

impl ClientCredentials for StubCredentials {
    fn select_certificate(&mut self, _request: &CertificateRequest) -> SelectOutcome {
        self.calls += 1;
        self.outcomes
            .pop_front()
            .unwrap_or(SelectOutcome::NoCertificate)
    }
}

/// Private-key signer with scripted outcomes.
#[derive(Default)]
pub struct StubSigner {
    pub outcomes: VecDeque<SignOutcome>,
    pub calls: usize,
}

impl PrivateKeySigner for StubSigner {
    fn sign(&mut self, schemes: &[SignatureScheme], _message: &[u8]) -> SignOutcome {
        self.calls += 1;
        self.outcomes.pop_front().unwrap_or(SignOutcome::Signed {
            scheme: schemes
                .first()
                .copied()
                .unwrap_or(SignatureScheme::EcdsaSecp256r1Sha256),
            signature: b"client-signature".to_vec(),
        })
    }
}

/// Identity assertor with scripted outcomes.
#[derive(Default)]
pub struct StubAssertor {
    pub outcomes: VecDeque<AssertOutcome>,
    pub calls: usize,
}

impl IdentityAssertor for StubAssertor {
    fn assert_identity(&mut self, _transcript_hash: &[u8]) -> AssertOutcome {
        self.calls += 1;
        self.outcomes
            .pop_front()
            .unwrap_or_else(|| AssertOutcome::Assertion(b"identity-assertion".to_vec()))
    }
}

/// Builds the retried ClientHello with a fresh key share.
#[derive(Default)]
pub struct RetryHelloBuilder {
    pub calls: Vec<(KeyExchangeAlgorithm, Option<Vec<u8>>)>,
    pub last_public: Option<Vec<u8>>,
}

impl ClientHelloBuilder for RetryHelloBuilder {
    fn build_retry_hello(
        &mut self,
        group: KeyExchangeAlgorithm,
        cookie: Option<&[u8]>,
    ) -> Result<SecondClientHello> {
        self.calls.push((group, cookie.map(|c| c.to_vec())));
        let provider = RustCryptoProvider::new();
        let kex = provider.key_exchange(group)?;
        let (private_key, public_key) = kex.generate_keypair()?;
        self.last_public = Some(public_key.as_bytes().to_vec());
        Ok(SecondClientHello {
            payload: b"second-client-hello".to_vec(),
            key_share: KeyShareKeys {
                group,
                private_key,
                public_key: public_key.into_bytes(),
            },
        })
    }
}

/// All collaborator stubs plus the provider, bundled per test.
pub struct Harness {
    pub provider: RustCryptoProvider,
    pub source: ServerMessages,
    pub outbox: Outbox,
    pub keys: KeyLog,
    pub builder: RetryHelloBuilder,
    pub verifier: StubVerifier,
    pub credentials: StubCredentials,
    pub signer: StubSigner,
    pub assertor: Option<StubAssertor>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            provider: RustCryptoProvider::new(),
            source: ServerMessages::default(),
            outbox: Outbox::default(),
            keys: KeyLog::default(),
            builder: RetryHelloBuilder::default(),
            verifier: StubVerifier::default(),
            credentials: StubCredentials::default(),
            signer: StubSigner::default(),
            assertor: None,
        }
    }

    pub fn drive(&mut self, handshake: &mut ClientHandshake) -> Result<HandshakeStatus> {
        let mut io = Collaborators {
            provider: &self.provider,
            source: &mut self.source,
            sink: &mut self.outbox,
            keys: &mut self.keys,
            hello: &mut self.builder,
            verifier: &mut self.verifier,
            credentials: &mut self.credentials,
            signer: &mut self.signer,
            assertor: self
                .assertor
                .as_mut()
                .map(|a| a as &mut dyn IdentityAssertor),
        };
        handshake.drive(&mut io)
    }
}

/// Generate a client key share and the framed first ClientHello.
pub fn client_offer(
    group: KeyExchangeAlgorithm,
    session: Option<Session>,
    early_data: bool,
) -> (ClientHelloOffer, Vec<u8>, Vec<u8>) {
    let provider = RustCryptoProvider::new();
    let kex = provider.key_exchange(group).unwrap();
    let (private_key, public_key) = kex.generate_keypair().unwrap();
    let client_public = public_key.as_bytes().to_vec();

    let hello = HandshakeMessage::new(HandshakeType::ClientHello, b"first-client-hello".to_vec());
    let encoded = hello.encode().unwrap();

    let offer = ClientHelloOffer {
        encoded: encoded.clone(),
        key_share: KeyShareKeys {
            group,
            private_key,
            public_key: public_key.into_bytes(),
        },
        session,
        early_data_offered: early_data,
    };
    (offer, encoded, client_public)
}

/// Compute the server side of the key exchange against a client public key.
pub fn server_key_share(
    group: KeyExchangeAlgorithm,
    client_public: &[u8],
) -> (Vec<u8>, Vec<u8>) {
    let provider = RustCryptoProvider::new();
    let kex = provider.key_exchange(group).unwrap();
    let (server_private, server_public) = kex.generate_keypair().unwrap();
    let shared = kex.exchange(&server_private, client_public).unwrap();
    (server_public.as_bytes().to_vec(), shared.as_bytes().to_vec())
}

/// key_share extension payload for ServerHello.
pub fn key_share_extension(group: KeyExchangeAlgorithm, public_key: &[u8]) -> Extension {
    let mut data = Vec::new();
    data.extend_from_slice(&group.to_u16().to_be_bytes());
    data.extend_from_slice(&(public_key.len() as u16).to_be_bytes());
    data.extend_from_slice(public_key);
    Extension::new(ExtensionType::KeyShare, data)
}

/// pre_shared_key extension payload selecting identity 0.
pub fn psk_extension() -> Extension {
    Extension::new(ExtensionType::PreSharedKey, vec![0, 0])
}

/// ALPN extension payload selecting exactly one protocol.
pub fn alpn_extension(protocol: &[u8]) -> Extension {
    let mut data = Vec::new();
    data.extend_from_slice(&((protocol.len() + 1) as u16).to_be_bytes());
    data.push(protocol.len() as u8);
    data.extend_from_slice(protocol);
    Extension::new(ExtensionType::ApplicationLayerProtocolNegotiation, data)
}

/// Build a framed ServerHello.
pub fn server_hello(suite: CipherSuite, extensions: Extensions) -> HandshakeMessage {
    let hello = ServerHello {
        version: 0x0304,
        random: [0x5A; 32],
        cipher_suite: suite.to_u16(),
        extensions,
    };
    HandshakeMessage::new(HandshakeType::ServerHello, hello.encode().unwrap())
}

/// Build a framed EncryptedExtensions message.
pub fn encrypted_extensions(extensions: Extensions) -> HandshakeMessage {
    HandshakeMessage::new(HandshakeType::EncryptedExtensions, extensions.encode())
}

/// Build a resumable session holding `psk` as its resumption secret.
pub fn resumable_session(suite: CipherSuite, psk: Vec<u8>, alpn: Option<Vec<u8>>) -> Session {
    let mut session = Session::new(suite, ProtocolVersion::Tls13, 0, 7_200);
    session.master_secret = zeroize::Zeroizing::new(psk);
    session.alpn_protocol = alpn;
    session.ticket = b"resumption-ticket".to_vec();
    session.ticket_age_add = 17;
    session.ticket_age_add_valid = true;
    session.not_resumable = false;
    session.peer_certificates = vec![b"cached-peer-der".to_vec()];
    session.peer_verified = true;
    session
}

/// Mirrors the server's view of the transcript and key schedule.
pub struct ServerSim {
    pub provider: RustCryptoProvider,
    pub suite: CipherSuite,
    pub transcript: TranscriptHash,
    pub key_schedule: KeySchedule,
    pub client_hs: Vec<u8>,
    pub server_hs: Vec<u8>,
}

impl ServerSim {
    /// Start a mirror with the early-secret input and DHE share folded.
    pub fn new(suite: CipherSuite, psk: Option<&[u8]>, shared_secret: &[u8]) -> Self {
        let provider = RustCryptoProvider::new();
        let mut key_schedule = KeySchedule::new(suite);
        let ikm = match psk {
            Some(psk) => psk.to_vec(),
            None => vec![0u8; suite.hash_algorithm().output_size()],
        };
        key_schedule.advance(&provider, &ikm).unwrap();
        key_schedule.advance(&provider, shared_secret).unwrap();
        Self {
            provider,
            suite,
            transcript: TranscriptHash::new(suite.hash_algorithm()),
            key_schedule,
            client_hs: Vec::new(),
            server_hs: Vec::new(),
        }
    }

    /// Fold a framed message into the mirrored transcript.
    pub fn fold(&mut self, message: &HandshakeMessage) {
        self.transcript.update(&message.encode().unwrap());
    }

    /// Fold already-encoded bytes into the mirrored transcript.
    pub fn fold_raw(&mut self, encoded: &[u8]) {
        self.transcript.update(encoded);
    }

    /// Derive the handshake traffic secrets at the current transcript.
    pub fn derive_handshake_secrets(&mut self) {
        let hash = self.transcript.current_hash(&self.provider).unwrap();
        self.client_hs = self
            .key_schedule
            .derive_client_handshake_traffic_secret(&self.provider, &hash)
            .unwrap();
        self.server_hs = self
            .key_schedule
            .derive_server_handshake_traffic_secret(&self.provider, &hash)
            .unwrap();
    }

    /// Build the server Finished over the current transcript.
    pub fn server_finished(&mut self) -> HandshakeMessage {
        let hash = self.transcript.current_hash(&self.provider).unwrap();
        let verify_data = compute_verify_data(
            &self.provider,
            self.suite.hash_algorithm(),
            &self.server_hs,
            &hash,
        )
        .unwrap();
        HandshakeMessage::new(
            HandshakeType::Finished,
            Finished::new(verify_data).encode().unwrap(),
        )
    }

    /// Advance to the master secret and derive the application secrets
    /// from the current (server-Finished) transcript.
    pub fn derive_application_secrets(&mut self) -> (Vec<u8>, Vec<u8>) {
        let zeros = vec![0u8; self.suite.hash_algorithm().output_size()];
        self.key_schedule.advance(&self.provider, &zeros).unwrap();
        let hash = self.transcript.current_hash(&self.provider).unwrap();
        let client_app = self
            .key_schedule
            .derive_client_application_traffic_secret(&self.provider, &hash)
            .unwrap();
        let server_app = self
            .key_schedule
            .derive_server_application_traffic_secret(&self.provider, &hash)
            .unwrap();
        (client_app, server_app)
    }

    /// Expected client Finished over the current transcript.
    pub fn expected_client_finished(&mut self) -> Vec<u8> {
        let hash = self.transcript.current_hash(&self.provider).unwrap();
        compute_verify_data(
            &self.provider,
            self.suite.hash_algorithm(),
            &self.client_hs,
            &hash,
        )
        .unwrap()
    }

    /// Resumption secret over the current (client-Finished) transcript.
    pub fn resumption_secret(&mut self) -> Vec<u8> {
        let hash = self.transcript.current_hash(&self.provider).unwrap();
        self.key_schedule
            .derive_resumption_master_secret(&self.provider, &hash)
            .unwrap()
    }
}

/// A fake DER certificate chain.
pub fn fake_chain() -> Vec<Vec<u8>> {
    vec![b"fake-leaf-der".to_vec(), b"fake-root-der".to_vec()]
}

/// Build a framed server Certificate message for `fake_chain`.
pub fn server_certificate() -> HandshakeMessage {
    let certificate = palisade_core::messages::Certificate::new(Vec::new(), fake_chain());
    HandshakeMessage::new(
        HandshakeType::Certificate,
        certificate.encode().unwrap(),
    )
}

/// Build a framed server CertificateVerify message.
pub fn server_certificate_verify() -> HandshakeMessage {
    let cert_verify = palisade_core::messages::CertificateVerify::new(
        SignatureScheme::EcdsaSecp256r1Sha256.to_u16(),
        b"server-signature".to_vec(),
    );
    HandshakeMessage::new(
        HandshakeType::CertificateVerify,
        cert_verify.encode().unwrap(),
    )
}

/// Build a framed CertificateRequest offering ECDSA-P256.
pub fn certificate_request() -> HandshakeMessage {
    let request = CertificateRequest {
        signature_algorithms: vec![SignatureScheme::EcdsaSecp256r1Sha256],
        ca_names: Vec::new(),
    };
    HandshakeMessage::new(
        HandshakeType::CertificateRequest,
        request.encode().unwrap(),
    )
}
