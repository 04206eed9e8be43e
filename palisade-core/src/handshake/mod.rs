//! Handshake state machine and its collaborator interfaces.
//!
//! The state machine is transport-agnostic and crypto-agnostic: everything
//! it needs from the outside world arrives through the small capability
//! traits defined here, bundled per [`drive`](client::ClientHandshake::drive)
//! call in [`Collaborators`]. Asynchronous collaborators (certificate
//! verification, private-key signing, identity lookup) do not block: they
//! return a `Retry` outcome, the machine suspends with
//! [`HandshakeStatus::Pending`], and the next `drive` call re-enters the
//! same state with the same input message.

use crate::alert::Alert;
use crate::cipher::CipherSuite;
use crate::error::Result;
use crate::messages::{CertificateRequest, HandshakeMessage};
use crate::session::Session;
use palisade_crypto::{KeyExchangeAlgorithm, PrivateKey, SignatureScheme};

pub mod client;

pub use client::{ClientHandshake, ClientState};

/// What the caller must do before driving the handshake again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeStatus {
    /// Wait for the transport to deliver the next handshake message.
    NeedRead,

    /// Flush queued output to the transport.
    NeedFlush,

    /// The server turned down 0-RTT: discard or replay buffered early
    /// application data, then keep driving. This is an outcome, not an
    /// error.
    EarlyDataRejected,

    /// An external asynchronous operation is outstanding; drive again once
    /// it has a result.
    Pending(PendingOperation),

    /// The handshake reached `Done`.
    Complete,
}

/// The asynchronous collaborator the machine is suspended on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingOperation {
    /// Certificate chain or signature verification
    CertificateVerify,

    /// Client certificate selection
    CertificateSelect,

    /// Private-key signing for the client CertificateVerify
    PrivateKeySign,

    /// Channel-binding identity assertion lookup
    IdentityAssertion,
}

/// Traffic key level for [`KeyInstaller`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrafficLevel {
    /// Handshake traffic keys
    Handshake,

    /// Application traffic keys
    Application,
}

/// Source of incoming handshake messages.
///
/// `get_message` peeks at the current message without consuming it;
/// `next_message` consumes it. A state handler only consumes after all
/// fallible work for the message has succeeded, which is what makes
/// suspension points re-enterable.
pub trait MessageSource {
    /// The current complete message, or `None` if the transport has not
    /// delivered one yet.
    fn get_message(&mut self) -> Option<HandshakeMessage>;

    /// Consume the current message.
    fn next_message(&mut self);
}

/// Sink for outgoing handshake messages and alerts.
pub trait MessageSink {
    /// Queue a handshake message for transmission.
    fn add_message(&mut self, message: HandshakeMessage) -> Result<()>;

    /// Queue an alert for transmission.
    fn add_alert(&mut self, alert: Alert) -> Result<()>;
}

/// Record-layer key installation.
///
/// The core never performs AEAD itself; it hands traffic secrets to the
/// record layer as they become available.
pub trait KeyInstaller {
    /// Install the read (open) traffic secret for the given level.
    fn install_read_key(
        &mut self,
        suite: CipherSuite,
        level: TrafficLevel,
        secret: &[u8],
    ) -> Result<()>;

    /// Install the write (seal) traffic secret for the given level.
    fn install_write_key(
        &mut self,
        suite: CipherSuite,
        level: TrafficLevel,
        secret: &[u8],
    ) -> Result<()>;

    /// Drop any write protection, returning to plaintext.
    ///
    /// Needed before the second ClientHello, which may follow 0-RTT
    /// records sent under the early traffic keys.
    fn reset_write_key(&mut self) -> Result<()>;
}

/// The client's ephemeral key-share material.
pub struct KeyShareKeys {
    /// Key exchange group
    pub group: KeyExchangeAlgorithm,

    /// Our ephemeral private key
    pub private_key: PrivateKey,

    /// Our public key as sent on the wire
    pub public_key: Vec<u8>,
}

impl core::fmt::Debug for KeyShareKeys {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("KeyShareKeys")
            .field("group", &self.group)
            .finish_non_exhaustive()
    }
}

/// Parameters of the ClientHello the external builder already sent.
///
/// The core does not build the first ClientHello; it receives the framed
/// bytes (for the transcript) plus the offer state it must track.
#[derive(Debug)]
pub struct ClientHelloOffer {
    /// The complete framed ClientHello as transmitted
    pub encoded: Vec<u8>,

    /// The ephemeral key share offered
    pub key_share: KeyShareKeys,

    /// Session offered for PSK resumption, if any
    pub session: Option<Session>,

    /// Whether 0-RTT early data was offered
    pub early_data_offered: bool,
}

/// A re-serialized second ClientHello, produced after HelloRetryRequest.
#[derive(Debug)]
pub struct SecondClientHello {
    /// The ClientHello body (without handshake framing)
    pub payload: Vec<u8>,

    /// The fresh key share the builder generated for the retry group
    pub key_share: KeyShareKeys,
}

/// Re-serializes the ClientHello for the retry flight.
pub trait ClientHelloBuilder {
    /// Build the second ClientHello for `group`, echoing `cookie` if the
    /// server supplied one.
    fn build_retry_hello(
        &mut self,
        group: KeyExchangeAlgorithm,
        cookie: Option<&[u8]>,
    ) -> Result<SecondClientHello>;
}

/// Outcome of a possibly-asynchronous verification step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Verification succeeded.
    Valid,

    /// Verification failed; the handshake must abort.
    Invalid,

    /// The result is not ready yet; re-enter later.
    Retry,
}

/// Certificate chain and CertificateVerify validation.
///
/// Chain parsing and X.509 semantics live behind this interface. Both
/// methods may be called again after a `Retry`; implementations must make
/// re-entry idempotent (e.g. by caching the eventual result).
pub trait CertificateVerifier {
    /// Validate the peer's certificate chain (leaf first, raw DER).
    fn verify_chain(&mut self, chain: &[Vec<u8>]) -> VerifyOutcome;

    /// Verify the peer's CertificateVerify signature over `message`.
    fn verify_signature(
        &mut self,
        chain: &[Vec<u8>],
        scheme: SignatureScheme,
        message: &[u8],
        signature: &[u8],
    ) -> VerifyOutcome;
}

/// Outcome of client certificate selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    /// Use this chain (leaf first, raw DER).
    Certificate(Vec<Vec<u8>>),

    /// No suitable certificate is configured.
    NoCertificate,

    /// Selection is still in progress; re-enter later.
    Retry,

    /// Selection failed outright.
    Failure,
}

/// Client certificate selection callback.
pub trait ClientCredentials {
    /// Pick a certificate chain satisfying the server's request.
    fn select_certificate(&mut self, request: &CertificateRequest) -> SelectOutcome;
}

/// Outcome of a private-key signing operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignOutcome {
    /// The signature is ready.
    Signed {
        /// Scheme actually used (must be one the server offered)
        scheme: SignatureScheme,
        /// Signature bytes
        signature: Vec<u8>,
    },

    /// Signing is still in progress; re-enter later.
    Retry,

    /// Signing failed.
    Failure,
}

/// Private-key signer for the client CertificateVerify.
pub trait PrivateKeySigner {
    /// Sign `message` with one of the offered schemes.
    fn sign(&mut self, schemes: &[SignatureScheme], message: &[u8]) -> SignOutcome;
}

/// Outcome of an identity-assertion lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssertOutcome {
    /// The assertion payload is ready.
    Assertion(Vec<u8>),

    /// The lookup is still in progress; re-enter later.
    Retry,

    /// The lookup failed.
    Failure,
}

/// Channel-binding identity assertion provider.
pub trait IdentityAssertor {
    /// Produce the assertion bound to the current transcript hash.
    fn assert_identity(&mut self, transcript_hash: &[u8]) -> AssertOutcome;
}

/// Everything a `drive` call needs from the outside world.
pub struct Collaborators<'a> {
    /// Cryptographic provider
    pub provider: &'a dyn palisade_crypto::CryptoProvider,

    /// Incoming message source
    pub source: &'a mut dyn MessageSource,

    /// Outgoing message sink
    pub sink: &'a mut dyn MessageSink,

    /// Record-layer key installation
    pub keys: &'a mut dyn KeyInstaller,

    /// Second-ClientHello builder
    pub hello: &'a mut dyn ClientHelloBuilder,

    /// Certificate verifier
    pub verifier: &'a mut dyn CertificateVerifier,

    /// Client certificate selection
    pub credentials: &'a mut dyn ClientCredentials,

    /// Private-key signer
    pub signer: &'a mut dyn PrivateKeySigner,

    /// Identity assertor; `None` if channel binding is not configured
    pub assertor: Option<&'a mut dyn IdentityAssertor>,
}

impl core::fmt::Debug for Collaborators<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
