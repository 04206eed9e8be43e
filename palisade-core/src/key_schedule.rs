//! TLS 1.3 Key Schedule (RFC 8446 Section 7.1).
//!
//! A single running secret advances along a forward-only ladder:
//!
//! ```text
//!              0
//!              |
//!              v
//!   PSK ->  HKDF-Extract = Early Secret
//!              |
//!              +-----> Derive-Secret(., "c e traffic", ClientHello)
//!              v
//!        Derive-Secret(., "derived", "")
//!              |
//!              v
//!   (EC)DHE -> HKDF-Extract = Handshake Secret
//!              |
//!              +-----> Derive-Secret(., "c hs traffic", CH..SH)
//!              +-----> Derive-Secret(., "s hs traffic", CH..SH)
//!              v
//!        Derive-Secret(., "derived", "")
//!              |
//!              v
//!   0 -> HKDF-Extract = Master Secret
//!              |
//!              +-----> Derive-Secret(., "c ap traffic", CH..server Finished)
//!              +-----> Derive-Secret(., "s ap traffic", CH..server Finished)
//!              +-----> Derive-Secret(., "exp master",   CH..server Finished)
//!              +-----> Derive-Secret(., "res master",   CH..client Finished)
//! ```
//!
//! Each [`advance`](KeySchedule::advance) folds the next input (PSK or
//! zeros, then the DHE shared secret, then zeros) and moves one rung up.
//! Advancing past the master secret is a programming-contract violation,
//! not a protocol error.

use crate::cipher::CipherSuite;
use crate::error::{Error, Result};
use crate::transcript::hkdf_expand_label;
use palisade_crypto::{CryptoProvider, HashAlgorithm};
use zeroize::Zeroizing;

/// Position of the running secret on the ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum KeyScheduleStage {
    /// No input folded yet; the running secret is all zeros.
    Initial,
    /// Early secret (PSK or zeros folded).
    EarlySecret,
    /// Handshake secret (DHE folded).
    HandshakeSecret,
    /// Master secret (final zeros folded). Terminal.
    MasterSecret,
}

/// TLS 1.3 key schedule.
///
/// Construction requires the negotiated cipher suite so the hash length is
/// fixed before any secret is derived.
pub struct KeySchedule {
    /// Hash algorithm for this cipher suite
    hash_algorithm: HashAlgorithm,

    /// Hash length in bytes
    hash_len: usize,

    /// Ladder position
    stage: KeyScheduleStage,

    /// The running secret
    secret: Zeroizing<Vec<u8>>,

    /// Client early traffic secret (for 0-RTT)
    client_early_traffic_secret: Option<Zeroizing<Vec<u8>>>,

    /// Client handshake traffic secret
    client_handshake_traffic_secret: Option<Zeroizing<Vec<u8>>>,

    /// Server handshake traffic secret
    server_handshake_traffic_secret: Option<Zeroizing<Vec<u8>>>,

    /// Client application traffic secret
    client_application_traffic_secret: Option<Zeroizing<Vec<u8>>>,

    /// Server application traffic secret
    server_application_traffic_secret: Option<Zeroizing<Vec<u8>>>,
}

impl core::fmt::Debug for KeySchedule {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("KeySchedule")
            .field("hash_algorithm", &self.hash_algorithm)
            .field("stage", &self.stage)
            .finish_non_exhaustive()
    }
}

impl KeySchedule {
    /// Create a new key schedule for the given cipher suite.
    pub fn new(cipher_suite: CipherSuite) -> Self {
        let hash_algorithm = cipher_suite.hash_algorithm();
        let hash_len = hash_algorithm.output_size();
        Self {
            hash_algorithm,
            hash_len,
            stage: KeyScheduleStage::Initial,
            secret: Zeroizing::new(vec![0u8; hash_len]),
            client_early_traffic_secret: None,
            client_handshake_traffic_secret: None,
            server_handshake_traffic_secret: None,
            client_application_traffic_secret: None,
            server_application_traffic_secret: None,
        }
    }

    /// Get the current ladder position.
    pub fn stage(&self) -> KeyScheduleStage {
        self.stage
    }

    /// Get the hash algorithm in use.
    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.hash_algorithm
    }

    /// Get the hash length in bytes.
    pub fn hash_len(&self) -> usize {
        self.hash_len
    }

    /// Fold the next input into the running secret and move one rung up.
    ///
    /// The inputs, in ladder order: the PSK (or `hash_len` zeros) for the
    /// early secret, the DHE shared secret for the handshake secret, and
    /// `hash_len` zeros for the master secret.
    ///
    /// # Errors
    ///
    /// Advancing past the master secret returns [`Error::Internal`]: the
    /// ladder is strictly forward within one handshake.
    pub fn advance(&mut self, provider: &dyn CryptoProvider, ikm: &[u8]) -> Result<()> {
        let kdf = provider.kdf(self.hash_algorithm.to_kdf_algorithm())?;

        let salt = match self.stage {
            // Early Secret = HKDF-Extract(salt=0, IKM=PSK-or-zeros)
            KeyScheduleStage::Initial => self.secret.clone(),
            KeyScheduleStage::EarlySecret | KeyScheduleStage::HandshakeSecret => {
                // Derive-Secret(., "derived", "") feeds the next extract.
                let empty_hash = provider.hash(self.hash_algorithm)?.finalize();
                Zeroizing::new(self.derive_secret(provider, b"derived", &empty_hash)?)
            }
            KeyScheduleStage::MasterSecret => {
                return Err(Error::Internal(
                    "key schedule already advanced to master secret".into(),
                ));
            }
        };

        self.secret = Zeroizing::new(kdf.extract(&salt, ikm));
        self.stage = match self.stage {
            KeyScheduleStage::Initial => KeyScheduleStage::EarlySecret,
            KeyScheduleStage::EarlySecret => KeyScheduleStage::HandshakeSecret,
            KeyScheduleStage::HandshakeSecret => KeyScheduleStage::MasterSecret,
            KeyScheduleStage::MasterSecret => unreachable!(),
        };
        Ok(())
    }

    /// Derive-Secret(running secret, label, transcript hash).
    fn derive_secret(
        &self,
        provider: &dyn CryptoProvider,
        label: &[u8],
        transcript_hash: &[u8],
    ) -> Result<Vec<u8>> {
        hkdf_expand_label(
            provider,
            self.hash_algorithm,
            &self.secret,
            label,
            transcript_hash,
            self.hash_len,
        )
    }

    fn require_stage(&self, stage: KeyScheduleStage, what: &str) -> Result<()> {
        if self.stage != stage {
            return Err(Error::Internal(format!(
                "{} requires the {:?} stage, key schedule is at {:?}",
                what, stage, self.stage
            )));
        }
        Ok(())
    }

    /// Derive the client early traffic secret (0-RTT).
    ///
    /// `transcript_hash` is the hash of the ClientHello alone.
    pub fn derive_client_early_traffic_secret(
        &mut self,
        provider: &dyn CryptoProvider,
        transcript_hash: &[u8],
    ) -> Result<Vec<u8>> {
        self.require_stage(KeyScheduleStage::EarlySecret, "early traffic secret")?;
        let secret = self.derive_secret(provider, b"c e traffic", transcript_hash)?;
        self.client_early_traffic_secret = Some(Zeroizing::new(secret.clone()));
        Ok(secret)
    }

    /// Derive the client handshake traffic secret.
    ///
    /// `transcript_hash` is the hash through ServerHello.
    pub fn derive_client_handshake_traffic_secret(
        &mut self,
        provider: &dyn CryptoProvider,
        transcript_hash: &[u8],
    ) -> Result<Vec<u8>> {
        self.require_stage(KeyScheduleStage::HandshakeSecret, "handshake traffic secret")?;
        let secret = self.derive_secret(provider, b"c hs traffic", transcript_hash)?;
        self.client_handshake_traffic_secret = Some(Zeroizing::new(secret.clone()));
        Ok(secret)
    }

    /// Derive the server handshake traffic secret.
    pub fn derive_server_handshake_traffic_secret(
        &mut self,
        provider: &dyn CryptoProvider,
        transcript_hash: &[u8],
    ) -> Result<Vec<u8>> {
        self.require_stage(KeyScheduleStage::HandshakeSecret, "handshake traffic secret")?;
        let secret = self.derive_secret(provider, b"s hs traffic", transcript_hash)?;
        self.server_handshake_traffic_secret = Some(Zeroizing::new(secret.clone()));
        Ok(secret)
    }

    /// Derive the client application traffic secret.
    ///
    /// `transcript_hash` is the hash through the server Finished.
    pub fn derive_client_application_traffic_secret(
        &mut self,
        provider: &dyn CryptoProvider,
        transcript_hash: &[u8],
    ) -> Result<Vec<u8>> {
        self.require_stage(KeyScheduleStage::MasterSecret, "application traffic secret")?;
        let secret = self.derive_secret(provider, b"c ap traffic", transcript_hash)?;
        self.client_application_traffic_secret = Some(Zeroizing::new(secret.clone()));
        Ok(secret)
    }

    /// Derive the server application traffic secret.
    pub fn derive_server_application_traffic_secret(
        &mut self,
        provider: &dyn CryptoProvider,
        transcript_hash: &[u8],
    ) -> Result<Vec<u8>> {
        self.require_stage(KeyScheduleStage::MasterSecret, "application traffic secret")?;
        let secret = self.derive_secret(provider, b"s ap traffic", transcript_hash)?;
        self.server_application_traffic_secret = Some(Zeroizing::new(secret.clone()));
        Ok(secret)
    }

    /// Derive the resumption master secret.
    ///
    /// `transcript_hash` is the hash through the client Finished.
    pub fn derive_resumption_master_secret(
        &self,
        provider: &dyn CryptoProvider,
        transcript_hash: &[u8],
    ) -> Result<Vec<u8>> {
        self.require_stage(KeyScheduleStage::MasterSecret, "resumption master secret")?;
        self.derive_secret(provider, b"res master", transcript_hash)
    }

    /// Derive the exporter master secret.
    pub fn derive_exporter_master_secret(
        &self,
        provider: &dyn CryptoProvider,
        transcript_hash: &[u8],
    ) -> Result<Vec<u8>> {
        self.require_stage(KeyScheduleStage::MasterSecret, "exporter master secret")?;
        self.derive_secret(provider, b"exp master", transcript_hash)
    }

    /// Get the client early traffic secret.
    pub fn client_early_traffic_secret(&self) -> Option<&[u8]> {
        self.client_early_traffic_secret.as_deref().map(Vec::as_slice)
    }

    /// Get the client handshake traffic secret.
    pub fn client_handshake_traffic_secret(&self) -> Option<&[u8]> {
        self.client_handshake_traffic_secret.as_deref().map(Vec::as_slice)
    }

    /// Get the server handshake traffic secret.
    pub fn server_handshake_traffic_secret(&self) -> Option<&[u8]> {
        self.server_handshake_traffic_secret.as_deref().map(Vec::as_slice)
    }

    /// Get the client application traffic secret.
    pub fn client_application_traffic_secret(&self) -> Option<&[u8]> {
        self.client_application_traffic_secret.as_deref().map(Vec::as_slice)
    }

    /// Get the server application traffic secret.
    pub fn server_application_traffic_secret(&self) -> Option<&[u8]> {
        self.server_application_traffic_secret.as_deref().map(Vec::as_slice)
    }
}
