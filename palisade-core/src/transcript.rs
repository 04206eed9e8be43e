//! Transcript hash management.
//!
//! The transcript hash is a running hash of all handshake messages exchanged
//! between client and server, in order, each in its full 4-byte-framed
//! encoding. It binds Finished and CertificateVerify to the exact negotiated
//! content and supplies the derivation context for the key schedule.

use crate::error::{Error, Result};
use palisade_crypto::{CryptoProvider, HashAlgorithm};

/// Running transcript hash.
///
/// Messages are retained and hashed lazily so the hash algorithm can be
/// (re)bound once the cipher suite is actually known: the first ClientHello
/// is folded in before the server has picked a suite.
#[derive(Debug, Clone)]
pub struct TranscriptHash {
    /// Hash algorithm being used
    algorithm: HashAlgorithm,
    /// All messages in order
    messages: Vec<Vec<u8>>,
    /// Cached hash (computed lazily)
    cached_hash: Option<Vec<u8>>,
}

impl TranscriptHash {
    /// Create a new transcript hash with the specified algorithm.
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            messages: Vec::new(),
            cached_hash: None,
        }
    }

    /// Get the hash algorithm being used.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Re-bind the hash algorithm, keeping the retained messages.
    ///
    /// Used once the negotiated cipher suite fixes the PRF hash.
    pub fn set_algorithm(&mut self, algorithm: HashAlgorithm) {
        if self.algorithm != algorithm {
            self.algorithm = algorithm;
            self.cached_hash = None;
        }
    }

    /// Add a framed handshake message to the transcript.
    ///
    /// `message` must be the complete encoding, including the 1-byte type
    /// and 3-byte length header.
    pub fn update(&mut self, message: &[u8]) {
        self.messages.push(message.to_vec());
        self.cached_hash = None;
    }

    /// Compute the current transcript hash.
    pub fn current_hash(&mut self, provider: &dyn CryptoProvider) -> Result<Vec<u8>> {
        if let Some(ref hash) = self.cached_hash {
            return Ok(hash.clone());
        }
        let mut hasher = provider.hash(self.algorithm)?;
        for msg in &self.messages {
            hasher.update(msg);
        }
        let hash = hasher.finalize();
        self.cached_hash = Some(hash.clone());
        Ok(hash)
    }

    /// Get the number of messages in the transcript.
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Check if the transcript is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Compute Finished verify data.
///
/// Per RFC 8446 Section 4.4.4:
/// ```text
/// finished_key = HKDF-Expand-Label(BaseKey, "finished", "", Hash.length)
/// verify_data = HMAC(finished_key, Transcript-Hash(Handshake Context))
/// ```
pub fn compute_verify_data(
    provider: &dyn CryptoProvider,
    algorithm: HashAlgorithm,
    base_key: &[u8],
    transcript_hash: &[u8],
) -> Result<Vec<u8>> {
    let finished_key = hkdf_expand_label(
        provider,
        algorithm,
        base_key,
        b"finished",
        &[],
        algorithm.output_size(),
    )?;
    let mut hmac = provider.hmac(algorithm, &finished_key)?;
    hmac.update(transcript_hash);
    Ok(hmac.finalize())
}

/// Build the content signed by CertificateVerify (RFC 8446 Section 4.4.3).
///
/// 64 spaces, the context string, a zero separator, then the transcript hash.
pub fn signature_content(context: &[u8], transcript_hash: &[u8]) -> Vec<u8> {
    let mut content = Vec::with_capacity(64 + context.len() + 1 + transcript_hash.len());
    content.extend_from_slice(&[0x20u8; 64]);
    content.extend_from_slice(context);
    content.push(0x00);
    content.extend_from_slice(transcript_hash);
    content
}

/// Context string for the server's CertificateVerify.
pub const SERVER_CERTIFICATE_VERIFY_CONTEXT: &[u8] = b"TLS 1.3, server CertificateVerify";

/// Context string for the client's CertificateVerify.
pub const CLIENT_CERTIFICATE_VERIFY_CONTEXT: &[u8] = b"TLS 1.3, client CertificateVerify";

/// HKDF-Expand-Label per RFC 8446 Section 7.1.
///
/// ```text
/// struct {
///     uint16 length = Length;
///     opaque label<7..255> = "tls13 " + Label;
///     opaque context<0..255> = Context;
/// } HkdfLabel;
/// ```
pub fn hkdf_expand_label(
    provider: &dyn CryptoProvider,
    algorithm: HashAlgorithm,
    secret: &[u8],
    label: &[u8],
    context: &[u8],
    length: usize,
) -> Result<Vec<u8>> {
    if length > 0xFFFF {
        return Err(Error::Internal("HKDF output length too large".into()));
    }

    let mut hkdf_label = Vec::with_capacity(4 + 6 + label.len() + context.len());
    hkdf_label.extend_from_slice(&(length as u16).to_be_bytes());
    hkdf_label.push((6 + label.len()) as u8);
    hkdf_label.extend_from_slice(b"tls13 ");
    hkdf_label.extend_from_slice(label);
    hkdf_label.push(context.len() as u8);
    hkdf_label.extend_from_slice(context);

    let kdf = provider.kdf(algorithm.to_kdf_algorithm())?;
    kdf.expand(secret, &hkdf_label, length)
        .map_err(|e| Error::Crypto(format!("HKDF-Expand failed: {}", e)))
}
