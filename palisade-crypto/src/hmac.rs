//! HMAC interface.

use crate::hash::HashAlgorithm;

/// Keyed HMAC trait.
///
/// Instances are created keyed via [`CryptoProvider::hmac`](crate::CryptoProvider::hmac)
/// and consumed by [`finalize`](Hmac::finalize).
pub trait Hmac: Send {
    /// Update the MAC state with more data.
    fn update(&mut self, data: &[u8]);

    /// Finalize the MAC and return the tag.
    fn finalize(self: Box<Self>) -> Vec<u8>;

    /// Get the output size in bytes.
    fn output_size(&self) -> usize;

    /// Get the underlying hash algorithm.
    fn algorithm(&self) -> HashAlgorithm;
}
