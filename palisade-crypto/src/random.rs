//! Random number generation interface.

use crate::Result;

/// Cryptographically secure random number generator.
pub trait Random: Send + Sync {
    /// Fill the buffer with random bytes.
    fn fill(&self, dest: &mut [u8]) -> Result<()>;

    /// Generate `len` random bytes.
    fn generate(&self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.fill(&mut buf)?;
        Ok(buf)
    }
}
