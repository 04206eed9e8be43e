//! Random number generation using the operating system CSPRNG.

use palisade_crypto::{Random, Result};
use rand_core::{OsRng, RngCore};

/// OS-backed random number generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl Random for OsRandom {
    fn fill(&self, dest: &mut [u8]) -> Result<()> {
        OsRng.fill_bytes(dest);
        Ok(())
    }
}
