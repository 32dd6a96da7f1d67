//! Deterministic per-trial random streams.
//!
//! A run seed is expanded into one independent stream per trial with
//! HMAC-SHA256, keyed by the run seed and tagged with the trial index. Trials
//! therefore draw the same numbers no matter which worker executes them.
use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;

const TRIAL_DOMAIN: &[u8] = b"voyage-trial";

/// Derives per-trial generators from a single run seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialSeeder {
    run_seed: u64,
}

impl TrialSeeder {
    #[must_use]
    pub const fn new(run_seed: u64) -> Self {
        Self { run_seed }
    }

    /// Seeder backed by operating-system entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    #[must_use]
    pub const fn run_seed(&self) -> u64 {
        self.run_seed
    }

    /// Stream seed for trial `index`.
    #[must_use]
    pub fn trial_seed(&self, index: u32) -> [u8; 32] {
        derive_stream_seed(self.run_seed, TRIAL_DOMAIN, index)
    }

    /// Fresh generator for trial `index`.
    #[must_use]
    pub fn trial_rng(&self, index: u32) -> ChaCha20Rng {
        ChaCha20Rng::from_seed(self.trial_seed(index))
    }
}

fn derive_stream_seed(run_seed: u64, domain_tag: &[u8], index: u32) -> [u8; 32] {
    // HMAC accepts keys of any length, so key setup cannot fail for 8 bytes.
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&run_seed.to_le_bytes()) else {
        return [0; 32];
    };
    mac.update(domain_tag);
    mac.update(&index.to_le_bytes());
    let digest = mac.finalize().into_bytes();
    let mut seed = [0_u8; 32];
    seed.copy_from_slice(&digest[..32]);
    seed
}
