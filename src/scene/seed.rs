use rand::{Rng as _, SeedableRng as _};
use rand_chacha::ChaCha8Rng;
use sha2::Digest as _;

use crate::foundation::error::{SynthError, SynthResult};

/// Seeds are reduced into `[0, SEED_MODULUS)`.
pub const SEED_MODULUS: u64 = 100_000_000;

/// Per-job seed derived from the job identity.
///
/// Not `Clone`: [`JobSeed::into_rng`] consumes it, so a job seeds its generator exactly once.
#[derive(Debug, PartialEq, Eq)]
pub struct JobSeed {
    value: u64,
}

impl JobSeed {
    /// Hash `synth_data:{dataset_index}:{run_pass}:{cut_index}` with SHA-256 and reduce the digest
    /// (big-endian) modulo [`SEED_MODULUS`].
    pub fn derive(dataset_index: usize, run_pass: usize, cut_index: usize) -> Self {
        let key = format!("synth_data:{dataset_index}:{run_pass}:{cut_index}");
        let digest = sha2::Sha256::digest(key.as_bytes());
        let value = digest
            .iter()
            .fold(0u64, |acc, &b| (acc * 256 + u64::from(b)) % SEED_MODULUS);
        Self { value }
    }

    /// Use an explicit seed value (debugging, reproducing a reported job).
    pub fn from_value(value: u64) -> Self {
        Self { value }
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn into_rng(self) -> JobRng {
        tracing::debug!(seed = self.value, "job rng seeded");
        JobRng {
            inner: ChaCha8Rng::seed_from_u64(self.value),
        }
    }
}

/// The job's only source of randomness.
#[derive(Debug)]
pub struct JobRng {
    inner: ChaCha8Rng,
}

impl JobRng {
    /// Uniform in `[0, 1)`.
    pub fn uniform(&mut self) -> f32 {
        self.inner.r#gen::<f32>()
    }

    pub fn normal(&mut self, mean: f32, std_dev: f32) -> SynthResult<f32> {
        let dist = rand_distr::Normal::new(mean, std_dev)
            .map_err(|e| SynthError::validation(format!("normal distribution: {e}")))?;
        Ok(rand_distr::Distribution::sample(&dist, &mut self.inner))
    }

    /// Uniform index into a collection of `len` items.
    pub fn index(&mut self, len: usize) -> SynthResult<usize> {
        if len == 0 {
            return Err(SynthError::validation("cannot choose from an empty list"));
        }
        Ok(self.inner.gen_range(0..len))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/seed.rs"]
mod tests;
