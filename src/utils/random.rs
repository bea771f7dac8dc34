use crate::domain::model::MemberId;
use crate::domain::ports::RandomSource;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// `RandomSource` backed by any `rand` generator.
///
/// Production runs use [`RngSource::from_entropy`]; tests and `--seed` runs
/// use [`RngSource::seeded`] so every round is reproducible.
#[derive(Debug, Clone)]
pub struct RngSource<R> {
    rng: R,
}

impl RngSource<StdRng> {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl RngSource<ChaCha8Rng> {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn shuffle(&mut self, ids: &mut [MemberId]) {
        ids.shuffle(&mut self.rng);
    }

    fn uniform_index(&mut self, upper: usize) -> usize {
        if upper == 0 {
            return 0;
        }
        self.rng.gen_range(0..upper)
    }
}

/// 有 seed 用 ChaCha（可重現），否則用系統熵
pub fn random_source(seed: Option<u64>) -> Box<dyn RandomSource + Send> {
    match seed {
        Some(seed) => {
            tracing::debug!("Using seeded random source (seed = {})", seed);
            Box::new(RngSource::seeded(seed))
        }
        None => Box::new(RngSource::from_entropy()),
    }
}
