//! Monte Carlo permutation sampling
//!
//! Each round draws a uniform random permutation of the squad and walks
//! it left to right; the marginal `v(S∪{i}) − v(S)` of each player over
//! the players preceding it is one sample of φᵢ. Unbiased, with accuracy
//! improving as O(1/√iterations).
//!
//! Sampling is split into fixed-size batches processed in parallel. Each
//! batch derives its RNG from (seed, batch index), so a seeded run is
//! reproducible regardless of how rayon schedules the batches.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::debug;

use crate::error::Result;
use crate::store::PlayerRecord;
use crate::valuation::evaluator::Evaluator;
use crate::valuation::{PlayerPhi, ShapleyStrategy, StrategyKind};

const BATCH_SIZE: usize = 64;

pub(crate) struct MonteCarloStrategy {
    pub(crate) iterations: usize,
    pub(crate) seed: Option<u64>,
}

struct Batch {
    sum: Vec<f64>,
    sum_sq: Vec<f64>,
}

impl ShapleyStrategy for MonteCarloStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::MonteCarlo
    }

    fn run(&self, eval: &Evaluator<'_>) -> Result<Vec<PlayerPhi>> {
        let n = eval.len();
        let iterations = self.iterations.max(1);
        let base_seed = self.seed.unwrap_or_else(rand::random);
        let batches = iterations.div_ceil(BATCH_SIZE);

        debug!(players = n, iterations, batches, seed = base_seed, "monte carlo sampling");

        let accumulated: Result<Vec<Batch>> = (0..batches)
            .into_par_iter()
            .map(|batch_idx| {
                let mut rng = ChaCha8Rng::seed_from_u64(base_seed.wrapping_add(batch_idx as u64));
                let rounds = BATCH_SIZE.min(iterations - batch_idx * BATCH_SIZE);
                let mut batch = Batch { sum: vec![0.0; n], sum_sq: vec![0.0; n] };
                let mut order: Vec<usize> = (0..n).collect();
                let mut members: Vec<&PlayerRecord> = Vec::with_capacity(n);

                for _ in 0..rounds {
                    order.shuffle(&mut rng);
                    members.clear();
                    let mut previous = eval.empty_value();
                    for &idx in &order {
                        members.push(&eval.players()[idx]);
                        let current = eval.value_of(&members)?;
                        let sample = current - previous;
                        batch.sum[idx] += sample;
                        batch.sum_sq[idx] += sample * sample;
                        previous = current;
                    }
                }
                Ok(batch)
            })
            .collect();

        let mut sum = vec![0.0f64; n];
        let mut sum_sq = vec![0.0f64; n];
        for batch in accumulated? {
            for i in 0..n {
                sum[i] += batch.sum[i];
                sum_sq[i] += batch.sum_sq[i];
            }
        }

        let t = iterations as f64;
        Ok((0..n)
            .map(|index| {
                let mean = sum[index] / t;
                let std_error = if iterations > 1 {
                    let variance = ((sum_sq[index] - t * mean * mean) / (t - 1.0)).max(0.0);
                    Some((variance / t).sqrt())
                } else {
                    None
                };
                PlayerPhi { index, phi: mean, std_error, iterations }
            })
            .collect())
    }
}
