//! Model-based attribution
//!
//! Fits a ridge-regularized linear model mapping coalition indicator
//! vectors to value-function output on sampled coalitions, then reads
//! per-player contributions off the coefficients. For a linear model the
//! coefficient is the additive local attribution of its feature, so this
//! recovers additive value functions exactly and approximates
//! interaction-heavy ones. Trades exactness for scalability: one fit
//! costs `samples` evaluations however large the squad.

use nalgebra::{DMatrix, DVector};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::error::{CoreError, Result};
use crate::store::PlayerRecord;
use crate::valuation::evaluator::Evaluator;
use crate::valuation::{PlayerPhi, ShapleyStrategy, StrategyKind};

pub(crate) struct ModelBasedStrategy {
    pub(crate) samples: usize,
    pub(crate) seed: Option<u64>,
    pub(crate) ridge: f64,
}

impl ShapleyStrategy for ModelBasedStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ModelBased
    }

    fn run(&self, eval: &Evaluator<'_>) -> Result<Vec<PlayerPhi>> {
        let n = eval.len();
        // Need at least as many rows as coefficients for a stable fit
        let samples = self.samples.max(n + 2);
        let seed = self.seed.unwrap_or_else(rand::random);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        debug!(players = n, samples, seed, "fitting coalition model");

        // Design matrix: intercept column + one indicator per player.
        // The empty and grand coalitions are always in the sample so the
        // fit is anchored at both ends of the lattice.
        let mut rows: Vec<Vec<f64>> = Vec::with_capacity(samples);
        let mut targets: Vec<f64> = Vec::with_capacity(samples);
        let mut members: Vec<&PlayerRecord> = Vec::with_capacity(n);

        for s in 0..samples {
            members.clear();
            let mut row = vec![0.0; n + 1];
            row[0] = 1.0;
            for (i, record) in eval.players().iter().enumerate() {
                let included = match s {
                    0 => false,
                    1 => true,
                    _ => rng.gen_bool(0.5),
                };
                if included {
                    row[i + 1] = 1.0;
                    members.push(record);
                }
            }
            targets.push(eval.value_of(&members)?);
            rows.push(row);
        }

        let x = DMatrix::from_fn(samples, n + 1, |r, c| rows[r][c]);
        let y = DVector::from_vec(targets);

        // Normal equations with ridge; the regularizer keeps the system
        // positive definite even when sampled rows repeat.
        let ridge = self.ridge.max(1e-9);
        let xtx = x.transpose() * &x + DMatrix::identity(n + 1, n + 1) * ridge;
        let xty = x.transpose() * y;
        let beta = xtx.lu().solve(&xty).ok_or_else(|| CoreError::Valuation {
            // failure of the fit as a whole, not of one coalition
            coalition: "<model fit>".to_string(),
            reason: "coalition model fit produced a singular system".to_string(),
        })?;

        // Efficiency normalization: shift coefficients so Σφ recovers
        // v(N) − v(∅) exactly.
        let target_total = eval.grand_value()? - eval.empty_value();
        let raw_total: f64 = (0..n).map(|i| beta[i + 1]).sum();
        let shift = (target_total - raw_total) / n as f64;

        Ok((0..n)
            .map(|index| PlayerPhi {
                index,
                phi: beta[index + 1] + shift,
                std_error: None,
                iterations: samples,
            })
            .collect())
    }
}
