//! Exact Shapley enumeration
//!
//! Evaluates every coalition once into a 2^n memo table, then sweeps the
//! subset lattice accumulating weighted marginal contributions. Cost is
//! O(2^n·n); the valuator enforces the squad ceiling before we get here.

use crate::error::Result;
use crate::valuation::evaluator::Evaluator;
use crate::valuation::{PlayerPhi, ShapleyStrategy, StrategyKind};

pub(crate) struct ExactStrategy;

impl ShapleyStrategy for ExactStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Exact
    }

    fn run(&self, eval: &Evaluator<'_>) -> Result<Vec<PlayerPhi>> {
        let n = eval.len();
        let coalition_count = 1usize << n;

        // Every v(S) exactly once; masks index the memo directly
        let mut values = Vec::with_capacity(coalition_count);
        for mask in 0..coalition_count {
            values.push(eval.value_of_mask(mask as u64)?);
        }

        let mut factorial = vec![1.0f64; n + 1];
        for k in 1..=n {
            factorial[k] = factorial[k - 1] * k as f64;
        }

        let mut phis = vec![0.0f64; n];
        for mask in 0..coalition_count {
            let s = (mask as u64).count_ones() as usize;
            if s == n {
                continue;
            }
            // |S|!·(n−|S|−1)!/n!
            let weight = factorial[s] * factorial[n - s - 1] / factorial[n];
            for (i, phi) in phis.iter_mut().enumerate() {
                if mask & (1 << i) == 0 {
                    *phi += weight * (values[mask | (1 << i)] - values[mask]);
                }
            }
        }

        Ok(phis
            .into_iter()
            .enumerate()
            .map(|(index, phi)| PlayerPhi {
                index,
                phi,
                std_error: None,
                iterations: coalition_count,
            })
            .collect())
    }
}
