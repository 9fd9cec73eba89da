//! PVOI — Shapley-based player valuation
//!
//! Estimates each player's fair marginal contribution φᵢ to a team value
//! function: the weighted average of `v(S ∪ {i}) − v(S)` over coalitions
//! S not containing i, weighted `|S|!·(|N|−|S|−1)!/|N|!`.
//!
//! Three interchangeable strategies sit behind [`ShapleyStrategy`]:
//! exact subset enumeration (small squads), Monte Carlo permutation
//! sampling (any squad, unbiased, O(1/√iterations) accuracy), and a
//! model-based linear attribution (scalable, approximate).

mod evaluator;
mod exact;
mod model;
mod monte_carlo;
mod value_function;

pub use value_function::{CompositeValue, Per90Value, StatWeightedValue, ValueFunction};

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ShapleyConfig;
use crate::error::{CoreError, Result};
use crate::store::{PlayerId, PlayerRecord};

use evaluator::Evaluator;
use exact::ExactStrategy;
use model::ModelBasedStrategy;
use monte_carlo::MonteCarloStrategy;

/// A duplicate-free set of player ids, used for reporting which coalition
/// a value function choked on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Coalition(pub std::collections::BTreeSet<PlayerId>);

impl Coalition {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_ids<I: IntoIterator<Item = PlayerId>>(ids: I) -> Self {
        Self(ids.into_iter().collect())
    }
}

impl std::fmt::Display for Coalition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for id in &self.0 {
            if !first {
                f.write_str(",")?;
            }
            f.write_str(id.as_str())?;
            first = false;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Exact,
    MonteCarlo,
    ModelBased,
}

/// Per-player valuation outcome. Immutable once produced.
#[derive(Debug, Clone, Serialize)]
pub struct ShapleyResult {
    pub player_id: PlayerId,
    /// Estimated marginal contribution φ
    pub phi: f64,
    /// Standard error of the estimate (Monte Carlo only)
    pub std_error: Option<f64>,
    pub method: StrategyKind,
    pub iterations: usize,
    pub value_function: String,
}

/// One full valuation run over a squad.
#[derive(Debug, Clone, Serialize)]
pub struct PvoiReport {
    pub results: BTreeMap<PlayerId, ShapleyResult>,
    pub method: StrategyKind,
    pub value_function: String,
    pub computed_at: DateTime<Utc>,
    /// v(N) − v(∅), the quantity Σφᵢ should (approximately) recover
    pub total_value: f64,
}

impl PvoiReport {
    pub fn phi(&self, id: &PlayerId) -> Option<f64> {
        self.results.get(id).map(|r| r.phi)
    }

    /// |Σφᵢ − (v(N) − v(∅))|. Zero (to float tolerance) for Exact;
    /// a sampling-noise-sized gap for Monte Carlo. Larger gaps indicate a
    /// bug or a badly mis-specified model fit.
    pub fn efficiency_gap(&self) -> f64 {
        let sum: f64 = self.results.values().map(|r| r.phi).sum();
        (sum - self.total_value).abs()
    }
}

/// Per-player accumulation handed back by a strategy run.
pub(crate) struct PlayerPhi {
    pub(crate) index: usize,
    pub(crate) phi: f64,
    pub(crate) std_error: Option<f64>,
    pub(crate) iterations: usize,
}

/// One computation strategy. Implementations see the squad only through
/// the [`Evaluator`], which owns the cached v(∅) and converts value
/// function failures into [`CoreError::Valuation`].
pub(crate) trait ShapleyStrategy {
    fn kind(&self) -> StrategyKind;
    fn run(&self, eval: &Evaluator<'_>) -> Result<Vec<PlayerPhi>>;
}

/// PVOI engine: strategy selection plus report assembly.
#[derive(Debug, Clone)]
pub struct ShapleyValuator {
    config: ShapleyConfig,
}

impl Default for ShapleyValuator {
    fn default() -> Self {
        Self::new(ShapleyConfig::default())
    }
}

impl ShapleyValuator {
    pub fn new(config: ShapleyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ShapleyConfig {
        &self.config
    }

    /// Value every player in `players` against `value_function`.
    ///
    /// Exact refuses squads above the configured ceiling with
    /// [`CoreError::StrategyUnavailable`] rather than running for hours.
    /// A value-function failure aborts the whole run: substituting zero
    /// for a broken coalition would corrupt every other player's estimate.
    pub fn compute(
        &self,
        players: &[PlayerRecord],
        value_function: &dyn ValueFunction,
        strategy: StrategyKind,
    ) -> Result<PvoiReport> {
        let strategy: Box<dyn ShapleyStrategy> = match strategy {
            StrategyKind::Exact => {
                // Exact enumeration is bitmask-based; the ceiling also
                // protects the u64 representation.
                let ceiling = self.config.exact_ceiling.min(62);
                if players.len() > ceiling {
                    return Err(CoreError::StrategyUnavailable {
                        players: players.len(),
                        ceiling,
                    });
                }
                Box::new(ExactStrategy)
            }
            StrategyKind::MonteCarlo => Box::new(MonteCarloStrategy {
                iterations: self.config.iterations,
                seed: self.config.seed,
            }),
            StrategyKind::ModelBased => Box::new(ModelBasedStrategy {
                samples: self.config.model_samples,
                seed: self.config.seed,
                ridge: self.config.model_ridge,
            }),
        };

        if players.is_empty() {
            return Ok(PvoiReport {
                results: BTreeMap::new(),
                method: strategy.kind(),
                value_function: value_function.id().to_string(),
                computed_at: Utc::now(),
                total_value: 0.0,
            });
        }

        let eval = Evaluator::new(players, value_function)?;
        let phis = strategy.run(&eval)?;
        let total_value = eval.grand_value()? - eval.empty_value();

        info!(
            players = players.len(),
            method = ?strategy.kind(),
            value_function = value_function.id(),
            "pvoi run complete"
        );

        let method = strategy.kind();
        let results = phis
            .into_iter()
            .map(|p| {
                let id = players[p.index].id.clone();
                let result = ShapleyResult {
                    player_id: id.clone(),
                    phi: p.phi,
                    std_error: p.std_error,
                    method,
                    iterations: p.iterations,
                    value_function: value_function.id().to_string(),
                };
                (id, result)
            })
            .collect();

        Ok(PvoiReport {
            results,
            method,
            value_function: value_function.id().to_string(),
            computed_at: Utc::now(),
            total_value,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn empty_squad_yields_empty_report() {
        let valuator = ShapleyValuator::default();
        let report = valuator.compute(&[], &AdditiveValue, StrategyKind::Exact).unwrap();
        assert!(report.results.is_empty());
        assert_eq!(report.total_value, 0.0);
        assert_eq!(report.efficiency_gap(), 0.0);
    }

    #[test]
    fn exact_refuses_oversized_squads() {
        use crate::store::Position;
        let players: Vec<PlayerRecord> = (0..16)
            .map(|i| {
                PlayerRecord::new(format!("p{i}"), "x", Position::Unknown)
                    .with_stat("contribution", 1.0)
            })
            .collect();
        let valuator =
            ShapleyValuator::new(ShapleyConfig { exact_ceiling: 8, ..ShapleyConfig::default() });
        let err = valuator.compute(&players, &AdditiveValue, StrategyKind::Exact);
        assert!(matches!(
            err,
            Err(CoreError::StrategyUnavailable { players: 16, ceiling: 8 })
        ));
    }

    #[test]
    fn end_to_end_additive_scenario() {
        // c₁=10, c₂=5, c₃=0 → Exact must yield exactly (10, 5, 0) and
        // Σφ = 15 = v({1,2,3}) − v(∅)
        let players = squad(&[("p1", 10.0), ("p2", 5.0), ("p3", 0.0)]);
        let valuator = ShapleyValuator::default();
        let report = valuator.compute(&players, &AdditiveValue, StrategyKind::Exact).unwrap();
        assert_eq!(report.phi(&"p1".into()), Some(10.0));
        assert_eq!(report.phi(&"p2".into()), Some(5.0));
        assert_eq!(report.phi(&"p3".into()), Some(0.0));
        assert_eq!(report.total_value, 15.0);
        assert!(report.efficiency_gap() < 1e-12);
        assert_eq!(report.method, StrategyKind::Exact);
    }

    #[test]
    fn valuation_error_names_offending_coalition() {
        struct Broken;
        impl ValueFunction for Broken {
            fn id(&self) -> &str {
                "broken"
            }
            fn value(&self, members: &[&PlayerRecord]) -> Result<f64> {
                if members.len() == 2 {
                    Ok(f64::NAN)
                } else {
                    Ok(members.len() as f64)
                }
            }
        }
        let players = squad(&[("a", 1.0), ("b", 1.0), ("c", 1.0)]);
        let err = ShapleyValuator::default().compute(&players, &Broken, StrategyKind::Exact);
        match err {
            Err(CoreError::Valuation { coalition, .. }) => {
                assert_eq!(coalition.split(',').count(), 2);
            }
            other => panic!("expected Valuation error, got {other:?}"),
        }
    }
}
