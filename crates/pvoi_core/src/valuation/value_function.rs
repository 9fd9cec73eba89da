//! Team-performance value functions
//!
//! A value function maps a coalition of players to one real number. The
//! empty coalition must be well-defined (0 for everything shipped here).
//! Required stat keys are validated here, at the value-function boundary,
//! not at ingestion — records carry an open stat map by design.

use crate::error::Result;
use crate::store::{stat_keys, PlayerRecord};

pub trait ValueFunction: Send + Sync {
    /// Stable identifier recorded in valuation results.
    fn id(&self) -> &str;

    /// Team value attributable to exactly these players. Pure: same
    /// members, same number. Must be finite.
    fn value(&self, members: &[&PlayerRecord]) -> Result<f64>;
}

/// Weighted sum of per-player statistics, e.g. goals + 0.7·assists.
pub struct StatWeightedValue {
    id: String,
    weights: Vec<(String, f64)>,
}

impl StatWeightedValue {
    pub fn new(id: impl Into<String>, weights: Vec<(String, f64)>) -> Self {
        Self { id: id.into(), weights }
    }

    /// Attacking output: goals plus discounted assists.
    pub fn goal_based() -> Self {
        Self::new(
            "goal_based",
            vec![(stat_keys::GOALS.to_string(), 1.0), (stat_keys::ASSISTS.to_string(), 0.7)],
        )
    }

    /// Defensive actions: tackles and interceptions.
    pub fn defensive() -> Self {
        Self::new(
            "defensive",
            vec![
                (stat_keys::TACKLES.to_string(), 1.0),
                (stat_keys::INTERCEPTIONS.to_string(), 1.0),
            ],
        )
    }
}

impl ValueFunction for StatWeightedValue {
    fn id(&self) -> &str {
        &self.id
    }

    fn value(&self, members: &[&PlayerRecord]) -> Result<f64> {
        let mut total = 0.0;
        for record in members {
            for (key, weight) in &self.weights {
                total += record.stat(key) * weight;
            }
        }
        Ok(total)
    }
}

/// Per-90-minute rate of an underlying weighted sum. A coalition with
/// zero total minutes has rate 0, never NaN or infinity.
pub struct Per90Value {
    id: String,
    inner: StatWeightedValue,
}

impl Per90Value {
    pub fn new(inner: StatWeightedValue) -> Self {
        Self { id: format!("{}_per90", inner.id), inner }
    }
}

impl ValueFunction for Per90Value {
    fn id(&self) -> &str {
        &self.id
    }

    fn value(&self, members: &[&PlayerRecord]) -> Result<f64> {
        let minutes: f64 = members.iter().map(|r| r.stat(stat_keys::MINUTES)).sum();
        if minutes <= 0.0 {
            return Ok(0.0);
        }
        Ok(self.inner.value(members)? * 90.0 / minutes)
    }
}

/// Weighted blend of other value functions, e.g. 0.7·attacking +
/// 0.3·defensive.
pub struct CompositeValue {
    id: String,
    parts: Vec<(Box<dyn ValueFunction>, f64)>,
}

impl CompositeValue {
    pub fn new(id: impl Into<String>, parts: Vec<(Box<dyn ValueFunction>, f64)>) -> Self {
        Self { id: id.into(), parts }
    }
}

impl ValueFunction for CompositeValue {
    fn id(&self) -> &str {
        &self.id
    }

    fn value(&self, members: &[&PlayerRecord]) -> Result<f64> {
        let mut total = 0.0;
        for (vf, weight) in &self.parts {
            total += vf.value(members)? * weight;
        }
        Ok(total)
    }
}
