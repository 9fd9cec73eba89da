//! Shared coalition evaluation for all strategies
//!
//! Owns the one-time cached v(∅) and the failure policy: a value
//! function that errors or returns a non-finite number aborts the run
//! with the offending coalition named.

use crate::error::{CoreError, Result};
use crate::store::PlayerRecord;
use crate::valuation::ValueFunction;

pub(crate) struct Evaluator<'a> {
    players: &'a [PlayerRecord],
    vf: &'a dyn ValueFunction,
    empty_value: f64,
}

impl<'a> Evaluator<'a> {
    /// Evaluates v(∅) exactly once up front; every later empty-coalition
    /// lookup reuses the cached value.
    pub(crate) fn new(players: &'a [PlayerRecord], vf: &'a dyn ValueFunction) -> Result<Self> {
        let empty_value = check(vf.value(&[]), &[])?;
        Ok(Self { players, vf, empty_value })
    }

    pub(crate) fn players(&self) -> &'a [PlayerRecord] {
        self.players
    }

    pub(crate) fn len(&self) -> usize {
        self.players.len()
    }

    pub(crate) fn empty_value(&self) -> f64 {
        self.empty_value
    }

    pub(crate) fn value_of(&self, members: &[&PlayerRecord]) -> Result<f64> {
        if members.is_empty() {
            return Ok(self.empty_value);
        }
        check(self.vf.value(members), members)
    }

    /// Coalition by bitmask over player indices (exact strategy).
    pub(crate) fn value_of_mask(&self, mask: u64) -> Result<f64> {
        if mask == 0 {
            return Ok(self.empty_value);
        }
        let members: Vec<&PlayerRecord> = (0..self.players.len())
            .filter(|i| mask & (1u64 << i) != 0)
            .map(|i| &self.players[i])
            .collect();
        self.value_of(&members)
    }

    /// v(N) over the whole squad.
    pub(crate) fn grand_value(&self) -> Result<f64> {
        let members: Vec<&PlayerRecord> = self.players.iter().collect();
        self.value_of(&members)
    }
}

fn check(value: Result<f64>, members: &[&PlayerRecord]) -> Result<f64> {
    let coalition =
        || crate::valuation::Coalition::from_ids(members.iter().map(|r| r.id.clone())).to_string();
    match value {
        Ok(v) if v.is_finite() => Ok(v),
        Ok(v) => Err(CoreError::Valuation {
            coalition: coalition(),
            reason: format!("returned non-numeric value {v}"),
        }),
        Err(CoreError::Valuation { coalition, reason }) => {
            Err(CoreError::Valuation { coalition, reason })
        }
        Err(err) => Err(CoreError::Valuation { coalition: coalition(), reason: err.to_string() }),
    }
}
