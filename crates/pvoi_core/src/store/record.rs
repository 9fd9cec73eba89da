//! Player record types
//!
//! Statistics are an open string→number map rather than a fixed schema:
//! source providers disagree on which stats exist, so unknown keys are
//! preserved opaquely and validated only at the value-function boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Caller-supplied player identifier. Integer ids arrive as their decimal
/// string form through the JSON layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Position {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
    #[default]
    Unknown,
}

impl Position {
    /// Lenient parse used at ingestion; anything unrecognized maps to
    /// Unknown instead of failing the whole record.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "goalkeeper" | "gk" => Position::Goalkeeper,
            "defender" | "df" | "cb" | "lb" | "rb" => Position::Defender,
            "midfielder" | "mf" | "cm" | "dm" | "am" => Position::Midfielder,
            "forward" | "fw" | "st" | "cf" | "lw" | "rw" => Position::Forward,
            _ => Position::Unknown,
        }
    }
}

/// Well-known statistic keys. The stats map stays open; these exist so
/// value functions and callers don't scatter string literals.
pub mod stat_keys {
    pub const GOALS: &str = "goals";
    pub const ASSISTS: &str = "assists";
    pub const MINUTES: &str = "minutes";
    pub const SHOTS: &str = "shots";
    pub const PASSES: &str = "passes";
    pub const TACKLES: &str = "tackles";
    pub const INTERCEPTIONS: &str = "interceptions";
    pub const CARDS: &str = "cards";
    pub const RATING: &str = "rating";
}

/// Canonical player record, owned exclusively by the store. Identity
/// fields (id, name) are immutable after creation; stats mutate as match
/// data arrives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerRecord {
    pub id: PlayerId,
    pub name: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub stats: HashMap<String, f64>,
    /// Soft-deactivation flag; records are never hard-deleted so that
    /// valuation history stays reproducible.
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl PlayerRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>, position: Position) -> Self {
        Self {
            id: PlayerId::new(id),
            name: name.into(),
            position,
            stats: HashMap::new(),
            active: true,
            updated_at: Utc::now(),
        }
    }

    /// Builder-style stat setter for record construction.
    pub fn with_stat(mut self, key: &str, value: f64) -> Self {
        self.stats.insert(key.to_string(), value);
        self
    }

    /// Missing keys read as 0.0; value functions that require a key to be
    /// present must check membership themselves.
    pub fn stat(&self, key: &str) -> f64 {
        self.stats.get(key).copied().unwrap_or(0.0)
    }
}
