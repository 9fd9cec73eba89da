//! Engine configuration
//!
//! All tuning knobs for the analytics core live here so callers configure
//! one struct at startup instead of threading constants through the API.
//!
//! ```rust
//! use pvoi_core::config::EngineConfig;
//!
//! let config = EngineConfig::default();
//! let fast = EngineConfig::fast();
//! ```

use serde::{Deserialize, Serialize};

/// Top-level configuration for [`crate::engine::AnalyticsEngine`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Leaderboard capacity (entries kept by the ranking heap)
    pub heap_capacity: usize,
    /// Statistic the live leaderboard ranks by
    pub ranking_metric: String,
    /// PageRank iteration settings
    pub pagerank: PageRankConfig,
    /// Shapley valuation settings
    pub shapley: ShapleyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRankConfig {
    /// Damping factor, conventionally 0.85
    pub damping: f64,
    pub max_iterations: usize,
    /// L1 change between successive score vectors below which we stop
    pub tolerance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapleyConfig {
    /// Monte Carlo permutation count
    pub iterations: usize,
    /// Fixed seed for reproducible sampling; None draws from the OS
    #[serde(default)]
    pub seed: Option<u64>,
    /// Largest squad the exact strategy will accept (cost is 2^n)
    pub exact_ceiling: usize,
    /// Coalitions sampled when fitting the model-based strategy
    pub model_samples: usize,
    /// Ridge regularization for the model fit
    pub model_ridge: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            heap_capacity: 50,
            ranking_metric: "rating".to_string(),
            pagerank: PageRankConfig::default(),
            shapley: ShapleyConfig::default(),
        }
    }
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self { damping: 0.85, max_iterations: 100, tolerance: 1e-8 }
    }
}

impl Default for ShapleyConfig {
    fn default() -> Self {
        Self {
            iterations: 500,
            seed: None,
            exact_ceiling: 12,
            model_samples: 256,
            model_ridge: 1e-6,
        }
    }
}

impl EngineConfig {
    /// Cheap settings for tests: few iterations, fixed seed.
    pub fn fast() -> Self {
        let mut cfg = Self::default();
        cfg.pagerank.max_iterations = 30;
        cfg.pagerank.tolerance = 1e-6;
        cfg.shapley.iterations = 100;
        cfg.shapley.seed = Some(42);
        cfg.shapley.model_samples = 64;
        cfg
    }

    /// High-accuracy settings for offline analysis runs.
    pub fn thorough() -> Self {
        let mut cfg = Self::default();
        cfg.pagerank.max_iterations = 500;
        cfg.pagerank.tolerance = 1e-10;
        cfg.shapley.iterations = 5_000;
        cfg.shapley.model_samples = 1_024;
        cfg
    }
}
