use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("player not found: {id}")]
    NotFound { id: String },

    #[error("unknown graph node: {node}")]
    InvalidReference { node: String },

    #[error("invalid edge: {0}")]
    InvalidEdge(String),

    #[error("no path between {from} and {to}")]
    NotReachable { from: String, to: String },

    #[error("exact strategy unavailable for {players} players (ceiling {ceiling})")]
    StrategyUnavailable { players: usize, ceiling: usize },

    #[error("value function failed on coalition {{{coalition}}}: {reason}")]
    Valuation { coalition: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    /// Structural errors signal caller bugs (bad ids, bad strategy choice);
    /// the rest are data-dependent outcomes.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            CoreError::NotFound { .. }
                | CoreError::InvalidReference { .. }
                | CoreError::InvalidEdge(_)
                | CoreError::StrategyUnavailable { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
