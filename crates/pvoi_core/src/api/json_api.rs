use serde::{Deserialize, Serialize};

use crate::engine::AnalyticsEngine;
use crate::error::CoreError;
use crate::graph::{EdgeKind, NodeId};
use crate::store::{PlayerId, PlayerRecord};
use crate::valuation::{Per90Value, StatWeightedValue, StrategyKind, ValueFunction};

/// Stable error codes for the JSON surface.
pub mod error_codes {
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const INVALID_REFERENCE: &str = "INVALID_REFERENCE";
    pub const INVALID_EDGE: &str = "INVALID_EDGE";
    pub const NOT_REACHABLE: &str = "NOT_REACHABLE";
    pub const STRATEGY_UNAVAILABLE: &str = "STRATEGY_UNAVAILABLE";
    pub const VALUATION_ERROR: &str = "VALUATION_ERROR";
}

fn err_code(code: &str, message: impl std::fmt::Display) -> String {
    format!("{code}: {message}")
}

fn map_err(err: CoreError) -> String {
    let code = match &err {
        CoreError::NotFound { .. } => error_codes::NOT_FOUND,
        CoreError::InvalidReference { .. } => error_codes::INVALID_REFERENCE,
        CoreError::InvalidEdge(_) => error_codes::INVALID_EDGE,
        CoreError::NotReachable { .. } => error_codes::NOT_REACHABLE,
        CoreError::StrategyUnavailable { .. } => error_codes::STRATEGY_UNAVAILABLE,
        CoreError::Valuation { .. } => error_codes::VALUATION_ERROR,
        CoreError::Serialization(_) => error_codes::BAD_REQUEST,
    };
    err_code(code, err)
}

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub schema_version: u8,
    pub players: Vec<PlayerRecord>,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub ingested: usize,
    /// Players whose score did not make the bounded leaderboard — a
    /// defined outcome, reported rather than failed
    pub ranking_rejected: usize,
}

pub fn ingest_players_json(engine: &AnalyticsEngine, request_json: &str) -> Result<String, String> {
    let request: IngestRequest = serde_json::from_str(request_json)
        .map_err(|e| err_code(error_codes::BAD_REQUEST, e))?;
    let mut ingested = 0;
    let mut ranking_rejected = 0;
    for record in request.players {
        if !engine.ingest(record).is_applied() {
            ranking_rejected += 1;
        }
        ingested += 1;
    }
    let response = IngestResponse { ingested, ranking_rejected };
    serde_json::to_string(&response).map_err(|e| err_code(error_codes::BAD_REQUEST, e))
}

pub fn player_json(engine: &AnalyticsEngine, id: &str) -> Result<String, String> {
    let record = engine.player(&PlayerId::new(id)).map_err(map_err)?;
    serde_json::to_string(&record).map_err(|e| err_code(error_codes::BAD_REQUEST, e))
}

#[derive(Debug, Deserialize)]
pub struct TopRequest {
    pub k: usize,
}

#[derive(Debug, Serialize)]
pub struct TopResponse {
    pub entries: Vec<TopEntry>,
}

#[derive(Debug, Serialize)]
pub struct TopEntry {
    pub player_id: PlayerId,
    pub score: f64,
}

pub fn top_players_json(engine: &AnalyticsEngine, request_json: &str) -> Result<String, String> {
    let request: TopRequest = serde_json::from_str(request_json)
        .map_err(|e| err_code(error_codes::BAD_REQUEST, e))?;
    let entries = engine
        .top_players(request.k)
        .into_iter()
        .map(|e| TopEntry { player_id: e.id, score: e.score })
        .collect();
    serde_json::to_string(&TopResponse { entries })
        .map_err(|e| err_code(error_codes::BAD_REQUEST, e))
}

#[derive(Debug, Deserialize)]
pub struct EdgeIngestRequest {
    pub edges: Vec<EdgeData>,
}

#[derive(Debug, Deserialize)]
pub struct EdgeData {
    pub from: String,
    pub to: String,
    pub weight: f64,
    pub kind: EdgeKind,
}

pub fn record_edges_json(engine: &AnalyticsEngine, request_json: &str) -> Result<String, String> {
    let request: EdgeIngestRequest = serde_json::from_str(request_json)
        .map_err(|e| err_code(error_codes::BAD_REQUEST, e))?;
    for edge in &request.edges {
        engine
            .record_relationship(
                &NodeId::new(edge.from.as_str()),
                &NodeId::new(edge.to.as_str()),
                edge.weight,
                edge.kind,
            )
            .map_err(map_err)?;
    }
    serde_json::to_string(&serde_json::json!({ "recorded": request.edges.len() }))
        .map_err(|e| err_code(error_codes::BAD_REQUEST, e))
}

pub fn pagerank_json(engine: &AnalyticsEngine) -> Result<String, String> {
    let scores = engine.pagerank();
    serde_json::to_string(&scores).map_err(|e| err_code(error_codes::BAD_REQUEST, e))
}

#[derive(Debug, Deserialize)]
pub struct PathRequest {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Serialize)]
pub struct PathResponse {
    pub path: Vec<NodeId>,
    pub hops: usize,
}

pub fn shortest_path_json(engine: &AnalyticsEngine, request_json: &str) -> Result<String, String> {
    let request: PathRequest = serde_json::from_str(request_json)
        .map_err(|e| err_code(error_codes::BAD_REQUEST, e))?;
    let path = engine
        .shortest_path(&NodeId::new(request.from), &NodeId::new(request.to))
        .map_err(map_err)?;
    let hops = path.len().saturating_sub(1);
    serde_json::to_string(&PathResponse { path, hops })
        .map_err(|e| err_code(error_codes::BAD_REQUEST, e))
}

#[derive(Debug, Deserialize)]
pub struct PvoiRequest {
    /// One of: goal_based, goal_based_per90, defensive
    pub value_function: String,
    pub strategy: StrategyKind,
}

pub fn compute_pvoi_json(engine: &AnalyticsEngine, request_json: &str) -> Result<String, String> {
    let request: PvoiRequest = serde_json::from_str(request_json)
        .map_err(|e| err_code(error_codes::BAD_REQUEST, e))?;
    let value_function: Box<dyn ValueFunction> = match request.value_function.as_str() {
        "goal_based" => Box::new(StatWeightedValue::goal_based()),
        "goal_based_per90" => Box::new(Per90Value::new(StatWeightedValue::goal_based())),
        "defensive" => Box::new(StatWeightedValue::defensive()),
        other => {
            return Err(err_code(
                error_codes::BAD_REQUEST,
                format!("unknown value function: {other}"),
            ))
        }
    };
    let report = engine.pvoi(value_function.as_ref(), request.strategy).map_err(map_err)?;
    serde_json::to_string(&report).map_err(|e| err_code(error_codes::BAD_REQUEST, e))
}
