//! External contract surface
//!
//! String-in/string-out JSON functions for the REST layer and notebook
//! consumers. Transport, auth and timeouts belong to the caller.

mod json_api;

pub use json_api::{
    compute_pvoi_json, error_codes, ingest_players_json, pagerank_json, player_json,
    record_edges_json, shortest_path_json, top_players_json, EdgeData, EdgeIngestRequest,
    IngestRequest, IngestResponse, PathRequest, PathResponse, PvoiRequest, TopEntry,
    TopRequest, TopResponse,
};
