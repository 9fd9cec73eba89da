//! Analytics CLI
//!
//! Loads player records (and optionally relationship edges) from JSON
//! files, feeds the in-memory engine and prints query results as JSON.
//! Stands in for the external API layer during offline analysis.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use pvoi_core::{
    AnalyticsEngine, EngineConfig, Per90Value, PlayerRecord, StatWeightedValue, StrategyKind,
    ValueFunction,
};

#[derive(Parser)]
#[command(name = "pvoi")]
#[command(about = "Player analytics: leaderboards, influence graphs, Shapley valuation", long_about = None)]
struct Cli {
    /// Player records JSON file (array of records)
    #[arg(long, global = true)]
    players: Option<PathBuf>,

    /// Relationship edges JSON file (array of {from, to, weight, kind})
    #[arg(long, global = true)]
    edges: Option<PathBuf>,

    /// Statistic the leaderboard ranks by
    #[arg(long, default_value = "rating")]
    metric: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the top k players by the ranking metric
    Top {
        #[arg(long, default_value = "10")]
        k: usize,
    },

    /// Print PageRank influence scores over the relationship graph
    Pagerank {
        #[arg(long, default_value = "0.85")]
        damping: f64,
    },

    /// Print the shortest relationship path between two nodes
    Path {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },

    /// Compute Shapley-based player valuations (PVOI)
    Pvoi {
        #[arg(long, value_enum, default_value = "goal-based")]
        value_function: ValueFunctionArg,
        #[arg(long, value_enum, default_value = "monte-carlo")]
        strategy: StrategyArg,
        #[arg(long, default_value = "500")]
        iterations: usize,
        /// Fixed seed for reproducible sampling runs
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ValueFunctionArg {
    GoalBased,
    GoalBasedPer90,
    Defensive,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Exact,
    MonteCarlo,
    ModelBased,
}

impl From<StrategyArg> for StrategyKind {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Exact => StrategyKind::Exact,
            StrategyArg::MonteCarlo => StrategyKind::MonteCarlo,
            StrategyArg::ModelBased => StrategyKind::ModelBased,
        }
    }
}

fn load_engine(cli: &Cli, config: EngineConfig) -> Result<AnalyticsEngine> {
    let engine = AnalyticsEngine::new(config);

    let players_path = cli
        .players
        .as_ref()
        .context("--players <file> is required")?;
    let raw = std::fs::read_to_string(players_path)
        .with_context(|| format!("read players file {}", players_path.display()))?;
    let records: Vec<PlayerRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("parse players file {}", players_path.display()))?;
    let count = records.len();
    for record in records {
        engine.ingest(record);
    }
    tracing::info!(players = count, "loaded player records");

    if let Some(edges_path) = &cli.edges {
        let raw = std::fs::read_to_string(edges_path)
            .with_context(|| format!("read edges file {}", edges_path.display()))?;
        let request = format!("{{\"edges\": {raw}}}");
        pvoi_core::api::record_edges_json(&engine, &request)
            .map_err(|e| anyhow::anyhow!(e))
            .context("ingest edges")?;
    }

    Ok(engine)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = EngineConfig::default();
    config.ranking_metric = cli.metric.clone();

    match &cli.command {
        Commands::Top { k } => {
            let engine = load_engine(&cli, config)?;
            let response = pvoi_core::api::top_players_json(&engine, &format!("{{\"k\": {k}}}"))
                .map_err(|e| anyhow::anyhow!(e))?;
            println!("{response}");
        }

        Commands::Pagerank { damping } => {
            if !(0.0..1.0).contains(damping) {
                bail!("damping must be in [0, 1), got {damping}");
            }
            config.pagerank.damping = *damping;
            let engine = load_engine(&cli, config)?;
            let response =
                pvoi_core::api::pagerank_json(&engine).map_err(|e| anyhow::anyhow!(e))?;
            println!("{response}");
        }

        Commands::Path { from, to } => {
            let engine = load_engine(&cli, config)?;
            let request = serde_json::json!({ "from": from, "to": to }).to_string();
            let response = pvoi_core::api::shortest_path_json(&engine, &request)
                .map_err(|e| anyhow::anyhow!(e))?;
            println!("{response}");
        }

        Commands::Pvoi { value_function, strategy, iterations, seed } => {
            if *iterations == 0 {
                bail!("iterations must be at least 1");
            }
            config.shapley.iterations = *iterations;
            config.shapley.seed = *seed;
            let engine = load_engine(&cli, config)?;
            let vf: Box<dyn ValueFunction> = match value_function {
                ValueFunctionArg::GoalBased => Box::new(StatWeightedValue::goal_based()),
                ValueFunctionArg::GoalBasedPer90 => {
                    Box::new(Per90Value::new(StatWeightedValue::goal_based()))
                }
                ValueFunctionArg::Defensive => Box::new(StatWeightedValue::defensive()),
            };
            let report = engine
                .pvoi(vf.as_ref(), (*strategy).into())
                .context("pvoi computation failed")?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_players(file: &mut tempfile::NamedTempFile) {
        write!(
            file,
            r#"[
                {{"id": "a", "name": "Ada", "position": "Forward",
                  "stats": {{"rating": 8.0, "goals": 6.0, "minutes": 900.0}}}},
                {{"id": "b", "name": "Bo", "position": "Defender",
                  "stats": {{"rating": 7.1, "tackles": 40.0, "minutes": 1200.0}}}}
            ]"#
        )
        .unwrap();
        file.flush().unwrap();
    }

    #[test]
    fn parses_pvoi_subcommand() {
        let cli = Cli::parse_from([
            "pvoi",
            "--players",
            "players.json",
            "pvoi",
            "--strategy",
            "exact",
            "--value-function",
            "defensive",
        ]);
        match cli.command {
            Commands::Pvoi { strategy, .. } => {
                assert!(matches!(StrategyKind::from(strategy), StrategyKind::Exact))
            }
            _ => panic!("expected pvoi subcommand"),
        }
    }

    #[test]
    fn load_engine_ingests_players_and_edges() {
        let mut players = tempfile::NamedTempFile::new().unwrap();
        write_players(&mut players);
        let mut edges = tempfile::NamedTempFile::new().unwrap();
        write!(
            edges,
            r#"[{{"from": "a", "to": "b", "weight": 2.0, "kind": "Teammate"}}]"#
        )
        .unwrap();
        edges.flush().unwrap();

        let cli = Cli::parse_from([
            "pvoi",
            "--players",
            players.path().to_str().unwrap(),
            "--edges",
            edges.path().to_str().unwrap(),
            "top",
            "--k",
            "5",
        ]);
        let engine = load_engine(&cli, EngineConfig::default()).unwrap();
        assert_eq!(engine.player_count(), 2);
        assert_eq!(engine.top_player().unwrap().id.as_str(), "a");
        assert!(engine
            .shortest_path(&"a".into(), &"b".into())
            .is_ok());
    }

    #[test]
    fn missing_players_file_is_an_error() {
        let cli = Cli::parse_from(["pvoi", "top"]);
        assert!(load_engine(&cli, EngineConfig::default()).is_err());
    }
}
