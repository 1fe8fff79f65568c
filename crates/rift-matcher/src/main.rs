//! Rift Matcher CLI
//!
//! Loads a simulation and answers one or more recorded requests against it,
//! printing the matched response or the closest-miss diagnostics.
//!
//! Usage:
//!   rift-matcher --simulation sim.json --request request.json [OPTIONS]
//!
//! The request file holds either a single request or an array of requests,
//! which are matched in order against the same state and cache.

use anyhow::Context;
use clap::Parser;
use rift_matcher::{
    collect_metrics, MatcherSettings, RequestDetails, SimulationDocument, SimulationMatcher,
    StrategyKind,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

// ANSI color codes
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Rift Matcher - match requests against a simulation
#[derive(Parser, Debug)]
#[command(name = "rift-matcher")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Matcher settings file (YAML or JSON)
    #[arg(short, long, env = "RIFT_MATCHER_CONFIG")]
    config: Option<PathBuf>,

    /// Simulation file: {"pairs": [...]}
    #[arg(short, long, env = "RIFT_MATCHER_SIMULATION")]
    simulation: PathBuf,

    /// Request file: a request object or an array of them
    #[arg(short, long)]
    request: PathBuf,

    /// Matching strategy override: first | strongest
    #[arg(long, env = "RIFT_MATCHER_STRATEGY")]
    strategy: Option<StrategyKind>,

    /// Webserver mode: ignore the destination
    #[arg(long)]
    webserver: bool,

    /// Print Prometheus metrics after matching
    #[arg(long)]
    metrics: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RequestInput {
    Many(Vec<RequestDetails>),
    One(Box<RequestDetails>),
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => MatcherSettings::from_file(path)
            .with_context(|| format!("Invalid matcher config {}", path.display()))?,
        None => MatcherSettings::default(),
    };
    if let Some(strategy) = args.strategy {
        settings.strategy = strategy;
    }
    settings.webserver |= args.webserver;
    debug!("Matcher settings: {:?}", settings);

    let document: SimulationDocument = read_json(&args.simulation)?;
    let matcher = SimulationMatcher::from_settings(&settings);
    matcher.replace_simulation(document)?;

    let requests = match read_json::<RequestInput>(&args.request)? {
        RequestInput::Many(requests) => requests,
        RequestInput::One(request) => vec![*request],
    };
    info!(
        "Matching {} request(s) with the {} strategy",
        requests.len(),
        settings.strategy
    );

    let mut misses = 0;
    for request in &requests {
        println!("{BOLD}{} {}{}{RESET}", request.method, request.destination, request.path);
        match matcher.get_response(request) {
            Ok(response) => {
                println!("{GREEN}matched{RESET} -> {}", response.status);
                println!("{}", serde_json::to_string_pretty(&response)?);
            }
            Err(e) => {
                misses += 1;
                println!("{RED}{} ({}){RESET}", e, e.status_code());
            }
        }
        println!();
    }

    if args.metrics {
        print!("{}", collect_metrics());
    }

    if misses > 0 {
        anyhow::bail!("{} of {} request(s) did not match", misses, requests.len());
    }
    Ok(())
}
