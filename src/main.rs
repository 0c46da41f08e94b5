//! reviewrelay - fetch business reviews with quota-aware fallback
//!
//! A small demo frontend for the review service: resolves the current review
//! batch and prints the route-layer JSON envelope to stdout. Credentials and
//! listing URLs come from the environment; see `config` for the variable
//! names.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use reviewrelay::config::Config;
use reviewrelay::data::ReviewsResponse;
use reviewrelay::resolver::ReviewService;
use reviewrelay::store::StateStore;

/// Fetch business reviews with caching, quota tracking, and ordered fallback
#[derive(Parser, Debug)]
#[command(name = "reviewrelay")]
#[command(about = "Best-effort business review retrieval")]
#[command(version)]
struct Cli {
    /// Skip the cache and attempt a live fetch (still subject to quota)
    #[arg(long)]
    force_refresh: bool,

    /// Directory for the persisted state document (defaults to the XDG cache dir)
    #[arg(long, value_name = "DIR")]
    state_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let store = match cli.state_dir {
        Some(dir) => StateStore::with_dir(dir),
        None => match StateStore::new() {
            Some(store) => store,
            None => {
                eprintln!("error: could not determine a state directory; pass --state-dir");
                return ExitCode::FAILURE;
            }
        },
    };

    let service = ReviewService::new(Config::from_env(), store);
    let reviews = service.resolve(cli.force_refresh).await;
    let response = ReviewsResponse::new(reviews);

    match serde_json::to_string_pretty(&response) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to serialize response: {e}");
            ExitCode::FAILURE
        }
    }
}
