use anyhow::Context;
use clap::{Parser, Subcommand};
use episode_aggregator::server::{self, AppState, ServerConfig};
use episode_aggregator::{AggregatorConfig, EpisodeAggregator};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "episode-aggregator", about = "Podcast episode catalog aggregated from a video feed")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the episode catalog over HTTP
    Serve {
        #[arg(long, env = "API_BIND_ADDRESS", default_value = "0.0.0.0")]
        bind: String,
        #[arg(long, env = "API_PORT", default_value_t = 3000)]
        port: u16,
        /// Seconds a fetched catalog is served before it is rebuilt
        #[arg(long, default_value_t = 600)]
        revalidate_secs: u64,
    },
    /// Aggregate once and print the catalog as JSON
    Fetch {
        #[arg(long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = AggregatorConfig::from_env();
    info!(
        "Starting episode aggregator (source: {})",
        config.source.as_ref().map(|s| s.strategy_name()).unwrap_or("none")
    );

    let aggregator = EpisodeAggregator::from_config(&config).context("failed to build aggregator")?;

    match cli.command {
        Command::Serve {
            bind,
            port,
            revalidate_secs,
        } => {
            let server_config = ServerConfig {
                bind_address: bind,
                port,
                revalidate_secs,
            };
            let state = AppState::new(aggregator, Duration::from_secs(server_config.revalidate_secs));
            server::serve(&server_config, state).await.context("server stopped")?;
        }
        Command::Fetch { pretty } => {
            let groups = aggregator.aggregate().await.context("episode aggregation failed")?;
            let json = if pretty {
                serde_json::to_string_pretty(&groups)?
            } else {
                serde_json::to_string(&groups)?
            };
            println!("{}", json);
        }
    }

    Ok(())
}
