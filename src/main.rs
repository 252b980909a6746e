use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber;

use news_historian::config::{self, Settings};
use news_historian::{
    pipeline, server, AppState, EnrichmentEngine, FeedFetcher, FetchConfig, NewsAggregator,
    OllamaClient,
};

#[derive(Parser)]
#[command(name = "news-historian")]
#[command(about = "RSS news aggregator with model-generated historical context")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API server
    Serve {
        /// Port to listen on (defaults to $PORT or 3001)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Fetch, enrich, and write a static news snapshot
    Build {
        /// Output path for the snapshot JSON
        #[arg(long, default_value = "public/data/news.json")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let settings = Settings::from_env();

    let fetch_config = FetchConfig::default();
    let fetcher = Arc::new(FeedFetcher::new(fetch_config.clone()));
    let aggregator = Arc::new(NewsAggregator::new(
        config::feed_sources(),
        fetcher,
        &fetch_config,
    ));
    let generator = Arc::new(OllamaClient::new(
        &settings.ollama_host,
        &settings.ollama_model,
    ));
    let enricher = Arc::new(EnrichmentEngine::new(generator));

    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => {
            let port = port.unwrap_or(settings.port);

            if !enricher.check_connection().await {
                warn!("Ollama is not available. Historical background generation will be disabled.");
            }

            info!("Fetching initial RSS feeds");
            aggregator.fetch_all(false).await;

            let state = AppState {
                aggregator,
                enricher,
            };
            server::serve(state, port).await?;
        }
        Command::Build { output } => {
            pipeline::build_news(&aggregator, &enricher, &output).await?;
        }
    }

    Ok(())
}
