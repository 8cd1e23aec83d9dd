//! White-space database server CLI

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use paws_engine::EngineConfig;
use paws_server::{create_router, create_shared_state, init_prometheus_recorder, Fixtures};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "paws-server", about = "PAWS white-space database server")]
struct Args {
    /// Engine configuration (JSON); defaults apply when omitted
    #[arg(long, env = "PAWS_CONFIG")]
    config: Option<PathBuf>,

    /// Reference data and model tables (JSON)
    #[arg(long, env = "PAWS_FIXTURES")]
    fixtures: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, env = "PAWS_LISTEN", default_value = "0.0.0.0:8080")]
    listen: SocketAddr,

    /// Disable the Prometheus recorder and /metrics
    #[arg(long)]
    no_metrics: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("paws_server=info,paws_engine=info")),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let fixtures = match &args.fixtures {
        Some(path) => Fixtures::load(path)
            .with_context(|| format!("loading fixtures {}", path.display()))?,
        None => Fixtures::default(),
    };

    tracing::info!(
        org = %config.org_code,
        region = %config.region_key,
        rulesets = config.rulesets.len(),
        reports = %config.report_dir.display(),
        "Starting PAWS server"
    );

    let (engine, _store) = fixtures.engine(config).await?;
    let metrics = if args.no_metrics {
        None
    } else {
        Some(init_prometheus_recorder()?)
    };

    let app = create_router(create_shared_state(engine, metrics));
    let listener = tokio::net::TcpListener::bind(args.listen).await?;
    tracing::info!("Listening on {}", args.listen);
    axum::serve(listener, app).await?;

    Ok(())
}
