//! pdfshelf — GitHub-backed PDF library proxy

use clap::Parser;
use pdfshelf::{run_server, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "pdfshelf")]
#[command(about = "Proxy bridging a browser PDF reader to a GitHub repository")]
#[command(version)]
struct Args {
    /// Repository owner (user or organization)
    #[arg(long, env = "GH_OWNER")]
    owner: Option<String>,

    /// Repository name
    #[arg(long, env = "GH_REPO")]
    repo: Option<String>,

    /// Branch ref documents live on
    #[arg(long, default_value = "main", env = "GH_BRANCH")]
    branch: String,

    /// Directory prefix uploads land under
    #[arg(long = "base-path", default_value = "pdfs", env = "GH_PATH")]
    base_path: String,

    /// Write credential; omit for read-only mode
    #[arg(long, env = "GH_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Host to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0", env = "HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8787", env = "PORT")]
    port: u16,

    /// Enable debug logging
    #[arg(short, long, env = "PDFSHELF_DEBUG")]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("pdfshelf={},tower_http=info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config {
        owner: args.owner,
        repo: args.repo,
        branch: args.branch,
        base_path: args.base_path,
        token: args.token,
        host: args.host,
        port: args.port,
        ..Default::default()
    };

    run_server(config).await
}
