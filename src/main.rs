mod cli;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Args, Session};
use glowup::config::Config;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = Config::new(args.data_dir)?;
    init_logging(args.verbose, &config.log_level);
    if let Some(warning) = &config.load_warning {
        tracing::warn!("{}", warning);
    }

    let mut session = Session::open(config)?;
    let result = cli::dispatch(&mut session, args.command).await;
    session.close()?;
    result
}

/// RUST_LOG wins, then --verbose, then the configured level.
fn init_logging(verbose: bool, configured: &str) {
    let fallback = if verbose { "debug" } else { configured };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
