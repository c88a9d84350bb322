use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use checkmesh::config::{parse_listen_addr, parse_peers, NodeConfig, DEFAULT_SCRIPT_DIR};
use checkmesh::node::Node;
use checkmesh::shutdown::install_shutdown_handler;

#[derive(Parser, Debug)]
#[command(name = "checkmesh")]
#[command(version)]
#[command(about = "Runs local health-check scripts and aggregates results from peer nodes")]
struct Args {
    /// Address to listen on (e.g. ":8080" or "127.0.0.1:8080")
    #[arg(long, short = 'l', default_value = ":8080")]
    listen: String,

    /// Directory containing health-check scripts
    #[arg(long, short = 'd', default_value = DEFAULT_SCRIPT_DIR)]
    directory: PathBuf,

    /// Peer addresses to poll (comma-separated or repeated, format: "host:port")
    #[arg(long, short = 'p', value_delimiter = ',')]
    peers: Vec<String>,

    /// Seconds between script runs and between peer fetches
    #[arg(long, default_value = "30", value_parser = clap::value_parser!(u64).range(1..))]
    interval: u64,

    /// Verbose (debug) logging; RUST_LOG takes precedence
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let listen_addr = parse_listen_addr(&args.listen)
        .map_err(|e| format!("invalid listen address {:?}: {}", args.listen, e))?;

    let config = NodeConfig {
        listen_addr,
        script_dir: args.directory,
        peers: parse_peers(args.peers.iter().map(String::as_str)),
        ..NodeConfig::default()
    }
    .with_interval(Duration::from_secs(args.interval));

    tracing::info!(
        listen_addr = %config.listen_addr,
        script_dir = %config.script_dir.display(),
        peers = ?config.peer_addrs().collect::<Vec<_>>(),
        interval_secs = args.interval,
        "Starting checkmesh node"
    );

    let shutdown = install_shutdown_handler();
    Node::new(config).run(shutdown).await?;

    tracing::info!("Node exited cleanly");
    Ok(())
}
