//! Relay: serves the crowd records stored in Redis as one JSON snapshot.

use anyhow::{Context, Result};
use clap::Parser;
use crowd3d::relay::{RedisStore, RelayServer};
use crowd3d::{init_logging, DEFAULT_LIST_KEY, DEFAULT_REDIS_URL, DEFAULT_RELAY_BIND};

/// HTTP relay exposing crowd positions from Redis
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Address to listen on
    #[arg(long, env = "CROWD_BIND", default_value = DEFAULT_RELAY_BIND)]
    bind: String,

    /// Redis connection URL
    #[arg(long, env = "REDIS_URL", default_value = DEFAULT_REDIS_URL)]
    redis_url: String,

    /// Redis list holding the tracked identifiers
    #[arg(long, env = "CROWD_LIST_KEY", default_value = DEFAULT_LIST_KEY)]
    list_key: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let store = RedisStore::open(&args.redis_url)
        .with_context(|| format!("invalid Redis URL {}", args.redis_url))?;
    let relay = RelayServer::bind(&args.bind, store, args.list_key)?;
    relay.serve().context("relay stopped")
}
