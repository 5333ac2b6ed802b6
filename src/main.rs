//! Viewer: the room, the crowd and the polling loop in one Bevy window.

use std::time::Duration;

use anyhow::Result;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use clap::Parser;
use crowd3d::{
    init_logging, AvatarPlugin, MaterialStylePlugin, ModelLoaderPlugin, PollingPlugin,
    PollingSettings, PresentationPlugin, ScenePlugin, DEFAULT_RELAY_URL, POLL_INTERVAL_MS,
};

/// Live 3D view of the tracked crowd
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Relay endpoint serving the crowd snapshot
    #[arg(long, env = "CROWD_RELAY_URL", default_value = DEFAULT_RELAY_URL)]
    relay_url: String,

    /// Milliseconds between snapshot fetches
    #[arg(long, default_value_t = POLL_INTERVAL_MS)]
    poll_interval_ms: u64,

    /// Give up on a fetch after this many milliseconds (waits forever if unset)
    #[arg(long)]
    fetch_timeout_ms: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    log::info!("polling {} every {} ms", args.relay_url, args.poll_interval_ms);

    let exit = App::new()
        .add_plugins(DefaultPlugins.build().disable::<LogPlugin>())
        .insert_resource(PollingSettings {
            url: args.relay_url,
            interval: Duration::from_millis(args.poll_interval_ms),
            timeout: args.fetch_timeout_ms.map(Duration::from_millis),
        })
        .add_plugins((
            ScenePlugin,
            PresentationPlugin,
            AvatarPlugin,
            PollingPlugin,
            ModelLoaderPlugin,
            MaterialStylePlugin,
        ))
        .run();

    if let AppExit::Error(code) = exit {
        anyhow::bail!("viewer exited with code {code}");
    }
    Ok(())
}
