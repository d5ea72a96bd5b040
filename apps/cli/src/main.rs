mod commands;
mod config;
mod main_lib;

use clap::Parser;
use goalpath_core::goals::GoalStoreTrait;

use commands::Cli;
use config::Config;
use main_lib::{build_state, init_tracing, sign_in, spawn_event_logger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    init_tracing();

    let state = build_state(&config)?;
    let logger = spawn_event_logger(&state.events);
    sign_in(&state, config.credentials.as_ref()).await?;

    state.store.load().await?;
    let output = commands::run(&state.store, cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    drop(state);
    logger.await?;
    Ok(())
}
