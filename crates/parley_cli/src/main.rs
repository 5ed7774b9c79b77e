//! CLI entry point for parley.

mod cli;
mod commands;
mod output;

use std::path::Path;

use clap::Parser;
use parley_constant::app;

use crate::cli::Cli;

/// Load env files: `~/.parley/env`, then the nearest `.env` walking up from
/// the working directory. Variables already set are never overwritten.
fn load_env() {
    if let Some(home) = dirs::home_dir() {
        let global = home.join(app::DATA_DIR).join(app::ENV_FILE);
        if global.exists() {
            let _ = dotenvy::from_path(&global);
        }
    }
    if let Ok(cwd) = std::env::current_dir() {
        if let Some(env_file) = find_upwards(&cwd, ".env") {
            let _ = dotenvy::from_path(&env_file);
        }
    }
}

fn find_upwards(start: &Path, name: &str) -> Option<std::path::PathBuf> {
    start
        .ancestors()
        .take(32)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.exists())
}

#[tokio::main]
async fn main() {
    load_env();
    let cli = Cli::parse();
    output::init(cli.output);

    if let Err(e) = commands::handle(cli).await {
        output::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}
