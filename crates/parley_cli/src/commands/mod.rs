//! Command dispatch.

pub mod run;
pub mod users;

use anyhow::Result;

use crate::cli::{Cli, Command};

pub async fn handle(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run(args) => run::handle(args, cli.verbose).await,
        Command::Users { action, users_file } => users::handle(action, users_file),
    }
}
