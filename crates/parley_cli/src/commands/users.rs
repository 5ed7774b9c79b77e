//! `parley users`: offline allow-list management.

use std::path::PathBuf;

use anyhow::Result;
use parley_core::AllowList;
use parley_runtime::BotConfig;

use crate::cli::UsersAction;
use crate::output;

pub fn handle(action: UsersAction, users_file: Option<PathBuf>) -> Result<()> {
    let config = BotConfig::from_env()?;
    let path = users_file.unwrap_or_else(|| config.users_file.clone());
    let mut list = AllowList::open(&path, config.admins.clone());

    match action {
        UsersAction::List => list_users(&list),
        UsersAction::Grant { usernames } => {
            let outcome = list.grant(&usernames)?;
            for user in &outcome.granted {
                output::success(&format!("Granted access to @{user}"));
            }
            for user in &outcome.already_allowed {
                output::warning(&format!("@{user} already had access"));
            }
        }
        UsersAction::Revoke { usernames } => {
            let outcome = list.revoke(&usernames)?;
            for user in &outcome.revoked {
                output::success(&format!("Revoked access for @{user}"));
            }
            for user in &outcome.protected {
                output::warning(&format!("@{user} is an admin and was kept"));
            }
            for user in &outcome.not_found {
                output::warning(&format!("@{user} did not have access"));
            }
        }
    }
    Ok(())
}

fn list_users(list: &AllowList) {
    output::header(&format!("Allowed users ({})", list.path().display()));

    let rows: Vec<(&str, &str)> = list
        .users()
        .iter()
        .map(|user| (user.as_str(), role(list, user)))
        .collect();

    let mut table = output::table("Username", "Role");
    for (user, role) in &rows {
        output::table_row(&mut table, user, role);
    }
    output::table_print(&table, &rows, ("username", "role"));
}

fn role(list: &AllowList, user: &str) -> &'static str {
    if list.is_admin(user) {
        "admin"
    } else {
        "user"
    }
}
