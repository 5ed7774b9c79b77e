//! Allow-list of usernames permitted to talk to the bot.
//!
//! The list lives in a small JSON document (`{"users": [...]}`). Every
//! mutation reloads the file first so edits from another admin session are
//! not overwritten with a stale copy.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::store::write_atomic;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UsersFile {
    users: Vec<String>,
}

/// Result of a `/grant`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrantOutcome {
    pub granted: Vec<String>,
    pub already_allowed: Vec<String>,
}

/// Result of a `/revoke`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevokeOutcome {
    pub revoked: Vec<String>,
    pub not_found: Vec<String>,
    /// Admins are never removed.
    pub protected: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AllowList {
    path: PathBuf,
    admins: Vec<String>,
    users: Vec<String>,
}

impl AllowList {
    /// Open the list at `path`, seeding it with `admins` when the file is missing.
    pub fn open(path: impl Into<PathBuf>, admins: Vec<String>) -> Self {
        let path = path.into();
        let mut list = Self {
            users: admins.clone(),
            admins,
            path,
        };
        if list.path.exists() {
            list.reload();
        } else if let Err(e) = list.save() {
            warn!(path = %list.path.display(), error = %e, "Could not create users file");
        }
        list
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the persisted list. Unreadable files fall back to the admins.
    pub fn reload(&mut self) {
        match read_users(&self.path) {
            Ok(users) => self.users = users,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read users file, using admins only");
                self.users = self.admins.clone();
            }
        }
    }

    pub fn users(&self) -> &[String] {
        &self.users
    }

    pub fn contains(&self, username: &str) -> bool {
        self.users.iter().any(|u| u == username)
    }

    pub fn is_admin(&self, username: &str) -> bool {
        self.admins.iter().any(|a| a == username)
    }

    pub fn admins(&self) -> &[String] {
        &self.admins
    }

    pub fn grant<S: AsRef<str>>(&mut self, names: &[S]) -> Result<GrantOutcome> {
        self.reload();
        let mut outcome = GrantOutcome::default();
        for name in names.iter().filter_map(|n| normalize_username(n.as_ref())) {
            if self.contains(&name) {
                outcome.already_allowed.push(name);
            } else {
                self.users.push(name.clone());
                outcome.granted.push(name);
            }
        }
        if !outcome.granted.is_empty() {
            self.save()?;
            info!(users = ?outcome.granted, "Granted access");
        }
        Ok(outcome)
    }

    pub fn revoke<S: AsRef<str>>(&mut self, names: &[S]) -> Result<RevokeOutcome> {
        self.reload();
        let mut outcome = RevokeOutcome::default();
        for name in names.iter().filter_map(|n| normalize_username(n.as_ref())) {
            if self.is_admin(&name) {
                outcome.protected.push(name);
            } else if self.contains(&name) {
                self.users.retain(|u| u != &name);
                outcome.revoked.push(name);
            } else {
                outcome.not_found.push(name);
            }
        }
        if !outcome.revoked.is_empty() {
            self.save()?;
            info!(users = ?outcome.revoked, "Revoked access");
        }
        Ok(outcome)
    }

    fn save(&self) -> Result<()> {
        let doc = UsersFile {
            users: self.users.clone(),
        };
        write_atomic(&self.path, serde_json::to_string(&doc)?.as_bytes())
    }
}

fn read_users(path: &Path) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)?;
    let doc: UsersFile = serde_json::from_str(&raw)?;
    Ok(doc.users)
}

/// `@Name ` -> `Name`; blank input is dropped.
fn normalize_username(raw: &str) -> Option<String> {
    let name = raw.trim().trim_start_matches('@').trim();
    (!name.is_empty()).then(|| name.to_string())
}
