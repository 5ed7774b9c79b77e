//! Per-chat conversation history.
//!
//! Chats hold user/assistant pairs only; the persona turn is rebuilt for
//! every request. The store can be dumped to and restored from a JSON file,
//! and both directions are best-effort.

use std::collections::HashMap;
use std::path::Path;

use tracing::{info, warn};

use crate::error::{CoreError, Result};
use crate::turn::Turn;

#[derive(Debug, Clone, Default)]
pub struct ContextStore {
    chats: HashMap<String, Vec<Turn>>,
    context_size: usize,
}

impl ContextStore {
    /// Empty store keeping at most `context_size - 1` exchanges per chat.
    pub fn new(context_size: usize) -> Self {
        Self {
            chats: HashMap::new(),
            context_size,
        }
    }

    /// Turns of `chat_id`, oldest first. Unknown chats are empty.
    pub fn get(&self, chat_id: &str) -> &[Turn] {
        self.chats.get(chat_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Record a completed exchange and drop whatever no longer fits.
    pub fn append(&mut self, chat_id: &str, user: Turn, assistant: Turn) {
        let turns = self.chats.entry(chat_id.to_string()).or_default();
        turns.push(user);
        turns.push(assistant);
        self.trim(chat_id, self.context_size.saturating_sub(1));
    }

    /// Drop the oldest turns until at most `max_pairs` exchanges remain.
    pub fn trim(&mut self, chat_id: &str, max_pairs: usize) {
        if let Some(turns) = self.chats.get_mut(chat_id) {
            let limit = max_pairs * 2;
            if turns.len() > limit {
                let excess = turns.len() - limit;
                turns.drain(..excess);
            }
        }
    }

    pub fn clear(&mut self, chat_id: &str) {
        if let Some(turns) = self.chats.get_mut(chat_id) {
            turns.clear();
        }
    }

    pub fn chat_count(&self) -> usize {
        self.chats.len()
    }

    /// Restore from `path`. Missing or unreadable files give an empty store.
    pub fn load(path: &Path, context_size: usize) -> Self {
        let mut store = Self::new(context_size);
        if !path.exists() {
            return store;
        }
        match read_chats(path) {
            Ok(chats) => {
                info!(path = %path.display(), chats = chats.len(), "Loaded conversation context");
                store.chats = chats;
                let ids: Vec<String> = store.chats.keys().cloned().collect();
                for id in ids {
                    store.trim(&id, context_size.saturating_sub(1));
                }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load context, starting empty");
            }
        }
        store
    }

    /// Write all chats to `path` via a temp file and rename.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string(&self.chats)?;
        write_atomic(path, json.as_bytes())
    }
}

fn read_chats(path: &Path) -> Result<HashMap<String, Vec<Turn>>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Replace `path` with `contents` without leaving a half-written file behind.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, contents).map_err(|e| CoreError::Persistence {
        path: tmp.display().to_string(),
        message: e.to_string(),
    })?;
    std::fs::rename(&tmp, path).map_err(|e| CoreError::Persistence {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}
