//! Per-username usage counters. Process lifetime only.

use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct UsageLedger {
    tokens: HashMap<String, u64>,
    images: HashMap<String, u64>,
}

impl UsageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_tokens(&mut self, username: &str, tokens: u64) {
        *self.tokens.entry(username.to_string()).or_insert(0) += tokens;
    }

    pub fn record_image(&mut self, username: &str) {
        *self.images.entry(username.to_string()).or_insert(0) += 1;
    }

    pub fn tokens_for(&self, username: &str) -> u64 {
        self.tokens.get(username).copied().unwrap_or(0)
    }

    pub fn images_for(&self, username: &str) -> u64 {
        self.images.get(username).copied().unwrap_or(0)
    }

    /// Token totals, heaviest users first.
    pub fn token_report(&self) -> Vec<(String, u64)> {
        sorted_desc(&self.tokens)
    }

    /// Image counts, heaviest users first.
    pub fn image_report(&self) -> Vec<(String, u64)> {
        sorted_desc(&self.images)
    }
}

fn sorted_desc(map: &HashMap<String, u64>) -> Vec<(String, u64)> {
    let mut rows: Vec<(String, u64)> = map.iter().map(|(k, v)| (k.clone(), *v)).collect();
    // Name as a tiebreaker keeps the report stable.
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    rows
}
