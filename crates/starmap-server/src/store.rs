use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use starmap_core::leaderboard::LeaderboardEntry;

/// Largest ranking a single listing may return.
pub const MAX_LIMIT: usize = 100;

/// Entries kept in memory; lower scores beyond this are dropped.
pub const MAX_STORED: usize = 1000;

/// A stored score together with its server-assigned id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEntry {
    pub id: uuid::Uuid,
    #[serde(flatten)]
    pub entry: LeaderboardEntry,
}

/// In-memory score table, kept ranked on every insert.
#[derive(Clone, Default)]
pub struct LeaderboardStore {
    entries: Arc<RwLock<Vec<StoredEntry>>>,
}

impl LeaderboardStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, entry: LeaderboardEntry) -> StoredEntry {
        let stored = StoredEntry {
            id: uuid::Uuid::new_v4(),
            entry,
        };
        let mut entries = self.entries.write();
        entries.push(stored.clone());
        // same order as the client-side ranking: score desc, earlier first
        entries.sort_by(|a, b| {
            b.entry
                .score
                .cmp(&a.entry.score)
                .then(a.entry.submitted_at.cmp(&b.entry.submitted_at))
        });
        entries.truncate(MAX_STORED);
        tracing::debug!("[store] {} entries", entries.len());
        stored
    }

    /// Top `limit` entries, clamped to [`MAX_LIMIT`].
    pub fn top(&self, limit: usize) -> Vec<StoredEntry> {
        let entries = self.entries.read();
        entries.iter().take(limit.min(MAX_LIMIT)).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
