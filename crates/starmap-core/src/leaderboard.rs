//! Leaderboard client.
//!
//! Entries are always ordered by descending score. The local board can
//! persist itself to a JSON file and doubles as the offline cache behind
//! [`FallbackLeaderboard`].

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::config::LeaderboardConfig;

/// Longest accepted player name, in characters.
pub const MAX_NAME_LEN: usize = 24;

#[derive(Debug, thiserror::Error)]
pub enum LeaderboardError {
    #[error("leaderboard cache io: {0}")]
    Io(#[from] std::io::Error),
    #[error("leaderboard serialization: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("leaderboard service: {0}")]
    Remote(String),
    #[error("player name must not be empty")]
    InvalidName,
}

/// Per-session statistics stored with a score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub visited: u32,
    pub correct: u32,
    pub wrong: u32,
    pub route_visits: u32,
    pub random_visits: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: i64,
    #[serde(default)]
    pub stats: SessionStats,
    #[serde(default = "Utc::now")]
    pub submitted_at: DateTime<Utc>,
}

impl LeaderboardEntry {
    /// Validates the name (trimmed, non-empty, length-capped).
    pub fn new(name: &str, score: i64, stats: SessionStats) -> Result<Self, LeaderboardError> {
        Ok(Self {
            name: normalize_name(name)?,
            score,
            stats,
            submitted_at: Utc::now(),
        })
    }
}

/// Trims a player name and caps its length.
pub fn normalize_name(name: &str) -> Result<String, LeaderboardError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(LeaderboardError::InvalidName);
    }
    Ok(trimmed.chars().take(MAX_NAME_LEN).collect())
}

/// Sorts entries by descending score; ties keep the earlier submission first.
pub fn rank_entries(entries: &mut [LeaderboardEntry]) {
    entries.sort_by(|a, b| b.score.cmp(&a.score).then(a.submitted_at.cmp(&b.submitted_at)));
}

pub trait LeaderboardClient: Send + Sync {
    fn submit(&self, entry: LeaderboardEntry) -> Result<(), LeaderboardError>;

    /// Top `limit` entries, highest score first.
    fn list(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, LeaderboardError>;
}

/// In-memory board, optionally mirrored to a JSON file.
#[derive(Debug)]
pub struct LocalLeaderboard {
    entries: RwLock<Vec<LeaderboardEntry>>,
    capacity: usize,
    path: Option<PathBuf>,
}

impl LocalLeaderboard {
    pub fn in_memory(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            capacity: capacity.max(1),
            path: None,
        }
    }

    /// Opens a file-backed board. A missing file starts empty.
    pub fn open(path: impl AsRef<Path>, capacity: usize) -> Result<Self, LeaderboardError> {
        let path = path.as_ref().to_path_buf();
        let mut entries: Vec<LeaderboardEntry> = match std::fs::read_to_string(&path) {
            Ok(json) => serde_json::from_str(&json)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(err) => return Err(err.into()),
        };
        rank_entries(&mut entries);
        let capacity = capacity.max(1);
        entries.truncate(capacity);
        tracing::debug!("[leaderboard] loaded {} cached entries", entries.len());
        Ok(Self {
            entries: RwLock::new(entries),
            capacity,
            path: Some(path),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn persist(&self, entries: &[LeaderboardEntry]) -> Result<(), LeaderboardError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(entries)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

impl LeaderboardClient for LocalLeaderboard {
    fn submit(&self, entry: LeaderboardEntry) -> Result<(), LeaderboardError> {
        let mut entries = self.entries.write();
        entries.push(entry);
        rank_entries(&mut entries);
        entries.truncate(self.capacity);
        self.persist(&entries)
    }

    fn list(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        Ok(self.entries.read().iter().take(limit).cloned().collect())
    }
}

/// Uses `primary` while it works and the local cache when it does not.
///
/// Every submission is also written to the cache.
pub struct FallbackLeaderboard {
    primary: Box<dyn LeaderboardClient>,
    cache: LocalLeaderboard,
}

impl FallbackLeaderboard {
    pub fn new(primary: Box<dyn LeaderboardClient>, cache: LocalLeaderboard) -> Self {
        Self { primary, cache }
    }

    pub fn cache(&self) -> &LocalLeaderboard {
        &self.cache
    }
}

impl LeaderboardClient for FallbackLeaderboard {
    fn submit(&self, entry: LeaderboardEntry) -> Result<(), LeaderboardError> {
        if let Err(err) = self.primary.submit(entry.clone()) {
            tracing::warn!("[leaderboard] submit failed, cached locally: {err}");
        }
        self.cache.submit(entry)
    }

    fn list(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        match self.primary.list(limit) {
            Ok(entries) => Ok(entries),
            Err(err) => {
                tracing::warn!("[leaderboard] list failed, using cache: {err}");
                self.cache.list(limit)
            }
        }
    }
}

#[cfg(feature = "remote")]
pub use remote::RemoteLeaderboard;

#[cfg(feature = "remote")]
mod remote {
    use std::time::Duration;

    use serde::Serialize;

    use super::{LeaderboardClient, LeaderboardEntry, LeaderboardError, SessionStats};

    #[derive(Serialize)]
    struct SubmitRequest<'a> {
        name: &'a str,
        score: i64,
        stats: SessionStats,
    }

    /// Blocking HTTP client for `starmap-server`.
    pub struct RemoteLeaderboard {
        client: reqwest::blocking::Client,
        base_url: String,
    }

    impl RemoteLeaderboard {
        pub fn new(base_url: impl Into<String>) -> Result<Self, LeaderboardError> {
            let client = reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
                .map_err(remote_error)?;
            Ok(Self {
                client,
                base_url: base_url.into().trim_end_matches('/').to_string(),
            })
        }

        fn endpoint(&self) -> String {
            format!("{}/api/leaderboard", self.base_url)
        }
    }

    fn remote_error(err: reqwest::Error) -> LeaderboardError {
        LeaderboardError::Remote(err.to_string())
    }

    impl LeaderboardClient for RemoteLeaderboard {
        fn submit(&self, entry: LeaderboardEntry) -> Result<(), LeaderboardError> {
            let body = SubmitRequest {
                name: &entry.name,
                score: entry.score,
                stats: entry.stats,
            };
            self.client
                .post(self.endpoint())
                .json(&body)
                .send()
                .and_then(reqwest::blocking::Response::error_for_status)
                .map_err(remote_error)?;
            Ok(())
        }

        fn list(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
            self.client
                .get(self.endpoint())
                .query(&[("limit", limit)])
                .send()
                .and_then(reqwest::blocking::Response::error_for_status)
                .and_then(reqwest::blocking::Response::json)
                .map_err(remote_error)
        }
    }
}

/// Builds the client described by `config`.
///
/// Without a remote URL (or without the `remote` feature) this is the
/// local board alone.
pub fn client_from_config(config: &LeaderboardConfig) -> Result<Box<dyn LeaderboardClient>, LeaderboardError> {
    let local = match &config.cache_path {
        Some(path) => LocalLeaderboard::open(path, config.cache_capacity)?,
        None => LocalLeaderboard::in_memory(config.cache_capacity),
    };

    #[cfg(feature = "remote")]
    if let Some(url) = &config.remote_url {
        tracing::info!("[leaderboard] using remote service {url}");
        let remote = RemoteLeaderboard::new(url.clone())?;
        return Ok(Box::new(FallbackLeaderboard::new(Box::new(remote), local)));
    }

    #[cfg(not(feature = "remote"))]
    if config.remote_url.is_some() {
        tracing::warn!("[leaderboard] remote_url ignored, built without the remote feature");
    }

    Ok(Box::new(local))
}
