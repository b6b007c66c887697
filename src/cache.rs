//! # Cache Store
//! Durable JSON persistence for the two independent caches: the global daily
//! digest and the per-topic headline search memo. Both are keyed by calendar
//! date (process-local clock) and written atomically via tmp + rename.
//!
//! I/O faults never propagate: a failed read is a miss, a failed write is
//! dropped with a warning. Concurrent writers are last-writer-wins, which is
//! acceptable at ≤ one daily write and ≤ one write per topic per day.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::analysis::NewsAnalysis;

/// One raw headline hit, as served by `/search` and stored per topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headline {
    pub headline: String,
    pub source: String,
    pub url: String,
}

/// Per-topic memo of one day's headline search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicEntry {
    pub date: String,
    pub searched_at: String,
    pub headlines: Vec<Headline>,
}

/// One slot of the daily digest: an analyzed headline, or the error that
/// prevented its analysis. Exactly one of `analysis`/`error` is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyItem {
    pub rank: u32,
    pub headline: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<NewsAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The whole-day digest record. Rebuilt from scratch, never merged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: String,
    pub fetched_at: String,
    pub count: usize,
    pub news: Vec<DailyItem>,
}

impl DailyRecord {
    pub fn is_current(&self) -> bool {
        self.date == today()
    }
}

/// Current calendar day, process-local clock.
pub fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

/// Topic keys are matched case-insensitively and whitespace-trimmed.
pub fn normalize_topic(topic: &str) -> String {
    topic.trim().to_lowercase()
}

pub struct CacheStore {
    daily_path: PathBuf,
    topic_path: PathBuf,
}

impl CacheStore {
    /// Both cache files live under `dir`, created best-effort.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let _ = fs::create_dir_all(&dir);
        Self {
            daily_path: dir.join("daily_news_cache.json"),
            topic_path: dir.join("topic_search_cache.json"),
        }
    }

    /// The stored daily record regardless of date; callers decide staleness
    /// policy (the HTTP layer distinguishes absent from stale).
    pub fn read_daily(&self) -> Option<DailyRecord> {
        read_json(&self.daily_path)
    }

    /// Full overwrite of the daily record. Best-effort.
    pub fn write_daily(&self, record: &DailyRecord) {
        if let Err(e) = write_json(&self.daily_path, record) {
            warn!(error = %e, path = %self.daily_path.display(), "daily cache write failed");
        }
    }

    /// Today's entry for `topic`, or `None`. An entry dated before today is a
    /// miss but stays on disk until its key is rewritten (lazy expiry).
    pub fn read_topic(&self, topic: &str) -> Option<TopicEntry> {
        let map: HashMap<String, TopicEntry> = read_json(&self.topic_path)?;
        let entry = map.get(&normalize_topic(topic))?;
        if entry.date == today() {
            Some(entry.clone())
        } else {
            None
        }
    }

    /// Upsert only `topic`'s key; stale sibling keys are left untouched.
    pub fn write_topic(&self, topic: &str, entry: &TopicEntry) {
        let mut map: HashMap<String, TopicEntry> =
            read_json(&self.topic_path).unwrap_or_default();
        map.insert(normalize_topic(topic), entry.clone());
        if let Err(e) = write_json(&self.topic_path, &map) {
            warn!(error = %e, path = %self.topic_path.display(), "topic cache write failed");
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    let data = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(error = %e, path = %path.display(), "cache read failed");
            return None;
        }
    };
    match serde_json::from_str(&data) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(error = %e, path = %path.display(), "cache parse failed");
            None
        }
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let mut f = fs::File::create(&tmp)?;
    f.write_all(json.as_bytes())?;
    fs::rename(tmp, path)?;
    Ok(())
}
