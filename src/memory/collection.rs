//! Append-only record collections addressed by owner
//!
//! A collection document looks like `{ "<key>": [record, ...], "createdAt": ... }`.
//! Reads are a linear scan over every record; there is no per-owner index.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::document::DocumentFile;
use crate::error::Result;

/// A record that belongs to exactly one user
pub trait OwnedRecord: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// Top-level key holding the record array in the collection document
    const KEY: &'static str;

    fn id(&self) -> &str;

    fn owner(&self) -> &str;

    /// Timestamp used for newest-first ordering
    fn recency(&self) -> DateTime<Utc>;
}

/// Parsed contents of a collection document
struct Loaded<T> {
    records: Vec<T>,
    created_at: Value,
}

/// File-backed collection of owned records
pub struct Collection<T> {
    doc: DocumentFile,
    _marker: PhantomData<fn() -> T>,
}

impl<T: OwnedRecord> Collection<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            doc: DocumentFile::new(path),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        self.doc.path()
    }

    /// Create the document with an empty collection if it is absent.
    /// Returns true when a new document was written.
    pub async fn ensure(&self) -> Result<bool> {
        let _guard = self.doc.lock().await;
        if self.doc.exists().await? {
            return Ok(false);
        }
        self.store(&Loaded::<T> {
            records: Vec::new(),
            created_at: Value::String(Utc::now().to_rfc3339()),
        })
        .await?;
        info!("Created empty {} collection at {}", T::KEY, self.path().display());
        Ok(true)
    }

    /// Append a record built from a freshly assigned id
    pub async fn append_with<F>(&self, build: F) -> Result<T>
    where
        F: FnOnce(String) -> T,
    {
        let _guard = self.doc.lock().await;
        let mut loaded = self.load().await?;

        let id = next_id(&loaded.records, Utc::now());
        let record = build(id);
        loaded.records.push(record.clone());
        self.store(&loaded).await?;

        debug!("Appended {} record {} for {}", T::KEY, record.id(), record.owner());
        Ok(record)
    }

    /// Records owned by `owner`, newest first, optionally truncated
    pub async fn query_by_owner(&self, owner: &str, limit: Option<usize>) -> Result<Vec<T>> {
        let _guard = self.doc.lock().await;
        let loaded = self.load().await?;

        let mut matching: Vec<T> = loaded
            .records
            .into_iter()
            .filter(|r| r.owner() == owner)
            .collect();
        matching.sort_by(newest_first);
        if let Some(limit) = limit {
            matching.truncate(limit);
        }
        Ok(matching)
    }

    /// Number of records owned by `owner`
    pub async fn count_by_owner(&self, owner: &str) -> Result<usize> {
        let _guard = self.doc.lock().await;
        let loaded = self.load().await?;
        Ok(loaded.records.iter().filter(|r| r.owner() == owner).count())
    }

    /// Remove every record owned by `owner`. Returns how many were removed.
    pub async fn delete_by_owner(&self, owner: &str) -> Result<usize> {
        let _guard = self.doc.lock().await;
        let mut loaded = self.load().await?;

        let before = loaded.records.len();
        loaded.records.retain(|r| r.owner() != owner);
        let removed = before - loaded.records.len();

        if removed > 0 {
            self.store(&loaded).await?;
        }
        Ok(removed)
    }

    async fn load(&self) -> Result<Loaded<T>> {
        let Some(mut map) = self.doc.read::<Map<String, Value>>().await? else {
            return Ok(Loaded {
                records: Vec::new(),
                created_at: Value::String(Utc::now().to_rfc3339()),
            });
        };

        let raw = map.remove(T::KEY).ok_or_else(|| {
            self.doc
                .corrupt(<serde_json::Error as serde::de::Error>::missing_field(T::KEY))
        })?;
        let records: Vec<T> = serde_json::from_value(raw).map_err(|e| self.doc.corrupt(e))?;
        let created_at = map.remove("createdAt").unwrap_or(Value::Null);

        Ok(Loaded { records, created_at })
    }

    async fn store(&self, loaded: &Loaded<T>) -> Result<()> {
        let records = serde_json::to_value(&loaded.records).map_err(|e| self.doc.corrupt(e))?;
        let mut map = Map::new();
        map.insert(T::KEY.to_string(), records);
        map.insert("createdAt".to_string(), loaded.created_at.clone());
        self.doc.write(&Value::Object(map)).await
    }
}

/// Millisecond-clock id, bumped past the largest existing id so that ids
/// stay unique and increasing even when the clock has not moved.
fn next_id<T: OwnedRecord>(records: &[T], now: DateTime<Utc>) -> String {
    let clock = now.timestamp_millis().max(0) as u64;
    let last = records
        .iter()
        .filter_map(|r| r.id().parse::<u64>().ok())
        .max();
    match last {
        Some(last) if last >= clock => (last + 1).to_string(),
        _ => clock.to_string(),
    }
}

/// Numeric ids compare by length first, then lexically
fn compare_ids(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn newest_first<T: OwnedRecord>(a: &T, b: &T) -> Ordering {
    b.recency()
        .cmp(&a.recency())
        .then_with(|| compare_ids(b.id(), a.id()))
}
