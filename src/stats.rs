//! Aggregate play statistics kept in a flat key-value store.
//!
//! Records are stored as JSON strings under a fixed key per game. Loading never
//! fails: a missing, unreadable or garbled record falls back to defaults field
//! by field.
use chrono::{SecondsFormat, Utc};
use log::warn;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const MATCH3_STATS_KEY: &str = "match3-stats";
pub const STACK_STATS_KEY: &str = "sheep-stats";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("stats store I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("stats store is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A string key-value store read and written one whole record at a time.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;
}

/// In-process store, mostly for tests and one-off sessions.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// Store backed by one JSON object file mapping keys to string values.
///
/// A missing file reads as an empty store. Writing over a file that does not
/// hold a JSON object replaces it.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<Map<String, Value>, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str::<Value>(&text)? {
            Value::Object(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_map()?.get(key).and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }))
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        let mut map = match self.read_map() {
            Ok(map) => map,
            Err(StoreError::Json(e)) => {
                warn!("replacing corrupt stats file {}: {}", self.path.display(), e);
                Map::new()
            }
            Err(e) => return Err(e),
        };
        map.insert(key.to_string(), Value::String(value));
        let text = serde_json::to_string_pretty(&Value::Object(map))?;
        fs::write(&self.path, text)?;
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Match3Stats {
    pub best_score: u32,
    pub total_cleared: u32,
    pub attempts: u32,
    pub last_play: Option<String>,
}

/// Stack-game statistics. `best_moves` is `None` until a game is recorded with
/// a non-zero move count; lower is better.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StackStats {
    pub best_moves: Option<u32>,
    pub total_clears: u32,
    pub attempts: u32,
    pub last_play: Option<String>,
}

/// Reads a record as a JSON object, or `None` if it is absent or malformed.
fn load_record<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> Option<Map<String, Value>> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!("could not read {}: {}", key, e);
            return None;
        }
    };
    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => {
            warn!("discarding {}: not a JSON object", key);
            None
        }
        Err(e) => {
            warn!("discarding {}: {}", key, e);
            None
        }
    }
}

/// Lenient counter: numbers and numeric strings are accepted, anything else
/// (missing, negative, NaN, objects) is 0. Fractions truncate toward zero.
fn counter(record: &Map<String, Value>, field: &str) -> u32 {
    let value = match record.get(field) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    match value {
        Some(v) if v.is_finite() && v >= 0.0 => v.min(f64::from(u32::MAX)) as u32,
        _ => 0,
    }
}

fn timestamp(record: &Map<String, Value>, field: &str) -> Option<String> {
    match record.get(field) {
        Some(Value::String(s)) => Some(s.clone()),
        _ => None,
    }
}

pub fn load_match3_stats<S: KeyValueStore + ?Sized>(store: &S) -> Match3Stats {
    let Some(record) = load_record(store, MATCH3_STATS_KEY) else {
        return Match3Stats::default();
    };
    Match3Stats {
        best_score: counter(&record, "bestScore"),
        total_cleared: counter(&record, "totalCleared"),
        attempts: counter(&record, "attempts"),
        last_play: timestamp(&record, "lastPlay"),
    }
}

pub fn load_stack_stats<S: KeyValueStore + ?Sized>(store: &S) -> StackStats {
    let Some(record) = load_record(store, STACK_STATS_KEY) else {
        return StackStats::default();
    };
    // Only a real finite number counts as a best; strings do not.
    let best_moves = match record.get("bestMoves") {
        Some(Value::Number(n)) => n
            .as_f64()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v.min(f64::from(u32::MAX)) as u32),
        _ => None,
    };
    StackStats {
        best_moves,
        total_clears: counter(&record, "totalClears"),
        attempts: counter(&record, "attempts"),
        last_play: timestamp(&record, "lastPlay"),
    }
}

fn save<S: KeyValueStore + ?Sized, R: Serialize>(
    store: &mut S,
    key: &str,
    record: &R,
) -> Result<(), StoreError> {
    store.set(key, serde_json::to_string(record)?)
}

/// Folds a finished match-3 game into the stored totals and writes them back.
pub fn record_match3<S: KeyValueStore + ?Sized>(
    store: &mut S,
    score: u32,
    cleared: u32,
    played_at: impl Into<String>,
) -> Result<Match3Stats, StoreError> {
    let current = load_match3_stats(&*store);
    let updated = Match3Stats {
        best_score: current.best_score.max(score),
        total_cleared: current.total_cleared.saturating_add(cleared),
        attempts: current.attempts.saturating_add(1),
        last_play: Some(played_at.into()),
    };
    save(store, MATCH3_STATS_KEY, &updated)?;
    Ok(updated)
}

/// Folds a finished stack game into the stored totals and writes them back.
///
/// A game with zero moves keeps the previous best.
pub fn record_stack<S: KeyValueStore + ?Sized>(
    store: &mut S,
    moves: u32,
    cleared_triples: u32,
    played_at: impl Into<String>,
) -> Result<StackStats, StoreError> {
    let current = load_stack_stats(&*store);
    let best_moves = match (current.best_moves, moves) {
        (best, 0) => best,
        (Some(best), m) => Some(best.min(m)),
        (None, m) => Some(m),
    };
    let updated = StackStats {
        best_moves,
        total_clears: current.total_clears.saturating_add(cleared_triples),
        attempts: current.attempts.saturating_add(1),
        last_play: Some(played_at.into()),
    };
    save(store, STACK_STATS_KEY, &updated)?;
    Ok(updated)
}

/// Current UTC time as RFC 3339 with milliseconds and a `Z` suffix, for
/// `played_at`. Same shape as JavaScript's `Date::toISOString`.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
