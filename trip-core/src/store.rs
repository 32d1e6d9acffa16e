//! Local persistence for the trip collection.
//!
//! The whole collection lives under a single key of a flat key-value store
//! and is rewritten in full on every mutation.

use anyhow::{Context, Result, anyhow, bail};
use directories::ProjectDirs;
use serde::Serialize;
use serde_json::Value;
use std::{
    collections::BTreeMap,
    fmt::Debug,
    fs,
    path::{Path, PathBuf},
};

use crate::model::Trip;

/// Key holding the serialized trip collection.
pub const TRIPS_KEY: &str = "trips";

/// Current layout version written by [`TripStore::save_all`].
pub const STORE_VERSION: u64 = 1;

/// Flat string-to-string store, the local-storage equivalent.
pub trait KeyValueStore: Send + Sync + Debug {
    fn get(&self, key: &str) -> Option<String>;

    /// Replace the value for `key`. A single key's value is written atomically.
    fn set(&mut self, key: &str, value: String) -> Result<()>;
}

/// In-memory store, used for tests and throwaway sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    entries: BTreeMap<String, String>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// Store kept as one JSON object in a file on disk.
///
/// A missing or unreadable file behaves like an empty store.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    path: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store file in the platform data directory.
    pub fn default_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "trip-planner", "trip-cli")
            .ok_or_else(|| anyhow!("Could not determine platform data directory"))?;

        Ok(dirs.data_dir().join("store.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> BTreeMap<String, String> {
        let Ok(contents) = fs::read_to_string(&self.path) else {
            return BTreeMap::new();
        };

        match serde_json::from_str(&contents) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), "Ignoring unreadable store file: {err}");
                BTreeMap::new()
            }
        }
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Option<String> {
        self.read_entries().remove(key)
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        let mut entries = self.read_entries();
        entries.insert(key.to_string(), value);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create store directory: {}", parent.display())
            })?;
        }

        let data = serde_json::to_string_pretty(&entries).context("Failed to serialize store")?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, data)
            .with_context(|| format!("Failed to write store file: {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace store file: {}", self.path.display()))?;

        Ok(())
    }
}

#[derive(Serialize)]
struct StoredTrips<'a> {
    version: u64,
    trips: &'a [Trip],
}

/// The trip collection on top of a [`KeyValueStore`].
#[derive(Debug)]
pub struct TripStore {
    kv: Box<dyn KeyValueStore>,
}

impl TripStore {
    pub fn new(kv: Box<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryKeyValueStore::new()))
    }

    /// Load every stored trip. Absent or undecodable data yields an empty list.
    pub fn load_all(&self) -> Vec<Trip> {
        let Some(raw) = self.kv.get(TRIPS_KEY) else {
            return Vec::new();
        };

        match decode_trips(&raw) {
            Ok(trips) => trips,
            Err(err) => {
                tracing::warn!("Stored trips could not be decoded, starting empty: {err:#}");
                Vec::new()
            }
        }
    }

    /// Overwrite the stored collection.
    pub fn save_all(&mut self, trips: &[Trip]) -> Result<()> {
        let data = serde_json::to_string(&StoredTrips { version: STORE_VERSION, trips })
            .context("Failed to serialize trips")?;

        self.kv.set(TRIPS_KEY, data)?;
        tracing::debug!(count = trips.len(), "Saved trips");
        Ok(())
    }

    pub fn append(&mut self, trip: Trip) -> Result<()> {
        let mut trips = self.load_all();
        trips.push(trip);
        self.save_all(&trips)
    }

    /// Remove the trip with `id`. Returns `false` (and writes nothing new)
    /// when no such trip exists.
    pub fn remove(&mut self, id: u64) -> Result<bool> {
        let mut trips = self.load_all();
        let before = trips.len();
        trips.retain(|trip| trip.id != id);

        if trips.len() == before {
            return Ok(false);
        }

        self.save_all(&trips)?;
        Ok(true)
    }

    /// Raw stored value, as written by the last save.
    pub fn raw(&self) -> Option<String> {
        self.kv.get(TRIPS_KEY)
    }
}

/// Accepts the versioned envelope and the legacy bare array.
fn decode_trips(raw: &str) -> Result<Vec<Trip>> {
    let value: Value = serde_json::from_str(raw).context("Stored trips are not valid JSON")?;

    let records = match value {
        Value::Array(records) => records,
        Value::Object(mut map) => {
            let version = map.get("version").and_then(Value::as_u64);
            if version != Some(STORE_VERSION) {
                bail!("Unsupported store version: {version:?}");
            }

            match map.remove("trips") {
                Some(Value::Array(records)) => records,
                None => Vec::new(),
                Some(_) => bail!("Stored trips are not a list"),
            }
        }
        _ => bail!("Unexpected stored trips layout"),
    };

    Ok(decode_records(records))
}

/// Decode each record on its own; a broken record is dropped, not the list.
fn decode_records(records: Vec<Value>) -> Vec<Trip> {
    records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value(record) {
            Ok(trip) => Some(trip),
            Err(err) => {
                tracing::warn!(index, "Skipping unreadable stored trip: {err}");
                None
            }
        })
        .collect()
}
