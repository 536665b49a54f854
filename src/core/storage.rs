use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::error::{GlowupError, Result};

/// Per-device key/value persistence. Values are strings; structured values
/// are stored as JSON text.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;

    /// Durable once this returns `Ok`.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    fn remove(&mut self, key: &str) -> Result<()>;

    fn keys(&self) -> Vec<String>;

    /// Pick up writes made through other handles since the last read.
    fn reload(&mut self) -> Result<()> {
        Ok(())
    }

    /// Missing or unparsable values read as zero.
    fn get_u32(&self, key: &str) -> u32 {
        match self.get(key) {
            None => 0,
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!(key, value = %raw, "stored counter is not a non-negative integer, reading as 0");
                0
            }),
        }
    }

    fn set_u32(&mut self, key: &str, value: u32) -> Result<()> {
        self.set(key, &value.to_string())
    }

    /// Missing values are `None`; corrupt JSON is logged and also treated as
    /// missing so callers fall back to their defaults.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "stored value is not valid JSON for its type, ignoring");
                None
            }
        }
    }

    fn set_json<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        let encoded = serde_json::to_string(value)?;
        self.set(key, &encoded)
    }
}

/// JSON-file backed store. Every mutation re-reads the file, applies the
/// change and writes the whole map back, so keys written by other handles
/// are kept.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open (or create) the store at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let entries = read_entries(&path)?;
        debug!(path = %path.display(), keys = entries.len(), "opened store");
        Ok(Self { path, entries })
    }

    /// Open the store in the default config directory.
    pub fn open_default() -> Result<Self> {
        let data_dir = dirs::config_dir()
            .ok_or_else(|| GlowupError::Config("Could not find config directory".to_string()))?
            .join("glowup");

        Self::open(data_dir.join("storage.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the store. Writes are already on disk, so nothing is
    /// written here.
    pub fn close(self) -> Result<()> {
        debug!(path = %self.path.display(), "closed store");
        Ok(())
    }

    /// Applies `change` to the current file contents and writes them back.
    /// Memory is only replaced once the write succeeded.
    fn update<F>(&mut self, change: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut entries = read_entries(&self.path)?;
        change(&mut entries);
        write_entries(&self.path, &entries)?;
        self.entries = entries;
        Ok(())
    }
}

fn read_entries(path: &Path) -> Result<BTreeMap<String, String>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(&content)
        .map_err(|e| GlowupError::Storage(format!("{} is not a valid store file: {}", path.display(), e)))
}

fn write_entries(path: &Path, entries: &BTreeMap<String, String>) -> Result<()> {
    let content = serde_json::to_string_pretty(entries)?;
    let tmp = path.with_extension("json.tmp");

    std::fs::write(&tmp, content)
        .and_then(|_| std::fs::rename(&tmp, path))
        .map_err(|e| GlowupError::Storage(format!("failed to write {}: {}", path.display(), e)))
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })?;
        debug!(key, "stored value");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.update(|entries| {
            entries.remove(key);
        })?;
        debug!(key, "removed value");
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn reload(&mut self) -> Result<()> {
        self.entries = read_entries(&self.path)?;
        Ok(())
    }
}

/// Volatile store, mostly for tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    entries: BTreeMap<String, String>,
    read_only: bool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that rejects every write, standing in for disabled or full
    /// device storage.
    pub fn read_only() -> Self {
        Self {
            entries: BTreeMap::new(),
            read_only: true,
        }
    }

    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            read_only: false,
        }
    }

    fn check_writable(&self) -> Result<()> {
        if self.read_only {
            return Err(GlowupError::Storage("store is read-only".to_string()));
        }
        Ok(())
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.check_writable()?;
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.check_writable()?;
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let mut store = FileStore::open(&path).unwrap();
        store.set("waterGlasses", "4").unwrap();
        store.set_json("completedExercises", &vec![1, 2]).unwrap();
        store.close().unwrap();

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get_u32("waterGlasses"), 4);
        assert_eq!(store.get_json::<Vec<u32>>("completedExercises"), Some(vec![1, 2]));
    }

    #[test]
    fn test_file_store_writes_immediately() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");

        let mut store = FileStore::open(&path).unwrap();
        store.set("healthyMeals", "2").unwrap();

        // a second handle sees the write without close()
        let other = FileStore::open(&path).unwrap();
        assert_eq!(other.get("healthyMeals").as_deref(), Some("2"));
    }

    #[test]
    fn test_writes_keep_keys_from_other_handles() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");

        let mut first = FileStore::open(&path).unwrap();
        let mut second = FileStore::open(&path).unwrap();
        second.set_u32("waterGlasses", 1).unwrap();
        second.close().unwrap();

        first.set("scheduledReminders", "[]").unwrap();
        assert_eq!(first.get_u32("waterGlasses"), 1);
        first.close().unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get_u32("waterGlasses"), 1);
        assert_eq!(reopened.get("scheduledReminders").as_deref(), Some("[]"));
    }

    #[test]
    fn test_close_does_not_rewrite_stale_copy() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");

        let stale = FileStore::open(&path).unwrap();
        let mut other = FileStore::open(&path).unwrap();
        other.set("healthyMeals", "3").unwrap();
        stale.close().unwrap();

        assert_eq!(FileStore::open(&path).unwrap().get_u32("healthyMeals"), 3);
    }

    #[test]
    fn test_reload_sees_other_handles() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");

        let mut watcher = FileStore::open(&path).unwrap();
        let mut other = FileStore::open(&path).unwrap();
        other.set("glowup_favorites", "[2]").unwrap();

        assert!(watcher.get("glowup_favorites").is_none());
        watcher.reload().unwrap();
        assert_eq!(watcher.get_json::<Vec<u32>>("glowup_favorites"), Some(vec![2]));
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(FileStore::open(&path), Err(GlowupError::Storage(_))));
    }

    #[test]
    fn test_remove() {
        let dir = TempDir::new().unwrap();
        let mut store = FileStore::open(dir.path().join("storage.json")).unwrap();
        store.set("a", "1").unwrap();
        store.remove("a").unwrap();
        store.remove("missing").unwrap();
        assert!(store.get("a").is_none());
        assert!(store.keys().is_empty());
    }

    #[test]
    fn test_garbage_counter_reads_as_zero() {
        let store = InMemoryStore::with_entries([("waterGlasses", "lots"), ("healthyMeals", "-3")]);
        assert_eq!(store.get_u32("waterGlasses"), 0);
        assert_eq!(store.get_u32("healthyMeals"), 0);
        assert_eq!(store.get_u32("unhealthyMeals"), 0);
    }

    #[test]
    fn test_corrupt_json_reads_as_missing() {
        let store = InMemoryStore::with_entries([("glowup_favorites", "[1, 2")]);
        assert_eq!(store.get_json::<Vec<u32>>("glowup_favorites"), None);
    }

    #[test]
    fn test_read_only_store_rejects_writes() {
        let mut store = InMemoryStore::read_only();
        assert!(matches!(store.set("a", "1"), Err(GlowupError::Storage(_))));
        assert!(store.get("a").is_none());
    }
}
