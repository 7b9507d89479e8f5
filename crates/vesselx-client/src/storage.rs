use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::warn;

/// Local persisted key/value state: session, theme, sound preference. The
/// browser analog is `localStorage`; native hosts back it with a file.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// Volatile store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    map: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.map.lock().unwrap().insert(key.into(), value.into());
    }

    fn remove(&self, key: &str) {
        self.map.lock().unwrap().remove(key);
    }
}

/// File-backed store: one JSON object per file, rewritten on every mutation.
/// Write failures are logged and swallowed — losing a preference write must
/// never break the action that triggered it.
pub struct FileStore {
    path: PathBuf,
    cache: Mutex<HashMap<String, String>>,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cache = std::fs::read_to_string(&path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        Self {
            path,
            cache: Mutex::new(cache),
        }
    }

    fn flush(&self, map: &HashMap<String, String>) {
        match serde_json::to_string_pretty(map) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&self.path, json) {
                    warn!("failed to persist state to {}: {}", self.path.display(), e);
                }
            }
            Err(e) => warn!("failed to serialize state: {}", e),
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.cache.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut map = self.cache.lock().unwrap();
        map.insert(key.into(), value.into());
        self.flush(&map);
    }

    fn remove(&self, key: &str) {
        let mut map = self.cache.lock().unwrap();
        map.remove(key);
        self.flush(&map);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k"), None);
        store.set("k", "v");
        assert_eq!(store.get("k").as_deref(), Some("v"));
        store.remove("k");
        assert_eq!(store.get("k"), None);
    }

    #[test]
    fn file_store_survives_reopen() {
        let path = std::env::temp_dir().join(format!("vesselx-store-{}.json", uuid::Uuid::new_v4()));
        {
            let store = FileStore::open(&path);
            store.set("vesselx.theme", "dark");
        }
        let store = FileStore::open(&path);
        assert_eq!(store.get("vesselx.theme").as_deref(), Some("dark"));
        let _ = std::fs::remove_file(&path);
    }
}
