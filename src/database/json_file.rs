//! JSON file storage
//!
//! Keeps every key in one JSON object on disk. The file is read once on
//! open and rewritten whole on every change.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::{debug, info};

use super::kv_store::{KeyValueStore, StoreError, StoreResult};

/// File-backed key-value store
#[derive(Debug)]
pub struct JsonFileStore {
    file_path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Open the store at `file_path`, creating an empty one if needed
    pub fn open(file_path: impl Into<PathBuf>) -> StoreResult<Self> {
        let file_path = file_path.into();

        let entries = if file_path.exists() {
            let contents = fs::read_to_string(&file_path)?;
            if contents.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&contents).map_err(StoreError::CorruptFile)?
            }
        } else {
            info!(path = %file_path.display(), "Creating new store file");
            if let Some(parent) = file_path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            let empty = BTreeMap::new();
            write_entries(&file_path, &empty)?;
            empty
        };

        info!(path = %file_path.display(), keys = entries.len(), "Store file ready");

        Ok(Self {
            file_path,
            entries: RwLock::new(entries),
        })
    }

}

// Write to a sibling temp file, then rename over the original
fn write_entries(path: &Path, entries: &BTreeMap<String, String>) -> StoreResult<()> {
    let json_data = serde_json::to_string_pretty(entries).map_err(|e| StoreError::Encode {
        key: path.display().to_string(),
        source: e,
    })?;
    let tmp_path = path.with_extension("json.tmp");

    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(json_data.as_bytes())?;
    file.sync_all()?;
    fs::rename(&tmp_path, path)?;

    debug!(path = %path.display(), keys = entries.len(), "Store file written");
    Ok(())
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> StoreResult<()> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;

        // Memory only changes once the file has it
        let mut updated = entries.clone();
        updated.insert(key.to_string(), value);
        write_entries(&self.file_path, &updated)?;
        *entries = updated;
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        if !entries.contains_key(key) {
            return Ok(());
        }

        let mut updated = entries.clone();
        updated.remove(key);
        write_entries(&self.file_path, &updated)?;
        *entries = updated;
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.keys().cloned().collect())
    }
}
