//! # Cache Index
//!
//! Persistent URL → [`CacheEntry`] mapping stored as a single JSON array.
//! The file is always rewritten in full through a `.part` sibling and a
//! rename, so readers never observe a partially written index.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::types::{CacheEntry, CacheResult, PART_FILE_SUFFIX};

#[derive(Debug)]
pub(crate) struct CacheIndex {
    path: PathBuf,
    entries: HashMap<String, CacheEntry>,
}

impl CacheIndex {
    /// Load the index at `path`. A missing file yields an empty index.
    pub(crate) fn load(path: impl Into<PathBuf>) -> CacheResult<Self> {
        let path = path.into();
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = ?path, "No cache index yet, starting empty");
                return Ok(Self {
                    path,
                    entries: HashMap::new(),
                });
            }
            Err(e) => return Err(e),
        };

        let list: Vec<CacheEntry> = serde_json::from_slice(&data).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Failed to parse cache index {}: {e}", path.display()),
            )
        })?;

        let entries = list
            .into_iter()
            .map(|entry| (entry.url.clone(), entry))
            .collect::<HashMap<_, _>>();
        debug!(path = ?path, count = entries.len(), "Loaded cache index");

        Ok(Self { path, entries })
    }

    /// Replace the in-memory entries with whatever is on disk now
    pub(crate) fn reload(&mut self) -> CacheResult<()> {
        self.entries = Self::load(&self.path)?.entries;
        Ok(())
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn get(&self, url: &str) -> Option<&CacheEntry> {
        self.entries.get(url)
    }

    pub(crate) fn insert(&mut self, entry: CacheEntry) {
        self.entries.insert(entry.url.clone(), entry);
    }

    pub(crate) fn remove(&mut self, url: &str) -> Option<CacheEntry> {
        self.entries.remove(url)
    }

    /// URLs of entries other than `url` whose artifact lives at `path`
    pub(crate) fn owners_of(&self, path: &Path, url: &str) -> Vec<String> {
        self.entries
            .values()
            .filter(|e| e.url != url && e.path == path)
            .map(|e| e.url.clone())
            .collect()
    }

    /// All entries ordered by URL
    pub(crate) fn sorted(&self) -> Vec<CacheEntry> {
        let mut list = self.entries.values().cloned().collect::<Vec<_>>();
        list.sort_by(|a, b| a.url.cmp(&b.url));
        list
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Rewrite the whole index through a temporary file and a rename
    pub(crate) fn save(&self) -> CacheResult<()> {
        let data = serde_json::to_vec_pretty(&self.sorted()).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Failed to serialize cache index: {e}"),
            )
        })?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(PART_FILE_SUFFIX);
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, &data)?;
        fs::rename(&tmp, &self.path)?;

        debug!(path = ?self.path, count = self.entries.len(), "Persisted cache index");
        Ok(())
    }
}
