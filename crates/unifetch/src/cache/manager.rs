//! # Cache Manager
//!
//! Stages downloads into temporary files inside the cache root and commits
//! them atomically, keeping the [`CacheIndex`](super::index::CacheIndex) in
//! step. A single lock serializes the bookkeeping; it is never held while
//! bytes are transferred. The index is re-read from disk under that lock
//! before every lookup and commit, so managers opened on the same root see
//! each other's entries.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::index::CacheIndex;
use super::types::{
    CacheConfig, CacheEntry, CacheResult, INDEX_FILE_NAME, PART_FILE_SUFFIX, StagedDownload,
    unix_now,
};
use crate::paths::sanitize_filename;

/// Appended to artifact names that would land on the index or look staged
const RESERVED_NAME_SUFFIX: &str = ".cached";

/// On-disk name for an artifact called `filename`. Names that clash with
/// the index, its temporary file or the staging files are moved aside.
fn artifact_file_name(filename: &str) -> String {
    let lower = filename.to_ascii_lowercase();
    if lower == INDEX_FILE_NAME || lower.ends_with(PART_FILE_SUFFIX) {
        format!("{filename}{RESERVED_NAME_SUFFIX}")
    } else {
        filename.to_string()
    }
}

/// Disk cache of HTTP artifacts keyed by source URL
#[derive(Debug)]
pub struct CacheManager {
    root: PathBuf,
    index: Mutex<CacheIndex>,
}

impl CacheManager {
    /// Open (or create) the cache rooted at the configured directory and
    /// load its index.
    pub fn new(config: &CacheConfig) -> CacheResult<Self> {
        let root = config.disk_cache_path.clone();
        fs::create_dir_all(&root)?;

        let index = CacheIndex::load(config.index_path())?;
        info!(root = ?root, entries = index.len(), "Cache ready");

        Ok(Self {
            root,
            index: Mutex::new(index),
        })
    }

    /// Root directory of the cache
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the index file
    pub fn index_path(&self) -> PathBuf {
        self.index.lock().path().to_path_buf()
    }

    /// Take the lock and bring the index up to date with the file on disk.
    /// A missing file empties the index; an unreadable one keeps the
    /// in-memory copy.
    fn synced(&self) -> MutexGuard<'_, CacheIndex> {
        let mut index = self.index.lock();
        if let Err(e) = index.reload() {
            warn!(path = ?index.path(), error = %e, "Failed to re-read cache index, using in-memory copy");
        }
        index
    }

    /// Look up the entry for `url`
    pub fn get(&self, url: &str) -> Option<CacheEntry> {
        self.synced().get(url).cloned()
    }

    /// Snapshot of every entry, ordered by URL
    pub fn entries(&self) -> Vec<CacheEntry> {
        self.synced().sorted()
    }

    /// Open the cached artifact of `entry` for reading. Fails with
    /// `NotFound` if the file was removed behind the index's back.
    pub fn open_existing(&self, entry: &CacheEntry) -> CacheResult<File> {
        File::open(&entry.path)
    }

    /// Allocate a fresh, uniquely named staging file in the cache root
    pub fn begin_staging(&self, url: &str) -> CacheResult<StagedDownload> {
        let _guard = self.index.lock();

        let path = self
            .root
            .join(format!("{}{PART_FILE_SUFFIX}", Uuid::new_v4()));
        let file = File::create_new(&path)?;
        debug!(url = %url, path = ?path, "Staging cache download");

        Ok(StagedDownload { path, file })
    }

    /// Remove a staging file that will never be committed
    pub fn discard_staging(&self, staging_path: &Path) {
        if let Err(e) = fs::remove_file(staging_path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(path = ?staging_path, error = %e, "Failed to remove staging file");
            }
        }
    }

    /// Promote a staged file to `<root>/<filename>` and record it in the
    /// index, which is then persisted in full. A filename equal to the
    /// index's, or ending in the staging suffix, is stored with an extra
    /// `.cached` suffix; the entry keeps the original display name.
    ///
    /// If the first rename fails, whatever occupies the final path is
    /// removed and the rename is attempted once more. Entries of other URLs
    /// that pointed at the replaced file are dropped from the index.
    pub fn commit(
        &self,
        url: &str,
        staging_path: &Path,
        filename: &str,
        etag: &str,
        last_modified: &str,
        size: u64,
    ) -> CacheResult<CacheEntry> {
        let Some(filename) = sanitize_filename(filename) else {
            self.discard_staging(staging_path);
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Unusable cache filename: {filename:?}"),
            ));
        };

        let mut index = self.synced();
        let final_path = self.root.join(artifact_file_name(&filename));

        if let Err(first) = fs::rename(staging_path, &final_path) {
            warn!(
                from = ?staging_path,
                to = ?final_path,
                error = %first,
                "Failed to promote staged file, retrying after removing destination"
            );
            let _ = fs::remove_file(&final_path);
            if let Err(second) = fs::rename(staging_path, &final_path) {
                debug!(error = %second, "Retry of staged file promotion failed");
                self.discard_staging(staging_path);
                return Err(first);
            }
        }

        for displaced in index.owners_of(&final_path, url) {
            warn!(
                url = %displaced,
                path = ?final_path,
                "Cached file replaced by another URL, dropping its entry"
            );
            index.remove(&displaced);
        }

        let entry = CacheEntry {
            url: url.to_string(),
            path: final_path,
            filename,
            etag: etag.to_string(),
            last_modified: last_modified.to_string(),
            size,
            completed: true,
            updated_at: unix_now(),
        };
        index.insert(entry.clone());
        index.save()?;

        info!(url = %url, path = ?entry.path, size, "Committed cache entry");
        Ok(entry)
    }
}
