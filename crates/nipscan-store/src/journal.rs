//! JSON journal with an in-memory dedupe index.

use crate::error::{Result, StoreError};
use nipscan_core::ConfirmedResult;
use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Read the journal at `path`.
///
/// A missing, unreadable or unparseable file yields an empty list.
pub async fn load_journal(path: &Path) -> Vec<ConfirmedResult> {
    match read_journal(path).await {
        JournalFile::Loaded(entries) => entries,
        JournalFile::Missing | JournalFile::Unreadable | JournalFile::Corrupt => Vec::new(),
    }
}

enum JournalFile {
    Missing,
    Unreadable,
    Corrupt,
    Loaded(Vec<ConfirmedResult>),
}

async fn read_journal(path: &Path) -> JournalFile {
    let contents = match fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No journal at {}, starting empty", path.display());
            return JournalFile::Missing;
        }
        Err(e) => {
            warn!("Cannot read journal {}: {}", path.display(), e);
            return JournalFile::Unreadable;
        }
    };

    match serde_json::from_str(&contents) {
        Ok(entries) => JournalFile::Loaded(entries),
        Err(e) => {
            warn!("Journal {} is not a valid result array: {}", path.display(), e);
            JournalFile::Corrupt
        }
    }
}

struct Journal {
    seen: HashSet<String>,
    entries: Vec<ConfirmedResult>,
}

/// Deduplicated store of confirmed results backed by the journal file.
///
/// All writes go through one async mutex, so concurrent [`ResultStore::try_add`]
/// calls never interleave their rewrites.
pub struct ResultStore {
    path: PathBuf,
    journal: Mutex<Journal>,
    /// Set when an unparseable journal could not be moved aside. Writing
    /// would destroy it, so every write fails until the file is dealt with.
    blocked: bool,
}

impl ResultStore {
    /// Open the store, rebuilding the in-memory set from the journal.
    ///
    /// A journal that exists but does not parse is renamed to
    /// `.{name}.corrupt` next to it before anything is written, so its
    /// records can still be recovered by hand.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut blocked = false;
        let loaded = match read_journal(&path).await {
            JournalFile::Loaded(entries) => entries,
            JournalFile::Missing | JournalFile::Unreadable => Vec::new(),
            JournalFile::Corrupt => {
                let aside = sibling_path(&path, "corrupt");
                match fs::rename(&path, &aside).await {
                    Ok(()) => warn!("Moved unparseable journal to {}", aside.display()),
                    Err(e) => {
                        error!(
                            "Cannot move unparseable journal {} aside ({}); results will not be written",
                            path.display(),
                            e
                        );
                        blocked = true;
                    }
                }
                Vec::new()
            }
        };

        let mut seen = HashSet::with_capacity(loaded.len());
        let mut entries = Vec::with_capacity(loaded.len());
        for result in loaded {
            if seen.insert(result.nip.clone()) {
                entries.push(result);
            }
        }

        info!(
            "Loaded {} confirmed results from {}",
            entries.len(),
            path.display()
        );

        Self {
            path,
            journal: Mutex::new(Journal { seen, entries }),
            blocked,
        }
    }

    /// Journal location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Add a result unless its identifier is already known.
    ///
    /// Returns `Ok(false)` with no side effects for a duplicate. Otherwise the
    /// result is inserted and the whole journal is rewritten before the lock
    /// is released. If the rewrite fails the result stays in memory and is
    /// persisted by the next successful write.
    pub async fn try_add(&self, result: ConfirmedResult) -> Result<bool> {
        let mut journal = self.journal.lock().await;

        if !journal.seen.insert(result.nip.clone()) {
            debug!("{} already in journal", result.nip);
            return Ok(false);
        }
        journal.entries.push(result);

        if self.blocked {
            return Err(StoreError::Blocked {
                path: self.path.display().to_string(),
            });
        }
        write_atomic(&self.path, &journal.entries).await?;
        Ok(true)
    }

    /// Whether an identifier is already stored.
    pub async fn contains(&self, nip: &str) -> bool {
        self.journal.lock().await.seen.contains(nip)
    }

    /// Number of stored results.
    pub async fn len(&self) -> usize {
        self.journal.lock().await.entries.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Stored results in discovery order.
    pub async fn snapshot(&self) -> Vec<ConfirmedResult> {
        self.journal.lock().await.entries.clone()
    }
}

/// Replace the journal with `entries` via a sibling temp file and a rename.
async fn write_atomic(path: &Path, entries: &[ConfirmedResult]) -> Result<()> {
    let json = serde_json::to_string_pretty(entries)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    let tmp = sibling_path(path, "tmp");
    fs::write(&tmp, json).await?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }

    debug!("Wrote {} results to {}", entries.len(), path.display());
    Ok(())
}

/// Hidden sibling of `path`: `/data/valid.json` -> `/data/.valid.json.{suffix}`.
fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or_else(|| OsStr::new("journal")));
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}
