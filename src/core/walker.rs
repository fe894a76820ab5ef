//! TreeWalker — depth-first enumeration of `FileMeta` beneath a root.
//!
//! Two-pass (count, then classify) and single-threaded: per-file work here
//! is a stat plus a 1 KiB read, not something worth spreading across a
//! thread pool the way the heavier hashing tiers downstream are.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use thiserror::Error;
use walkdir::WalkDir;

use super::{normalize_extensions, sniff, FileMeta, ProgressCallback, ProgressEvent, Stage};

#[derive(Debug, Error)]
pub enum WalkError {
    #[error("root does not exist or is not a directory: {0}")]
    RootMissing(String),
}

const PROGRESS_STRIDE: usize = 100;

pub struct TreeWalker;

impl TreeWalker {
    /// Enumerates regular files beneath `root`, canonicalizing first.
    /// Emits `{stage: Classify}` progress every 100 files and once more at
    /// completion. `cancel`, when set, stops the walk after the file in
    /// flight and returns everything collected so far — not an error.
    pub fn walk(
        root: &Path,
        cancel: &AtomicBool,
        progress: Option<&ProgressCallback>,
    ) -> Result<Vec<FileMeta>, WalkError> {
        let canonical = root
            .canonicalize()
            .map_err(|_| WalkError::RootMissing(root.display().to_string()))?;
        if !canonical.is_dir() {
            return Err(WalkError::RootMissing(root.display().to_string()));
        }

        let total = count_regular_files(&canonical, cancel);

        let mut metas = Vec::new();
        let mut scanned = 0usize;
        let mut seen = CycleGuard::new();

        'walk: for entry in WalkDir::new(&canonical).follow_links(true).into_iter() {
            if cancel.load(Ordering::Relaxed) {
                break 'walk;
            }
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!("walk error: {e}");
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                if !seen.admit(entry.path()) {
                    tracing::warn!("symlink cycle detected, skipping {}", entry.path().display());
                    continue;
                }
                continue;
            }
            if !entry.file_type().is_file() {
                continue;
            }

            match build_meta(entry.path()) {
                Ok(meta) => metas.push(meta),
                Err(e) => {
                    tracing::warn!("skipping {}: {e}", entry.path().display());
                }
            }

            scanned += 1;
            if scanned % PROGRESS_STRIDE == 0 {
                emit(
                    progress,
                    Stage::Classify,
                    scanned,
                    total,
                    Some(entry.path().display().to_string()),
                );
            }
        }

        emit(progress, Stage::Classify, scanned, total, None);
        Ok(metas)
    }
}

fn emit(
    progress: Option<&ProgressCallback>,
    stage: Stage,
    scanned: usize,
    total: usize,
    path: Option<String>,
) {
    if let Some(cb) = progress {
        let event = ProgressEvent::new(stage, scanned, total, path);
        if std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| cb(event))).is_err() {
            tracing::warn!("progress callback panicked; swallowing and continuing");
        }
    }
}

fn count_regular_files(root: &Path, cancel: &AtomicBool) -> usize {
    WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .take_while(|_| !cancel.load(Ordering::Relaxed))
        .filter(|e| e.file_type().is_file())
        .count()
}

fn build_meta(path: &Path) -> std::io::Result<FileMeta> {
    let metadata = std::fs::metadata(path)?;
    let size = metadata.len();
    let mtime_ns = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0);

    let header_type = sniff(path);
    let (ext_full, ext_container, ext_logical) = normalize_extensions(path);

    Ok(FileMeta {
        path: path.display().to_string(),
        size,
        mtime_ns,
        header_type,
        ext_full,
        ext_container,
        ext_logical,
    })
}

/// Guards against symlink-induced directory cycles using an inode+device
/// key, per the spec's "cycle guard (inode + device set)" design note.
/// Only meaningful on unix, where inodes are stable; elsewhere every
/// directory is admitted (walkdir's own depth limits are the only guard).
struct CycleGuard {
    #[cfg(unix)]
    seen: std::collections::HashSet<(u64, u64)>,
}

impl CycleGuard {
    fn new() -> Self {
        Self {
            #[cfg(unix)]
            seen: std::collections::HashSet::new(),
        }
    }

    #[cfg(unix)]
    fn admit(&mut self, path: &Path) -> bool {
        use std::os::unix::fs::MetadataExt;
        match std::fs::metadata(path) {
            Ok(m) => self.seen.insert((m.dev(), m.ino())),
            Err(_) => true,
        }
    }

    #[cfg(not(unix))]
    fn admit(&mut self, _path: &Path) -> bool {
        true
    }
}
