//! ScanOrchestrator — drives TreeWalker, then fans the resulting table out
//! to DuplicateDetector, MismatchReporter, and ErasabilityReasoner, and
//! assembles the final report.
//!
//! Single-threaded at the orchestration level — there is no async runtime
//! here, only `rayon` inside the dedup tiers.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{FileMeta, HeaderKind, ProgressCallback, ProgressEvent, Stage, TreeWalker, WalkError};
use crate::dedup::{DuplicateDetector, DuplicateGroup};
use crate::erasable::{ErasabilityReasoner, ErasableCandidate, Policy};
use crate::mismatch::{MismatchRecord, MismatchReporter};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("scan root does not exist or is not a directory: {0}")]
    RootMissing(String),
}

impl From<WalkError> for ScanError {
    fn from(e: WalkError) -> Self {
        match e {
            WalkError::RootMissing(p) => ScanError::RootMissing(p),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub strict: bool,
    pub chunk_size_bytes: usize,
    pub include_non_bio_mismatches: bool,
    pub policy: Policy,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            strict: true,
            chunk_size_bytes: 4 * 1024 * 1024,
            include_non_bio_mismatches: false,
            policy: Policy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stats {
    pub wall_clock_s: f64,
    pub cpu_avg: Option<f64>,
    pub cpu_peak: Option<f64>,
    pub peak_rss_mb: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportedFile {
    pub path: String,
    pub size: u64,
    pub header_type: HeaderKind,
    pub extension: String,
    pub extension_container: String,
    pub extension_logical: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub n_files: usize,
    pub stats: Stats,
    pub mismatches: Vec<MismatchRecord>,
    pub files: Vec<ReportedFile>,
    pub duplicate_groups: Vec<DuplicateGroup>,
    pub erasable_candidates: Vec<ErasableCandidate>,
}

/// The public entry point. Holds no ambient state — options, cancel flag,
/// and progress callback all live on the instance, per the spec's "global
/// state → explicit scanner object" design note.
pub struct Scanner {
    options: ScanOptions,
    cancel: Arc<AtomicBool>,
    callback: Mutex<Option<ProgressCallback>>,
}

impl Scanner {
    pub fn new(options: ScanOptions) -> Self {
        Self {
            options,
            cancel: Arc::new(AtomicBool::new(false)),
            callback: Mutex::new(None),
        }
    }

    pub fn set_progress_callback(&self, cb: ProgressCallback) {
        *self.callback.lock() = Some(cb);
    }

    pub fn request_cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn scan(&self, root: &Path) -> Result<Report, ScanError> {
        let start = Instant::now();
        let sampler = crate::stats::CpuRssSampler::start();

        let callback_guard = self.callback.lock();
        let callback_ref: Option<&ProgressCallback> = callback_guard.as_ref();

        let metas = TreeWalker::walk(root, &self.cancel, callback_ref)?;

        let duplicate_groups = DuplicateDetector::detect(&metas, &self.cancel, callback_ref);
        let mismatches = MismatchReporter::detect(&metas, self.options.include_non_bio_mismatches);
        let erasable_candidates = ErasabilityReasoner::detect(&metas, &self.options.policy);

        let (cpu_avg, cpu_peak, peak_rss_mb) = sampler.finish();

        emit(
            callback_ref,
            Stage::Done,
            metas.len(),
            metas.len(),
        );

        let n_files = metas.len();
        let files = metas
            .into_iter()
            .map(|m| ReportedFile {
                path: m.path,
                size: m.size,
                header_type: m.header_type,
                extension: m.ext_full,
                extension_container: m.ext_container,
                extension_logical: m.ext_logical,
            })
            .collect();

        Ok(Report {
            n_files,
            stats: Stats {
                wall_clock_s: start.elapsed().as_secs_f64(),
                cpu_avg,
                cpu_peak,
                peak_rss_mb,
            },
            mismatches,
            files,
            duplicate_groups,
            erasable_candidates,
        })
    }
}

fn emit(progress: Option<&ProgressCallback>, stage: Stage, scanned: usize, total: usize) {
    if let Some(cb) = progress {
        let event = ProgressEvent::new(stage, scanned, total, None);
        if std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| cb(event))).is_err() {
            tracing::warn!("progress callback panicked; swallowing and continuing");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tempfile::tempdir;

    #[test]
    fn root_missing_is_surfaced() {
        let scanner = Scanner::new(ScanOptions::default());
        let err = scanner.scan(Path::new("/does/not/exist/anywhere"));
        assert!(matches!(err, Err(ScanError::RootMissing(_))));
    }

    #[test]
    fn root_is_a_file_not_a_directory() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("not_a_dir.txt");
        std::fs::write(&file, b"hi").unwrap();
        let scanner = Scanner::new(ScanOptions::default());
        assert!(matches!(scanner.scan(&file), Err(ScanError::RootMissing(_))));
    }

    #[test]
    fn scan_reports_n_files_and_exact_duplicates() {
        let dir = tempdir().unwrap();
        let content = vec![5u8; 1024 * 1024];
        std::fs::create_dir(dir.path().join("a")).unwrap();
        std::fs::create_dir(dir.path().join("b")).unwrap();
        std::fs::write(dir.path().join("a/x.fastq.gz"), &content).unwrap();
        std::fs::write(dir.path().join("b/x.fastq.gz"), &content).unwrap();

        let scanner = Scanner::new(ScanOptions::default());
        let report = scanner.scan(dir.path()).unwrap();
        assert_eq!(report.n_files, 2);
        assert_eq!(report.duplicate_groups.len(), 1);
        assert_eq!(report.duplicate_groups[0].count, 2);
    }

    #[test]
    fn progress_callback_is_invoked() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.fasta"), b">s\nACGT\n").unwrap();

        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        let scanner = Scanner::new(ScanOptions::default());
        scanner.set_progress_callback(Box::new(move |_e| {
            count_clone.fetch_add(1, Ordering::Relaxed);
        }));
        scanner.scan(dir.path()).unwrap();
        assert!(count.load(Ordering::Relaxed) > 0);
    }

    #[test]
    fn cancel_returns_a_partial_report_not_an_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.fasta"), b">s\nACGT\n").unwrap();
        let scanner = Scanner::new(ScanOptions::default());
        scanner.request_cancel();
        let report = scanner.scan(dir.path()).unwrap();
        assert!(report.n_files <= 1);
    }
}
