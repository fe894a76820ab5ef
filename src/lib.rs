//! seqdrill
//!
//! Catalogs a directory tree of sequencing-pipeline output: what kinds of
//! files are present (content-sniffed, not name-guessed), which files are
//! exact byte-for-byte duplicates, and which intermediates are safely
//! erasable because they can be regenerated from other retained files.
//!
//! # Example
//!
//! ```no_run
//! use seqdrill::{ScanOptions, Scanner};
//! use std::path::Path;
//!
//! let scanner = Scanner::new(ScanOptions::default());
//! let report = scanner.scan(Path::new("/data/pipeline-output"))?;
//! println!("found {} files, {} duplicate groups", report.n_files, report.duplicate_groups.len());
//! # Ok::<(), seqdrill::ScanError>(())
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod dedup;
pub mod erasable;
pub mod mismatch;
mod scan;
mod stats;

pub use config::Config;
pub use core::{FileMeta, HeaderKind, ProgressCallback, ProgressEvent, Stage};
pub use dedup::{DuplicateDetector, DuplicateGroup};
pub use erasable::{ErasabilityReasoner, ErasableCandidate, Policy};
pub use mismatch::{MismatchRecord, MismatchReporter};
pub use scan::{Report, ReportedFile, ScanError, ScanOptions, Scanner, Stats};
