//! Core module — file metadata, type sniffing, and the shared progress schema.
//!
//! No persisted index here: a scan produces a single in-memory `Vec<FileMeta>`
//! table that is read once by the dedup/mismatch/erasability passes and
//! dropped when the report is assembled.

mod extension;
mod fingerprint;
mod sniffer;
mod walker;

pub use extension::normalize_extensions;
pub use fingerprint::{sampled_fingerprint, stream_hash};
pub use sniffer::sniff;
pub use walker::{TreeWalker, WalkError};

use serde::{Deserialize, Serialize};

/// Header kind sniffed from a file's first 1 KiB. Pure function of bytes —
/// never inferred from a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HeaderKind {
    Gzip,
    Bam,
    Cram,
    Bcf,
    Vcf,
    Sam,
    Fastq,
    Fasta,
    Unknown,
}

impl HeaderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeaderKind::Gzip => "GZIP",
            HeaderKind::Bam => "BAM",
            HeaderKind::Cram => "CRAM",
            HeaderKind::Bcf => "BCF",
            HeaderKind::Vcf => "VCF",
            HeaderKind::Sam => "SAM",
            HeaderKind::Fastq => "FASTQ",
            HeaderKind::Fasta => "FASTA",
            HeaderKind::Unknown => "UNKNOWN",
        }
    }

    /// True for the seven concrete bio formats — excludes GZIP, which is
    /// tracked as a container rather than a logical type.
    pub fn is_bio_logical(&self) -> bool {
        !matches!(self, HeaderKind::Gzip | HeaderKind::Unknown)
    }
}

impl std::fmt::Display for HeaderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extension-side logical/container vocabulary, kept as plain strings (not
/// an enum) so the empty `""` state is representable without an `Option`
/// wrapper — these are serialized verbatim into the report contract.
pub const BIO_LOGICAL: [&str; 7] = ["BAM", "CRAM", "BCF", "VCF", "SAM", "FASTQ", "FASTA"];
pub const BIO_CONTAINERS: [&str; 2] = ["GZIP", "BGZF"];

/// Immutable record produced once per enumerated regular file. Never
/// mutated after the walk finishes; downstream passes only ever read a
/// `&[FileMeta]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileMeta {
    pub path: String,
    pub size: u64,
    pub mtime_ns: i64,
    pub header_type: HeaderKind,
    pub ext_full: String,
    pub ext_container: String,
    pub ext_logical: String,
}

/// Scan phase, used both in the progress-event stream and internally to
/// bracket the dedup tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Classify,
    DedupTier0,
    DedupTier2,
    Done,
    Error,
}

/// A single progress notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub stage: Stage,
    pub scanned: usize,
    pub total: usize,
    pub path: Option<String>,
}

impl ProgressEvent {
    pub fn new(stage: Stage, scanned: usize, total: usize, path: Option<String>) -> Self {
        Self {
            stage,
            scanned,
            total,
            path,
        }
    }
}

/// Type-erased progress sink. A callback that panics must not take down the
/// scan — `Scanner::emit` in `scan.rs` catches unwinds around every
/// invocation, matching the spec's CallbackFailure recovery.
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_kind_serializes_to_screaming_snake_case() {
        for kind in [
            HeaderKind::Gzip,
            HeaderKind::Bam,
            HeaderKind::Cram,
            HeaderKind::Bcf,
            HeaderKind::Vcf,
            HeaderKind::Sam,
            HeaderKind::Fastq,
            HeaderKind::Fasta,
            HeaderKind::Unknown,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn gzip_is_not_bio_logical() {
        assert!(!HeaderKind::Gzip.is_bio_logical());
        assert!(HeaderKind::Bam.is_bio_logical());
        assert!(!HeaderKind::Unknown.is_bio_logical());
    }
}
