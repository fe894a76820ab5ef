//! DuplicateDetector — the tiered exact-duplicate cascade.
//!
//! Three explicit tiers — size, sampled fingerprint, full digest — each
//! narrowing the candidate set before the next, more expensive step runs.
//! Tier 1/2 hashing fans out across a `rayon` pool; group membership is
//! re-sorted lexicographically afterward so the result is independent of
//! scheduling order.

use std::collections::HashMap;
use std::sync::atomic::AtomicBool;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::{sampled_fingerprint, stream_hash, FileMeta, ProgressCallback, Stage};

/// A group of exact, byte-for-byte duplicates. `count >= 2` always holds —
/// singleton partitions never survive to become a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub sha256: String,
    pub total_size: u64,
    pub count: usize,
    #[serde(rename = "files")]
    pub paths: Vec<String>,
}

pub struct DuplicateDetector;

impl DuplicateDetector {
    /// Runs the full cascade and returns groups sorted by
    /// `(total_size desc, count desc)`. Members within a group are sorted
    /// lexicographically — the cascade itself holds no notion of an
    /// "original" file.
    pub fn detect(
        metas: &[FileMeta],
        cancel: &AtomicBool,
        progress: Option<&ProgressCallback>,
    ) -> Vec<DuplicateGroup> {
        let scanned = metas.len();

        emit(progress, Stage::DedupTier0, scanned);
        let size_buckets = tier0_size_buckets(metas);

        let tier1_partitions = tier1_sampled_fingerprint(size_buckets, cancel);

        emit(progress, Stage::DedupTier2, scanned);
        let mut groups = tier2_stream_verify(tier1_partitions, cancel);

        for group in &mut groups {
            group.paths.sort();
        }
        groups.sort_by(|a, b| {
            b.total_size
                .cmp(&a.total_size)
                .then_with(|| b.count.cmp(&a.count))
        });
        groups
    }
}

fn emit(progress: Option<&ProgressCallback>, stage: Stage, scanned: usize) {
    if let Some(cb) = progress {
        let event = crate::core::ProgressEvent::new(stage, scanned, scanned, None);
        if std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| cb(event))).is_err() {
            tracing::warn!("progress callback panicked; swallowing and continuing");
        }
    }
}

/// Tier 0: bucket by size, dropping buckets too small to hold a duplicate.
/// Zero-size files never enter the cascade — two empty files are not
/// "exact duplicates" in any interesting sense and the spec excludes them.
fn tier0_size_buckets(metas: &[FileMeta]) -> Vec<Vec<&FileMeta>> {
    let mut buckets: HashMap<u64, Vec<&FileMeta>> = HashMap::new();
    for meta in metas {
        if meta.size > 0 {
            buckets.entry(meta.size).or_default().push(meta);
        }
    }
    buckets.into_values().filter(|b| b.len() >= 2).collect()
}

/// Tier 1: sampled fingerprint, computed in parallel across buckets.
/// Failures land in a key tagged `None` that is unconditionally discarded
/// below — a file whose sampled hash fails can never contribute to a
/// duplicate group, even if another file happens to share its size.
fn tier1_sampled_fingerprint<'a>(
    buckets: Vec<Vec<&'a FileMeta>>,
    cancel: &AtomicBool,
) -> Vec<Vec<&'a FileMeta>> {
    let flat: Vec<&FileMeta> = buckets.into_iter().flatten().collect();

    // Sampled hash each member in parallel; failures are tagged `None` and
    // unconditionally dropped when building partitions below, whatever
    // their size bucket looked like.
    let fingerprinted: Vec<(&FileMeta, Option<String>)> = flat
        .into_par_iter()
        .map(|meta| {
            if cancel.load(std::sync::atomic::Ordering::Relaxed) {
                return (meta, None);
            }
            let path = std::path::Path::new(&meta.path);
            match sampled_fingerprint(path, meta.size) {
                Ok(fp) => (meta, Some(fp)),
                Err(e) => {
                    tracing::debug!("sampled fingerprint failed for {}: {e}", meta.path);
                    (meta, None)
                }
            }
        })
        .collect();

    let mut partitions: HashMap<(u64, String), Vec<&FileMeta>> = HashMap::new();
    for (meta, fp) in fingerprinted {
        if let Some(fp) = fp {
            partitions.entry((meta.size, fp)).or_default().push(meta);
        }
    }

    partitions
        .into_values()
        .filter(|members| members.len() >= 2)
        .collect()
}

/// Tier 2: full streaming digest, computed in parallel across surviving
/// partitions. A file whose stream hash fails is excluded from its
/// partition rather than dropping the whole partition.
fn tier2_stream_verify(partitions: Vec<Vec<&FileMeta>>, cancel: &AtomicBool) -> Vec<DuplicateGroup> {
    const CHUNK_SIZE: usize = 4 * 1024 * 1024;

    let flat: Vec<(usize, &FileMeta)> = partitions
        .iter()
        .enumerate()
        .flat_map(|(i, partition)| partition.iter().map(move |m| (i, *m)))
        .collect();

    // Full digest in parallel; a file whose stream hash fails is simply
    // excluded below, not dropped along with the rest of its partition.
    let hashed: Vec<(usize, &FileMeta, Option<String>)> = flat
        .into_par_iter()
        .map(|(partition_idx, meta)| {
            if cancel.load(std::sync::atomic::Ordering::Relaxed) {
                return (partition_idx, meta, None);
            }
            let path = std::path::Path::new(&meta.path);
            match stream_hash(path, CHUNK_SIZE) {
                Ok(digest) => (partition_idx, meta, Some(digest)),
                Err(e) => {
                    tracing::warn!("stream hash failed for {}: {e}", meta.path);
                    (partition_idx, meta, None)
                }
            }
        })
        .collect();

    let mut by_partition_digest: HashMap<(usize, String), Vec<&FileMeta>> = HashMap::new();
    for (partition_idx, meta, digest) in hashed {
        if let Some(digest) = digest {
            by_partition_digest
                .entry((partition_idx, digest))
                .or_default()
                .push(meta);
        }
    }

    by_partition_digest
        .into_iter()
        .filter(|(_, members)| members.len() >= 2)
        .map(|((_, sha256), members)| {
            let count = members.len();
            let total_size = members[0].size * count as u64;
            DuplicateGroup {
                sha256,
                total_size,
                count,
                paths: members.into_iter().map(|m| m.path.clone()).collect(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::HeaderKind;
    use std::sync::atomic::AtomicBool;
    use tempfile::tempdir;

    fn meta(path: &std::path::Path, size: u64) -> FileMeta {
        FileMeta {
            path: path.display().to_string(),
            size,
            mtime_ns: 0,
            header_type: HeaderKind::Unknown,
            ext_full: String::new(),
            ext_container: String::new(),
            ext_logical: String::new(),
        }
    }

    #[test]
    fn identical_files_form_one_group() {
        let dir = tempdir().unwrap();
        let content = vec![7u8; 300_000];
        let a = dir.path().join("a.bin");
        let b = dir.path().join("b.bin");
        std::fs::write(&a, &content).unwrap();
        std::fs::write(&b, &content).unwrap();

        let metas = vec![
            meta(&a, content.len() as u64),
            meta(&b, content.len() as u64),
        ];
        let cancel = AtomicBool::new(false);
        let groups = DuplicateDetector::detect(&metas, &cancel, None);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].count, 2);
        assert_eq!(groups[0].total_size, content.len() as u64 * 2);
        let mut paths = groups[0].paths.clone();
        paths.sort();
        assert_eq!(paths, groups[0].paths);
    }

    #[test]
    fn single_byte_flip_breaks_the_group() {
        let dir = tempdir().unwrap();
        let mut a_content = vec![7u8; 300_000];
        let b_content = a_content.clone();
        a_content[250_000] = 0xFF;
        let a = dir.path().join("a.bin");
        let b = dir.path().join("b.bin");
        std::fs::write(&a, &a_content).unwrap();
        std::fs::write(&b, &b_content).unwrap();

        let metas = vec![
            meta(&a, a_content.len() as u64),
            meta(&b, b_content.len() as u64),
        ];
        let cancel = AtomicBool::new(false);
        let groups = DuplicateDetector::detect(&metas, &cancel, None);
        assert!(groups.is_empty());
    }

    #[test]
    fn differently_sized_files_never_cluster() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.bin");
        let b = dir.path().join("b.bin");
        std::fs::write(&a, vec![1u8; 100]).unwrap();
        std::fs::write(&b, vec![1u8; 200]).unwrap();

        let metas = vec![meta(&a, 100), meta(&b, 200)];
        let cancel = AtomicBool::new(false);
        let groups = DuplicateDetector::detect(&metas, &cancel, None);
        assert!(groups.is_empty());
    }

    #[test]
    fn empty_files_are_excluded_even_if_identical() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.bin");
        let b = dir.path().join("b.bin");
        std::fs::write(&a, []).unwrap();
        std::fs::write(&b, []).unwrap();

        let metas = vec![meta(&a, 0), meta(&b, 0)];
        let cancel = AtomicBool::new(false);
        let groups = DuplicateDetector::detect(&metas, &cancel, None);
        assert!(groups.is_empty());
    }

    #[test]
    fn tier1_prunes_same_sized_but_different_content_files() {
        let dir = tempdir().unwrap();
        let content = vec![9u8; 200 * 1024 * 1024 / 1000]; // smaller stand-in, same idea
        let a = dir.path().join("a.bin");
        let b = dir.path().join("b.bin");
        let c = dir.path().join("c.bin");
        std::fs::write(&a, &content).unwrap();
        std::fs::write(&b, &content).unwrap();
        let mut different = content.clone();
        different[100] = 0xAB;
        std::fs::write(&c, &different).unwrap();

        let metas = vec![
            meta(&a, content.len() as u64),
            meta(&b, content.len() as u64),
            meta(&c, content.len() as u64),
        ];
        let cancel = AtomicBool::new(false);
        let groups = DuplicateDetector::detect(&metas, &cancel, None);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].count, 2);
    }

    #[test]
    fn groups_sorted_by_total_size_desc_then_count_desc() {
        let dir = tempdir().unwrap();
        let small = vec![1u8; 100];
        let large = vec![2u8; 1000];

        let a1 = dir.path().join("a1.bin");
        let a2 = dir.path().join("a2.bin");
        let b1 = dir.path().join("b1.bin");
        let b2 = dir.path().join("b2.bin");
        std::fs::write(&a1, &small).unwrap();
        std::fs::write(&a2, &small).unwrap();
        std::fs::write(&b1, &large).unwrap();
        std::fs::write(&b2, &large).unwrap();

        let metas = vec![
            meta(&a1, small.len() as u64),
            meta(&a2, small.len() as u64),
            meta(&b1, large.len() as u64),
            meta(&b2, large.len() as u64),
        ];
        let cancel = AtomicBool::new(false);
        let groups = DuplicateDetector::detect(&metas, &cancel, None);
        assert_eq!(groups.len(), 2);
        assert!(groups[0].total_size > groups[1].total_size);
    }
}
