//! MismatchReporter — where content-implied type contradicts name-implied
//! type, restricted to the bio domain.
//!
//! This pass is the smallest of the four (by design, per the relative
//! share the core's composition gives it) — a single filter-and-classify
//! loop over the file table, no grouping or hashing involved.

use serde::{Deserialize, Serialize};

use crate::core::{FileMeta, BIO_CONTAINERS, BIO_LOGICAL};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MismatchRecord {
    pub path: String,
    pub extension: String,
    pub extension_container: String,
    pub extension_logical: String,
    pub header_type: String,
}

pub struct MismatchReporter;

impl MismatchReporter {
    pub fn detect(metas: &[FileMeta], include_non_bio_mismatches: bool) -> Vec<MismatchRecord> {
        metas
            .iter()
            .filter(|m| m.header_type.as_str() != "UNKNOWN")
            .filter(|m| include_non_bio_mismatches || is_bio_relevant(m))
            .filter(|m| is_mismatch(m))
            .map(|m| MismatchRecord {
                path: m.path.clone(),
                extension: m.ext_full.clone(),
                extension_container: m.ext_container.clone(),
                extension_logical: m.ext_logical.clone(),
                header_type: m.header_type.as_str().to_string(),
            })
            .collect()
    }
}

fn is_bio_relevant(m: &FileMeta) -> bool {
    BIO_LOGICAL.contains(&m.header_type.as_str())
        || BIO_LOGICAL.contains(&m.ext_logical.as_str())
        || BIO_CONTAINERS.contains(&m.ext_container.as_str())
}

fn is_mismatch(m: &FileMeta) -> bool {
    let header = m.header_type.as_str();
    if header == "GZIP" || header == "BGZF" {
        return !BIO_CONTAINERS.contains(&m.ext_container.as_str());
    }
    if BIO_CONTAINERS.contains(&m.ext_container.as_str()) {
        return true;
    }
    header != m.ext_logical
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::HeaderKind;

    fn meta(header: HeaderKind, ext_container: &str, ext_logical: &str) -> FileMeta {
        FileMeta {
            path: "x".to_string(),
            size: 10,
            mtime_ns: 0,
            header_type: header,
            ext_full: String::new(),
            ext_container: ext_container.to_string(),
            ext_logical: ext_logical.to_string(),
        }
    }

    #[test]
    fn unknown_header_never_emits() {
        let m = meta(HeaderKind::Unknown, "", "");
        assert!(MismatchReporter::detect(&[m], true).is_empty());
    }

    #[test]
    fn fasta_content_named_as_bam_is_a_mismatch() {
        let m = meta(HeaderKind::Fasta, "", "BAM");
        let records = MismatchReporter::detect(&[m], false);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].header_type, "FASTA");
        assert_eq!(records[0].extension_logical, "BAM");
    }

    #[test]
    fn matching_header_and_logical_is_not_a_mismatch() {
        let m = meta(HeaderKind::Bam, "", "BAM");
        assert!(MismatchReporter::detect(&[m], false).is_empty());
    }

    #[test]
    fn gzip_header_named_without_compression_extension_is_a_mismatch() {
        let m = meta(HeaderKind::Gzip, "", "FASTQ");
        let records = MismatchReporter::detect(&[m], false);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn gzip_header_named_with_gz_extension_is_not_a_mismatch() {
        let m = meta(HeaderKind::Gzip, "GZIP", "FASTQ");
        assert!(MismatchReporter::detect(&[m], false).is_empty());
    }

    #[test]
    fn name_claims_compression_but_content_is_not_compressed() {
        let m = meta(HeaderKind::Fasta, "GZIP", "FASTA");
        let records = MismatchReporter::detect(&[m], false);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn bio_relevant_header_surfaces_even_with_empty_extension() {
        let m = meta(HeaderKind::Fasta, "", "");
        let records = MismatchReporter::detect(&[m], false);
        // header_type FASTA is in BIO_LOGICAL, so the bio filter passes,
        // and header ("FASTA") != ext_logical ("") triggers the mismatch.
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn unknown_header_is_excluded_even_with_include_non_bio_mismatches() {
        let m = meta(HeaderKind::Unknown, "", "BAM");
        assert!(MismatchReporter::detect(&[m], true).is_empty());
    }

    #[test]
    fn non_bio_contradiction_needs_include_non_bio_mismatches_flag() {
        // Gzip content named with neither a container nor a logical
        // extension touches none of the three bio-filter clauses.
        let m = meta(HeaderKind::Gzip, "", "");
        assert!(MismatchReporter::detect(&[m.clone()], false).is_empty());
        assert_eq!(MismatchReporter::detect(&[m], true).len(), 1);
    }
}
