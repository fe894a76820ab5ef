//! ErasabilityReasoner — groups files by a loose sample key and proposes
//! deletions that are reconstructable from other retained files.
//!
//! Rule order: SAM (re-emittable from BAM or CRAM), uncompressed BAM
//! (superseded by CRAM), SRA vs. retained FASTQ, trimmed FASTQ (re-derivable
//! from its raw pair). Each rule's reason, fidelity, and regen command are
//! fixed strings; `depends_on` only ever references paths already present in
//! the same sample group.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::FileMeta;

/// Process-wide policy knobs (spec §4.7). Defaults match the spec exactly.
#[derive(Debug, Clone, Copy)]
pub struct Policy {
    pub allow_sam_regen: bool,
    pub prefer_sra_over_fastq: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            allow_sam_regen: true,
            prefer_sra_over_fastq: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErasableCandidate {
    pub path: String,
    pub reason: String,
    pub fidelity: String,
    pub depends_on: Vec<String>,
    pub regen_cmd: String,
}

const PROCESSING_TOKENS: &[&str] = &[
    "r1", "r2", "read1", "read2", "paired", "unpaired", "trimmed", "sorted", "unsorted",
    "collated",
];

fn split_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.\-_]+").unwrap())
}

pub struct ErasabilityReasoner;

impl ErasabilityReasoner {
    pub fn detect(metas: &[FileMeta], policy: &Policy) -> Vec<ErasableCandidate> {
        let groups = group_by_base_stem(metas);

        let mut candidates = Vec::new();
        let mut stems: Vec<&String> = groups.keys().collect();
        stems.sort();
        for stem in stems {
            let items = &groups[stem];
            apply_rules(items, policy, &mut candidates);
        }

        candidates.sort_by(|a, b| a.path.cmp(&b.path));
        candidates
    }
}

fn apply_rules(items: &[&FileMeta], policy: &Policy, out: &mut Vec<ErasableCandidate>) {
    let has_cram = items.iter().any(|m| has_kind(m, "CRAM"));
    let has_bam_uncompressed = items
        .iter()
        .any(|m| has_kind(m, "BAM") && !is_container(m, &["GZIP", "BGZF"]));
    let has_bam_any = items.iter().any(|m| has_kind(m, "BAM"));
    let has_sam = items.iter().any(|m| has_kind(m, "SAM"));
    let fastqs: Vec<&&FileMeta> = items.iter().filter(|m| has_kind(m, "FASTQ")).collect();
    let has_sra = items.iter().any(|m| m.ext_full.ends_with("SRA"));

    // R1a / R1b — SAM is regenerable from BAM (preferred) or CRAM+reference.
    if policy.allow_sam_regen && has_sam && (has_bam_any || has_cram) {
        for x in items.iter().filter(|m| has_kind(m, "SAM")) {
            if has_bam_any {
                let bam = items.iter().find(|m| has_kind(m, "BAM")).unwrap();
                out.push(ErasableCandidate {
                    path: x.path.clone(),
                    reason: "SAM is an intermediate; re-emit from BAM".to_string(),
                    fidelity: "content-equivalent (order may differ)".to_string(),
                    depends_on: vec![bam.path.clone()],
                    regen_cmd: format!(
                        "samtools view -h {} > {}",
                        shell_quote(&bam.path),
                        shell_quote(&x.path)
                    ),
                });
            } else {
                let cram = items.iter().find(|m| has_kind(m, "CRAM")).unwrap();
                out.push(ErasableCandidate {
                    path: x.path.clone(),
                    reason: "SAM is an intermediate; re-emit from CRAM".to_string(),
                    fidelity: "content-equivalent (requires reference)".to_string(),
                    depends_on: vec![cram.path.clone(), "<ref.fa>".to_string()],
                    regen_cmd: format!(
                        "samtools view -h -T <ref.fa> {} > {}",
                        shell_quote(&cram.path),
                        shell_quote(&x.path)
                    ),
                });
            }
        }
    }

    // R2 — uncompressed BAM superseded by CRAM.
    if has_bam_uncompressed && has_cram {
        let cram = items.iter().find(|m| has_kind(m, "CRAM")).unwrap();
        for b in items
            .iter()
            .filter(|m| has_kind(m, "BAM") && !is_container(m, &["GZIP", "BGZF"]))
        {
            out.push(ErasableCandidate {
                path: b.path.clone(),
                reason: "BAM superseded by CRAM; reconstructable from CRAM".to_string(),
                fidelity: "content-equivalent (coordinate order preserved if CRAM is sorted)"
                    .to_string(),
                depends_on: vec![cram.path.clone(), "<ref.fa>".to_string()],
                regen_cmd: format!(
                    "samtools view -b -T <ref.fa> -o {} {}",
                    shell_quote(&b.path),
                    shell_quote(&cram.path)
                ),
            });
        }
    }

    // R3a / R3b — SRA vs. retained FASTQ, direction set by policy.
    if has_sra && !fastqs.is_empty() {
        if policy.prefer_sra_over_fastq {
            for fq in &fastqs {
                out.push(ErasableCandidate {
                    path: fq.path.clone(),
                    reason: "FASTQ re-derivable from retained SRA".to_string(),
                    fidelity: "tool-deterministic (fasterq-dump + pigz)".to_string(),
                    depends_on: vec!["<SRA_ACCESSION>".to_string()],
                    regen_cmd: "fasterq-dump --split-files SRRXXXXXX && pigz -p N *.fastq"
                        .to_string(),
                });
            }
        } else {
            let sra = items.iter().find(|m| m.ext_full.ends_with("SRA")).unwrap();
            out.push(ErasableCandidate {
                path: sra.path.clone(),
                reason: "SRA redundant when gzipped FASTQ is retained locally".to_string(),
                fidelity: "content-equivalent (tool-dependent container)".to_string(),
                depends_on: fastqs.iter().map(|fq| fq.path.clone()).collect(),
                regen_cmd: "n/a (keep FASTQ as canonical raw layer)".to_string(),
            });
        }
    }

    // R4 — trimmed FASTQ re-derivable from raw FASTQ (+ optional manifest).
    let raw_fq: Vec<&&FileMeta> = fastqs
        .iter()
        .filter(|fq| !basename_lower(&fq.path).contains("trimmed"))
        .copied()
        .collect();
    let trimmed_fq: Vec<&&FileMeta> = fastqs
        .iter()
        .filter(|fq| basename_lower(&fq.path).contains("trimmed"))
        .copied()
        .collect();
    if !raw_fq.is_empty() && !trimmed_fq.is_empty() {
        let manifest = items
            .iter()
            .find(|m| m.path.to_lowercase().ends_with(".manifest.json"))
            .map(|m| m.path.clone());
        for tfq in &trimmed_fq {
            let mut depends_on = vec![raw_fq[0].path.clone()];
            if let Some(manifest) = &manifest {
                depends_on.push(manifest.clone());
            }
            out.push(ErasableCandidate {
                path: tfq.path.clone(),
                reason: "Trimmed FASTQ is re-derivable from raw FASTQ with recorded parameters"
                    .to_string(),
                fidelity: "content-equivalent given pinned tool and params".to_string(),
                depends_on,
                regen_cmd: "cutadapt <params_from_manifest> -o out.fq.gz raw.fq.gz".to_string(),
            });
        }
    }
}

fn has_kind(m: &FileMeta, kind: &str) -> bool {
    m.header_type.as_str() == kind || m.ext_logical == kind
}

fn is_container(m: &FileMeta, containers: &[&str]) -> bool {
    containers.contains(&m.ext_container.as_str())
}

fn basename_lower(path: &str) -> String {
    std::path::Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
        .to_lowercase()
}

fn group_by_base_stem(metas: &[FileMeta]) -> HashMap<String, Vec<&FileMeta>> {
    let mut groups: HashMap<String, Vec<&FileMeta>> = HashMap::new();
    for meta in metas {
        groups.entry(base_stem(&meta.path)).or_default().push(meta);
    }
    groups
}

/// Strips all dotted suffixes, splits on `.`/`-`/`_`, discards processing
/// tokens, rejoins with `.`, lowercases. Deliberately loose — collisions
/// across true samples are fine because every rule above requires
/// co-presence of specific types within the group.
fn base_stem(path: &str) -> String {
    let name = std::path::Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path);

    let trimmed = name.trim_start_matches('.');
    let stripped = match trimmed.find('.') {
        Some(i) => &trimmed[..i],
        None => name,
    };

    let tokens: Vec<&str> = split_re()
        .split(stripped)
        .filter(|t| !t.is_empty())
        .filter(|t| !is_processing_token(t))
        .collect();

    tokens.join(".").to_lowercase()
}

fn is_processing_token(token: &str) -> bool {
    let lower = token.to_lowercase();
    PROCESSING_TOKENS.contains(&lower.as_str())
}

/// POSIX single-quote escaping, matching Python's `shlex.quote`: wrap in
/// single quotes, replacing any embedded `'` with `'\''`.
fn shell_quote(s: &str) -> String {
    if !s.is_empty() && s.bytes().all(|b| is_shell_safe(b)) {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        if c == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(c);
        }
    }
    out.push('\'');
    out
}

fn is_shell_safe(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.' | b'/' | b'@' | b'%' | b'+' | b'=' | b':')
}
