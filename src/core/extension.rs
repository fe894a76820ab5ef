//! ExtensionNormalizer — name-implied type, independent of content.

use std::path::Path;

/// Parses a path's dotted suffixes into `(ext_full, ext_container,
/// ext_logical)`. Pure function of the basename; never looks at file bytes.
pub fn normalize_extensions(path: &Path) -> (String, String, String) {
    let suffixes = dotted_suffixes(path);
    let ext_full = suffixes.join(".").to_uppercase();

    let Some(last) = suffixes.last() else {
        return (ext_full, String::new(), String::new());
    };

    let container = match last.as_str() {
        "gz" | "gzip" => "GZIP",
        "bgz" | "bgzf" => "BGZF",
        _ => "",
    };

    let logical_source = if !container.is_empty() && suffixes.len() >= 2 {
        &suffixes[suffixes.len() - 2]
    } else {
        last
    };

    let logical = match logical_source.as_str() {
        "bam" => "BAM",
        "cram" => "CRAM",
        "bcf" => "BCF",
        "vcf" => "VCF",
        "sam" => "SAM",
        "fastq" | "fq" => "FASTQ",
        "fasta" | "fa" => "FASTA",
        _ => "",
    };

    (ext_full, container.to_string(), logical.to_string())
}

/// Collects dotted suffixes from the basename in order, lowercased, e.g.
/// `sample.vcf.gz` → `["vcf", "gz"]`. A leading-dot dotfile name (`.bashrc`)
/// contributes no suffixes — the leading dot is not a suffix separator.
fn dotted_suffixes(path: &Path) -> Vec<String> {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return Vec::new();
    };
    let trimmed = name.trim_start_matches('.');
    let mut parts: Vec<&str> = trimmed.split('.').collect();
    if parts.len() <= 1 {
        return Vec::new();
    }
    parts.remove(0);
    parts.into_iter().map(|s| s.to_lowercase()).collect()
}
