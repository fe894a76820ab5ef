//! HeaderSniffer — content-derived type identity, independent of the name.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::HeaderKind;

const SNIFF_LEN: usize = 1024;
const VCF_SEARCH_WINDOW: usize = 256;

/// Reads up to 1 KiB from the start of `path` and classifies it. Any read
/// error — missing file, permission denied, vanished mid-read — yields
/// `Unknown` rather than propagating; the sniffer is never allowed to be
/// the reason a file drops out of the walk.
pub fn sniff(path: &Path) -> HeaderKind {
    let mut buf = [0u8; SNIFF_LEN];
    let n = match File::open(path).and_then(|mut f| f.read(&mut buf)) {
        Ok(n) => n,
        Err(_) => return HeaderKind::Unknown,
    };
    classify(&buf[..n])
}

/// First-match-wins classification, in the exact order the match carries
/// evidentiary weight: binary magics first, then the VCF text pragma, then
/// the looser single-byte text sniffs.
fn classify(bytes: &[u8]) -> HeaderKind {
    if bytes.len() >= 3 && bytes[0..3] == [0x1F, 0x8B, 0x08] {
        return HeaderKind::Gzip;
    }
    if bytes.len() >= 4 && &bytes[0..4] == b"BAM\x01" {
        return HeaderKind::Bam;
    }
    if bytes.len() >= 4 && &bytes[0..4] == b"CRAM" {
        return HeaderKind::Cram;
    }
    if bytes.len() >= 3 && &bytes[0..3] == b"BCF" {
        return HeaderKind::Bcf;
    }
    let search_end = bytes.len().min(VCF_SEARCH_WINDOW);
    if contains(&bytes[..search_end], b"##fileformat=VCF") {
        return HeaderKind::Vcf;
    }
    if bytes.len() >= 4 && &bytes[0..4] == b"@HD\t" {
        return HeaderKind::Sam;
    }
    if bytes.first() == Some(&b'@') {
        return HeaderKind::Fastq;
    }
    if bytes.first() == Some(&b'>') {
        return HeaderKind::Fasta;
    }
    HeaderKind::Unknown
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn sniff_bytes(bytes: &[u8]) -> HeaderKind {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(bytes).unwrap();
        f.flush().unwrap();
        sniff(f.path())
    }

    #[test]
    fn recognizes_gzip_magic() {
        assert_eq!(sniff_bytes(&[0x1F, 0x8B, 0x08, 0x00]), HeaderKind::Gzip);
    }

    #[test]
    fn recognizes_bam_magic() {
        assert_eq!(sniff_bytes(b"BAM\x01rest-of-header"), HeaderKind::Bam);
    }

    #[test]
    fn recognizes_cram_magic() {
        assert_eq!(sniff_bytes(b"CRAM\x03\x00"), HeaderKind::Cram);
    }

    #[test]
    fn recognizes_bcf_magic() {
        assert_eq!(sniff_bytes(b"BCF\x02\x02"), HeaderKind::Bcf);
    }

    #[test]
    fn recognizes_vcf_pragma_anywhere_in_first_256_bytes() {
        let mut bytes = vec![b'#'; 100];
        bytes.extend_from_slice(b"##fileformat=VCFv4.2\n");
        assert_eq!(sniff_bytes(&bytes), HeaderKind::Vcf);
    }

    #[test]
    fn vcf_pragma_outside_search_window_is_not_matched() {
        let mut bytes = vec![b'x'; 300];
        bytes.extend_from_slice(b"##fileformat=VCFv4.2\n");
        assert_eq!(sniff_bytes(&bytes), HeaderKind::Unknown);
    }

    #[test]
    fn recognizes_sam_header() {
        assert_eq!(
            sniff_bytes(b"@HD\tVN:1.6\tSO:coordinate\n"),
            HeaderKind::Sam
        );
    }

    #[test]
    fn recognizes_fastq_leading_at() {
        assert_eq!(sniff_bytes(b"@SRR000001.1 1 length=36\n"), HeaderKind::Fastq);
    }

    #[test]
    fn recognizes_fasta_leading_angle_bracket() {
        assert_eq!(sniff_bytes(b">chr1 some sequence\nACGT\n"), HeaderKind::Fasta);
    }

    #[test]
    fn unknown_for_arbitrary_bytes() {
        assert_eq!(sniff_bytes(b"not a bio file at all"), HeaderKind::Unknown);
    }

    #[test]
    fn unknown_for_empty_file() {
        assert_eq!(sniff_bytes(b""), HeaderKind::Unknown);
    }

    #[test]
    fn unknown_for_missing_file() {
        assert_eq!(sniff(Path::new("/nonexistent/path/does/not/exist")), HeaderKind::Unknown);
    }

    #[test]
    fn bam_magic_wins_over_fastq_at_rule() {
        // BAM's magic starts with an '@'-free prefix but the priority order
        // matters when bytes happen to coincide with a later rule's trigger.
        assert_eq!(sniff_bytes(b"BAM\x01"), HeaderKind::Bam);
    }
}
