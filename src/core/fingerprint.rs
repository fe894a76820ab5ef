//! Fingerprinter — the two hash routines behind the duplicate cascade.
//!
//! MD5 for the cheap sampled digest used only to cluster candidates,
//! SHA-256 for the authoritative full-file digest used to confirm equality.

use digest::Digest;
use md5::Md5;
use sha2::Sha256;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

const WINDOW: u64 = 65536;
const MID_THRESHOLD: u64 = 196608;

/// A 128-bit digest over up to three 64 KiB windows (head, middle, tail).
/// Used only for candidate clustering — never as evidence of equality, so
/// overlapping windows on small files are harmless.
pub fn sampled_fingerprint(path: &Path, size: u64) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Md5::new();
    let mut buf = vec![0u8; WINDOW as usize];

    hash_window(&mut file, &mut hasher, 0, &mut buf)?;

    if size >= MID_THRESHOLD {
        let mid = (size / 2).saturating_sub(WINDOW / 2);
        hash_window(&mut file, &mut hasher, mid, &mut buf)?;
    }

    if size >= WINDOW {
        let tail = size - WINDOW;
        hash_window(&mut file, &mut hasher, tail, &mut buf)?;
    }

    Ok(hex::encode(hasher.finalize()))
}

fn hash_window(file: &mut File, hasher: &mut Md5, offset: u64, buf: &mut [u8]) -> io::Result<()> {
    file.seek(SeekFrom::Start(offset))?;
    let n = read_up_to(file, buf)?;
    hasher.update(&buf[..n]);
    Ok(())
}

fn read_up_to(file: &mut File, buf: &mut [u8]) -> io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match file.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(total)
}

/// A 256-bit digest over the entire file, read in `chunk_size`-sized
/// buffers. Read errors propagate — this is the tier where correctness
/// matters and a partial digest must never be reported as real.
pub fn stream_hash(path: &Path, chunk_size: usize) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; chunk_size.max(4096)];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}
