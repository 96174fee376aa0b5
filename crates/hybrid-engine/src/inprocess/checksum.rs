use crate::types::ChecksumResult;
use md5::{Digest as Md5Digest, Md5};
use sha1::Sha1;
use sha2::{Digest as Sha2Digest, Sha256};
use std::io::Read;
use std::path::Path;

const CHUNK_SIZE: usize = 1024 * 1024;

/// Compute md5/sha1/sha256 for each path in one pass; a failure on a
/// single file is isolated to that entry (spec.md §4.A).
pub fn calculate_checksums(files: &[impl AsRef<Path>]) -> Vec<ChecksumResult> {
    files.iter().map(|p| checksum_one(p.as_ref())).collect()
}

fn checksum_one(path: &Path) -> ChecksumResult {
    match checksum_one_inner(path) {
        Ok(result) => result,
        Err(e) => ChecksumResult {
            file: path.display().to_string(),
            md5: String::new(),
            sha1: String::new(),
            sha256: String::new(),
            size: 0,
            error: Some(e.to_string()),
        },
    }
}

fn checksum_one_inner(path: &Path) -> std::io::Result<ChecksumResult> {
    let size = std::fs::metadata(path)?.len();
    let mut file = std::fs::File::open(path)?;

    let mut md5 = Md5::new();
    let mut sha1 = Sha1::new();
    let mut sha256 = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        md5.update(&buf[..n]);
        sha1.update(&buf[..n]);
        sha256.update(&buf[..n]);
    }

    Ok(ChecksumResult {
        file: path.display().to_string(),
        md5: format!("{:x}", md5.finalize()),
        sha1: format!("{:x}", sha1.finalize()),
        sha256: format!("{:x}", sha256.finalize()),
        size,
        error: None,
    })
}
