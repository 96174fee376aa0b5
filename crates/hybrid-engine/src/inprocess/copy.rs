use crate::error::HybridEngineError;
use crate::types::{Backend, CopyResult};
use sha2::{Digest, Sha256};
use std::io::{Read, Write};
use std::path::Path;
use std::time::Instant;

const CHUNK_SIZE: usize = 1024 * 1024;

/// Copy `source` to `destination`, hashing as it streams (spec.md §4.A:
/// `copy_file` returns a sha256 hex checksum alongside transfer stats).
pub fn copy_file(source: &Path, destination: &Path) -> Result<CopyResult, HybridEngineError> {
    let io_err = |path: &Path, source: std::io::Error| HybridEngineError::Io {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
    }

    let start = Instant::now();
    let mut src = std::fs::File::open(source).map_err(|e| io_err(source, e))?;
    let mut dst = std::fs::File::create(destination).map_err(|e| io_err(destination, e))?;

    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut bytes_copied: u64 = 0;
    loop {
        let n = src.read(&mut buf).map_err(|e| io_err(source, e))?;
        if n == 0 {
            break;
        }
        dst.write_all(&buf[..n]).map_err(|e| io_err(destination, e))?;
        hasher.update(&buf[..n]);
        bytes_copied += n as u64;
    }

    let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
    let transfer_rate_mbps = if duration_ms > 0.0 {
        (bytes_copied as f64 / (1024.0 * 1024.0)) / (duration_ms / 1000.0)
    } else {
        0.0
    };

    Ok(CopyResult {
        bytes_copied,
        duration_ms,
        checksum: format!("{:x}", hasher.finalize()),
        transfer_rate_mbps,
        success: true,
        backend: Backend::InProcess,
    })
}
