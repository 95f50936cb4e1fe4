//! Secure deletion: overwrite with random bytes, then unlink
//!
//! The overwrite is block aligned. The final partial block is written as a
//! full block of random bytes, so a file of `S` bytes grows to
//! `ceil(S / block) * block` bytes right before it is removed.

use rand::{RngCore, thread_rng};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShredError {
    #[error("block size must be greater than zero")]
    BlockSize,
    #[error("{} is not a regular file", .0.display())]
    NotAFile(PathBuf),
    #[error("failed to open {} for writing: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to overwrite {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to remove {}: {source}", .path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Overwrite the whole file with random bytes and flush it to disk
///
/// Returns the number of bytes written. Symlinks and directories are refused.
pub fn scramble(path: &Path, block_size: usize) -> Result<u64, ShredError> {
    if block_size == 0 {
        return Err(ShredError::BlockSize);
    }

    let metadata = fs::symlink_metadata(path).map_err(|source| ShredError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    if !metadata.is_file() {
        return Err(ShredError::NotAFile(path.to_path_buf()));
    }

    let mut file = OpenOptions::new()
        .write(true)
        .open(path)
        .map_err(|source| ShredError::Open {
            path: path.to_path_buf(),
            source,
        })?;
    let write_error = |source| ShredError::Write {
        path: path.to_path_buf(),
        source,
    };

    let size = file.metadata().map_err(write_error)?.len();
    let blocks = size.div_ceil(block_size as u64);
    let mut block = vec![0u8; block_size];
    let mut rng = thread_rng();

    for _ in 0..blocks {
        rng.fill_bytes(&mut block);
        file.write_all(&block).map_err(write_error)?;
    }
    file.sync_all().map_err(write_error)?;

    let written = blocks * block_size as u64;
    tracing::trace!("Scrambled {} ({} -> {} bytes)", path.display(), size, written);
    Ok(written)
}

/// Scramble one file, then remove it
pub fn shred_file(path: &Path, block_size: usize) -> Result<u64, ShredError> {
    let written = scramble(path, block_size)?;
    fs::remove_file(path).map_err(|source| ShredError::Remove {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(written)
}

/// Outcome of a best-effort batch deletion
#[derive(Debug, Default, Clone, Serialize)]
pub struct DeletionReport {
    pub deleted: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
    pub bytes_overwritten: u64,
}

impl DeletionReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Shred every path; a failure is logged and does not stop the rest
pub fn delete_files<P: AsRef<Path>>(paths: &[P], block_size: usize) -> DeletionReport {
    let mut report = DeletionReport::default();

    for path in paths {
        let path = path.as_ref();
        match shred_file(path, block_size) {
            Ok(written) => {
                tracing::debug!("Shredded {}", path.display());
                report.bytes_overwritten += written;
                report.deleted.push(path.to_path_buf());
            }
            Err(e) => {
                tracing::warn!("Could not shred {}: {}", path.display(), e);
                report.failed.push((path.to_path_buf(), e.to_string()));
            }
        }
    }

    tracing::info!(
        "Shredded {} files, {} failed",
        report.deleted.len(),
        report.failed.len()
    );
    report
}
