//! Checksum utilities for file verification
//!
//! Streams file contents through SHA-256 in fixed-size blocks, accounting
//! for the bytes consumed and the wall time spent hashing.

use crate::error::Result;
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;
use std::time::Instant;

/// Default block size for streaming reads (1 MiB)
pub const HASH_BLOCK_SIZE: usize = 1024 * 1024;

/// Result of hashing one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChecksum {
    /// Lowercase hex SHA-256 digest
    pub sha256_hex: String,
    /// Total bytes fed into the hasher
    pub bytes_hashed: u64,
    /// Wall time spent hashing, in whole milliseconds
    pub duration_ms: u64,
}

/// Compute the SHA-256 checksum of a file by streaming its contents
pub fn compute_file_checksum(path: impl AsRef<Path>) -> Result<FileChecksum> {
    let mut file = std::fs::File::open(path)?;
    compute_checksum(&mut file, HASH_BLOCK_SIZE)
}

/// Compute a streaming SHA-256 checksum from any readable source
///
/// The digest is independent of `block_size`; the parameter only controls
/// I/O granularity. Read errors propagate to the caller.
pub fn compute_checksum<R: Read>(reader: &mut R, block_size: usize) -> Result<FileChecksum> {
    let start = Instant::now();
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; block_size];
    let mut bytes_hashed: u64 = 0;

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
        bytes_hashed += bytes_read as u64;
    }

    Ok(FileChecksum {
        sha256_hex: hex::encode(hasher.finalize()),
        bytes_hashed,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::TdpError;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    #[test]
    fn test_compute_checksum_known_vector() {
        let mut cursor = Cursor::new(b"hello world");
        let checksum = compute_checksum(&mut cursor, HASH_BLOCK_SIZE).unwrap();
        assert_eq!(
            checksum.sha256_hex,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
        assert_eq!(checksum.bytes_hashed, 11);
    }

    #[test]
    fn test_compute_checksum_empty() {
        let mut cursor = Cursor::new(b"");
        let checksum = compute_checksum(&mut cursor, HASH_BLOCK_SIZE).unwrap();
        assert_eq!(
            checksum.sha256_hex,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(checksum.bytes_hashed, 0);
    }

    #[test]
    fn test_block_size_does_not_change_digest() {
        let data = vec![7u8; 100_000];
        let digests: Vec<String> = [1usize, 7, 8192, HASH_BLOCK_SIZE]
            .iter()
            .map(|&size| {
                let mut cursor = Cursor::new(&data);
                compute_checksum(&mut cursor, size).unwrap().sha256_hex
            })
            .collect();
        assert!(digests.windows(2).all(|pair| pair[0] == pair[1]));
    }

    #[test]
    fn test_compute_file_checksum() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"test data").unwrap();
        temp_file.flush().unwrap();

        let checksum = compute_file_checksum(temp_file.path()).unwrap();
        assert_eq!(
            checksum.sha256_hex,
            "916f0027a575074ce72a331777c3478d6513f786a591bd892da1a577bf2335f9"
        );
        assert_eq!(checksum.bytes_hashed, 9);
    }

    #[test]
    fn test_compute_file_checksum_missing_file() {
        let result = compute_file_checksum("/nonexistent/path/to/file.parquet");
        assert!(matches!(result, Err(TdpError::Io(_))));
    }

    #[test]
    fn test_bytes_hashed_matches_file_size() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let data = vec![0u8; 3 * HASH_BLOCK_SIZE + 17];
        temp_file.write_all(&data).unwrap();
        temp_file.flush().unwrap();

        let checksum = compute_file_checksum(temp_file.path()).unwrap();
        let size = std::fs::metadata(temp_file.path()).unwrap().len();
        assert_eq!(checksum.bytes_hashed, size);
    }
}
