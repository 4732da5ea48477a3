//! Content hashing for change detection

use std::path::Path;

use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;

use crate::error::Result;

/// Read buffer size for streaming file hashes
const HASH_BUF_SIZE: usize = 64 * 1024;

/// Supported content hash algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Md5,
}

impl HashAlgorithm {
    /// Hash a byte slice, returning lowercase hex
    pub fn hash_bytes(&self, bytes: &[u8]) -> String {
        match self {
            HashAlgorithm::Sha256 => hex_digest::<Sha256>(bytes),
            HashAlgorithm::Md5 => hex_digest::<Md5>(bytes),
        }
    }

    /// Hash a file's contents without loading the whole file into memory
    pub async fn hash_file(&self, path: &Path) -> Result<String> {
        match self {
            HashAlgorithm::Sha256 => hash_file_streaming::<Sha256>(path).await,
            HashAlgorithm::Md5 => hash_file_streaming::<Md5>(path).await,
        }
    }
}

fn hex_digest<D: Digest>(bytes: &[u8]) -> String {
    let mut hasher = D::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

async fn hash_file_streaming<D: Digest>(path: &Path) -> Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = D::new();
    let mut buf = vec![0u8; HASH_BUF_SIZE];

    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            HashAlgorithm::Sha256.hash_bytes(b"hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_md5_known_vector() {
        assert_eq!(
            HashAlgorithm::Md5.hash_bytes(b"hello world"),
            "5eb63bbbe01eeed093cb22bb8f5acdc3"
        );
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&HashAlgorithm::Sha256).unwrap(),
            "\"sha256\""
        );
        let parsed: HashAlgorithm = serde_json::from_str("\"md5\"").unwrap();
        assert_eq!(parsed, HashAlgorithm::Md5);
    }

    #[test]
    fn test_hash_file_matches_bytes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        // Larger than one read buffer to exercise the streaming loop
        let content = vec![0xabu8; HASH_BUF_SIZE + 17];
        file.write_all(&content).unwrap();
        file.flush().unwrap();

        let from_file = tokio_test::block_on(HashAlgorithm::Sha256.hash_file(file.path()));
        assert_eq!(from_file.unwrap(), HashAlgorithm::Sha256.hash_bytes(&content));
    }

    #[test]
    fn test_hash_file_missing_is_error() {
        let result = tokio_test::block_on(
            HashAlgorithm::Sha256.hash_file(Path::new("/nonexistent/toolsmith-hash-test")),
        );
        assert!(result.is_err());
    }
}
