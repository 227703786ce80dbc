//! Payload codec for heavy I/O files
//!
//! A stored file is a JSON record holding the SHA-256 of the uncompressed
//! content and the gzip-compressed content as hex. Decoding reverses the
//! steps and rejects the payload if the recomputed hash differs.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{BenchError, Result};

/// Size of one generated content chunk
pub const CHUNK_SIZE: usize = 1024;

/// On-disk record for a heavy I/O file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilePayload {
    /// Hex SHA-256 of the uncompressed content
    pub hash: String,
    /// Hex-encoded gzip stream
    pub data: String,
    /// Unix milliseconds at encode time
    pub timestamp: i64,
}

/// Generate `size_mb` MiB worth of deterministic text chunks for `seed`
pub fn generate_content(size_mb: usize, seed: &str) -> String {
    let total_chunks = size_mb * 1024;
    let filler = "x".repeat(900);
    let mut content = String::with_capacity(total_chunks * CHUNK_SIZE);

    for i in 0..total_chunks {
        content.push_str(&format!("Data chunk {} with seed {}: {}\n", i, seed, filler));
    }

    content
}

/// Hex SHA-256 digest
pub fn compute_hash(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}

/// Gzip at the default compression level
pub fn compress(content: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(content)?;
    encoder.finish()
}

pub fn decompress(compressed: &[u8]) -> std::io::Result<String> {
    let mut decoder = GzDecoder::new(compressed);
    let mut content = String::new();
    decoder.read_to_string(&mut content)?;
    Ok(content)
}

/// Hash, compress and wrap content into the serialized file record
pub fn encode_payload(content: &str) -> Result<Vec<u8>> {
    let hash = compute_hash(content.as_bytes());
    let compressed = compress(content.as_bytes())?;

    let payload = FilePayload {
        hash,
        data: hex::encode(compressed),
        timestamp: chrono::Utc::now().timestamp_millis(),
    };

    Ok(serde_json::to_vec(&payload)?)
}

/// Unwrap a serialized file record and verify its hash
pub fn decode_payload(raw: &[u8]) -> Result<String> {
    let payload: FilePayload = serde_json::from_slice(raw)?;
    let compressed = hex::decode(&payload.data)?;
    let content = decompress(&compressed)
        .map_err(|e| BenchError::PayloadError(format!("gzip decoding failed: {}", e)))?;

    let actual = compute_hash(content.as_bytes());
    if actual != payload.hash {
        return Err(BenchError::HashMismatch {
            expected: payload.hash,
            actual,
        });
    }

    Ok(content)
}
