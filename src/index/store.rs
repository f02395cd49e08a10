//! On-disk index format
//!
//! An index directory holds two files:
//! - `index.json`: a versioned manifest with the chunks and a blake3 checksum
//!   of the vector file
//! - `vectors.bin`: the embedding matrix as little-endian `f32`, row per chunk
//!
//! Loading checks the format tag, the version, the vector file size and the
//! checksum before anything is trusted.

use super::{IndexEntry, VectorIndex};
use crate::chunk::Chunk;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

pub const MANIFEST_FILE: &str = "index.json";
pub const VECTORS_FILE: &str = "vectors.bin";
pub const FORMAT_TAG: &str = "rag-consultant-index";
pub const FORMAT_VERSION: u32 = 1;

/// Fields every manifest version carries
#[derive(Debug, Deserialize)]
struct ManifestHeader {
    format: String,
    version: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    format: String,
    version: u32,
    created_at: DateTime<Utc>,
    embedding_model: String,
    dimension: usize,
    count: usize,
    vectors_blake3: String,
    chunks: Vec<Chunk>,
}

impl VectorIndex {
    /// Persist the index into directory `path`, creating it if needed
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path)?;

        let mut bytes = Vec::with_capacity(self.entries.len() * self.dimension * 4);
        for entry in &self.entries {
            for value in &entry.embedding {
                bytes.extend_from_slice(&value.to_le_bytes());
            }
        }

        let manifest = Manifest {
            format: FORMAT_TAG.to_string(),
            version: FORMAT_VERSION,
            created_at: Utc::now(),
            embedding_model: self.embedding_model.clone(),
            dimension: self.dimension,
            count: self.entries.len(),
            vectors_blake3: blake3::hash(&bytes).to_hex().to_string(),
            chunks: self.entries.iter().map(|e| e.chunk.clone()).collect(),
        };

        write_atomic(&path.join(VECTORS_FILE), &bytes)?;
        write_atomic(
            &path.join(MANIFEST_FILE),
            &serde_json::to_vec_pretty(&manifest)?,
        )?;

        info!(
            "Saved index with {} chunks to {}",
            manifest.count,
            path.display()
        );
        Ok(())
    }

    /// Load an index previously written by [`VectorIndex::save`]
    pub fn load(path: &Path) -> Result<Self> {
        let manifest_path = path.join(MANIFEST_FILE);
        if !manifest_path.is_file() {
            return Err(Error::NotFound(format!(
                "Vector store not found: {}",
                path.display()
            )));
        }

        let raw = std::fs::read(&manifest_path)?;
        let header: ManifestHeader = serde_json::from_slice(&raw)
            .map_err(|e| Error::Format(format!("{} is not an index manifest: {}", manifest_path.display(), e)))?;
        if header.format != FORMAT_TAG {
            return Err(Error::Format(format!(
                "Unexpected index format '{}'",
                header.format
            )));
        }
        if header.version != FORMAT_VERSION {
            return Err(Error::Format(format!(
                "Unsupported index version {} (supported: {})",
                header.version, FORMAT_VERSION
            )));
        }

        let manifest: Manifest = serde_json::from_slice(&raw)
            .map_err(|e| Error::Format(format!("Malformed index manifest: {}", e)))?;
        debug!(
            "Manifest: {} chunks, dimension {}, model {}, created {}",
            manifest.count, manifest.dimension, manifest.embedding_model, manifest.created_at
        );

        if manifest.chunks.len() != manifest.count {
            return Err(Error::Format(format!(
                "Manifest lists {} chunks but declares {}",
                manifest.chunks.len(),
                manifest.count
            )));
        }
        if manifest.count > 0 && manifest.dimension == 0 {
            return Err(Error::Format("Non-empty index with zero dimension".to_string()));
        }

        let vectors_path = path.join(VECTORS_FILE);
        if !vectors_path.is_file() {
            return Err(Error::Format(format!(
                "Missing vector file {}",
                vectors_path.display()
            )));
        }
        let bytes = std::fs::read(&vectors_path)?;

        let expected_len = manifest
            .count
            .checked_mul(manifest.dimension)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| Error::Format("Index dimensions overflow".to_string()))?;
        if bytes.len() != expected_len {
            return Err(Error::Format(format!(
                "Vector file has {} bytes, expected {}",
                bytes.len(),
                expected_len
            )));
        }
        if blake3::hash(&bytes).to_hex().as_str() != manifest.vectors_blake3 {
            return Err(Error::Format(
                "Vector file checksum does not match manifest".to_string(),
            ));
        }

        let values: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        let entries = if manifest.dimension == 0 {
            Vec::new()
        } else {
            manifest
                .chunks
                .into_iter()
                .zip(values.chunks_exact(manifest.dimension))
                .map(|(chunk, row)| IndexEntry {
                    chunk,
                    embedding: row.to_vec(),
                })
                .collect()
        };

        info!("Loaded index with {} chunks from {}", manifest.count, path.display());
        Ok(Self {
            embedding_model: manifest.embedding_model,
            dimension: manifest.dimension,
            entries,
        })
    }
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, contents)?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        warn!("Failed to move {} into place: {}", tmp.display(), e);
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::EmbedSettings;
    use crate::test_support::{chunk, HashingEmbedder};
    use std::time::Duration;
    use tempfile::TempDir;

    const TIMEOUT: Duration = Duration::from_secs(5);

    async fn built_index(embedder: &HashingEmbedder) -> VectorIndex {
        let chunks = vec![
            chunk("Invoices are due within thirty days.", "billing.txt", 0),
            chunk("Late invoices incur a two percent fee.", "billing.txt", 1),
            chunk("Support is available on weekdays.", "support.txt", 0),
            chunk("Weekend support requires a premium plan.", "support.txt", 1),
        ];
        let settings = EmbedSettings {
            batch_size: 3,
            timeout: TIMEOUT,
        };
        VectorIndex::build(chunks, embedder, settings).await.unwrap()
    }

    #[tokio::test]
    async fn test_round_trip_answers_identically() {
        let tmp = TempDir::new().unwrap();
        let store = tmp.path().join("nested/vector_store");
        let embedder = HashingEmbedder::default();
        let index = built_index(&embedder).await;

        index.save(&store).unwrap();
        let loaded = VectorIndex::load(&store).unwrap();

        assert_eq!(loaded, index);
        for question in ["When are invoices due?", "weekend support", "fee"] {
            let fresh = index.query(&embedder, question, 3, TIMEOUT).await.unwrap();
            let restored = loaded.query(&embedder, question, 3, TIMEOUT).await.unwrap();
            assert_eq!(fresh, restored);
        }
    }

    #[test]
    fn test_empty_index_round_trip() {
        let tmp = TempDir::new().unwrap();
        let index = VectorIndex::from_parts("stub".to_string(), 0, Vec::new(), Vec::new());

        index.save(tmp.path()).unwrap();
        let loaded = VectorIndex::load(tmp.path()).unwrap();

        assert!(loaded.is_empty());
        assert_eq!(loaded.embedding_model(), "stub");
    }

    #[test]
    fn test_missing_path() {
        let tmp = TempDir::new().unwrap();
        let result = VectorIndex::load(&tmp.path().join("does-not-exist"));
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_unknown_version_rejected() {
        let tmp = TempDir::new().unwrap();
        let embedder = HashingEmbedder::default();
        built_index(&embedder).await.save(tmp.path()).unwrap();

        let manifest_path = tmp.path().join(MANIFEST_FILE);
        let mut manifest: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&manifest_path).unwrap()).unwrap();
        manifest["version"] = serde_json::json!(99);
        std::fs::write(&manifest_path, serde_json::to_vec(&manifest).unwrap()).unwrap();

        let err = VectorIndex::load(tmp.path()).unwrap_err();
        assert!(matches!(err, Error::Format(ref msg) if msg.contains("99")));
    }

    #[tokio::test]
    async fn test_tampered_vectors_rejected() {
        let tmp = TempDir::new().unwrap();
        let embedder = HashingEmbedder::default();
        built_index(&embedder).await.save(tmp.path()).unwrap();

        let vectors_path = tmp.path().join(VECTORS_FILE);
        let mut bytes = std::fs::read(&vectors_path).unwrap();
        bytes[0] ^= 0xff;
        std::fs::write(&vectors_path, &bytes).unwrap();

        assert!(matches!(VectorIndex::load(tmp.path()), Err(Error::Format(_))));
    }

    #[tokio::test]
    async fn test_truncated_vectors_rejected() {
        let tmp = TempDir::new().unwrap();
        let embedder = HashingEmbedder::default();
        built_index(&embedder).await.save(tmp.path()).unwrap();

        let vectors_path = tmp.path().join(VECTORS_FILE);
        let bytes = std::fs::read(&vectors_path).unwrap();
        std::fs::write(&vectors_path, &bytes[..bytes.len() - 4]).unwrap();

        assert!(matches!(VectorIndex::load(tmp.path()), Err(Error::Format(_))));
    }

    #[test]
    fn test_foreign_data_rejected() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(MANIFEST_FILE), b"\x80\x04pickle").unwrap();
        assert!(matches!(VectorIndex::load(tmp.path()), Err(Error::Format(_))));

        std::fs::write(
            tmp.path().join(MANIFEST_FILE),
            br#"{"format": "faiss", "version": 1}"#,
        )
        .unwrap();
        assert!(matches!(VectorIndex::load(tmp.path()), Err(Error::Format(_))));
    }
}
