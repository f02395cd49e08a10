//! Knowledge base loading
//!
//! Walks a directory tree and reads every plain-text file into a
//! [`Document`]. Files that cannot be read or decoded are reported back to
//! the caller instead of aborting the whole load.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Metadata attached to a document and inherited by its chunks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// File the text was read from
    pub source: PathBuf,
}

/// A loaded source document
#[derive(Debug, Clone)]
pub struct Document {
    pub text: String,
    pub metadata: Metadata,
}

/// A file that was discovered but could not be loaded
#[derive(Debug, Clone, Serialize)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of loading a directory
#[derive(Debug, Default)]
pub struct LoadReport {
    pub documents: Vec<Document>,
    pub failures: Vec<LoadFailure>,
}

/// Load every file under `dir` whose extension is in `extensions`.
///
/// Traversal is recursive and sorted by file name, so the document order is
/// stable across runs.
pub fn load_documents(dir: &Path, extensions: &[String]) -> Result<LoadReport> {
    if !dir.is_dir() {
        return Err(Error::NotFound(format!(
            "Directory not found: {}",
            dir.display()
        )));
    }

    info!("Loading documents from {}", dir.display());

    let mut report = LoadReport::default();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
                warn!("Skipping unreadable entry {}: {}", path.display(), e);
                report.failures.push(LoadFailure {
                    path,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        if !entry.file_type().is_file() || !has_extension(entry.path(), extensions) {
            continue;
        }

        let path = entry.path();
        match read_text(path) {
            Ok(text) => {
                debug!("Loaded {} ({} bytes)", path.display(), text.len());
                report.documents.push(Document {
                    text,
                    metadata: Metadata {
                        source: path.to_path_buf(),
                    },
                });
            }
            Err(reason) => {
                warn!("Skipping {}: {}", path.display(), reason);
                report.failures.push(LoadFailure {
                    path: path.to_path_buf(),
                    reason,
                });
            }
        }
    }

    info!(
        "Loaded {} documents ({} failed)",
        report.documents.len(),
        report.failures.len()
    );

    Ok(report)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

fn read_text(path: &Path) -> std::result::Result<String, String> {
    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
    String::from_utf8(bytes).map_err(|e| format!("not valid UTF-8: {}", e))
}
