//! Specification document storage
//!
//! A tool is written as pretty-printed JSON to `<folder>/<ToolName>.json`.
//! Back-references are plain names, so the document is a tree and its
//! layout follows the builder's insertion order exactly. Writes go to a
//! locked temp file that is renamed into place.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::domain::Tool;

#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("Failed to encode specification for {tool}: {source}")]
    Encode {
        tool: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write specification {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SerializationError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        SerializationError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A document that was written to disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenDocument {
    pub path: PathBuf,

    /// blake3 hash of the written bytes
    pub fingerprint: String,

    pub bytes: usize,
}

/// Returns the document path for a tool
pub fn document_path(folder: &Path, tool_name: &str) -> PathBuf {
    folder.join(format!("{}.json", tool_name))
}

/// Renders the canonical document bytes
pub fn render(tool: &Tool) -> Result<Vec<u8>, SerializationError> {
    let mut bytes = serde_json::to_vec_pretty(tool).map_err(|source| SerializationError::Encode {
        tool: tool.name.clone(),
        source,
    })?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Writes the tool document into `folder`, creating the folder if needed
pub fn save(tool: &Tool, folder: &Path) -> Result<WrittenDocument, SerializationError> {
    let bytes = render(tool)?;
    let path = document_path(folder, &tool.name);

    fs::create_dir_all(folder).map_err(|e| SerializationError::io(folder, e))?;

    let temp_path = path.with_extension("json.tmp");
    if let Err(e) = write_temp(&temp_path, &bytes).and_then(|_| fs::rename(&temp_path, &path)) {
        let _ = fs::remove_file(&temp_path);
        return Err(SerializationError::io(&path, e));
    }

    let document = WrittenDocument {
        path,
        fingerprint: blake3::hash(&bytes).to_hex().to_string(),
        bytes: bytes.len(),
    };

    info!(tool = %tool.name, path = %document.path.display(), bytes = document.bytes, "wrote specification");
    Ok(document)
}

/// Writes `bytes` to `temp_path` under an exclusive lock
fn write_temp(temp_path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(temp_path)?;
    file.lock_exclusive()?;

    let mut writer = BufWriter::new(&file);
    writer.write_all(bytes)?;
    writer.flush()
}

/// Reads a previously written document back
pub fn load(path: &Path) -> Result<Tool> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read specification: {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse specification: {}", path.display()))
}
