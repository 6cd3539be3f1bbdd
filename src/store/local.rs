//! Local document file

use crate::error::{OrbitError, Result};
use crate::store::document::StudyDocument;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Study document kept on local disk
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document; `None` when the file does not exist
    pub fn load(&self) -> Result<Option<StudyDocument>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let doc = serde_json::from_str(&content).map_err(|e| {
            OrbitError::Store(format!("Failed to parse {}: {}", self.path.display(), e))
        })?;
        Ok(Some(doc))
    }

    /// Write the document, creating parent directories as needed
    pub fn save(&self, doc: &StudyDocument) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&self.path, doc.to_pretty_json()?)?;
        debug!(path = %self.path.display(), "saved study document locally");
        Ok(())
    }
}
