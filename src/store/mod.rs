//! Store Module
//!
//! Loads and saves the study document, preferring a GitHub repository and
//! falling back to a local file.

pub mod document;
pub mod github;
pub mod local;

pub use document::{ArchivedSession, ChatMessage, Role, StudyDocument, YearUnits};
pub use github::GithubStore;
pub use local::LocalStore;

use crate::config::Settings;
use crate::error::Result;
use tracing::{info, warn};

/// Where a save landed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveTarget {
    Remote,
    Local,
}

/// Document store with an optional remote
pub struct ConfigStore {
    remote: Option<GithubStore>,
    local: LocalStore,
}

impl ConfigStore {
    pub fn new(remote: Option<GithubStore>, local: LocalStore) -> Self {
        Self { remote, local }
    }

    /// Build from settings; the remote is used only when token and repo are set
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let remote = match &settings.github {
            Some(github) => GithubStore::from_settings(github)?,
            None => None,
        };
        if remote.is_none() {
            info!("GitHub store not configured, using local document only");
        }
        Ok(Self::new(
            remote,
            LocalStore::new(settings.local_document_path()),
        ))
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub fn local(&self) -> &LocalStore {
        &self.local
    }

    /// Load from the remote, falling back to the local file when the remote
    /// is missing or fails. `None` when neither holds a document.
    pub async fn load(&self) -> Result<Option<StudyDocument>> {
        if let Some(remote) = &self.remote {
            match remote.load().await {
                Ok(Some(doc)) => return Ok(Some(doc)),
                Ok(None) => warn!(url = %remote.url(), "no remote document, checking local"),
                Err(e) => warn!(error = %e, "cloud load failed, checking local"),
            }
        }
        self.local.load()
    }

    /// Save to the remote when one is configured, otherwise to the local file
    pub async fn save(&self, doc: &StudyDocument) -> Result<SaveTarget> {
        match &self.remote {
            Some(remote) => {
                remote.save(doc).await?;
                Ok(SaveTarget::Remote)
            }
            None => {
                self.local.save(doc)?;
                Ok(SaveTarget::Local)
            }
        }
    }
}
