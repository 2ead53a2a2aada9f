//! JSON file storage for the invitation ledger
//!
//! Saves go to a sibling temporary file that is then renamed over the
//! ledger, so a reader sees either the previous or the new document.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::error::{InviterError, InviterResult};
use crate::traits::LedgerStore;
use crate::types::LedgerState;

/// Ledger stored as pretty-printed JSON
pub struct JsonLedgerStore {
    path: PathBuf,
}

impl JsonLedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "ledger.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn storage_error(&self, operation: &str, error: impl std::fmt::Display) -> InviterError {
        InviterError::LedgerError {
            operation: operation.to_string(),
            path: self.path.display().to_string(),
            message: error.to_string(),
        }
    }
}

#[async_trait]
impl LedgerStore for JsonLedgerStore {
    async fn load(&self) -> InviterResult<Option<LedgerState>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.storage_error("read", e)),
        };

        let state = serde_json::from_str(&content).map_err(|e| self.storage_error("parse", e))?;
        Ok(Some(state))
    }

    async fn save(&self, state: &LedgerState) -> InviterResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| self.storage_error("create directory", e))?;
            }
        }

        let content = serde_json::to_string_pretty(state)?;
        let temp_path = self.temp_path();

        fs::write(&temp_path, content)
            .await
            .map_err(|e| self.storage_error("write", e))?;
        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| self.storage_error("rename", e))?;

        Ok(())
    }
}
