//! Durable storage for the single Dataverse credential.
//!
//! The store holds at most one serialized credential with last-write-wins
//! semantics. Writes always replace the credential wholesale; there is no
//! partial patching, so a reader never observes a half-updated token pair.
//! The backing implementation is pluggable behind `CredentialStore` so the
//! file store can be swapped for an embedded DB or a managed secret store
//! without touching the auth service.

use crate::auth::models::Credential;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;

/// Narrow load/save/delete interface over the credential singleton.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns the stored credential, or `None` when logged out.
    async fn load(&self) -> Result<Option<Credential>>;

    /// Replaces the stored credential wholesale.
    async fn save(&self, credential: &Credential) -> Result<()>;

    /// Removes the stored credential. Deleting an absent credential is not
    /// an error.
    async fn delete(&self) -> Result<()>;
}

/// File-backed credential store.
///
/// Saves write to a sibling temp file and rename over the target, so the
/// credential file is replaced atomically. Note the known limitation from
/// the hosting model: when the configured path itself is ephemeral (worker
/// recycling wipes the directory), a cold start still forces a re-login.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<Option<Credential>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).context(format!(
                    "Failed to read credential file {}",
                    self.path.display()
                ));
            }
        };

        let credential = serde_json::from_str(&contents).context(format!(
            "Credential file {} is malformed",
            self.path.display()
        ))?;
        Ok(Some(credential))
    }

    async fn save(&self, credential: &Credential) -> Result<()> {
        let serialized =
            serde_json::to_string_pretty(credential).context("Failed to serialize credential")?;

        let tmp_path = self.path.with_extension("tmp");
        tokio::fs::write(&tmp_path, serialized).await.context(format!(
            "Failed to write credential file {}",
            tmp_path.display()
        ))?;
        tokio::fs::rename(&tmp_path, &self.path).await.context(format!(
            "Failed to replace credential file {}",
            self.path.display()
        ))?;
        Ok(())
    }

    async fn delete(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context(format!(
                "Failed to delete credential file {}",
                self.path.display()
            )),
        }
    }
}

/// In-memory credential store used by tests.
#[cfg(test)]
pub struct MemoryCredentialStore {
    credential: std::sync::Mutex<Option<Credential>>,
}

#[cfg(test)]
impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self {
            credential: std::sync::Mutex::new(None),
        }
    }

    pub fn with_credential(credential: Credential) -> Self {
        Self {
            credential: std::sync::Mutex::new(Some(credential)),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> Result<Option<Credential>> {
        Ok(self.credential.lock().unwrap().clone())
    }

    async fn save(&self, credential: &Credential) -> Result<()> {
        *self.credential.lock().unwrap() = Some(credential.clone());
        Ok(())
    }

    async fn delete(&self) -> Result<()> {
        *self.credential.lock().unwrap() = None;
        Ok(())
    }
}
