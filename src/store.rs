use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

/// A registered account as it is persisted on disk.
///
/// The hash is stored alongside the rest of the record; the HTTP layer is
/// responsible for never echoing it back to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read user store: {0}")]
    Read(#[source] std::io::Error),
    #[error("failed to write user store: {0}")]
    Write(#[source] std::io::Error),
    #[error("failed to encode user store: {0}")]
    Encode(#[source] serde_json::Error),
}

/// File-backed credential store.
///
/// The whole collection lives in one human-inspectable JSON array and is
/// rewritten wholesale on every change. There is no partial update: callers
/// load the full set, mutate it in memory and save it back. That sequence is
/// not safe against concurrent writers, so mutating callers must serialize it
/// (see `AuthService::register`).
pub struct UserStore {
    path: PathBuf,
}

impl UserStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the entire persisted collection.
    ///
    /// A missing file is initialized to an empty collection. Content that is
    /// present but not parseable degrades to an empty collection instead of
    /// failing the request; the parse error is logged so an operator can spot
    /// a corrupted store before the next signup overwrites it.
    pub async fn load_all(&self) -> Result<Vec<User>, StoreError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.save_all(&[]).await?;
                return Ok(Vec::new());
            }
            Err(e) => return Err(StoreError::Read(e)),
        };

        match serde_json::from_slice::<Vec<User>>(&raw) {
            Ok(users) => Ok(users),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "user store is not valid JSON; treating it as empty"
                );
                Ok(Vec::new())
            }
        }
    }

    /// Replaces the persisted collection with `users`.
    ///
    /// Writes to a temporary file in the same directory and renames it over
    /// the store, so a concurrent `load_all` never observes a half-written
    /// snapshot.
    pub async fn save_all(&self, users: &[User]) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(users).map_err(StoreError::Encode)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &json)
            .await
            .map_err(StoreError::Write)?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(StoreError::Write)?;
        Ok(())
    }
}
