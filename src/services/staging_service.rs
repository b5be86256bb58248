//! Content-addressed staging and permanent storage for uploaded POM files.
//!
//! Staged files live under `<base>/staging/<digest>.tmp`; promoted files
//! under `<base>/poms/<2-char shard>/<digest>.pom`. All operations are
//! idempotent with respect to a given digest.

use sha2::{Digest, Sha256};
use std::path::PathBuf;
use tokio::fs;

use crate::error::{AppError, Result};

/// Handle to one staged upload
#[derive(Debug, Clone)]
pub struct StagedPom {
    /// SHA-256 hex digest of the uploaded bytes
    pub digest: String,
    pub temp_path: PathBuf,
}

/// Filesystem content store
pub struct StagingService {
    staging_dir: PathBuf,
    pom_dir: PathBuf,
}

impl StagingService {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        let base = base_path.into();
        Self {
            staging_dir: base.join("staging"),
            pom_dir: base.join("poms"),
        }
    }

    /// Calculate SHA-256 digest of data
    pub fn calculate_sha256(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        format!("{:x}", hasher.finalize())
    }

    /// Stage uploaded bytes into a digest-named temporary file.
    ///
    /// Re-staging the same bytes overwrites the same temp file.
    pub async fn stage(&self, bytes: &[u8]) -> Result<StagedPom> {
        let digest = Self::calculate_sha256(bytes);

        fs::create_dir_all(&self.staging_dir)
            .await
            .map_err(|e| AppError::Staging(format!("Failed to create staging dir: {}", e)))?;

        let temp_path = self.staging_dir.join(format!("{}.tmp", digest));
        fs::write(&temp_path, bytes)
            .await
            .map_err(|e| AppError::Staging(format!("Failed to stage {}: {}", digest, e)))?;

        Ok(StagedPom { digest, temp_path })
    }

    /// Move a staged file to its permanent digest-keyed location.
    ///
    /// Promoting a digest that is already permanent is a no-op.
    pub async fn promote(&self, staged: &StagedPom) -> Result<PathBuf> {
        let shard = &staged.digest[..2.min(staged.digest.len())];
        let dir = self.pom_dir.join(shard);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::Staging(format!("Failed to create pom dir: {}", e)))?;

        let dest = dir.join(format!("{}.pom", staged.digest));
        if fs::try_exists(&dest).await.unwrap_or(false) {
            let _ = fs::remove_file(&staged.temp_path).await;
            return Ok(dest);
        }

        if fs::rename(&staged.temp_path, &dest).await.is_err() {
            // A concurrent promote of the same digest may have won the rename.
            if fs::try_exists(&dest).await.unwrap_or(false) {
                let _ = fs::remove_file(&staged.temp_path).await;
                return Ok(dest);
            }
            // rename can also fail across filesystems; fall back to copy+remove
            fs::copy(&staged.temp_path, &dest)
                .await
                .map_err(|e| AppError::Staging(format!("Failed to promote {}: {}", staged.digest, e)))?;
            let _ = fs::remove_file(&staged.temp_path).await;
        }

        Ok(dest)
    }

    /// Remove a staged temporary file. Removing an already-removed file
    /// succeeds.
    pub async fn discard(&self, staged: &StagedPom) -> Result<()> {
        match fs::remove_file(&staged.temp_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Staging(format!(
                "Failed to discard {}: {}",
                staged.digest, e
            ))),
        }
    }
}
