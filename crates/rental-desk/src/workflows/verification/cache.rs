use std::fs;
use std::io;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{LandlordId, LandlordSummary};

/// Last successfully fetched landlord summary, kept on disk for display when the API is
/// unreachable. Never consulted while the API answers.
#[derive(Debug, Clone)]
pub struct SnapshotCache {
    path: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    saved_at: DateTime<Utc>,
    summary: LandlordSummary,
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("snapshot cache io error: {0}")]
    Io(#[from] io::Error),
    #[error("snapshot cache is corrupt: {0}")]
    Format(#[from] serde_json::Error),
}

impl SnapshotCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn store(&self, summary: &LandlordSummary) -> Result<(), CacheError> {
        let snapshot = Snapshot {
            saved_at: Utc::now(),
            summary: summary.clone(),
        };
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(&snapshot)?)?;
        Ok(())
    }

    /// Cached summary for `landlord_id`; `None` when absent or cached for another account.
    pub fn load(
        &self,
        landlord_id: &LandlordId,
    ) -> Result<Option<(LandlordSummary, DateTime<Utc>)>, CacheError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
        if &snapshot.summary.id != landlord_id {
            return Ok(None);
        }
        Ok(Some((snapshot.summary, snapshot.saved_at)))
    }
}
