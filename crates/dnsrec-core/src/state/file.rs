// # Run State File
//
// Persists a RunState to disk so an interrupted run can still be torn down.
//
// ## Crash Recovery
//
// - Atomic writes: Uses write-then-rename for atomicity
// - Automatic backup: Keeps .backup of last known good state
// - Recovery: Falls back to backup if the main file fails to parse
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "state": {
//     "resources": {
//       "digitalocean_record.foobar": {
//         "kind": "record",
//         "id": "3352896",
//         "attributes": { "name": "terraform", "value": "192.168.0.10", ... },
//         "applied_at": "2025-01-09T12:00:00Z"
//       }
//     },
//     "created": [ ... ]
//   }
// }
// ```

use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::RunState;
use crate::Error;

/// State file format version
const STATE_FILE_VERSION: &str = "1.0";

/// Serializable state file format
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct StateFileFormat {
    version: String,
    state: RunState,
}

/// Location of a persisted run state
///
/// # Example
///
/// ```rust,no_run
/// use dnsrec_core::state::{RunState, RunStateFile};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let file = RunStateFile::new("/var/lib/dnsrec/run.json").await?;
///     file.save(&RunState::new()).await?;
///     let restored = file.load().await?;
///     assert!(restored.is_empty());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RunStateFile {
    path: PathBuf,
}

impl RunStateFile {
    /// Create a handle, creating parent directories if needed
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::config(format!(
                    "Failed to create state directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the run state, recovering from the backup if the main file is corrupt
    ///
    /// A missing file yields an empty state.
    pub async fn load(&self) -> Result<RunState, Error> {
        match Self::read(&self.path).await {
            Ok(state) => Ok(state),
            Err(Error::Json(e)) => {
                tracing::warn!(
                    "State file {} appears corrupted: {}. Attempting recovery from backup.",
                    self.path.display(),
                    e
                );
                let backup = self.backup_path();
                if !backup.exists() {
                    return Err(Error::state(format!(
                        "State file {} is corrupted and no backup exists",
                        self.path.display()
                    )));
                }
                let state = Self::read(&backup).await?;
                tracing::info!("Recovered run state from backup: {} resources", state.len());
                Ok(state)
            }
            Err(e) => Err(e),
        }
    }

    async fn read(path: &Path) -> Result<RunState, Error> {
        if !path.exists() {
            tracing::debug!("State file does not exist: {}", path.display());
            return Ok(RunState::new());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::state(format!("Failed to read state file {}: {}", path.display(), e))
        })?;

        let file: StateFileFormat = serde_json::from_str(&content)?;
        if file.version != STATE_FILE_VERSION {
            tracing::warn!(
                "State file version mismatch: expected {}, got {}. Attempting to load anyway.",
                STATE_FILE_VERSION,
                file.version
            );
        }

        Ok(file.state)
    }

    /// Write the run state atomically
    pub async fn save(&self, state: &RunState) -> Result<(), Error> {
        let file = StateFileFormat {
            version: STATE_FILE_VERSION.to_string(),
            state: state.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;

        let temp_path = self.temp_path();
        {
            let mut temp = fs::File::create(&temp_path).await.map_err(|e| {
                Error::state(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
            temp.write_all(json.as_bytes()).await?;
            temp.flush().await?;
        }

        if self.path.exists()
            && let Err(e) = fs::copy(&self.path, self.backup_path()).await
        {
            tracing::warn!("Failed to create backup: {}", e);
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::state(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Run state written to {}", self.path.display());
        Ok(())
    }

    /// Remove the state file and its backup
    pub async fn remove(&self) -> Result<(), Error> {
        for path in [self.path.clone(), self.backup_path()] {
            if path.exists() {
                fs::remove_file(&path).await?;
            }
        }
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone().into_os_string();
        temp.push(".tmp");
        PathBuf::from(temp)
    }

    fn backup_path(&self) -> PathBuf {
        let mut backup = self.path.clone().into_os_string();
        backup.push(".backup");
        PathBuf::from(backup)
    }
}
