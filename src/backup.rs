//! Backup and restore of documents before mutation

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Local;
use tracing::{debug, info};

use crate::error::PersistenceError;

#[async_trait]
pub trait BackupStore: Send + Sync {
    /// Snapshot `path`, returning where the copy was written
    async fn create_backup(&self, path: &Path) -> Result<PathBuf, PersistenceError>;

    /// Put the snapshot at `backup` back over `target`
    async fn restore_backup(&self, backup: &Path, target: &Path) -> Result<(), PersistenceError>;
}

/// Timestamped copies in one directory
#[derive(Debug, Clone)]
pub struct FileBackupStore {
    dir: PathBuf,
}

impl FileBackupStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<data dir>/dochub/backups`, or `./.dochub-backups` when there is no data dir
    pub fn default_location() -> Self {
        let dir = dirs::data_local_dir()
            .map(|dir| dir.join("dochub").join("backups"))
            .unwrap_or_else(|| PathBuf::from(".dochub-backups"));
        Self::new(dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn backup_name(path: &Path, attempt: u32) -> String {
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("document");
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("docx");
        let stamp = Local::now().format("%Y%m%d_%H%M%S_%3f");
        match attempt {
            0 => format!("{stem}_{stamp}.{extension}"),
            n => format!("{stem}_{stamp}_{n}.{extension}"),
        }
    }

    /// Claim a backup file nobody else holds; same-named sources backed up in
    /// the same millisecond get distinct suffixes
    async fn reserve_backup_path(&self, path: &Path) -> std::io::Result<PathBuf> {
        let mut attempt = 0;
        loop {
            let candidate = self.dir.join(Self::backup_name(path, attempt));
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
                .await
            {
                Ok(_) => return Ok(candidate),
                Err(err) if err.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(err) => return Err(err),
            }
        }
    }
}

#[async_trait]
impl BackupStore for FileBackupStore {
    async fn create_backup(&self, path: &Path) -> Result<PathBuf, PersistenceError> {
        let backup_error = |message: String| PersistenceError::Backup {
            path: path.to_path_buf(),
            message,
        };

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|err| backup_error(format!("cannot create {}: {err}", self.dir.display())))?;

        let backup = self
            .reserve_backup_path(path)
            .await
            .map_err(|err| backup_error(format!("cannot reserve backup: {err}")))?;
        if let Err(err) = tokio::fs::copy(path, &backup).await {
            let _ = tokio::fs::remove_file(&backup).await;
            return Err(backup_error(err.to_string()));
        }

        info!(
            event = "backup.created",
            source = %path.display(),
            backup = %backup.display()
        );
        Ok(backup)
    }

    async fn restore_backup(&self, backup: &Path, target: &Path) -> Result<(), PersistenceError> {
        tokio::fs::copy(backup, target)
            .await
            .map_err(|err| PersistenceError::Restore {
                backup: backup.to_path_buf(),
                message: err.to_string(),
            })?;
        debug!(
            event = "backup.restored",
            backup = %backup.display(),
            target = %target.display()
        );
        Ok(())
    }
}
