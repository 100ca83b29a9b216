// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Settings file transactions with automatic backups
//!
//! Provides atomic write operations for a single target file.

use atomic_write_file::AtomicWriteFile;
use std::{fs, io::Write, path::{Path, PathBuf}};
use tracing::info;

use crate::config::{ConfigError, ConfigManager, TargetFile};

/// Atomic write of one settings file, with automatic backup.
///
/// - **Atomic**: The file is replaced by rename, never half-written
/// - **Durable**: A backup of the previous content exists before the write
///
/// # Lifecycle
///
/// 1. `begin()` - Backs up the current file (if there is one)
/// 2. Caller computes the new content in memory
/// 3. `commit()` - Writes atomically, or `rollback()` - Restores the backup
///
/// # Example
///
/// ```no_run
/// use modbinds::config::{ConfigManager, ConfigTransaction, GameVersion, TargetFile};
///
/// let manager = ConfigManager::new("settings".into(), GameVersion::Classic)?;
/// let tx = ConfigTransaction::begin(&manager, TargetFile::InputSettings)?;
///
/// match tx.commit("[Exploration]\nIK_E=(Action=Use)\n") {
///     Ok(()) => println!("Changes applied successfully"),
///     Err(e) => eprintln!("Commit failed: {}", e),
/// }
/// # Ok::<(), modbinds::config::ConfigError>(())
/// ```
pub struct ConfigTransaction<'a> {
    manager: &'a ConfigManager,
    target: TargetFile,
    /// `None` when the file did not exist at `begin()`
    backup_path: Option<PathBuf>,
}

impl<'a> ConfigTransaction<'a> {
    /// Begins a new transaction by backing up the target file.
    ///
    /// The transaction cannot outlive the manager (enforced by `'a`).
    ///
    /// # Errors
    ///
    /// Returns an error if the existing file cannot be read or the backup
    /// cannot be written. No changes are made in that case.
    pub fn begin(manager: &'a ConfigManager, target: TargetFile) -> Result<Self, ConfigError> {
        let backup_path = manager.create_timestamped_backup(target)?;

        Ok(Self {
            manager,
            target,
            backup_path,
        })
    }

    /// Backup taken at `begin()`, if the file existed.
    pub fn backup_path(&self) -> Option<&Path> {
        self.backup_path.as_deref()
    }

    /// Commits the transaction by atomically writing new content.
    ///
    /// Consumes the transaction, preventing accidental double commits.
    /// On error the original file is unchanged.
    pub fn commit(self, new_content: &str) -> Result<(), ConfigError> {
        self.write(new_content)
    }

    /// Writes without consuming, so a multi-file install can still roll
    /// this file back if a later file fails.
    pub(crate) fn write(&self, new_content: &str) -> Result<(), ConfigError> {
        let path = self.manager.path(self.target);
        write_atomically(&path, new_content)?;

        info!(file = self.target.file_name(), bytes = new_content.len(), "settings file written");
        Ok(())
    }

    /// Restores the file to its state at `begin()`.
    ///
    /// If the file did not exist when the transaction began, it is removed.
    pub fn rollback(&self) -> Result<(), ConfigError> {
        let path = self.manager.path(self.target);

        match &self.backup_path {
            Some(backup_path) => {
                let backup_content = fs::read_to_string(backup_path)?;
                write_atomically(&path, &backup_content)?;
            }
            None => {
                if path.exists() {
                    fs::remove_file(&path)?;
                }
            }
        }

        info!(file = self.target.file_name(), "settings file rolled back");
        Ok(())
    }
}

fn write_atomically(path: &Path, content: &str) -> Result<(), ConfigError> {
    let mut file = AtomicWriteFile::options().open(path).map_err(|e| {
        ConfigError::WriteFailed(format!("Failed to open for atomic write: {}", e))
    })?;

    file.write_all(content.as_bytes())
        .map_err(|e| ConfigError::WriteFailed(format!("Failed to write content: {}", e)))?;

    file.commit().map_err(|e| {
        ConfigError::WriteFailed(format!("Failed to commit atomic write: {}", e))
    })?;

    Ok(())
}
