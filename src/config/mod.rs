//! Settings file management with atomic writes and backup support.
//!
//! This module owns every disk access of the crate. The core computes new
//! file content in memory; this layer reads the game's settings files and
//! writes the result back safely:
//!
//! - **Atomic writes**: Uses temp-file-then-rename to prevent corruption
//! - **Automatic backups**: Every write of an existing file keeps a timestamped copy
//! - **All-or-nothing installs**: Every target file is computed before the first
//!   write, and a failed write rolls back the files already written
//!
//! Most targets live in the settings directory. The menu targets
//! (`input.xml`, `hidden.xml` and the next-gen file lists) live in the
//! game's menu configuration directory, set with `with_menu_dir`.
//!
//! # Example
//!
//! ```no_run
//! use modbinds::config::{ConfigManager, GameVersion, TargetFile};
//!
//! let manager = ConfigManager::new("/home/user/Documents/The Witcher 3".into(), GameVersion::NextGen)?;
//! let current = manager.read_target(TargetFile::InputSettings)?;
//! println!("input.settings present: {}", current.is_some());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
pub mod installer;
pub mod transaction;

pub use error::ConfigError;
pub use installer::{InstallReport, Installer, UninstallReport};
pub use transaction::ConfigTransaction;

use chrono::Local;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

/// Game edition; the next-gen edition keeps a second user settings file
/// for its DX12 renderer.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum GameVersion {
    /// Original release: `user.settings` only
    #[default]
    Classic,
    /// Next-gen release: `user.settings` and `dx12user.settings`
    NextGen,
}

impl FromStr for GameVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "classic" | "w3" => Ok(GameVersion::Classic),
            "ng" | "nextgen" | "next-gen" => Ok(GameVersion::NextGen),
            _ => Err(ConfigError::UnknownGameVersion(s.to_string())),
        }
    }
}

impl fmt::Display for GameVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameVersion::Classic => write!(f, "classic"),
            GameVersion::NextGen => write!(f, "ng"),
        }
    }
}

/// Game files the installer writes to
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TargetFile {
    InputSettings,
    UserSettings,
    Dx12UserSettings,
    InputXml,
    HiddenXml,
    Dx11FileList,
    Dx12FileList,
}

impl TargetFile {
    pub fn file_name(&self) -> &'static str {
        match self {
            TargetFile::InputSettings => "input.settings",
            TargetFile::UserSettings => "user.settings",
            TargetFile::Dx12UserSettings => "dx12user.settings",
            TargetFile::InputXml => "input.xml",
            TargetFile::HiddenXml => "hidden.xml",
            TargetFile::Dx11FileList => "dx11filelist.txt",
            TargetFile::Dx12FileList => "dx12filelist.txt",
        }
    }

    /// Whether the file lives in the menu configuration directory.
    pub fn is_menu_file(&self) -> bool {
        matches!(
            self,
            TargetFile::InputXml | TargetFile::HiddenXml | TargetFile::Dx11FileList | TargetFile::Dx12FileList
        )
    }
}

/// Manages the game's settings directory with safe atomic operations.
///
/// Reads are direct; writes go through `ConfigTransaction` so that each
/// one is atomic and preceded by a backup.
#[derive(Debug)]
pub struct ConfigManager {
    settings_dir: PathBuf,
    menu_dir: Option<PathBuf>,
    backup_dir: PathBuf,
    game_version: GameVersion,
}

impl ConfigManager {
    /// Creates a new ConfigManager for the given settings directory.
    ///
    /// The backup directory (`<settings_dir>/backups`) is created if it
    /// doesn't exist. Individual settings files may be missing; they are
    /// created on first write.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if the directory doesn't exist,
    /// `ConfigError::NotADirectory` if the path is a file, and
    /// `ConfigError::BackupDirNotWritable` if backups cannot be stored.
    pub fn new(settings_dir: PathBuf, game_version: GameVersion) -> Result<Self, ConfigError> {
        if !settings_dir.exists() {
            return Err(ConfigError::NotFound(settings_dir));
        }
        if !settings_dir.is_dir() {
            return Err(ConfigError::NotADirectory(settings_dir));
        }

        let backup_dir = settings_dir.join("backups");

        if !backup_dir.exists() {
            fs::create_dir_all(&backup_dir)
                .map_err(|_| ConfigError::BackupDirNotWritable(backup_dir.clone()))?;
        }

        if backup_dir.metadata()?.permissions().readonly() {
            return Err(ConfigError::BackupDirNotWritable(backup_dir));
        }

        debug!(dir = %settings_dir.display(), %game_version, "settings directory ready");

        Ok(Self {
            settings_dir,
            menu_dir: None,
            backup_dir,
            game_version,
        })
    }

    /// Sets the game's menu configuration directory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` or `ConfigError::NotADirectory` like
    /// `new` does.
    pub fn with_menu_dir(mut self, menu_dir: PathBuf) -> Result<Self, ConfigError> {
        if !menu_dir.exists() {
            return Err(ConfigError::NotFound(menu_dir));
        }
        if !menu_dir.is_dir() {
            return Err(ConfigError::NotADirectory(menu_dir));
        }

        debug!(dir = %menu_dir.display(), "menu directory ready");
        self.menu_dir = Some(menu_dir);
        Ok(self)
    }

    pub fn settings_dir(&self) -> &Path {
        &self.settings_dir
    }

    pub fn menu_dir(&self) -> Option<&Path> {
        self.menu_dir.as_deref()
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    pub fn game_version(&self) -> GameVersion {
        self.game_version
    }

    /// Full path of a target file.
    ///
    /// Menu files resolve against the settings directory while no menu
    /// directory is set.
    pub fn path(&self, target: TargetFile) -> PathBuf {
        match &self.menu_dir {
            Some(menu_dir) if target.is_menu_file() => menu_dir.join(target.file_name()),
            _ => self.settings_dir.join(target.file_name()),
        }
    }

    /// User settings files that must stay in sync for this game version.
    pub fn user_settings_targets(&self) -> Vec<TargetFile> {
        match self.game_version {
            GameVersion::Classic => vec![TargetFile::UserSettings],
            GameVersion::NextGen => vec![TargetFile::UserSettings, TargetFile::Dx12UserSettings],
        }
    }

    /// Menu file lists that must stay in sync for this game version.
    ///
    /// Only the next-gen edition keeps file lists.
    pub fn menu_list_targets(&self) -> Vec<TargetFile> {
        match self.game_version {
            GameVersion::Classic => Vec::new(),
            GameVersion::NextGen => vec![TargetFile::Dx11FileList, TargetFile::Dx12FileList],
        }
    }

    /// Reads a target file, returning `None` if it doesn't exist yet.
    ///
    /// Content must already be UTF-8; re-encoding files written by the game
    /// is left to the caller.
    pub fn read_target(&self, target: TargetFile) -> Result<Option<String>, ConfigError> {
        let path = self.path(target);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    /// Lists backups of a target file, oldest first.
    pub fn list_backups(&self, target: TargetFile) -> Result<Vec<PathBuf>, ConfigError> {
        let prefix = format!("{}.", target.file_name());

        let mut backups: Vec<PathBuf> = fs::read_dir(&self.backup_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with(&prefix))
            })
            .collect();

        // Timestamps are zero-padded, so name order is time order
        backups.sort();
        Ok(backups)
    }

    /// Copies a target file into the backup directory.
    ///
    /// Returns `None` when the target doesn't exist and there is nothing
    /// to back up.
    pub(crate) fn create_timestamped_backup(
        &self,
        target: TargetFile,
    ) -> Result<Option<PathBuf>, ConfigError> {
        let path = self.path(target);
        if !path.exists() {
            return Ok(None);
        }

        if path.read_link().is_ok() {
            warn!(path = %path.display(), "settings file is a symlink, backing up its target content");
        }

        let content = fs::read(&path)
            .map_err(|e| ConfigError::BackupFailed(format!("{}: {}", path.display(), e)))?;

        // Generate timestamp in YYYY-MM-DD_HHMMSS format
        let timestamp = Local::now().format("%Y-%m-%d_%H%M%S");
        let backup_path = self
            .backup_dir
            .join(format!("{}.{}", target.file_name(), timestamp));

        fs::write(&backup_path, content)
            .map_err(|e| ConfigError::BackupFailed(format!("{}: {}", backup_path.display(), e)))?;

        debug!(backup = %backup_path.display(), "backup created");
        Ok(Some(backup_path))
    }
}

#[cfg(test)]
mod tests;
