//! Installs and uninstalls a mod's records into the game's files.
//!
//! Every operation follows the same steps: read the current target files,
//! compute their new content in memory with the core, and only then write
//! them through `ConfigTransaction`s. A parse or merge failure in any file
//! leaves every file untouched; a failed write rolls back the files
//! already written.

use tracing::{info, info_span, warn};

use crate::config::{ConfigError, ConfigManager, ConfigTransaction, TargetFile};
use crate::core::{
    conflict::{remove_keys, ConflictResolver, MergeEngine, MergeOutcome},
    menu::{
        install_menu_entries, install_xml_vars, uninstall_menu_entries, uninstall_xml_vars, HIDDEN_XML_ANCHOR,
        INPUT_XML_ANCHOR,
    },
    parser::parse_input_settings,
    serializer::serialize_input_settings,
    settings::SettingsDocument,
    Key, ModSettings,
};

/// New content for one target file
struct PendingWrite {
    target: TargetFile,
    content: String,
}

/// What `Installer::install` changed
#[derive(Debug, Default, PartialEq)]
pub struct InstallReport {
    /// Merge of the mod's bindings into `input.settings`
    pub input: MergeOutcome,
    /// User settings applied to `user.settings`
    pub user_settings: usize,
    /// Vars inserted into `input.xml` and `hidden.xml`
    pub xml_vars: usize,
    /// Entries appended to `dx11filelist.txt`
    pub menus: usize,
}

/// What `Installer::uninstall` removed
#[derive(Debug, Default, PartialEq)]
pub struct UninstallReport {
    pub bindings: usize,
    pub user_settings: usize,
    pub xml_vars: usize,
    pub menus: usize,
}

/// Applies `ModSettings` to the files of one game installation.
pub struct Installer<'a> {
    manager: &'a ConfigManager,
}

impl<'a> Installer<'a> {
    pub fn new(manager: &'a ConfigManager) -> Self {
        Self { manager }
    }

    /// Installs everything the mod carries as one unit.
    ///
    /// Every target file is read and parsed before `resolver` is asked
    /// about the first conflict, and nothing is written unless every new
    /// file content could be computed.
    pub fn install(
        &self,
        mod_settings: &ModSettings,
        resolver: &mut dyn ConflictResolver,
    ) -> Result<InstallReport, ConfigError> {
        let _span = info_span!("install").entered();
        let mut writes = Vec::new();

        let user_settings = self.plan_user_settings_install(mod_settings, &mut writes)?;
        let xml_vars = self.plan_xml_vars_install(mod_settings, &mut writes)?;
        let menus = self.plan_menus_install(mod_settings, &mut writes)?;
        let input = self.plan_input_keys_install(mod_settings, resolver, &mut writes)?;

        self.commit_all(writes)?;

        info!(
            added = input.added,
            skipped = input.skipped,
            user_settings,
            xml_vars,
            menus,
            "mod installed"
        );
        Ok(InstallReport {
            input,
            user_settings,
            xml_vars,
            menus,
        })
    }

    /// Removes everything the mod carries as one unit.
    pub fn uninstall(&self, mod_settings: &ModSettings) -> Result<UninstallReport, ConfigError> {
        let _span = info_span!("uninstall").entered();
        let mut writes = Vec::new();

        let report = UninstallReport {
            bindings: self.plan_input_keys_uninstall(mod_settings, &mut writes)?,
            user_settings: self.plan_user_settings_uninstall(mod_settings, &mut writes)?,
            xml_vars: self.plan_xml_vars_uninstall(mod_settings, &mut writes)?,
            menus: self.plan_menus_uninstall(mod_settings, &mut writes)?,
        };

        self.commit_all(writes)?;

        info!(
            bindings = report.bindings,
            user_settings = report.user_settings,
            xml_vars = report.xml_vars,
            menus = report.menus,
            "mod uninstalled"
        );
        Ok(report)
    }

    /// Merges the mod's bindings into `input.settings`.
    ///
    /// Conflicts are decided by `resolver`. Returns the merge outcome; the
    /// file is left alone when the mod has no bindings.
    pub fn install_input_keys(
        &self,
        mod_settings: &ModSettings,
        resolver: &mut dyn ConflictResolver,
    ) -> Result<MergeOutcome, ConfigError> {
        let _span = info_span!("install_input_keys").entered();
        let mut writes = Vec::new();
        let outcome = self.plan_input_keys_install(mod_settings, resolver, &mut writes)?;
        self.commit_all(writes)?;

        info!(added = outcome.added, skipped = outcome.skipped, "input settings installed");
        Ok(outcome)
    }

    /// Removes the mod's exact bindings from `input.settings`.
    ///
    /// Returns the number of bindings removed. A missing file is a no-op.
    pub fn uninstall_input_keys(&self, mod_settings: &ModSettings) -> Result<usize, ConfigError> {
        let mut writes = Vec::new();
        let removed = self.plan_input_keys_uninstall(mod_settings, &mut writes)?;
        self.commit_all(writes)?;

        info!(removed, "input settings uninstalled");
        Ok(removed)
    }

    /// Applies the mod's user settings to every user settings file of the
    /// game version.
    ///
    /// All documents are computed before any is written. If writing a later
    /// file fails, the files already written are rolled back.
    pub fn install_user_settings(&self, mod_settings: &ModSettings) -> Result<usize, ConfigError> {
        let mut writes = Vec::new();
        let applied = self.plan_user_settings_install(mod_settings, &mut writes)?;
        self.commit_all(writes)?;

        info!(applied, "user settings installed");
        Ok(applied)
    }

    /// Removes the mod's user settings from every user settings file.
    ///
    /// Options are removed whatever their current value. Returns the number
    /// removed from `user.settings`. Missing files are skipped.
    pub fn uninstall_user_settings(&self, mod_settings: &ModSettings) -> Result<usize, ConfigError> {
        let mut writes = Vec::new();
        let removed = self.plan_user_settings_uninstall(mod_settings, &mut writes)?;
        self.commit_all(writes)?;

        info!(removed, "user settings uninstalled");
        Ok(removed)
    }

    fn plan_input_keys_install(
        &self,
        mod_settings: &ModSettings,
        resolver: &mut dyn ConflictResolver,
        writes: &mut Vec<PendingWrite>,
    ) -> Result<MergeOutcome, ConfigError> {
        let existing = self.read_keys()?;
        if mod_settings.input_keys.is_empty() {
            return Ok(MergeOutcome {
                keys: existing,
                ..MergeOutcome::default()
            });
        }

        let outcome = MergeEngine::merge(existing, &mod_settings.input_keys, resolver);
        writes.push(PendingWrite {
            target: TargetFile::InputSettings,
            content: serialize_input_settings(&outcome.keys),
        });
        Ok(outcome)
    }

    fn plan_input_keys_uninstall(
        &self,
        mod_settings: &ModSettings,
        writes: &mut Vec<PendingWrite>,
    ) -> Result<usize, ConfigError> {
        if mod_settings.input_keys.is_empty() {
            return Ok(0);
        }

        let (remaining, removed) = remove_keys(self.read_keys()?, &mod_settings.input_keys);
        if removed > 0 {
            writes.push(PendingWrite {
                target: TargetFile::InputSettings,
                content: serialize_input_settings(&remaining),
            });
        }
        Ok(removed)
    }

    /// Returns the number of settings applied to `user.settings`; every
    /// other user settings file receives the same records.
    fn plan_user_settings_install(
        &self,
        mod_settings: &ModSettings,
        writes: &mut Vec<PendingWrite>,
    ) -> Result<usize, ConfigError> {
        if mod_settings.user_settings.is_empty() {
            return Ok(0);
        }

        let mut applied = 0;
        for target in self.manager.user_settings_targets() {
            let mut document = self.read_document(target)?;
            let count = document.apply(&mod_settings.user_settings);
            if target == TargetFile::UserSettings {
                applied = count;
            }
            writes.push(PendingWrite {
                target,
                content: document.render(),
            });
        }
        Ok(applied)
    }

    fn plan_user_settings_uninstall(
        &self,
        mod_settings: &ModSettings,
        writes: &mut Vec<PendingWrite>,
    ) -> Result<usize, ConfigError> {
        if mod_settings.user_settings.is_empty() {
            return Ok(0);
        }

        let mut removed = 0;
        for target in self.manager.user_settings_targets() {
            if self.manager.read_target(target)?.is_none() {
                continue;
            }
            let mut document = self.read_document(target)?;
            let count = document.remove(&mod_settings.user_settings);
            if target == TargetFile::UserSettings {
                removed = count;
            }
            writes.push(PendingWrite {
                target,
                content: document.render(),
            });
        }
        Ok(removed)
    }

    fn plan_xml_vars_install(
        &self,
        mod_settings: &ModSettings,
        writes: &mut Vec<PendingWrite>,
    ) -> Result<usize, ConfigError> {
        let mut added = 0;
        for (target, vars, anchor) in [
            (TargetFile::InputXml, &mod_settings.xml_vars, INPUT_XML_ANCHOR),
            (TargetFile::HiddenXml, &mod_settings.hidden_vars, HIDDEN_XML_ANCHOR),
        ] {
            if vars.is_empty() {
                continue;
            }

            let text = self.read_menu_file(target)?;
            let (content, count) = install_xml_vars(&text, vars, anchor).map_err(|source| ConfigError::Parse {
                path: self.manager.path(target),
                source,
            })?;
            if count > 0 {
                writes.push(PendingWrite { target, content });
            }
            added += count;
        }
        Ok(added)
    }

    fn plan_xml_vars_uninstall(
        &self,
        mod_settings: &ModSettings,
        writes: &mut Vec<PendingWrite>,
    ) -> Result<usize, ConfigError> {
        let mut removed = 0;
        for (target, vars) in [
            (TargetFile::InputXml, &mod_settings.xml_vars),
            (TargetFile::HiddenXml, &mod_settings.hidden_vars),
        ] {
            if vars.is_empty() {
                continue;
            }

            self.require_menu_dir(target)?;
            let Some(text) = self.manager.read_target(target)? else {
                continue;
            };
            let (content, count) = uninstall_xml_vars(&text, vars);
            if count > 0 {
                writes.push(PendingWrite { target, content });
            }
            removed += count;
        }
        Ok(removed)
    }

    /// Returns the number of entries appended to `dx11filelist.txt`.
    fn plan_menus_install(
        &self,
        mod_settings: &ModSettings,
        writes: &mut Vec<PendingWrite>,
    ) -> Result<usize, ConfigError> {
        if mod_settings.menus.is_empty() {
            return Ok(0);
        }

        let mut added = 0;
        for target in self.manager.menu_list_targets() {
            let text = self.read_menu_file(target)?;
            let (content, count) = install_menu_entries(&text, &mod_settings.menus);
            if count > 0 {
                writes.push(PendingWrite { target, content });
            }
            if target == TargetFile::Dx11FileList {
                added = count;
            }
        }
        Ok(added)
    }

    fn plan_menus_uninstall(
        &self,
        mod_settings: &ModSettings,
        writes: &mut Vec<PendingWrite>,
    ) -> Result<usize, ConfigError> {
        if mod_settings.menus.is_empty() {
            return Ok(0);
        }

        let mut removed = 0;
        for target in self.manager.menu_list_targets() {
            self.require_menu_dir(target)?;
            let Some(text) = self.manager.read_target(target)? else {
                continue;
            };
            let (content, count) = uninstall_menu_entries(&text, &mod_settings.menus);
            if count > 0 {
                writes.push(PendingWrite { target, content });
            }
            if target == TargetFile::Dx11FileList {
                removed = count;
            }
        }
        Ok(removed)
    }

    fn read_keys(&self) -> Result<Vec<Key>, ConfigError> {
        let Some(text) = self.manager.read_target(TargetFile::InputSettings)? else {
            return Ok(Vec::new());
        };

        parse_input_settings(&text).map_err(|source| ConfigError::Parse {
            path: self.manager.path(TargetFile::InputSettings),
            source,
        })
    }

    fn read_document(&self, target: TargetFile) -> Result<SettingsDocument, ConfigError> {
        let Some(text) = self.manager.read_target(target)? else {
            return Ok(SettingsDocument::new());
        };

        SettingsDocument::parse(&text).map_err(|source| ConfigError::Parse {
            path: self.manager.path(target),
            source,
        })
    }

    fn require_menu_dir(&self, target: TargetFile) -> Result<(), ConfigError> {
        match self.manager.menu_dir() {
            Some(_) => Ok(()),
            None => Err(ConfigError::MenuDirNotSet(target.file_name())),
        }
    }

    /// Menu files ship with the game and are never created here.
    fn read_menu_file(&self, target: TargetFile) -> Result<String, ConfigError> {
        self.require_menu_dir(target)?;
        self.manager
            .read_target(target)?
            .ok_or_else(|| ConfigError::MissingFile(self.manager.path(target)))
    }

    /// Writes every pending file, rolling back the ones already written if
    /// a later one fails.
    fn commit_all(&self, writes: Vec<PendingWrite>) -> Result<(), ConfigError> {
        let mut written: Vec<ConfigTransaction<'_>> = Vec::new();

        for PendingWrite { target, content } in writes {
            let result = ConfigTransaction::begin(self.manager, target).and_then(|tx| {
                tx.write(&content)?;
                Ok(tx)
            });

            match result {
                Ok(tx) => written.push(tx),
                Err(error) => {
                    for earlier in written.iter().rev() {
                        if let Err(rollback_error) = earlier.rollback() {
                            warn!(%rollback_error, "rollback failed");
                        }
                    }
                    return Err(error);
                }
            }
        }

        Ok(())
    }
}
