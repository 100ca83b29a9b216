//! Per-mod collection of candidate records
//!
//! A mod may spread its bindings and settings over several files.
//! `ModSettings` gathers the candidates from all of them, in input order.
//! A file that fails to parse is reported with its name and does not stop
//! the remaining files from being collected.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::warn;

use crate::core::{
    menu::{parse_input_xml, parse_xml_vars},
    parser::{parse_input_settings, parse_user_settings, ParseError},
    types::{strip_brackets, Key, UserSetting},
};

/// A parse failure tied to the text it came from
#[derive(Debug, Error, PartialEq)]
#[error("{source_name}: {error}")]
pub struct SourceError {
    pub source_name: String,
    #[source]
    pub error: ParseError,
}

/// Candidate records found in one mod's files
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ModSettings {
    pub input_keys: Vec<Key>,
    pub user_settings: Vec<UserSetting>,
    /// `<Var/>` elements for the game's `input.xml`
    pub xml_vars: Vec<String>,
    /// `<Var/>` elements for the game's `hidden.xml`
    pub hidden_vars: Vec<String>,
    /// Menu XML file names to list in the next-gen file lists
    pub menus: Vec<String>,
}

impl ModSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds every `(name, text)` file with `add_file`.
    ///
    /// Returns everything that parsed along with one error per failed file.
    /// User settings of a file are still collected when its input settings
    /// fail to parse.
    pub fn collect<'a, I>(files: I) -> (Self, Vec<SourceError>)
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut settings = Self::new();
        let mut errors = Vec::new();

        for (name, text) in files {
            if let Err(error) = settings.add_file(name, text) {
                warn!(source = name, %error, "skipping input settings");
                errors.push(SourceError {
                    source_name: name.to_string(),
                    error,
                });
            }
        }

        (settings, errors)
    }

    /// Adds the records of one file, chosen by its name.
    ///
    /// - `input.xml`: vars of its `PCInput` and `Hidden` groups
    /// - any other `*.xml`: a menu file, registered by name only
    /// - anything else: text scanned with both dialects and for vars, which
    ///   go to `hidden_vars` when the file name mentions "hidden"
    pub fn add_file(&mut self, name: &str, text: &str) -> Result<(), ParseError> {
        let file_name = Path::new(name)
            .file_name()
            .and_then(|file_name| file_name.to_str())
            .unwrap_or(name);
        let lowercase = file_name.to_ascii_lowercase();

        if lowercase == "input.xml" {
            let vars = parse_input_xml(text);
            self.xml_vars.extend(vars.visible);
            self.hidden_vars.extend(vars.hidden);
            Ok(())
        } else if lowercase.ends_with(".xml") {
            self.menus.push(file_name.to_string());
            Ok(())
        } else {
            self.add_records(text, lowercase.contains("hidden"))
        }
    }

    /// Adds the records of one text blob.
    pub fn add_text(&mut self, text: &str) -> Result<(), ParseError> {
        self.add_records(text, false)
    }

    fn add_records(&mut self, text: &str, hidden: bool) -> Result<(), ParseError> {
        let user_settings = parse_user_settings(text);
        let vars = parse_xml_vars(text);
        if hidden {
            self.hidden_vars.extend(vars);
        } else {
            self.xml_vars.extend(vars);
        }

        // A header followed only by options opens a user settings section,
        // not an empty input section
        let input_keys = parse_input_settings(text).map(|keys| {
            keys.into_iter()
                .filter(|key| {
                    !(key.is_placeholder()
                        && user_settings
                            .iter()
                            .any(|setting| setting.context == strip_brackets(&key.context)))
                })
                .collect::<Vec<_>>()
        });

        self.user_settings.extend(user_settings);
        self.input_keys.extend(input_keys?);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.input_keys.is_empty()
            && self.user_settings.is_empty()
            && self.xml_vars.is_empty()
            && self.hidden_vars.is_empty()
            && self.menus.is_empty()
    }
}
