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

//! src/core/settings.rs
//!
//! In-memory model of a `user.settings` file
//!
//! User settings have no conflict concept: installing a mod's settings sets
//! each `(section, option)` pair, last writer wins. Uninstalling removes
//! exactly the pairs the mod introduced, whatever their current value is.
//! A value changed by hand after install is therefore still removed.
//!
//! Sections and options keep their file order so rewriting a file only
//! changes the lines a mod touched.

use indexmap::IndexMap;
use tracing::debug;

use crate::core::{
    parser::{normalize_line_endings, parse_header, ParseError},
    types::{strip_brackets, UserSetting},
};

/// Ordered sections of `option=value` pairs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SettingsDocument {
    sections: IndexMap<String, IndexMap<String, String>>,
}

impl SettingsDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the content of a target settings file.
    ///
    /// Blank lines and `;`/`#` comments are skipped. A repeated section is
    /// merged into the first one and a repeated option keeps its last value.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::MissingSectionHeader` for an option before the
    /// first header, and `ParseError::InvalidSyntax` for a line that is
    /// neither a header nor `option=value`.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut document = Self::new();
        let mut current: Option<String> = None;

        for (index, line) in normalize_line_endings(text).lines().enumerate() {
            let line_num = index + 1;
            let line = line.trim();

            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if let Some(header) = parse_header(line) {
                let name = strip_brackets(header).to_string();
                document.sections.entry(name.clone()).or_default();
                current = Some(name);
                continue;
            }

            let Some((option, value)) = line.split_once('=') else {
                return Err(ParseError::InvalidSyntax {
                    line: line_num,
                    message: format!("expected option=value, found '{}'", line),
                });
            };

            let Some(section) = current.as_ref() else {
                return Err(ParseError::MissingSectionHeader { line: line_num });
            };

            document
                .sections
                .entry(section.clone())
                .or_default()
                .insert(option.trim().to_string(), value.trim().to_string());
        }

        Ok(document)
    }

    /// Sets every setting, creating sections as needed.
    ///
    /// Returns the number of settings applied.
    pub fn apply(&mut self, settings: &[UserSetting]) -> usize {
        for setting in settings {
            self.sections
                .entry(setting.context.clone())
                .or_default()
                .insert(setting.option.clone(), setting.value.clone());
        }

        debug!(applied = settings.len(), "applied user settings");
        settings.len()
    }

    /// Removes the `(section, option)` pair of every setting.
    ///
    /// The stored value is not compared. Sections are kept even when they
    /// end up empty. Returns the number of options actually removed.
    pub fn remove(&mut self, settings: &[UserSetting]) -> usize {
        let mut removed = 0;

        for setting in settings {
            if let Some(section) = self.sections.get_mut(&setting.context) {
                if section.shift_remove(&setting.option).is_some() {
                    removed += 1;
                }
            }
        }

        debug!(removed, "removed user settings");
        removed
    }

    pub fn get(&self, context: &str, option: &str) -> Option<&str> {
        self.sections
            .get(strip_brackets(context))
            .and_then(|section| section.get(option))
            .map(String::as_str)
    }

    pub fn has_section(&self, context: &str) -> bool {
        self.sections.contains_key(strip_brackets(context))
    }

    /// Number of options across all sections.
    pub fn len(&self) -> usize {
        self.sections.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Renders the document as `[section]` blocks, each followed by a blank line.
    pub fn render(&self) -> String {
        let mut text = String::new();

        for (name, options) in &self.sections {
            text.push('[');
            text.push_str(name);
            text.push_str("]\n");
            for (option, value) in options {
                text.push_str(option);
                text.push('=');
                text.push_str(value);
                text.push('\n');
            }
            text.push('\n');
        }

        text
    }
}
