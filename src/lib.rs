// Copyright 2025 bakri (tidynest@proton.me)
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

//! Mod Bindings Merger
//!
//! Extracts key bindings and user settings from the text files that game
//! mods ship, and merges them into the game's settings files with conflict
//! detection.
//!
//! # Features
//!
//! - **Lenient extraction:** Finds `[Context]` sections inside readmes and notes
//! - **Conflict Detection:** Rebinds and modifier clashes go to a resolver
//! - **Stable Output:** Merged files are sorted by context, key and action
//! - **Exact Uninstall:** Removes only what a mod introduced
//! - **Menu Registration:** Adds a mod's `<Var/>` elements and menu file list entries
//! - **Atomic Operations:** Backups and atomic writes, nothing written on failure
//!
//! # Architecture
//!
//! - **`core`:** Records, parser, merge engine, serializer, menu edits (pure, no I/O)
//! - **`config`:** Settings directory, transactions, installer
//!
//! # Examples
//!
//! ## Parsing a mod text file
//!
//! ```no_run
//! use modbinds::core::parser::parse_input_settings;
//!
//! let content = std::fs::read_to_string("/tmp/mod/readme.txt")?;
//! let keys = parse_input_settings(&content)?;
//! println!("Found {} bindings", keys.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Merging with conflict resolution
//!
//! ```
//! use modbinds::core::{conflict::{MergeEngine, Resolution}, serializer::serialize_input_settings, Key};
//!
//! let existing = vec![Key::binding("[Movement]", "IK_Forward", "Action=Move,+")];
//! let candidates = vec![Key::binding("[Movement]", "IK_Forward", "Action=Move,-")];
//!
//! let mut resolver = |_: &Key, _: &Key, _: &str, just_modifiers: bool| {
//!     assert!(just_modifiers);
//!     Resolution::Accept
//! };
//! let outcome = MergeEngine::merge(existing, &candidates, &mut resolver);
//!
//! assert_eq!(outcome.added, 1);
//! assert_eq!(serialize_input_settings(&outcome.keys), "[Movement]\nIK_Forward=(Action=Move,-)\n");
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod config;
pub mod core;

// Re-export commonly used types for convenience
pub use crate::core::{Action, DeviceType, Key, KeyKind, ModSettings, UserSetting};
