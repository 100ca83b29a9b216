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

//! src/core/mod.rs
//!
//! Core parsing and merging logic
//!
//! This module contains the record types and algorithms for installing
//! mod key bindings and user settings, including:
//! - Type definitions for actions, keys and user settings
//! - Section parsing of the two text dialects
//! - Conflict-aware merging of input bindings
//! - Serialization back to `input.settings` text
//! - Last-writer-wins user settings documents
//! - Menu `<Var/>` elements and menu file list entries
//!
//! Everything here works on in-memory text and records. File access lives
//! in `config`, which keeps the core testable without touching disk.

pub mod conflict;
pub mod descriptor;
pub mod menu;
pub mod parser;
pub mod serializer;
pub mod settings;
pub mod types;

pub use conflict::{ConflictResolver, FixedResolver, MergeEngine, MergeOutcome, Resolution};
pub use descriptor::{ModSettings, SourceError};
pub use parser::ParseError;
pub use settings::SettingsDocument;
pub use types::*;

#[cfg(test)]
mod tests;
