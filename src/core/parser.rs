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

//! src/core/parser.rs
//!
//! Section parser for the two mod text dialects
//!
//! Mod authors ship their bindings and settings inside free-form text
//! files (readmes, install notes, copies of `input.settings`). This module
//! pulls the relevant records out of that text:
//! - Input settings: `[Context]` followed by `IK_<name>=(Field=Value,...)`
//!   or `Version=<digits>` lines
//! - User settings: `[Context]` followed by `option=value` lines
//!
//! # Architecture
//! Every line is first classified into a token. A small state machine
//! (`Outside` → `AwaitingFirstBody` → `InSection`) then walks the tokens,
//! tracking the current context. Text outside a recognised region is
//! ignored verbatim. The per-line grammar is written with nom combinators.
//!
//! # Empty sections
//! A header that gets no body line before the next header, a stray line,
//! or the end of input still produces a placeholder `Key`, so an empty
//! section survives a parse/serialize round trip.

use nom::{
    bytes::complete::{tag, take_until},
    character::complete::{char, digit1},
    combinator::{all_consuming, recognize, rest, verify},
    sequence::{preceded, separated_pair},
    IResult, Parser,
};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, trace};

use crate::core::types::{Key, UserSetting};

/// Parse errors with line number context
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("Invalid binding on line {line} in section {section}: {message}")]
    InvalidBinding {
        line: usize,
        section: String,
        message: String,
    },

    #[error("Parse error on line {line}: {message}")]
    InvalidSyntax { line: usize, message: String },

    #[error("Option on line {line} appears before any section header")]
    MissingSectionHeader { line: usize },

    #[error("Insertion point {anchor} not found")]
    MissingAnchor { anchor: String },
}

/// Classification of one input settings line
#[derive(Clone, Debug, PartialEq)]
pub enum InputToken<'a> {
    Header(&'a str),
    Binding(&'a str),
    Version(&'a str),
    Blank,
    Other,
}

/// Scanner state while walking input settings tokens
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScanState {
    /// Not inside a recognised region; body lines are ignored
    Outside,
    /// A header was seen but nothing has been emitted under it yet
    AwaitingFirstBody,
    /// At least one body line was emitted under the current header
    InSection,
}

/// Parse every input settings record found in `text`
///
/// # Arguments
/// * `text` - Decoded file content, in any line ending style
///
/// # Returns
/// Keys in source order, or a ParseError for a malformed binding line
/// inside a recognised section.
///
/// # Example
/// ```
/// use modbinds::core::parser::parse_input_settings;
///
/// let text = "Some readme prose\n[Exploration]\nIK_E=(Action=Use)\n";
/// let keys = parse_input_settings(text)?;
/// assert_eq!(keys.len(), 1);
/// assert_eq!(keys[0].context, "[Exploration]");
/// # Ok::<(), modbinds::core::parser::ParseError>(())
/// ```
pub fn parse_input_settings(text: &str) -> Result<Vec<Key>, ParseError> {
    let text = strip_block_comments(&normalize_line_endings(text));

    let mut scanner = SectionScanner::new();
    for (index, line) in text.lines().enumerate() {
        scanner.feed(index + 1, tokenize_input_line(line))?;
    }
    let keys = scanner.finish();

    debug!(records = keys.len(), "parsed input settings");
    Ok(keys)
}

/// Walks tokens and emits keys, one line at a time.
///
/// Kept separate from `parse_input_settings` so the empty-section rules
/// can be driven token by token.
#[derive(Debug)]
pub struct SectionScanner<'a> {
    state: ScanState,
    context: &'a str,
    keys: Vec<Key>,
}

impl<'a> SectionScanner<'a> {
    pub fn new() -> Self {
        Self {
            state: ScanState::Outside,
            context: "",
            keys: Vec::new(),
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Advances the state machine by one token.
    pub fn feed(&mut self, line: usize, token: InputToken<'a>) -> Result<(), ParseError> {
        match token {
            InputToken::Header(context) => {
                self.close_empty_section();
                trace!(line, context, "section header");
                self.context = context;
                self.state = ScanState::AwaitingFirstBody;
            }
            InputToken::Binding(body) if self.state != ScanState::Outside => {
                let (_, (raw_key, action)) =
                    parse_binding_line(body).map_err(|e| ParseError::InvalidBinding {
                        line,
                        section: self.context.to_string(),
                        message: format!("expected IK_<key>=(<fields>): {:?}", e),
                    })?;
                self.keys.push(Key::binding(self.context, raw_key, action));
                self.state = ScanState::InSection;
            }
            InputToken::Version(body) if self.state != ScanState::Outside => {
                self.keys.push(Key::version(self.context, body));
                self.state = ScanState::InSection;
            }
            InputToken::Other => {
                self.close_empty_section();
                self.state = ScanState::Outside;
            }
            InputToken::Binding(_) | InputToken::Version(_) | InputToken::Blank => {}
        }
        Ok(())
    }

    /// Ends the scan, returning the collected keys.
    ///
    /// Placeholders are dropped for contexts that received real entries
    /// elsewhere in the text; such a context is not empty.
    pub fn finish(mut self) -> Vec<Key> {
        self.close_empty_section();

        let filled: HashSet<String> = self
            .keys
            .iter()
            .filter(|key| !key.is_placeholder())
            .map(|key| key.context.clone())
            .collect();

        self.keys
            .into_iter()
            .filter(|key| !key.is_placeholder() || !filled.contains(&key.context))
            .collect()
    }

    fn close_empty_section(&mut self) {
        if self.state == ScanState::AwaitingFirstBody {
            self.keys.push(Key::placeholder(self.context));
            self.state = ScanState::InSection;
        }
    }
}

impl Default for SectionScanner<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Classify one line of the input settings dialect
pub fn tokenize_input_line(line: &str) -> InputToken<'_> {
    let line = line.trim();

    if line.is_empty() {
        InputToken::Blank
    } else if let Some(context) = parse_header(line) {
        InputToken::Header(context)
    } else if parse_version_line(line).is_ok() {
        InputToken::Version(line)
    } else if line.starts_with("IK_") && line.contains('=') {
        InputToken::Binding(line)
    } else {
        InputToken::Other
    }
}

/// Returns the header text (with brackets) if `line` is a `[Context]` line.
pub fn parse_header(line: &str) -> Option<&str> {
    let line = line.trim();
    let inner = line.strip_prefix('[')?.strip_suffix(']')?;

    if inner.trim().is_empty() {
        None
    } else {
        Some(line)
    }
}

/// Parse a `Version=<digits>` marker line
pub fn parse_version_line(input: &str) -> IResult<&str, &str> {
    all_consuming(recognize(preceded(tag("Version="), digit1))).parse(input)
}

/// Parse a single binding line
///
/// Format: IK_KEY=(Field=Value,Field=Value)
/// Example: IK_Pad_A_CROSS=(Action=Jump,State=Duration,IdleTime=0.2)
///
/// Returns the raw key name and the tuple text without its parentheses.
pub fn parse_binding_line(input: &str) -> IResult<&str, (&str, &str)> {
    let (input, raw_key) = verify(take_until("=("), |key: &str| !key.trim().is_empty())
        .parse(input)?;
    let (input, _) = tag("=(").parse(input)?;
    let (input, body) = verify(rest, |body: &str| body.trim_end().ends_with(')')).parse(input)?;

    let body = body.trim_end();
    Ok((input, (raw_key.trim(), &body[..body.len() - 1])))
}

/// Parse every user setting found in `text`
///
/// Headers switch the current context, `option=value` lines under a header
/// become settings. Any other line closes the current section; lines
/// outside a section are skipped, so prose around the settings never fails
/// the parse. A section holding an `IK_` binding is input settings: the
/// options already read from it (such as `Version=3`) are dropped.
///
/// # Example
/// ```
/// use modbinds::core::parser::parse_user_settings;
///
/// let settings = parse_user_settings("Add this:\n[Gameplay]\nHudScale=0.8\n");
/// assert_eq!(settings[0].context, "Gameplay");
/// assert_eq!(settings[0].option, "HudScale");
/// ```
pub fn parse_user_settings(text: &str) -> Vec<UserSetting> {
    let text = strip_block_comments(&normalize_line_endings(text));

    let mut settings = Vec::new();
    let mut context: Option<&str> = None;
    // First setting of the current section
    let mut section_start = 0;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(header) = parse_header(line) {
            context = Some(header);
            section_start = settings.len();
        } else if let InputToken::Binding(_) = tokenize_input_line(line) {
            if context.take().is_some() {
                settings.truncate(section_start);
            }
        } else if let Ok((_, (option, value))) = parse_option_line(line) {
            if let Some(context) = context {
                settings.push(UserSetting::new(context, option, value));
            }
        } else {
            context = None;
        }
    }

    debug!(records = settings.len(), "parsed user settings");
    settings
}

/// Parse an `option=value` line
///
/// Lines whose value part contains parentheses belong to the input
/// dialect and are rejected here.
pub fn parse_option_line(input: &str) -> IResult<&str, (&str, &str)> {
    let (input, (option, value)) = separated_pair(
        verify(take_until("="), |option: &str| !option.trim().is_empty()),
        char('='),
        verify(rest, |value: &str| !value.contains(['(', ')'])),
    )
    .parse(input)?;

    Ok((input, (option.trim(), value.trim())))
}

/// Convert `\r\n` and lone `\r` line endings to `\n`
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Remove `<!-- ... -->` comments, keeping their line breaks
///
/// Line breaks inside a comment are preserved so line numbers in errors
/// still point at the original text. An unterminated comment is left as is.
pub fn strip_block_comments(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut remaining = text;

    while let Some(start) = remaining.find("<!--") {
        let Some(length) = remaining[start..].find("-->") else {
            break;
        };
        let end = start + length + "-->".len();

        output.push_str(&remaining[..start]);
        output.extend(remaining[start..end].chars().filter(|c| *c == '\n'));
        remaining = &remaining[end..];
    }

    output.push_str(remaining);
    output
}
