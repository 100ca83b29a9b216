//! src/core/types.rs
//!
//! Core type definitions for input and user settings
//!
//! This module defines the record types extracted from mod text files and
//! merged into the game's settings files:
//! - `Action`: The parenthesised field tuple of one binding
//! - `DeviceType`: Keyboard, controller or PS4 pad, derived from the key name
//! - `Key`: A binding, a `Version=N` marker or an empty-section placeholder
//! - `UserSetting`: A plain `option=value` entry under a section
//!
//! `Key` carries a total order (context, raw key, action) so merged output
//! is stable and diffable.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Field name that identifies the logical game action of a binding.
pub const ACTION_FIELD: &str = "Action";

/// Ordered fields of one binding tuple.
///
/// `IK_W=(Action=MoveForward,State=Axis,Value=1)` holds the three fields
/// `Action=MoveForward`, `State=Axis` and `Value=1`. Order matters for the
/// canonical text form; lookups go by name. Fields without `=` (such as a
/// bare `+`) are kept in place but have no name.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Action {
    fields: Vec<String>,
}

impl Action {
    /// Builds an action from the text between the parentheses.
    ///
    /// Surrounding parentheses are tolerated, fields are trimmed and empty
    /// fields (from `,,` or a trailing comma) are dropped.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let text = text.strip_prefix('(').unwrap_or(text);
        let text = text.strip_suffix(')').unwrap_or(text);

        let fields = text
            .split(',')
            .map(str::trim)
            .filter(|field| !field.is_empty())
            .map(str::to_string)
            .collect();

        Self { fields }
    }

    /// Looks up a field value by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find_map(|field| field_value(field, name))
    }

    /// Sets a field, overwriting in place when the name already exists.
    pub fn set(&mut self, name: &str, value: &str) {
        let entry = format!("{}={}", name, value);

        match self.position(name) {
            Some(index) => self.fields[index] = entry,
            None => self.fields.push(entry),
        }
    }

    /// Removes a field by name, returning its previous value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self.position(name)?;
        let field = self.fields.remove(index);
        field_value(&field, name).map(str::to_string)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// All fields in order, in their `Name=Value` text form.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|field| field_value(field, name).is_some())
    }
}

/// Returns the value of `field` if it is named `name`.
fn field_value<'a>(field: &'a str, name: &str) -> Option<&'a str> {
    field
        .strip_prefix(name)
        .and_then(|rest| rest.strip_prefix('='))
}

/// Splits a field into (name, value). Unnamed fields sort by an empty name.
fn field_parts(field: &str) -> (&str, &str) {
    field.split_once('=').unwrap_or(("", field))
}

impl Ord for Action {
    fn cmp(&self, other: &Self) -> Ordering {
        // The logical action leads, then every field by name and value
        self.get(ACTION_FIELD)
            .cmp(&other.get(ACTION_FIELD))
            .then_with(|| {
                self.fields
                    .iter()
                    .map(|f| field_parts(f))
                    .cmp(other.fields.iter().map(|f| field_parts(f)))
            })
            .then_with(|| self.fields.cmp(&other.fields))
    }
}

impl PartialOrd for Action {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fields.join(","))
    }
}

/// Input device a binding belongs to
///
/// Derived from substrings of the raw key name: `IK_Pad_A_CROSS` is a
/// controller key, `IK_PS4_OPTIONS` a PS4 pad key, everything else is
/// keyboard or mouse.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum DeviceType {
    /// Keyboard and mouse
    Keyboard,
    /// Generic gamepad (`Pad` in the key name)
    Controller,
    /// PS4 pad (`PS4` in the key name)
    PS4,
}

impl DeviceType {
    pub fn from_raw_key(raw_key: &str) -> Self {
        if raw_key.contains("Pad") {
            DeviceType::Controller
        } else if raw_key.contains("PS4") {
            DeviceType::PS4
        } else {
            DeviceType::Keyboard
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceType::Keyboard => write!(f, "keyboard"),
            DeviceType::Controller => write!(f, "controller"),
            DeviceType::PS4 => write!(f, "PS4"),
        }
    }
}

/// What a `Key` record holds besides its context
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum KeyKind {
    /// A real binding such as `IK_E=(Action=Use)`
    Binding {
        raw_key: String,
        device: DeviceType,
        action: Action,
    },
    /// A bare `Version=N` marker line, stored verbatim
    Version(String),
    /// Keeps an otherwise empty section alive through parse and serialize
    Placeholder,
}

impl KeyKind {
    fn rank(&self) -> u8 {
        match self {
            KeyKind::Placeholder => 0,
            KeyKind::Version(_) => 1,
            KeyKind::Binding { .. } => 2,
        }
    }
}

/// One record of the input settings dialect
///
/// The context is kept as written in the source (usually with brackets,
/// e.g. `[Exploration]`).
///
/// # Example
/// ```
/// use modbinds::core::types::{DeviceType, Key};
///
/// let key = Key::binding("[Exploration]", "IK_Pad_A_CROSS", "Action=Jump");
/// assert_eq!(key.device(), Some(DeviceType::Controller));
/// assert_eq!(key.to_string(), "IK_Pad_A_CROSS=(Action=Jump)");
/// ```
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Key {
    pub context: String,
    pub kind: KeyKind,
}

impl Key {
    /// Creates a binding; the device type is derived from `raw_key`.
    pub fn binding(context: &str, raw_key: &str, action: &str) -> Self {
        Self {
            context: context.to_string(),
            kind: KeyKind::Binding {
                raw_key: raw_key.to_string(),
                device: DeviceType::from_raw_key(raw_key),
                action: Action::parse(action),
            },
        }
    }

    pub fn version(context: &str, line: &str) -> Self {
        Self {
            context: context.to_string(),
            kind: KeyKind::Version(line.to_string()),
        }
    }

    pub fn placeholder(context: &str) -> Self {
        Self {
            context: context.to_string(),
            kind: KeyKind::Placeholder,
        }
    }

    /// Raw key name; the whole line for version markers, empty for placeholders.
    pub fn raw_key(&self) -> &str {
        match &self.kind {
            KeyKind::Binding { raw_key, .. } => raw_key,
            KeyKind::Version(line) => line,
            KeyKind::Placeholder => "",
        }
    }

    pub fn device(&self) -> Option<DeviceType> {
        match &self.kind {
            KeyKind::Binding { device, .. } => Some(*device),
            _ => None,
        }
    }

    pub fn action(&self) -> Option<&Action> {
        match &self.kind {
            KeyKind::Binding { action, .. } => Some(action),
            _ => None,
        }
    }

    pub fn action_mut(&mut self) -> Option<&mut Action> {
        match &mut self.kind {
            KeyKind::Binding { action, .. } => Some(action),
            _ => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.kind, KeyKind::Placeholder)
    }

    pub fn is_binding(&self) -> bool {
        matches!(self.kind, KeyKind::Binding { .. })
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        self.context
            .cmp(&other.context)
            .then_with(|| self.raw_key().cmp(other.raw_key()))
            .then_with(|| self.kind.rank().cmp(&other.kind.rank()))
            .then_with(|| self.action().cmp(&other.action()))
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            KeyKind::Binding {
                raw_key, action, ..
            } => write!(f, "{}=({})", raw_key, action),
            KeyKind::Version(line) => write!(f, "{}", line),
            KeyKind::Placeholder => Ok(()),
        }
    }
}

/// One `option=value` entry of the user settings dialect
///
/// The context is stored without brackets (`Graphics`, not `[Graphics]`).
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct UserSetting {
    pub context: String,
    pub option: String,
    pub value: String,
}

impl UserSetting {
    pub fn new(context: &str, option: &str, value: &str) -> Self {
        Self {
            context: strip_brackets(context).to_string(),
            option: option.trim().to_string(),
            value: value.trim().to_string(),
        }
    }
}

impl fmt::Display for UserSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.option, self.value)
    }
}

/// Removes one pair of surrounding brackets, if present.
pub fn strip_brackets(context: &str) -> &str {
    let context = context.trim();
    context
        .strip_prefix('[')
        .and_then(|c| c.strip_suffix(']'))
        .unwrap_or(context)
}

/// Renders a context as a section header, adding brackets when missing.
pub fn section_header(context: &str) -> String {
    let mut header = String::with_capacity(context.len() + 2);
    if !context.starts_with('[') {
        header.push('[');
    }
    header.push_str(context);
    if !context.ends_with(']') {
        header.push(']');
    }
    header
}
