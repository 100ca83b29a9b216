//! Renders input settings keys back to the sectioned text dialect.
//!
//! Output shape:
//! ```text
//! [Exploration]
//! IK_E=(Action=Use)
//! Version=2
//!
//! [Horse]
//! ```
//! Consecutive keys sharing a context go under one header, groups are
//! separated by a blank line, and a placeholder contributes its header
//! only. Callers sort the keys first (the merge engine does) so each
//! context forms one group.

use crate::core::types::{section_header, Key};

/// Serialize keys into `input.settings` text
///
/// # Example
/// ```
/// use modbinds::core::{serializer::serialize_input_settings, types::Key};
///
/// let keys = vec![
///     Key::placeholder("[A]"),
///     Key::binding("[A]", "IK_X", "Action=Jump"),
/// ];
/// assert_eq!(serialize_input_settings(&keys), "[A]\nIK_X=(Action=Jump)\n");
/// ```
pub fn serialize_input_settings(keys: &[Key]) -> String {
    let mut text = String::new();
    let mut current: Option<&str> = None;

    for key in keys {
        if current != Some(key.context.as_str()) {
            if current.is_some() {
                text.push('\n');
            }
            current = Some(&key.context);
            text.push_str(&section_header(&key.context));
            text.push('\n');
        }

        if !key.is_placeholder() {
            text.push_str(&key.to_string());
            text.push('\n');
        }
    }

    text
}
