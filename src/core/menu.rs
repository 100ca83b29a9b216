//! Menu configuration: `<Var/>` elements and menu file lists
//!
//! Mods that add in-game options ship XML menu files. The `<Var .../>`
//! elements of those options must also be registered in the game's
//! `input.xml`, or in `hidden.xml` for options without a visible menu
//! entry. On the next-gen edition every menu file must additionally be
//! listed in `dx11filelist.txt` and `dx12filelist.txt`.
//!
//! Like the rest of the core, these functions take the current file text
//! and return the new text; reading and writing the files is left to
//! `config`.

use nom::{
    bytes::complete::{tag, take_until},
    character::complete::multispace1,
    combinator::recognize,
    IResult, Parser,
};
use tracing::debug;

use crate::core::parser::{normalize_line_endings, strip_block_comments, ParseError};

/// Line of `input.xml` before which new vars are inserted
pub const INPUT_XML_ANCHOR: &str = "<!-- [BASE_CharacterMovement] -->";

/// Closing tag of `hidden.xml` before which new vars are inserted
pub const HIDDEN_XML_ANCHOR: &str = "</VisibleVars>";

const PC_INPUT_ID: &str = r#"id="PCInput""#;
const HIDDEN_ID: &str = r#"id="Hidden""#;
const BASE_MOVEMENT_MARKER: &str = "[BASE_CharacterMovement]";

/// Vars found in a mod's copy of `input.xml`
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InputXmlVars {
    /// Vars of the `PCInput` group, up to the base movement marker
    pub visible: Vec<String>,
    /// Vars of the `Hidden` group
    pub hidden: Vec<String>,
}

/// One `<Var .../>` element, attributes included.
fn var_element(input: &str) -> IResult<&str, &str> {
    recognize((tag("<Var"), multispace1, take_until("/>"), tag("/>"))).parse(input)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract every `<Var .../>` element of `text`, in order and without
/// duplicates.
///
/// Runs of whitespace inside an element are collapsed to one space so the
/// same var written with different indentation compares equal. Commented
/// out elements are skipped.
///
/// # Example
/// ```
/// use modbinds::core::menu::parse_xml_vars;
///
/// let vars = parse_xml_vars(r#"<Var id="Lantern"   displayName="lantern"/>"#);
/// assert_eq!(vars, vec![r#"<Var id="Lantern" displayName="lantern"/>"#]);
/// ```
pub fn parse_xml_vars(text: &str) -> Vec<String> {
    let text = strip_block_comments(&normalize_line_endings(text));
    let mut vars: Vec<String> = Vec::new();

    for line in text.lines() {
        let mut remaining = line;
        while let Some(start) = remaining.find("<Var") {
            match var_element(&remaining[start..]) {
                Ok((rest, element)) => {
                    let var = collapse_whitespace(element);
                    if !vars.contains(&var) {
                        vars.push(var);
                    }
                    remaining = rest;
                }
                // `<Variable`, or an element not closed on this line
                Err(_) => remaining = &remaining[start + "<Var".len()..],
            }
        }
    }

    debug!(vars = vars.len(), "parsed xml vars");
    vars
}

/// Extract the vars a mod adds to `input.xml`.
///
/// Only the mod's own additions count: visible vars are read from the
/// `PCInput` group up to the base movement marker, hidden vars from the
/// `Hidden` group before it. A file without a `PCInput` group yields
/// nothing.
pub fn parse_input_xml(text: &str) -> InputXmlVars {
    let text = normalize_line_endings(text);
    let Some(pc_input) = text.find(PC_INPUT_ID) else {
        return InputXmlVars::default();
    };

    let visible = text[pc_input..]
        .find(BASE_MOVEMENT_MARKER)
        .map(|end| parse_xml_vars(&text[pc_input..pc_input + end]))
        .unwrap_or_default();
    let hidden = text[..pc_input]
        .find(HIDDEN_ID)
        .map(|start| parse_xml_vars(&text[start..pc_input]))
        .unwrap_or_default();

    InputXmlVars { visible, hidden }
}

fn contains_var(text: &str, var: &str) -> bool {
    text.lines().any(|line| collapse_whitespace(line).contains(var))
}

/// Insert each var not yet present on its own line before `anchor`.
///
/// New lines take the indentation of the anchor line. Returns the new text
/// and the number of vars inserted.
///
/// # Errors
///
/// Returns `ParseError::MissingAnchor` if a var has to be inserted and
/// `text` has no `anchor`.
pub fn install_xml_vars(text: &str, vars: &[String], anchor: &str) -> Result<(String, usize), ParseError> {
    let mut output = text.to_string();
    let mut added = 0;

    for var in vars {
        if contains_var(&output, var) {
            continue;
        }
        let position = output.find(anchor).ok_or_else(|| ParseError::MissingAnchor {
            anchor: anchor.to_string(),
        })?;

        let line_start = output[..position].rfind('\n').map_or(0, |index| index + 1);
        let indent = &output[line_start..position];
        let indent = if indent.trim().is_empty() { indent.to_string() } else { String::new() };

        output.insert_str(position, &format!("{}{}{}", var, line_ending(text), indent));
        added += 1;
    }

    debug!(added, anchor, "installed xml vars");
    Ok((output, added))
}

/// Remove the lines holding one of `vars`.
///
/// Returns the new text and the number of lines removed.
pub fn uninstall_xml_vars(text: &str, vars: &[String]) -> (String, usize) {
    remove_lines(text, |line| {
        let line = collapse_whitespace(line);
        vars.iter().any(|var| *var == line)
    })
}

/// Append a `<menu>;` entry for each menu file not yet listed.
///
/// Returns the new text and the number of entries appended.
pub fn install_menu_entries(text: &str, menus: &[String]) -> (String, usize) {
    let newline = line_ending(text);
    let mut output = text.to_string();
    let mut added = 0;

    for menu in menus {
        let entry = format!("{};", menu);
        if output.lines().any(|line| line.trim() == entry) {
            continue;
        }
        if !output.is_empty() && !output.ends_with('\n') {
            output.push_str(newline);
        }
        output.push_str(&entry);
        output.push_str(newline);
        added += 1;
    }

    debug!(added, "installed menu entries");
    (output, added)
}

/// Remove the `<menu>;` entries of `menus`.
///
/// Returns the new text and the number of entries removed.
pub fn uninstall_menu_entries(text: &str, menus: &[String]) -> (String, usize) {
    remove_lines(text, |line| {
        let line = line.trim();
        menus.iter().any(|menu| line.strip_suffix(';') == Some(menu.as_str()))
    })
}

fn remove_lines(text: &str, matches: impl Fn(&str) -> bool) -> (String, usize) {
    let mut output = String::with_capacity(text.len());
    let mut removed = 0;

    for line in text.split_inclusive('\n') {
        if matches(line) {
            removed += 1;
        } else {
            output.push_str(line);
        }
    }

    (output, removed)
}

/// Line ending used by `text`, `\n` unless it already uses `\r\n`.
fn line_ending(text: &str) -> &'static str {
    if text.contains("\r\n") {
        "\r\n"
    } else {
        "\n"
    }
}
