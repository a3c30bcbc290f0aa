//
//  bugz-cli
//  interactive/prompt.rs
//

//! Interactive prompts.
//!
//! All terminal input goes through this module so command code never touches
//! `dialoguer` directly. The functions block until the user answers; a closed
//! or non-interactive stdin surfaces as an I/O error, which callers treat as
//! "not running interactively".

use dialoguer::{Confirm, Editor, Input, Password};

use crate::error::{BugzError, Result};

/// Prefix for instructional lines the editor strips back out.
const COMMENT_PREFIX: &str = "BUGZ:";

/// Prompts for a single line of text. Empty input repeats the prompt.
///
/// # Example
///
/// ```no_run
/// use bugz_cli::interactive::prompt::prompt_input;
///
/// let product = prompt_input("Enter product").unwrap();
/// ```
pub fn prompt_input(message: &str) -> Result<String> {
    let input: String = Input::new()
        .with_prompt(message)
        .interact_text()
        .map_err(interaction_error)?;
    Ok(input)
}

/// Prompts for a single line of text, allowing an empty answer.
///
/// Returns `None` when the user just presses Enter, so callers can fall
/// back to a default value.
pub fn prompt_input_optional(message: &str) -> Result<Option<String>> {
    let input: String = Input::new()
        .with_prompt(message)
        .allow_empty(true)
        .interact_text()
        .map_err(interaction_error)?;
    if input.is_empty() {
        Ok(None)
    } else {
        Ok(Some(input))
    }
}

/// Prompts for a password without echoing it.
pub fn prompt_password(message: &str) -> Result<String> {
    let password = Password::new()
        .with_prompt(message)
        .interact()
        .map_err(interaction_error)?;
    Ok(password)
}

/// Asks a yes/no question with a default answer.
///
/// The default is shown in the prompt (`[Y/n]` or `[y/N]`) and accepted on
/// a bare Enter.
pub fn prompt_confirm(message: &str, default: bool) -> Result<bool> {
    let confirmed = Confirm::new()
        .with_prompt(message)
        .default(default)
        .interact()
        .map_err(interaction_error)?;
    Ok(confirmed)
}

/// Opens the user's editor to compose multi-line text.
///
/// `context` is shown inside the buffer as `BUGZ:`-prefixed lines, which are
/// stripped from the result along with any other line carrying that prefix.
/// The editor command comes from `BUGZ_EDITOR`, then `EDITOR`; with neither
/// set, `dialoguer` falls back to its platform default.
///
/// # Returns
///
/// `Ok(Some(text))` with the cleaned, non-empty buffer contents;
/// `Ok(None)` when the user saved nothing or left only instruction lines.
pub fn prompt_editor(context: &str) -> Result<Option<String>> {
    let seed = editor_seed(context);

    let mut editor = Editor::new();
    if let Some(command) = preferred_editor() {
        editor.executable(command);
    }
    let edited = editor
        .edit(&seed)
        .map_err(|e| BugzError::config(format!("unable to launch editor: {e}")))?;

    Ok(edited.and_then(|text| {
        let cleaned = strip_comment_lines(&text);
        if cleaned.trim().is_empty() {
            None
        } else {
            Some(cleaned)
        }
    }))
}

fn preferred_editor() -> Option<String> {
    std::env::var("BUGZ_EDITOR")
        .or_else(|_| std::env::var("EDITOR"))
        .ok()
}

fn editor_seed(context: &str) -> String {
    let mut seed = String::new();
    seed.push_str(COMMENT_PREFIX);
    seed.push_str(" ---------------------------------------------------\n");
    for line in context.lines() {
        seed.push_str(COMMENT_PREFIX);
        seed.push(' ');
        seed.push_str(line);
        seed.push('\n');
    }
    seed.push_str(COMMENT_PREFIX);
    seed.push_str(" Any line beginning with 'BUGZ:' will be ignored.\n");
    seed.push_str(COMMENT_PREFIX);
    seed.push_str(" ---------------------------------------------------\n");
    seed
}

fn strip_comment_lines(text: &str) -> String {
    let mut out = String::new();
    for line in text.lines() {
        if line.starts_with(COMMENT_PREFIX) {
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

fn interaction_error(e: dialoguer::Error) -> BugzError {
    match e {
        dialoguer::Error::IO(io) => BugzError::Io(io),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editor_seed_prefixes_every_context_line() {
        let seed = editor_seed("line one\nline two");
        for line in seed.lines() {
            assert!(line.starts_with("BUGZ:"), "unprefixed line: {line}");
        }
        assert!(seed.contains("BUGZ: line one\n"));
        assert!(seed.contains("BUGZ: line two\n"));
    }

    #[test]
    fn test_strip_removes_instruction_lines_only() {
        let text = "BUGZ: instructions\nreal comment\nBUGZ: more\nsecond line\n";
        assert_eq!(strip_comment_lines(text), "real comment\nsecond line\n");
    }

    #[test]
    fn test_seed_round_trips_to_empty() {
        let seed = editor_seed("describe the problem");
        assert!(strip_comment_lines(&seed).trim().is_empty());
    }
}
