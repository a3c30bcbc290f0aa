//
//  bugz-cli
//  output/mod.rs
//

//! Plain-text rendering of bugs, comments and attachments.
//!
//! Everything here is a pure function from decoded RPC values to strings;
//! the command layer owns the actual printing. Column-formatted output is
//! truncated to the resolved terminal width so a narrow terminal never
//! wraps a one-line-per-bug listing.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;

use crate::rpc::{Struct, Value};

/// Display format for timestamps.
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Bug fields mapped to their display labels; fields not listed here are
/// shown under their raw name.
static FIELD_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("alias", "Alias"),
        ("summary", "Title"),
        ("status", "Status"),
        ("resolution", "Resolution"),
        ("product", "Product"),
        ("component", "Component"),
        ("version", "Version"),
        ("platform", "Hardware"),
        ("op_sys", "OpSystem"),
        ("priority", "Priority"),
        ("severity", "Severity"),
        ("target_milestone", "TargetMilestone"),
        ("assigned_to_detail", "AssignedTo"),
        ("url", "URL"),
        ("whiteboard", "Whiteboard"),
        ("keywords", "Keywords"),
        ("depends_on", "dependsOn"),
        ("blocks", "Blocks"),
        ("creation_time", "Reported"),
        ("creator_detail", "Reporter"),
        ("last_change_time", "Updated"),
        ("cc_detail", "CC"),
        ("see_also", "See Also"),
    ])
});

/// Fields that duplicate a `*_detail` sibling or carry no display value.
const SKIP_FIELDS: &[&str] = &[
    "assigned_to",
    "cc",
    "creator",
    "id",
    "is_confirmed",
    "is_creator_accessible",
    "is_cc_accessible",
    "is_open",
    "update_token",
];

const TIME_FIELDS: &[&str] = &["creation_time", "last_change_time"];

/// Which extra columns a bug listing shows.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListColumns {
    pub status: bool,
    pub priority: bool,
    pub severity: bool,
}

/// One line of a `search` result listing, truncated to `width` characters.
///
/// Layout follows the classic listing: bug id, optional status/priority/
/// severity columns, assignee (local part only), summary.
pub fn format_bug_line(bug: &Struct, columns: ListColumns, width: usize) -> String {
    let id = bug.get("id").and_then(Value::as_i64).unwrap_or_default();
    let assignee = bug
        .get("assigned_to")
        .and_then(Value::as_str)
        .unwrap_or("")
        .split('@')
        .next()
        .unwrap_or("");
    let summary = bug.get("summary").and_then(Value::as_str).unwrap_or("");

    let mut line = format!("{id}");
    for (enabled, field) in [
        (columns.status, "status"),
        (columns.priority, "priority"),
        (columns.severity, "severity"),
    ] {
        if enabled {
            let value = bug.get(field).and_then(Value::as_str).unwrap_or("");
            line = format!("{line} {value:<12}");
        }
    }
    line = format!("{line} {assignee:<20} {summary}");
    truncate(&line, width)
}

/// The `Field : value` block shown by `get`.
///
/// Empty values and list fields with no entries are omitted; `*_detail`
/// user fields render as `Name <email>`.
pub fn format_bug_details(bug: &Struct) -> Vec<String> {
    let mut lines = Vec::new();
    for (field, value) in bug {
        if SKIP_FIELDS.contains(&field.as_str()) {
            continue;
        }
        let label = FIELD_MAP
            .get(field.as_str())
            .copied()
            .unwrap_or_else(|| field.as_str());

        match field.as_str() {
            "assigned_to_detail" | "creator_detail" => {
                if let Some(user) = value.as_struct() {
                    lines.push(field_line(label, &format_user(user)));
                }
            }
            "cc_detail" => {
                if let Some(ccs) = value.as_array() {
                    for cc in ccs {
                        if let Some(user) = cc.as_struct() {
                            lines.push(field_line(label, &format_user(user)));
                        }
                    }
                }
            }
            "see_also" => {
                if let Some(urls) = value.as_array() {
                    for url in urls {
                        if let Some(url) = url.as_str() {
                            lines.push(field_line(label, url));
                        }
                    }
                }
            }
            _ if TIME_FIELDS.contains(&field.as_str()) => {
                if let Some(when) = value.as_datetime() {
                    lines.push(field_line(label, &format_time(*when)));
                }
            }
            _ => match value {
                Value::Array(items) => {
                    let joined = items
                        .iter()
                        .map(display_scalar)
                        .collect::<Vec<_>>()
                        .join(", ");
                    if !joined.is_empty() {
                        lines.push(field_line(label, &joined));
                    }
                }
                other => {
                    let text = display_scalar(other);
                    if !text.is_empty() {
                        lines.push(field_line(label, &text));
                    }
                }
            },
        }
    }
    lines
}

/// One `[Attachment] [id] [summary]` listing line.
pub fn format_attachment_line(attachment: &Struct) -> String {
    let id = attachment
        .get("id")
        .and_then(Value::as_i64)
        .unwrap_or_default();
    let summary = attachment
        .get("summary")
        .and_then(Value::as_str)
        .unwrap_or("");
    format!("[Attachment] [{id}] [{summary}]")
}

/// A numbered comment block: header line plus the body wrapped to `width`.
pub fn format_comment(index: usize, comment: &Struct, width: usize) -> Vec<String> {
    let who = comment
        .get("creator")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    let when = comment
        .get("time")
        .and_then(Value::as_datetime)
        .map(|dt| format_time(*dt))
        .unwrap_or_default();

    let mut lines = vec![format!("[Comment #{index}] {who} : {when}")];
    if let Some(text) = comment.get("text").and_then(Value::as_str) {
        for line in text.lines() {
            if line.chars().count() <= width {
                lines.push(line.to_string());
            } else {
                lines.extend(wrap(line, width));
            }
        }
    }
    lines
}

/// Quoted prior comments used to seed the comment editor.
pub fn format_quoted_comments(comments: &[&Struct], width: usize) -> String {
    let mut quotes = String::new();
    for comment in comments {
        let text = match comment.get("text").and_then(Value::as_str) {
            Some(text) if !text.is_empty() => text,
            _ => continue,
        };
        let who = comment
            .get("creator")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        let when = comment
            .get("time")
            .and_then(Value::as_datetime)
            .map(|dt| format_time(*dt))
            .unwrap_or_default();
        quotes.push_str(&format!("On {when}, {who} wrote:\n"));
        for line in text.lines() {
            if line.chars().count() < width {
                quotes.push_str(&format!("> {line}\n"));
            } else {
                for short in wrap(line, width) {
                    quotes.push_str(&format!("> {short}\n"));
                }
            }
        }
    }
    quotes
}

/// Horizontal rule sized one short of the terminal width.
pub fn horizontal_rule(width: usize) -> String {
    "-".repeat(width.saturating_sub(1))
}

/// A `Label       : value` line with the classic 12-column label field.
pub fn field_line(label: &str, value: &str) -> String {
    format!("{label:<12}: {value}")
}

pub fn format_time(when: NaiveDateTime) -> String {
    when.format(TIME_FORMAT).to_string()
}

fn format_user(user: &Struct) -> String {
    let name = user.get("real_name").and_then(Value::as_str).unwrap_or("");
    let email = user.get("email").and_then(Value::as_str).unwrap_or("");
    format!("{name} <{email}>")
}

fn display_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Int(i) => i.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Double(d) => d.to_string(),
        Value::DateTime(dt) => format_time(*dt),
        _ => String::new(),
    }
}

fn truncate(line: &str, width: usize) -> String {
    line.chars().take(width).collect()
}

/// Greedy word fill that never breaks a word, however long.
fn wrap(line: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.chars().count() + 1 + word.chars().count() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            out.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bug() -> Struct {
        let mut bug = Struct::new();
        bug.insert("id".to_string(), Value::Int(123456));
        bug.insert("status".to_string(), Value::from("CONFIRMED"));
        bug.insert("priority".to_string(), Value::from("Normal"));
        bug.insert("severity".to_string(), Value::from("normal"));
        bug.insert(
            "assigned_to".to_string(),
            Value::from("maintainer@gentoo.org"),
        );
        bug.insert(
            "summary".to_string(),
            Value::from("sys-kernel/gentoo-sources: build failure"),
        );
        bug
    }

    #[test]
    fn test_bug_line_basic_layout() {
        let line = format_bug_line(&bug(), ListColumns::default(), 200);
        assert!(line.starts_with("123456 "));
        assert!(line.contains("maintainer "));
        assert!(line.ends_with("build failure"));
        assert!(!line.contains("CONFIRMED"));
    }

    #[test]
    fn test_bug_line_optional_columns_and_truncation() {
        let columns = ListColumns {
            status: true,
            ..Default::default()
        };
        let line = format_bug_line(&bug(), columns, 25);
        assert!(line.contains("CONFIRMED"));
        assert_eq!(line.chars().count(), 25);
    }

    #[test]
    fn test_details_skip_raw_and_empty_fields() {
        let mut b = bug();
        b.insert("whiteboard".to_string(), Value::from(""));
        b.insert("update_token".to_string(), Value::from("xyz"));
        let lines = format_bug_details(&b);
        let text = lines.join("\n");
        assert!(text.contains("Status      : CONFIRMED"));
        assert!(text.contains("Title       : sys-kernel"));
        assert!(!text.contains("Whiteboard"));
        assert!(!text.contains("update_token"));
        // Raw assigned_to is skipped in favour of the detail variant.
        assert!(!text.contains("maintainer@gentoo.org"));
    }

    #[test]
    fn test_details_render_user_detail() {
        let mut user = Struct::new();
        user.insert("real_name".to_string(), Value::from("Jane Doe"));
        user.insert("email".to_string(), Value::from("jane@example.com"));
        let mut b = Struct::new();
        b.insert("creator_detail".to_string(), Value::Struct(user));
        let lines = format_bug_details(&b);
        assert_eq!(lines, vec!["Reporter    : Jane Doe <jane@example.com>"]);
    }

    #[test]
    fn test_details_join_list_fields() {
        let mut b = Struct::new();
        b.insert("depends_on".to_string(), Value::int_array([1, 2, 3]));
        b.insert("blocks".to_string(), Value::Array(vec![]));
        let lines = format_bug_details(&b);
        assert_eq!(lines, vec!["dependsOn   : 1, 2, 3"]);
    }

    #[test]
    fn test_comment_block_wraps_body() {
        let mut comment = Struct::new();
        comment.insert("creator".to_string(), Value::from("dev@example.com"));
        comment.insert(
            "text".to_string(),
            Value::from("one two three four five six seven"),
        );
        let lines = format_comment(0, &comment, 15);
        assert!(lines[0].starts_with("[Comment #0] dev@example.com"));
        assert!(lines.len() > 2);
        for line in &lines[1..] {
            assert!(line.chars().count() <= 15);
        }
    }

    #[test]
    fn test_quoted_comments_prefix_every_line() {
        let mut comment = Struct::new();
        comment.insert("creator".to_string(), Value::from("dev@example.com"));
        comment.insert("text".to_string(), Value::from("first\nsecond"));
        let quotes = format_quoted_comments(&[&comment], 80);
        assert!(quotes.contains("dev@example.com wrote:\n"));
        assert!(quotes.contains("> first\n"));
        assert!(quotes.contains("> second\n"));
    }

    #[test]
    fn test_wrap_never_breaks_words() {
        let wrapped = wrap("supercalifragilistic word", 5);
        assert_eq!(wrapped[0], "supercalifragilistic");
        assert_eq!(wrapped[1], "word");
    }
}
