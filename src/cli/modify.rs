//
//  bugz-cli
//  cli/modify.rs
//

//! The `modify` sub-command.

use clap::Args;
use tracing::info;

use crate::auth::AuthSession;
use crate::bugs::MutationRequest;
use crate::error::{BugzError, Result};
use crate::interactive::prompt;
use crate::output::format_quoted_comments;
use crate::rpc::{Struct, Value};
use crate::settings::ResolvedSettings;

use super::post::read_text_source;

/// Modify a bug (eg. post a comment)
#[derive(Args, Debug)]
pub struct ModifyArgs {
    /// The ID of the bug to modify
    pub bugid: i64,

    /// Change the alias for this bug
    #[arg(long)]
    pub alias: Option<String>,

    /// Change assignee for this bug
    #[arg(short = 'a', long)]
    pub assigned_to: Option<String>,

    /// Reassign the bug to the default owner
    #[arg(short = 'u', long)]
    pub unassign: bool,

    /// Add a bug to the blocked list
    #[arg(long = "add-blocked", value_name = "BUG")]
    pub blocks_add: Vec<i64>,

    /// Remove a bug from the blocked list
    #[arg(long = "remove-blocked", value_name = "BUG")]
    pub blocks_remove: Vec<i64>,

    /// Add a bug to the depends list
    #[arg(long = "add-dependson", value_name = "BUG")]
    pub depends_on_add: Vec<i64>,

    /// Remove a bug from the depends list
    #[arg(long = "remove-dependson", value_name = "BUG")]
    pub depends_on_remove: Vec<i64>,

    /// Add an email to the CC list
    #[arg(long = "add-cc", value_name = "EMAIL")]
    pub cc_add: Vec<String>,

    /// Remove an email from the CC list
    #[arg(long = "remove-cc", value_name = "EMAIL")]
    pub cc_remove: Vec<String>,

    /// Add comment from command line
    #[arg(short = 'c', long)]
    pub comment: Option<String>,

    /// Add comment via default editor
    #[arg(short = 'C', long)]
    pub comment_editor: bool,

    /// Add comment from file ('-' for stdin); with -C the editor is seeded
    /// with its contents
    #[arg(short = 'F', long, value_name = "FILE")]
    pub comment_from: Option<String>,

    /// Quote the last N comments when composing in the editor
    #[arg(long, value_name = "N")]
    pub quote: Option<usize>,

    /// Change the component for this bug
    #[arg(long)]
    pub component: Option<String>,

    /// This bug is a duplicate
    #[arg(short = 'd', long = "duplicate", value_name = "BUG")]
    pub dupe_of: Option<i64>,

    /// Add a group to this bug
    #[arg(long = "add-group", value_name = "GROUP")]
    pub groups_add: Vec<String>,

    /// Remove a group from this bug
    #[arg(long = "remove-group", value_name = "GROUP")]
    pub groups_remove: Vec<String>,

    /// Set bug keywords
    #[arg(long = "set-keywords", value_name = "KEYWORD")]
    pub keywords_set: Option<Vec<String>>,

    /// Change the operating system for this bug
    #[arg(long)]
    pub op_sys: Option<String>,

    /// Change the hardware platform for this bug
    #[arg(long)]
    pub platform: Option<String>,

    /// Change the priority for this bug
    #[arg(long)]
    pub priority: Option<String>,

    /// Change the product for this bug
    #[arg(long)]
    pub product: Option<String>,

    /// Set new resolution (if status = RESOLVED)
    #[arg(short = 'r', long)]
    pub resolution: Option<String>,

    /// Add a "see also" URL to this bug
    #[arg(long = "add-see-also", value_name = "URL")]
    pub see_also_add: Vec<String>,

    /// Remove a "see also" URL from this bug
    #[arg(long = "remove-see-also", value_name = "URL")]
    pub see_also_remove: Vec<String>,

    /// Set severity for this bug
    #[arg(short = 'S', long)]
    pub severity: Option<String>,

    /// Set new status of bug (eg. RESOLVED)
    #[arg(short = 's', long)]
    pub status: Option<String>,

    /// Set title of bug
    #[arg(short = 't', long = "title")]
    pub summary: Option<String>,

    /// Set URL field of bug
    #[arg(short = 'U', long)]
    pub url: Option<String>,

    /// Set the version for this bug
    #[arg(short = 'v', long)]
    pub version: Option<String>,

    /// Set status whiteboard
    #[arg(short = 'w', long)]
    pub whiteboard: Option<String>,

    /// Mark bug as RESOLVED, FIXED
    #[arg(long)]
    pub fixed: bool,

    /// Mark bug as RESOLVED, INVALID
    #[arg(long)]
    pub invalid: bool,
}

impl ModifyArgs {
    pub async fn run(
        &self,
        session: &mut AuthSession,
        settings: &ResolvedSettings,
    ) -> Result<()> {
        let comment = self.resolve_comment(session, settings).await?;
        let commented = comment.as_deref().is_some_and(|c| !c.is_empty());
        let request = self.to_request(comment);
        let params = request.build()?;

        let result = session.call_bz("Bug.update", params).await?;
        for line in change_report(&result, commented)? {
            info!("{line}");
        }
        Ok(())
    }

    /// Comment text in precedence order: file/stdin, then literal flag;
    /// with `--comment-editor` the editor runs seeded with that text plus
    /// any quoted prior comments.
    async fn resolve_comment(
        &self,
        session: &mut AuthSession,
        settings: &ResolvedSettings,
    ) -> Result<Option<String>> {
        let mut comment = match &self.comment_from {
            Some(source) => Some(read_text_source(source)?),
            None => self.comment.clone(),
        };

        if self.comment_editor {
            let mut context = String::from("Enter comment:");
            if let Some(quote) = self.quote {
                let quotes = self.fetch_quotes(session, quote, settings.columns).await?;
                if !quotes.is_empty() {
                    context = format!("{context}\n{quotes}");
                }
            }
            if let Some(seed) = &comment {
                context = format!("{context}\n{seed}");
            }
            comment = prompt::prompt_editor(&context)?;
        }

        Ok(comment)
    }

    /// Last `count` comments of the bug, rendered in quoted form.
    async fn fetch_quotes(
        &self,
        session: &mut AuthSession,
        count: usize,
        width: usize,
    ) -> Result<String> {
        let mut params = Struct::new();
        params.insert("ids".to_string(), Value::int_array([self.bugid]));
        let result = session.call_bz("Bug.comments", params).await?;
        let comments = result
            .get("bugs")
            .and_then(|bugs| bugs.get(&self.bugid.to_string()))
            .and_then(|bug| bug.get("comments"))
            .and_then(Value::as_array)
            .ok_or_else(|| BugzError::protocol("Bug.comments returned no listing"))?;

        let tail: Vec<&Struct> = comments
            .iter()
            .rev()
            .take(count)
            .rev()
            .filter_map(Value::as_struct)
            .collect();
        Ok(format_quoted_comments(&tail, width))
    }

    fn to_request(&self, comment: Option<String>) -> MutationRequest {
        MutationRequest {
            ids: vec![self.bugid],
            alias: self.alias.clone(),
            assigned_to: self.assigned_to.clone(),
            unassign: self.unassign,
            blocks_add: self.blocks_add.clone(),
            blocks_remove: self.blocks_remove.clone(),
            depends_on_add: self.depends_on_add.clone(),
            depends_on_remove: self.depends_on_remove.clone(),
            cc_add: self.cc_add.clone(),
            cc_remove: self.cc_remove.clone(),
            comment,
            component: self.component.clone(),
            dupe_of: self.dupe_of,
            deadline: None,
            estimated_time: None,
            remaining_time: None,
            work_time: None,
            groups_add: self.groups_add.clone(),
            groups_remove: self.groups_remove.clone(),
            keywords_set: self.keywords_set.clone(),
            op_sys: self.op_sys.clone(),
            platform: self.platform.clone(),
            priority: self.priority.clone(),
            product: self.product.clone(),
            resolution: self.resolution.clone(),
            see_also_add: self.see_also_add.clone(),
            see_also_remove: self.see_also_remove.clone(),
            severity: self.severity.clone(),
            status: self.status.clone(),
            summary: self.summary.clone(),
            url: self.url.clone(),
            version: self.version.clone(),
            whiteboard: self.whiteboard.clone(),
            fixed: self.fixed,
            invalid: self.invalid,
        }
    }
}

/// Per-bug change report: the removed/added pairs the server recorded for
/// each touched field. When the server recorded no field changes, the
/// comment-only message appears only if a comment was actually sent.
fn change_report(result: &Value, commented: bool) -> Result<Vec<String>> {
    let bugs = result
        .get("bugs")
        .and_then(Value::as_array)
        .ok_or_else(|| BugzError::protocol("Bug.update returned no bug list"))?;

    let mut lines = Vec::new();
    for bug in bugs {
        let id = bug.get("id").and_then(Value::as_i64).unwrap_or_default();
        let changes = bug.get("changes").and_then(Value::as_struct);
        match changes {
            Some(changes) if !changes.is_empty() => {
                lines.push(format!("Modified the following fields in bug {id}"));
                for (field, change) in changes {
                    let removed = change
                        .get("removed")
                        .and_then(Value::as_str)
                        .unwrap_or_default();
                    let added = change
                        .get("added")
                        .and_then(Value::as_str)
                        .unwrap_or_default();
                    lines.push(format!("{field:<12}: removed {removed}"));
                    lines.push(format!("{field:<12}: added {added}"));
                }
            }
            _ if commented => lines.push(format!("Added comment to bug {id}")),
            _ => {}
        }
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update_result(id: i64, changes: Struct) -> Value {
        let mut bug = Struct::new();
        bug.insert("id".to_string(), Value::Int(id));
        bug.insert("changes".to_string(), Value::Struct(changes));
        let mut result = Struct::new();
        result.insert("bugs".to_string(), Value::Array(vec![Value::Struct(bug)]));
        Value::Struct(result)
    }

    #[test]
    fn test_comment_only_message_requires_a_comment() {
        let result = update_result(123, Struct::new());
        assert_eq!(
            change_report(&result, true).unwrap(),
            vec!["Added comment to bug 123"]
        );
        assert!(change_report(&result, false).unwrap().is_empty());
    }

    #[test]
    fn test_field_changes_are_echoed_per_field() {
        let mut change = Struct::new();
        change.insert("removed".to_string(), Value::from("b@x.com"));
        change.insert("added".to_string(), Value::from("a@x.com"));
        let mut changes = Struct::new();
        changes.insert("cc".to_string(), Value::Struct(change));

        let lines = change_report(&update_result(123, changes), false).unwrap();
        assert_eq!(lines[0], "Modified the following fields in bug 123");
        assert!(lines.iter().any(|l| l.contains("removed b@x.com")));
        assert!(lines.iter().any(|l| l.contains("added a@x.com")));
    }
}
