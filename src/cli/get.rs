//
//  bugz-cli
//  cli/get.rs
//

//! The `get` sub-command.

use clap::Args;

use crate::auth::AuthSession;
use crate::error::{BugzError, Result};
use crate::output::{field_line, format_attachment_line, format_bug_details, format_comment};
use crate::rpc::{Struct, Value};
use crate::settings::ResolvedSettings;

/// Get a bug from Bugzilla
#[derive(Args, Debug)]
pub struct GetArgs {
    /// The ID of the bug to retrieve
    pub bugid: i64,

    /// Do not show attachments
    #[arg(short = 'a', long)]
    pub no_attachments: bool,

    /// Do not show comments
    #[arg(short = 'n', long)]
    pub no_comments: bool,
}

impl GetArgs {
    pub async fn run(
        &self,
        session: &mut AuthSession,
        settings: &ResolvedSettings,
    ) -> Result<()> {
        let mut params = Struct::new();
        params.insert("ids".to_string(), Value::int_array([self.bugid]));

        let result = session.call_bz("Bug.get", params.clone()).await?;
        let bug = result
            .get("bugs")
            .and_then(Value::as_array)
            .and_then(|bugs| bugs.first())
            .and_then(Value::as_struct)
            .ok_or_else(|| BugzError::protocol("Bug.get returned no bug"))?;

        for line in format_bug_details(bug) {
            println!("{line}");
        }

        if !self.no_attachments {
            self.show_attachments(session, params.clone()).await?;
        }
        if !self.no_comments {
            self.show_comments(session, params, settings.columns).await?;
        }
        Ok(())
    }

    /// Attachment count and listing, fetched with a separate call.
    async fn show_attachments(&self, session: &mut AuthSession, params: Struct) -> Result<()> {
        let result = session.call_bz("Bug.attachments", params).await?;
        let attachments = result
            .get("bugs")
            .and_then(|bugs| bugs.get(&self.bugid.to_string()))
            .and_then(Value::as_array)
            .ok_or_else(|| BugzError::protocol("Bug.attachments returned no listing"))?;

        println!("{}", field_line("Attachments", &attachments.len().to_string()));
        println!();
        for attachment in attachments {
            if let Some(attachment) = attachment.as_struct() {
                println!("{}", format_attachment_line(attachment));
            }
        }
        Ok(())
    }

    async fn show_comments(
        &self,
        session: &mut AuthSession,
        params: Struct,
        width: usize,
    ) -> Result<()> {
        let result = session.call_bz("Bug.comments", params).await?;
        let comments = result
            .get("bugs")
            .and_then(|bugs| bugs.get(&self.bugid.to_string()))
            .and_then(|bug| bug.get("comments"))
            .and_then(Value::as_array)
            .ok_or_else(|| BugzError::protocol("Bug.comments returned no listing"))?;

        for (index, comment) in comments.iter().enumerate() {
            if let Some(comment) = comment.as_struct() {
                println!();
                for line in format_comment(index, comment, width) {
                    println!("{line}");
                }
            }
        }
        Ok(())
    }
}
