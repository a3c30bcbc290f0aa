//
//  bugz-cli
//  cli/attachment.rs
//

//! The `attachment` sub-command.

use std::io::Write;
use std::path::Path;

use clap::Args;
use tracing::info;

use crate::auth::AuthSession;
use crate::error::{BugzError, Result};
use crate::rpc::{Struct, Value};
use crate::settings::ResolvedSettings;

/// Get an attachment from Bugzilla
#[derive(Args, Debug)]
pub struct AttachmentArgs {
    /// The ID of the attachment
    pub attachid: i64,

    /// Print the attachment rather than save it
    #[arg(short = 'v', long)]
    pub view: bool,
}

impl AttachmentArgs {
    pub async fn run(
        &self,
        session: &mut AuthSession,
        _settings: &ResolvedSettings,
    ) -> Result<()> {
        let mut params = Struct::new();
        params.insert(
            "attachment_ids".to_string(),
            Value::int_array([self.attachid]),
        );

        let result = session.call_bz("Bug.attachments", params).await?;
        let attachment = result
            .get("attachments")
            .and_then(|a| a.get(&self.attachid.to_string()))
            .and_then(Value::as_struct)
            .ok_or_else(|| {
                BugzError::protocol(format!("attachment {} not found", self.attachid))
            })?;

        let data = attachment
            .get("data")
            .and_then(Value::as_base64)
            .ok_or_else(|| BugzError::protocol("attachment carries no data"))?;

        if self.view {
            std::io::stdout().write_all(data)?;
            return Ok(());
        }

        let file_name = attachment
            .get("file_name")
            .and_then(Value::as_str)
            .ok_or_else(|| BugzError::protocol("attachment carries no file name"))?;
        let file_name = sanitize_file_name(file_name);

        if Path::new(&file_name).exists() {
            return Err(BugzError::validation(format!(
                "file {file_name} already exists, refusing to overwrite"
            )));
        }
        info!("Saving attachment to {file_name}");
        std::fs::write(&file_name, data)?;
        Ok(())
    }
}

/// Strips directory components so a malicious file name cannot escape the
/// working directory.
fn sanitize_file_name(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name)
        .trim_start_matches('.');
    if base.is_empty() {
        "attachment".to_string()
    } else {
        base.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("/tmp/evil.sh"), "evil.sh");
        assert_eq!(sanitize_file_name("c:\\boot.ini"), "boot.ini");
        assert_eq!(sanitize_file_name("plain.txt"), "plain.txt");
    }

    #[test]
    fn test_sanitize_never_returns_empty() {
        assert_eq!(sanitize_file_name("..."), "attachment");
        assert_eq!(sanitize_file_name("dir/"), "attachment");
    }

    #[test]
    fn test_sanitize_drops_leading_dots() {
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
    }
}
