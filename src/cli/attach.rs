//
//  bugz-cli
//  cli/attach.rs
//

//! The `attach` sub-command.

use std::path::{Path, PathBuf};

use clap::Args;
use tracing::info;

use crate::auth::AuthSession;
use crate::error::{BugzError, Result};
use crate::interactive::prompt;
use crate::rpc::{Struct, Value};
use crate::settings::ResolvedSettings;

/// Attach a file to a bug
#[derive(Args, Debug)]
pub struct AttachArgs {
    /// The ID of the bug where the file should be attached
    pub bugid: i64,

    /// The name of the file to attach
    pub filename: PathBuf,

    /// Mimetype of the file e.g. text/plain (default: auto-detect)
    #[arg(short = 'c', long, value_name = "TYPE")]
    pub content_type: Option<String>,

    /// A long description of the attachment
    #[arg(short = 'd', long = "description", value_name = "TEXT")]
    pub comment: Option<String>,

    /// Attachment is a patch
    #[arg(short = 'p', long = "patch")]
    pub is_patch: bool,

    /// A short description of the attachment (default: filename)
    #[arg(short = 't', long = "title", value_name = "TEXT")]
    pub summary: Option<String>,
}

impl AttachArgs {
    pub async fn run(
        &self,
        session: &mut AuthSession,
        _settings: &ResolvedSettings,
    ) -> Result<()> {
        let data = std::fs::read(&self.filename).map_err(|e| {
            BugzError::validation(format!(
                "unable to read file: {}: {e}",
                self.filename.display()
            ))
        })?;

        let file_name = self
            .filename
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| BugzError::validation("invalid attachment file name"))?
            .to_string();

        let is_patch = self.is_patch || looks_like_patch(&self.filename);
        let content_type = match &self.content_type {
            Some(explicit) => explicit.clone(),
            // Bugzilla insists patches are text/plain.
            None if is_patch => "text/plain".to_string(),
            None => guess_content_type(&self.filename).to_string(),
        };

        let summary = self.summary.clone().unwrap_or_else(|| file_name.clone());
        let comment = match &self.comment {
            Some(comment) => Some(comment.clone()),
            None => prompt::prompt_editor("Enter description of the attachment:")?,
        };

        let mut params = Struct::new();
        params.insert("ids".to_string(), Value::int_array([self.bugid]));
        params.insert("file_name".to_string(), Value::String(file_name.clone()));
        params.insert("summary".to_string(), Value::String(summary));
        params.insert("content_type".to_string(), Value::String(content_type));
        params.insert("data".to_string(), Value::Base64(data));
        params.insert("is_patch".to_string(), Value::Bool(is_patch));
        if let Some(comment) = comment {
            params.insert("comment".to_string(), Value::String(comment));
        }

        session.call_bz("Bug.add_attachment", params).await?;
        info!("{file_name} attached to bug {}", self.bugid);
        Ok(())
    }
}

fn looks_like_patch(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("diff") | Some("patch")
    )
}

/// Extension-based content-type guess; unknown extensions fall back to an
/// opaque byte stream.
fn guess_content_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("txt") | Some("log") | Some("ebuild") => "text/plain",
        Some("html") | Some("htm") => "text/html",
        Some("xml") => "text/xml",
        Some("c") | Some("h") | Some("rs") | Some("py") | Some("sh") => "text/plain",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("pdf") => "application/pdf",
        Some("gz") => "application/gzip",
        Some("bz2") => "application/x-bzip2",
        Some("xz") => "application/x-xz",
        Some("zip") => "application/zip",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_extensions_detected() {
        assert!(looks_like_patch(Path::new("fix-build.patch")));
        assert!(looks_like_patch(Path::new("fix-build.diff")));
        assert!(!looks_like_patch(Path::new("build.log")));
    }

    #[test]
    fn test_content_type_guess() {
        assert_eq!(guess_content_type(Path::new("build.log")), "text/plain");
        assert_eq!(guess_content_type(Path::new("shot.PNG")), "image/png");
        assert_eq!(
            guess_content_type(Path::new("core.bin")),
            "application/octet-stream"
        );
    }
}
