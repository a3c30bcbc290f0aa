//
//  bugz-cli
//  cli/post.rs
//

//! The `post` sub-command.
//!
//! Unless `--batch` is given, every field missing from the command line is
//! gathered interactively, the way the classic client prompted for a new
//! bug: product, component, title, then an editor for the description and
//! optional fields after that. Submission is confirmed before the single
//! `Bug.create` call.

use std::io::Read;
use std::process::Command;

use clap::Args;
use tracing::info;

use crate::auth::AuthSession;
use crate::error::{BugzError, Result};
use crate::interactive::prompt;
use crate::output::{field_line, horizontal_rule};
use crate::rpc::{Struct, Value};
use crate::settings::ResolvedSettings;

/// Post a new bug into Bugzilla
#[derive(Args, Debug)]
pub struct PostArgs {
    /// Product
    #[arg(long)]
    pub product: Option<String>,

    /// Component
    #[arg(long)]
    pub component: Option<String>,

    /// Version of the product
    #[arg(long)]
    pub version: Option<String>,

    /// Title of bug
    #[arg(short = 't', long = "title")]
    pub summary: Option<String>,

    /// Description of the bug
    #[arg(short = 'd', long)]
    pub description: Option<String>,

    /// Load description from file ('-' for stdin)
    #[arg(short = 'F', long, value_name = "FILE")]
    pub description_from: Option<String>,

    /// Append output from command to description
    #[arg(long, value_name = "COMMAND")]
    pub append_command: Option<String>,

    /// Set the operating system
    #[arg(long)]
    pub op_sys: Option<String>,

    /// Set the hardware platform
    #[arg(long)]
    pub platform: Option<String>,

    /// Set priority for the new bug
    #[arg(long)]
    pub priority: Option<String>,

    /// Set the severity for the new bug
    #[arg(short = 'S', long)]
    pub severity: Option<String>,

    /// Set the alias for this bug
    #[arg(long)]
    pub alias: Option<String>,

    /// Assign the bug to someone
    #[arg(short = 'a', long)]
    pub assigned_to: Option<String>,

    /// Add a list of emails to the CC list
    #[arg(long)]
    pub cc: Vec<String>,

    /// Set URL field of bug
    #[arg(short = 'U', long)]
    pub url: Option<String>,

    /// Do not prompt for any values
    #[arg(long)]
    pub batch: bool,

    /// Default answer to the confirmation question
    #[arg(long, value_parser = ["y", "n"], default_value = "y")]
    pub default_confirm: String,
}

/// The fully-gathered submission, after prompting.
#[derive(Debug, Default)]
struct Submission {
    product: String,
    component: String,
    summary: String,
    description: String,
    version: Option<String>,
    op_sys: Option<String>,
    platform: Option<String>,
    priority: Option<String>,
    severity: Option<String>,
    alias: Option<String>,
    assigned_to: Option<String>,
    cc: Vec<String>,
    url: Option<String>,
}

impl PostArgs {
    pub async fn run(
        &self,
        session: &mut AuthSession,
        settings: &ResolvedSettings,
    ) -> Result<()> {
        let submission = self.gather(settings)?;

        println!("{}", horizontal_rule(settings.columns));
        println!("{}", field_line("Product", &submission.product));
        println!("{}", field_line("Component", &submission.component));
        println!("{}", field_line("Title", &submission.summary));
        if let Some(version) = &submission.version {
            println!("{}", field_line("Version", version));
        }
        println!("{}", field_line("Description", &submission.description));
        for (label, value) in [
            ("Operating System", &submission.op_sys),
            ("Platform", &submission.platform),
            ("Priority", &submission.priority),
            ("Severity", &submission.severity),
            ("Alias", &submission.alias),
            ("Assigned to", &submission.assigned_to),
            ("URL", &submission.url),
        ] {
            if let Some(value) = value {
                println!("{}", field_line(label, value));
            }
        }
        if !submission.cc.is_empty() {
            println!("{}", field_line("CC", &submission.cc.join(", ")));
        }
        println!("{}", horizontal_rule(settings.columns));

        if !self.batch {
            let default = self.default_confirm == "y";
            if !prompt::prompt_confirm("Confirm bug submission?", default)? {
                info!("Submission aborted");
                return Ok(());
            }
        }

        let result = session.call_bz("Bug.create", submission.into_params()).await?;
        let id = result
            .get("id")
            .and_then(Value::as_i64)
            .ok_or_else(|| BugzError::protocol("Bug.create returned no bug id"))?;
        info!("Bug {id} submitted");
        Ok(())
    }

    /// Collects every submission field, prompting for whatever the command
    /// line and configuration left unset.
    fn gather(&self, settings: &ResolvedSettings) -> Result<Submission> {
        let mut description = match &self.description_from {
            Some(source) => Some(read_text_source(source)?),
            None => self.description.clone(),
        };

        let mut product = self.product.clone().or_else(|| settings.product.clone());
        let mut component = self
            .component
            .clone()
            .or_else(|| settings.component.clone());
        let mut summary = self.summary.clone();
        let mut version = self.version.clone();
        let mut op_sys = self.op_sys.clone();
        let mut platform = self.platform.clone();
        let mut priority = self.priority.clone();
        let mut severity = self.severity.clone();
        let mut alias = self.alias.clone();
        let mut assigned_to = self.assigned_to.clone();
        let mut cc = self.cc.clone();
        let mut url = self.url.clone();

        if !self.batch {
            info!("Press Ctrl+C at any time to abort.");
            if product.is_none() {
                product = Some(prompt::prompt_input("Enter product")?);
            }
            if component.is_none() {
                component = Some(prompt::prompt_input("Enter component")?);
            }
            if version.is_none() {
                version = Some(
                    prompt::prompt_input_optional("Enter version (default: unspecified)")?
                        .unwrap_or_else(|| "unspecified".to_string()),
                );
            }
            if summary.is_none() {
                summary = Some(prompt::prompt_input("Enter title")?);
            }
            if description.is_none() {
                description = prompt::prompt_editor("Enter bug description:")?;
            }
            if op_sys.is_none() {
                op_sys = prompt::prompt_input_optional(
                    "Enter operating system where this bug occurs",
                )?;
            }
            if platform.is_none() {
                platform = prompt::prompt_input_optional(
                    "Enter hardware platform where this bug occurs",
                )?;
            }
            if priority.is_none() {
                priority =
                    prompt::prompt_input_optional("Enter priority (eg. Normal) (optional)")?;
            }
            if severity.is_none() {
                severity =
                    prompt::prompt_input_optional("Enter severity (eg. normal) (optional)")?;
            }
            if alias.is_none() {
                alias = prompt::prompt_input_optional(
                    "Enter an alias for this bug (optional)",
                )?;
            }
            if assigned_to.is_none() {
                assigned_to = prompt::prompt_input_optional("Enter assignee (optional)")?;
            }
            if cc.is_empty() {
                if let Some(list) =
                    prompt::prompt_input_optional("Enter a CC list (comma separated) (optional)")?
                {
                    cc = list
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect();
                }
            }
            if url.is_none() {
                url = prompt::prompt_input_optional("Enter a URL (optional)")?;
            }
        }

        let product = product.ok_or_else(|| BugzError::validation("Product not specified"))?;
        let component =
            component.ok_or_else(|| BugzError::validation("Component not specified"))?;
        let summary = summary.ok_or_else(|| BugzError::validation("Title not specified"))?;
        let mut description =
            description.ok_or_else(|| BugzError::validation("Description not specified"))?;

        if let Some(command) = &self.append_command {
            if !command.is_empty() {
                let output = run_append_command(command)?;
                description = format!("{description}\n\n$ {command}\n{output}");
            }
        }

        Ok(Submission {
            product,
            component,
            summary,
            description,
            version,
            op_sys,
            platform,
            priority,
            severity,
            alias,
            assigned_to,
            cc,
            url,
        })
    }
}

impl Submission {
    fn into_params(self) -> Struct {
        let mut params = Struct::new();
        params.insert("product".to_string(), Value::String(self.product));
        params.insert("component".to_string(), Value::String(self.component));
        params.insert("summary".to_string(), Value::String(self.summary));
        params.insert("description".to_string(), Value::String(self.description));
        for (key, value) in [
            ("version", self.version),
            ("op_sys", self.op_sys),
            ("platform", self.platform),
            ("priority", self.priority),
            ("severity", self.severity),
            ("alias", self.alias),
            ("assigned_to", self.assigned_to),
            ("url", self.url),
        ] {
            if let Some(value) = value {
                params.insert(key.to_string(), Value::String(value));
            }
        }
        if !self.cc.is_empty() {
            params.insert(
                "cc".to_string(),
                Value::string_array(self.cc.iter().map(String::as_str)),
            );
        }
        params
    }
}

/// Reads a description source: a file path, or `-` for standard input.
pub(crate) fn read_text_source(source: &str) -> Result<String> {
    if source == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        std::fs::read_to_string(source).map_err(|e| {
            BugzError::validation(format!("unable to read file: {source}: {e}"))
        })
    }
}

/// Runs the `--append-command` line and captures its standard output.
fn run_append_command(command: &str) -> Result<String> {
    let argv = shell_words::split(command)
        .map_err(|e| BugzError::validation(format!("bad append command {command:?}: {e}")))?;
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| BugzError::validation("append command is empty"))?;
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| BugzError::validation(format!("append command failed: {e}")))?;
    Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_params_include_mandatory_fields() {
        let submission = Submission {
            product: "Gentoo Linux".to_string(),
            component: "Current packages".to_string(),
            summary: "build failure".to_string(),
            description: "fails with gcc 14".to_string(),
            cc: vec!["dev@example.com".to_string()],
            ..Default::default()
        };
        let params = submission.into_params();
        assert_eq!(
            params.get("product").and_then(Value::as_str),
            Some("Gentoo Linux")
        );
        assert_eq!(params.get("cc"), Some(&Value::string_array(["dev@example.com"])));
        assert!(!params.contains_key("version"));
    }

    #[test]
    fn test_read_text_source_reports_missing_file() {
        let err = read_text_source("/nonexistent/description.txt").unwrap_err();
        assert!(err.to_string().contains("unable to read file"));
    }
}
