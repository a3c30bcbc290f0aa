//
//  bugz-cli
//  cli/search.rs
//

//! The `search` sub-command.

use clap::Args;
use tracing::info;

use crate::auth::AuthSession;
use crate::bugs::SearchQuery;
use crate::error::{BugzError, Result};
use crate::output::{format_bug_line, ListColumns};
use crate::rpc::Value;
use crate::settings::ResolvedSettings;

/// Search for bugs in Bugzilla
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Strings to search for in the bug title
    pub terms: Vec<String>,

    /// The unique alias for this bug
    #[arg(long)]
    pub alias: Option<String>,

    /// Email the bug is assigned to
    #[arg(short = 'a', long)]
    pub assigned_to: Option<String>,

    /// Email of the person who created the bug
    #[arg(short = 'r', long, visible_alias = "reporter")]
    pub creator: Option<String>,

    /// Email on the CC list
    #[arg(long)]
    pub cc: Option<String>,

    /// Email of a commenter
    #[arg(long)]
    pub commenter: Option<String>,

    /// Restrict by component (one or more)
    #[arg(short = 'C', long)]
    pub component: Vec<String>,

    /// Restrict by product (one or more)
    #[arg(long)]
    pub product: Vec<String>,

    /// Restrict by severity (one or more)
    #[arg(long)]
    pub severity: Vec<String>,

    /// Restrict by priority (one or more)
    #[arg(long)]
    pub priority: Vec<String>,

    /// Restrict by operating system
    #[arg(long)]
    pub op_sys: Option<String>,

    /// Restrict by platform
    #[arg(long)]
    pub platform: Option<String>,

    /// Restrict by resolution
    #[arg(long)]
    pub resolution: Option<String>,

    /// Restrict by version
    #[arg(short = 'v', long)]
    pub version: Option<String>,

    /// Status whiteboard
    #[arg(short = 'w', long)]
    pub whiteboard: Option<String>,

    /// Restrict by keywords
    #[arg(long)]
    pub keywords: Option<String>,

    /// Restrict by status (one or more, use all for all statuses)
    #[arg(short = 's', long = "status")]
    pub statuses: Vec<String>,

    /// Limit the number of records returned
    #[arg(short = 'l', long)]
    pub limit: Option<i64>,

    /// Set the start position for a search
    #[arg(long)]
    pub offset: Option<i64>,

    /// Show status of bugs
    #[arg(long)]
    pub show_status: bool,

    /// Show priority of bugs
    #[arg(long)]
    pub show_priority: bool,

    /// Show severity of bugs
    #[arg(long)]
    pub show_severity: bool,
}

impl SearchArgs {
    pub async fn run(
        &self,
        session: &mut AuthSession,
        settings: &ResolvedSettings,
    ) -> Result<()> {
        let query = self.to_query(settings);
        let params = query.build()?;

        info!("Searching for bugs meeting the following criteria:");
        for (key, value) in &params {
            info!("   {key:<20} = {value:?}");
        }

        let result = session.call_bz("Bug.search", params).await?;
        let bugs = result
            .get("bugs")
            .and_then(Value::as_array)
            .ok_or_else(|| BugzError::protocol("Bug.search returned no bug list"))?;

        if bugs.is_empty() {
            info!("No bugs found.");
            return Ok(());
        }

        let columns = ListColumns {
            status: self.show_status,
            priority: self.show_priority,
            severity: self.show_severity,
        };
        for bug in bugs {
            if let Some(bug) = bug.as_struct() {
                println!("{}", format_bug_line(bug, columns, settings.columns));
            }
        }
        info!("{} bug(s) found.", bugs.len());
        Ok(())
    }

    /// Command-line criteria merged with the configured status default.
    fn to_query(&self, settings: &ResolvedSettings) -> SearchQuery {
        let statuses = if !self.statuses.is_empty() {
            Some(self.statuses.clone())
        } else {
            settings.search_statuses.clone()
        };

        SearchQuery {
            terms: self.terms.clone(),
            statuses,
            assigned_to: self.assigned_to.clone(),
            reporter: self.creator.clone(),
            cc: self.cc.clone(),
            commenter: self.commenter.clone(),
            alias: self.alias.clone(),
            product: self.product.clone(),
            component: self.component.clone(),
            severity: self.severity.clone(),
            priority: self.priority.clone(),
            op_sys: self.op_sys.clone(),
            platform: self.platform.clone(),
            resolution: self.resolution.clone(),
            version: self.version.clone(),
            whiteboard: self.whiteboard.clone(),
            keywords: self.keywords.clone(),
            limit: self.limit,
            offset: self.offset,
        }
    }
}
