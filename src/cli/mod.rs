//
//  bugz-cli
//  cli/mod.rs
//

//! CLI command definitions using clap derive macros

mod attach;
mod attachment;
mod completion;
mod connections;
mod get;
mod login;
mod logout;
mod modify;
mod post;
mod search;

pub use attach::AttachArgs;
pub use attachment::AttachmentArgs;
pub use completion::CompletionArgs;
pub use connections::ConnectionsArgs;
pub use get::GetArgs;
pub use login::LoginArgs;
pub use logout::LogoutArgs;
pub use modify::ModifyArgs;
pub use post::PostArgs;
pub use search::SearchArgs;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// bugz - a command-line interface to Bugzilla
#[derive(Parser, Debug)]
#[command(
    name = "bugz",
    version,
    about = "Command-line interface to Bugzilla",
    long_about = "bugz talks to the XML-RPC web service of a Bugzilla \
                  installation.\n\n\
                  Connections are configured in ~/.bugzrc; credentials are \
                  resolved per connection from an API key, a cached login \
                  token, or a username and password.",
    after_help = "Use 'bugz <command> --help' for more information about a command."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOptions,
}

/// Options shared by every command, given before the sub-command name
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Read an alternate configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Use [connection] section of your configuration file
    #[arg(long, value_name = "NAME")]
    pub connection: Option<String>,

    /// Base URL of Bugzilla (the xmlrpc.cgi endpoint)
    #[arg(short = 'b', long, value_name = "URL")]
    pub base: Option<String>,

    /// Username
    #[arg(short = 'u', long)]
    pub user: Option<String>,

    /// Password
    #[arg(short = 'p', long)]
    pub password: Option<String>,

    /// Command to evaluate for the password
    #[arg(long, value_name = "COMMAND")]
    pub passwordcmd: Option<String>,

    /// API key
    #[arg(short = 'k', long)]
    pub key: Option<String>,

    /// Maximum number of columns output should use
    #[arg(long, value_name = "N")]
    pub columns: Option<usize>,

    /// Debug level (from 0 to 3)
    #[arg(short = 'd', long, value_name = "LEVEL")]
    pub debug: Option<u8>,

    /// Quiet mode
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Skip authentication entirely
    #[arg(long)]
    pub skip_auth: bool,

    /// Accept invalid TLS certificates
    #[arg(long)]
    pub insecure: bool,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search for bugs in Bugzilla
    Search(SearchArgs),

    /// Get a bug from Bugzilla
    Get(GetArgs),

    /// Post a new bug into Bugzilla
    Post(PostArgs),

    /// Modify a bug (eg. post a comment)
    Modify(ModifyArgs),

    /// Attach a file to a bug
    Attach(AttachArgs),

    /// Get an attachment from Bugzilla
    Attachment(AttachmentArgs),

    /// Log into Bugzilla and cache the session token
    Login(LoginArgs),

    /// Log out of Bugzilla and discard the cached token
    Logout(LogoutArgs),

    /// List known bug trackers
    Connections(ConnectionsArgs),

    /// Generate shell completion scripts
    Completion(CompletionArgs),
}
