//
//  bugz-cli
//  lib.rs
//

//! # bugz
//!
//! A command-line interface to the Bugzilla bug-tracking system, speaking
//! the Bugzilla XML-RPC web-service API.
//!
//! ## Overview
//!
//! This library provides the core functionality for the `bugz` CLI tool:
//! searching, fetching, posting and modifying bugs, and managing
//! attachments, against any number of configured Bugzilla installations.
//!
//! ## Features
//!
//! - **Multi-connection configuration**: named `[connection]` sections in
//!   `~/.bugzrc`, layered over packaged and system-wide defaults
//! - **Layered authentication**: API keys, cached login tokens, or
//!   username/password, with a just-in-time login handshake
//! - **Full bug lifecycle**: search, get, post, modify, attach
//! - **Interactive & scriptable**: prompts and editor integration for
//!   humans, `--batch` and flags for scripts
//!
//! ## Module Structure
//!
//! - [`cli`]: command-line definitions using clap
//! - [`config`]: layered configuration store
//! - [`settings`]: per-invocation connection resolution
//! - [`auth`]: token cache and the authenticated call session
//! - [`rpc`]: XML-RPC value model, codec and HTTP transport
//! - [`bugs`]: `Bug.search` / `Bug.update` payload builders
//! - [`output`]: plain-text rendering of bugs, comments and attachments
//! - [`interactive`]: terminal prompts and the comment editor
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use bugz_cli::config::ConfigStore;
//! use bugz_cli::cli::GlobalOptions;
//! use bugz_cli::settings::ResolvedSettings;
//!
//! let store = ConfigStore::load(None).expect("failed to load configuration");
//! let settings = ResolvedSettings::resolve(&GlobalOptions::default(), &store)
//!     .expect("no usable connection");
//! println!("talking to {}", settings.safe_base());
//! ```

pub mod auth;
pub mod bugs;
pub mod cli;
pub mod config;
pub mod error;
pub mod interactive;
pub mod output;
pub mod rpc;
pub mod settings;

pub use cli::Cli;
pub use error::{BugzError, Result};

/// Application name constant.
///
/// The name of the CLI binary, used for display purposes and the user agent.
pub const APP_NAME: &str = "bugz";

/// The current version of the CLI, taken from `Cargo.toml` at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Exit codes for the CLI.
///
/// The tool reports every failure the same way: a message on stderr and a
/// non-zero exit. Scripts only ever need to distinguish success from
/// failure.
pub mod exit_codes {
    /// Successful execution.
    pub const SUCCESS: i32 = 0;

    /// Any reported error, including a keyboard interrupt.
    pub const ERROR: i32 = 1;
}
