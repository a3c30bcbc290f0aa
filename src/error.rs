//
//  bugz-cli
//  error.rs
//

//! Error taxonomy for the Bugzilla CLI.
//!
//! Every component raises a typed [`BugzError`] carrying a human-readable
//! message and lets it bubble up to the dispatcher in `main.rs`, which is the
//! only place errors are printed and the exit code is chosen. Components never
//! write to the terminal on failure.

use thiserror::Error;

/// Bugzilla fault code for "you must log in before using this part of
/// Bugzilla" as documented in the WebService API.
pub const FAULT_LOGIN_REQUIRED: i64 = 410;

/// All failures the CLI can report.
///
/// The variants map one-to-one onto the error classes the tool distinguishes:
///
/// * [`Config`](BugzError::Config) - missing or malformed configuration,
///   always detected before any network activity.
/// * [`Validation`](BugzError::Validation) - an inconsistent field
///   combination or unreadable input file for a single invocation.
/// * [`Auth`](BugzError::Auth) - login rejected by the server, or no way to
///   obtain credentials.
/// * [`Fault`](BugzError::Fault) - a structured XML-RPC fault returned by the
///   server (code + message).
/// * [`Protocol`](BugzError::Protocol) - network failure, HTTP-level failure
///   or a malformed XML-RPC response. Never retried.
/// * [`Interrupted`](BugzError::Interrupted) - deliberate abort by the
///   operator (Ctrl-C), reported as a short message rather than a stack trace.
/// * [`Io`](BugzError::Io) - local filesystem or terminal failure.
#[derive(Debug, Error)]
pub enum BugzError {
    /// A configuration problem: missing required key, unknown connection
    /// section, or an unparsable configuration file.
    #[error("{0}")]
    Config(String),

    /// A command's inputs are inconsistent or unusable.
    #[error("{0}")]
    Validation(String),

    /// Authentication failed or credentials could not be obtained.
    #[error("{0}")]
    Auth(String),

    /// A structured fault returned by the remote XML-RPC endpoint.
    #[error("Bugzilla error: {message}")]
    Fault {
        /// Numeric fault code; 410 means authentication is required.
        code: i64,
        /// The server-provided fault string.
        message: String,
    },

    /// Transport or wire-format failure: connection error, non-success HTTP
    /// status, or a response that is not valid XML-RPC.
    #[error("{0}")]
    Protocol(String),

    /// The operator aborted the invocation.
    #[error("Stopped due to keyboard interrupt")]
    Interrupted,

    /// Local I/O failure: unreadable attachment, failed editor launch, or a
    /// broken terminal.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl BugzError {
    /// Builds a [`BugzError::Config`].
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Builds a [`BugzError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Builds a [`BugzError::Auth`].
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Builds a [`BugzError::Protocol`].
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Returns `true` when this error is the "login required" fault that
    /// triggers the single just-in-time login retry in the session layer.
    pub fn is_auth_required(&self) -> bool {
        matches!(self, Self::Fault { code, .. } if *code == FAULT_LOGIN_REQUIRED)
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BugzError>;
