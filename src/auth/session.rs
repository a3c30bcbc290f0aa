//
//  bugz-cli
//  auth/session.rs
//

//! Authenticated call session.
//!
//! [`AuthSession`] wraps the RPC transport and owns everything about
//! credentials: which authentication artifact rides along with each call,
//! when to perform the `User.login` handshake, and how the token cache is
//! kept in sync. Command code calls [`AuthSession::call_bz`] and never
//! thinks about authentication again.
//!
//! Exactly one authentication mode is active per call, in priority order:
//! API key, cached token, username/password. A call that fails with the
//! "login required" fault (code 410) triggers a single just-in-time login
//! followed by one retry of the original call; a second failure surfaces
//! to the caller. With `skip_auth` set the session never authenticates:
//! credentials are discarded at construction and the 410 fault is passed
//! straight through.

use std::process::Command;

use tracing::{debug, info, warn};

use crate::auth::cache::CredentialCache;
use crate::error::{BugzError, Result};
use crate::interactive::prompt;
use crate::rpc::{RpcTransport, Struct, Value};
use crate::settings::ResolvedSettings;

/// Credentials available to the session, before any prompting.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub user: Option<String>,
    pub password: Option<String>,
    pub passwordcmd: Option<String>,
    pub key: Option<String>,
}

impl Credentials {
    fn from_settings(settings: &ResolvedSettings) -> Self {
        Self {
            user: settings.user.clone(),
            password: settings.password.clone(),
            passwordcmd: settings.passwordcmd.clone(),
            key: settings.key.clone(),
        }
    }
}

/// A connection-bound session that attaches authentication to every call.
pub struct AuthSession {
    transport: Box<dyn RpcTransport>,
    cache: CredentialCache,
    connection: String,
    credentials: Credentials,
    skip_auth: bool,
    token: Option<String>,
}

impl AuthSession {
    /// Builds a session for the resolved connection.
    ///
    /// A previously cached token is loaded speculatively; no login round
    /// trip happens until the server actually demands one. With `skip_auth`
    /// both the token and the credentials are dropped on the floor.
    pub fn new(
        transport: Box<dyn RpcTransport>,
        cache: CredentialCache,
        settings: &ResolvedSettings,
    ) -> Self {
        let skip_auth = settings.skip_auth;
        let credentials = if skip_auth {
            Credentials::default()
        } else {
            Credentials::from_settings(settings)
        };
        let token = if skip_auth {
            None
        } else {
            cache.load(&settings.connection)
        };
        if token.is_some() {
            debug!("loaded cached token for [{}]", settings.connection);
        }

        Self {
            transport,
            cache,
            connection: settings.connection.clone(),
            credentials,
            skip_auth,
            token,
        }
    }

    /// Invokes `method` with authentication attached.
    ///
    /// On a "login required" fault the session logs in once and retries the
    /// original call once. Every other error, and a second auth failure,
    /// goes back to the caller untouched.
    pub async fn call_bz(&mut self, method: &str, params: Struct) -> Result<Value> {
        match self.transport.call(method, &self.authenticated(&params)).await {
            Err(e) if e.is_auth_required() && !self.skip_auth => {
                info!("Authentication required; logging in");
                self.login().await?;
                self.transport.call(method, &self.authenticated(&params)).await
            }
            other => other,
        }
    }

    /// Performs the `User.login` handshake and caches any returned token.
    ///
    /// Missing credentials are gathered interactively: the username with a
    /// plain prompt, the password from `passwordcmd` if configured or a
    /// masked prompt otherwise. Resolved values are kept on the session so
    /// a later retry never prompts twice.
    pub async fn login(&mut self) -> Result<()> {
        if self.skip_auth {
            return Err(BugzError::auth(
                "authentication is disabled (skip_auth is set)",
            ));
        }

        let user = match &self.credentials.user {
            Some(user) => user.clone(),
            None => {
                info!("No username given.");
                prompt::prompt_input("Username")?
            }
        };
        let password = match &self.credentials.password {
            Some(password) => password.clone(),
            None => match &self.credentials.passwordcmd {
                Some(cmd) => run_password_command(cmd)?,
                None => {
                    info!("No password given.");
                    prompt::prompt_password("Password")?
                }
            },
        };

        let mut params = Struct::new();
        params.insert("login".to_string(), Value::from(user.as_str()));
        params.insert("password".to_string(), Value::from(password.as_str()));

        let result = self.transport.call("User.login", &params).await?;

        self.credentials.user = Some(user);
        self.credentials.password = Some(password);

        if let Some(token) = result.get("token").and_then(Value::as_str) {
            let token = token.to_string();
            self.cache.save(&self.connection, &token)?;
            self.token = Some(token);
        }
        Ok(())
    }

    /// Remote logout, then unconditional local token destruction.
    ///
    /// The remote call is best-effort: an expired token or unreachable
    /// server must not stop the local cleanup.
    pub async fn logout(&mut self) -> Result<()> {
        let params = self.authenticated(&Struct::new());
        if let Err(e) = self.transport.call("User.logout", &params).await {
            warn!("remote logout failed: {e}");
        }
        self.cache.destroy(&self.connection)?;
        self.token = None;
        Ok(())
    }

    /// Whether the session currently holds a token.
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Returns `params` with the active authentication artifact attached.
    ///
    /// Priority: API key, then cached token, then the legacy login/password
    /// pair for servers that never issue tokens.
    fn authenticated(&self, params: &Struct) -> Struct {
        let mut params = params.clone();
        if let Some(key) = &self.credentials.key {
            params.insert("Bugzilla_api_key".to_string(), Value::from(key.as_str()));
        } else if let Some(token) = &self.token {
            params.insert("Bugzilla_token".to_string(), Value::from(token.as_str()));
        } else if let (Some(user), Some(password)) =
            (&self.credentials.user, &self.credentials.password)
        {
            params.insert("Bugzilla_login".to_string(), Value::from(user.as_str()));
            params.insert(
                "Bugzilla_password".to_string(),
                Value::from(password.as_str()),
            );
        }
        params
    }
}

/// Runs the configured password command and takes the first line of its
/// standard output.
fn run_password_command(cmd: &str) -> Result<String> {
    let argv = shell_words::split(cmd)
        .map_err(|e| BugzError::config(format!("bad passwordcmd {cmd:?}: {e}")))?;
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| BugzError::config("passwordcmd is empty"))?;

    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| BugzError::auth(format!("passwordcmd failed to run: {e}")))?;
    if !output.status.success() {
        return Err(BugzError::auth(format!(
            "passwordcmd exited with {}",
            output.status
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .lines()
        .next()
        .map(str::to_string)
        .ok_or_else(|| BugzError::auth("passwordcmd produced no output"))
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::cli::GlobalOptions;
    use crate::config::ConfigStore;

    /// Scripted transport: pops one canned result per call and records
    /// every method/params pair it sees. Tests hold an `Arc` handle to
    /// inspect the call log after the session consumed its clone.
    struct FakeTransport {
        responses: Mutex<VecDeque<Result<Value>>>,
        calls: Mutex<Vec<(String, Struct)>>,
    }

    impl FakeTransport {
        fn new(responses: Vec<Result<Value>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(String, Struct)> {
            self.calls.lock().unwrap().clone()
        }
    }

    /// Adapter so a test can keep its own `Arc` to the fake while the
    /// session owns a boxed transport.
    struct Shared(Arc<FakeTransport>);

    #[async_trait]
    impl RpcTransport for Shared {
        async fn call(&self, method: &str, params: &Struct) -> Result<Value> {
            self.0
                .calls
                .lock()
                .unwrap()
                .push((method.to_string(), params.clone()));
            self.0
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| panic!("unexpected call to {method}"))
        }
    }

    fn auth_fault() -> BugzError {
        BugzError::Fault {
            code: 410,
            message: "Log in before using this part of Bugzilla.".to_string(),
        }
    }

    fn login_response(token: &str) -> Value {
        let mut s = Struct::new();
        s.insert("id".to_string(), Value::Int(42));
        s.insert("token".to_string(), Value::from(token));
        Value::Struct(s)
    }

    fn settings(extra: &str) -> (ResolvedSettings, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ConfigStore::default();
        store
            .merge_text(
                "test",
                &format!(
                    "[default]\nconnection = \"gentoo\"\n[gentoo]\nbase = \"https://example/xmlrpc.cgi\"\n{extra}"
                ),
            )
            .unwrap();
        let resolved = ResolvedSettings::resolve(&GlobalOptions::default(), &store).unwrap();
        (resolved, dir)
    }

    fn cache_in(dir: &tempfile::TempDir) -> CredentialCache {
        CredentialCache::open_at(dir.path().join(".bugz_tokens"))
    }

    #[tokio::test]
    async fn test_auth_fault_triggers_single_login_and_retry() {
        let (settings, dir) =
            settings("user = \"me@example.com\"\npassword = \"hunter2\"");
        let fake = FakeTransport::new(vec![
            Err(auth_fault()),
            Ok(login_response("tok123")),
            Ok(Value::Int(1)),
        ]);
        let mut session =
            AuthSession::new(Box::new(Shared(fake.clone())), cache_in(&dir), &settings);

        let result = session.call_bz("Bug.update", Struct::new()).await.unwrap();
        assert_eq!(result.as_i64(), Some(1));

        let calls = fake.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].0, "Bug.update");
        assert_eq!(calls[1].0, "User.login");
        assert_eq!(
            calls[1].1.get("login").and_then(Value::as_str),
            Some("me@example.com")
        );
        // Retry carries the freshly issued token.
        assert_eq!(calls[2].0, "Bug.update");
        assert_eq!(
            calls[2].1.get("Bugzilla_token").and_then(Value::as_str),
            Some("tok123")
        );
    }

    #[tokio::test]
    async fn test_tokenless_server_falls_back_to_login_password_pair() {
        let (settings, dir) =
            settings("user = \"me@example.com\"\npassword = \"hunter2\"");
        // Login succeeds but the server issues no token.
        let mut tokenless = Struct::new();
        tokenless.insert("id".to_string(), Value::Int(42));
        let fake = FakeTransport::new(vec![
            Err(auth_fault()),
            Ok(Value::Struct(tokenless)),
            Ok(Value::Int(1)),
        ]);
        let mut session =
            AuthSession::new(Box::new(Shared(fake.clone())), cache_in(&dir), &settings);

        session.call_bz("Bug.update", Struct::new()).await.unwrap();

        let calls = fake.calls();
        assert_eq!(calls.len(), 3);
        assert!(!calls[2].1.contains_key("Bugzilla_token"));
        assert_eq!(
            calls[2].1.get("Bugzilla_login").and_then(Value::as_str),
            Some("me@example.com")
        );
        assert_eq!(
            calls[2].1.get("Bugzilla_password").and_then(Value::as_str),
            Some("hunter2")
        );
    }

    #[tokio::test]
    async fn test_second_auth_fault_surfaces_without_looping() {
        let (settings, dir) =
            settings("user = \"me@example.com\"\npassword = \"hunter2\"");
        let fake = FakeTransport::new(vec![
            Err(auth_fault()),
            Ok(login_response("tok123")),
            Err(auth_fault()),
        ]);
        let mut session =
            AuthSession::new(Box::new(Shared(fake)), cache_in(&dir), &settings);

        let err = session.call_bz("Bug.update", Struct::new()).await.unwrap_err();
        assert!(err.is_auth_required());
    }

    #[tokio::test]
    async fn test_skip_auth_passes_fault_through() {
        let (settings, dir) = settings("skip_auth = true\nuser = \"me@example.com\"");
        let fake = FakeTransport::new(vec![Err(auth_fault())]);
        let mut session =
            AuthSession::new(Box::new(Shared(fake.clone())), cache_in(&dir), &settings);

        let err = session.call_bz("Bug.update", Struct::new()).await.unwrap_err();
        assert!(err.is_auth_required());

        // Exactly the one call, with no credentials attached.
        let calls = fake.calls();
        assert_eq!(calls.len(), 1);
        assert!(!calls[0].1.contains_key("Bugzilla_token"));
        assert!(!calls[0].1.contains_key("Bugzilla_api_key"));
    }

    #[tokio::test]
    async fn test_api_key_outranks_cached_token() {
        let (settings, dir) = settings("key = \"sekrit-key\"");
        let mut cache = cache_in(&dir);
        cache.save("gentoo", "stale-token").unwrap();

        let fake = FakeTransport::new(vec![Ok(Value::Int(0))]);
        let mut session =
            AuthSession::new(Box::new(Shared(fake.clone())), cache_in(&dir), &settings);

        session.call_bz("Bug.get", Struct::new()).await.unwrap();
        let calls = fake.calls();
        assert_eq!(
            calls[0].1.get("Bugzilla_api_key").and_then(Value::as_str),
            Some("sekrit-key")
        );
        assert!(!calls[0].1.contains_key("Bugzilla_token"));
    }

    #[tokio::test]
    async fn test_logout_destroys_token_even_when_remote_fails() {
        let (settings, dir) = settings("");
        let mut cache = cache_in(&dir);
        cache.save("gentoo", "tok123").unwrap();

        let fake = FakeTransport::new(vec![Err(BugzError::protocol("connection refused"))]);
        let mut session =
            AuthSession::new(Box::new(Shared(fake)), cache_in(&dir), &settings);
        assert!(session.has_token());

        session.logout().await.unwrap();
        assert!(!session.has_token());
        assert_eq!(cache_in(&dir).load("gentoo"), None);
    }

    #[tokio::test]
    async fn test_login_with_skip_auth_is_an_error() {
        let (settings, dir) = settings("skip_auth = true");
        let fake = FakeTransport::new(vec![]);
        let mut session =
            AuthSession::new(Box::new(Shared(fake)), cache_in(&dir), &settings);
        let err = session.login().await.unwrap_err();
        assert!(matches!(err, BugzError::Auth(_)));
    }

    #[test]
    fn test_password_command_takes_first_line() {
        let password = run_password_command(r"printf 'first\nsecond'").unwrap();
        assert_eq!(password, "first");
    }

    #[test]
    fn test_empty_password_command_is_config_error() {
        let err = run_password_command("").unwrap_err();
        assert!(matches!(err, BugzError::Config(_)));
    }
}
