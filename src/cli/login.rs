//
//  bugz-cli
//  cli/login.rs
//

//! The `login` sub-command.

use clap::Args;
use tracing::info;

use crate::auth::AuthSession;
use crate::error::Result;
use crate::settings::ResolvedSettings;

/// Log into Bugzilla eagerly and cache the session token
#[derive(Args, Debug)]
pub struct LoginArgs {}

impl LoginArgs {
    pub async fn run(
        &self,
        session: &mut AuthSession,
        _settings: &ResolvedSettings,
    ) -> Result<()> {
        session.login().await?;
        info!("Log in successful.");
        Ok(())
    }
}
