//
//  bugz-cli
//  cli/logout.rs
//

//! The `logout` sub-command.

use clap::Args;
use tracing::info;

use crate::auth::AuthSession;
use crate::error::Result;
use crate::settings::ResolvedSettings;

/// Invalidate the remote session and discard the cached token
#[derive(Args, Debug)]
pub struct LogoutArgs {}

impl LogoutArgs {
    pub async fn run(
        &self,
        session: &mut AuthSession,
        _settings: &ResolvedSettings,
    ) -> Result<()> {
        session.logout().await?;
        info!("Log out successful.");
        Ok(())
    }
}
