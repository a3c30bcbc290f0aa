//
//  bugz-cli
//  cli/connections.rs
//

//! The `connections` sub-command.

use clap::Args;

use crate::error::Result;
use crate::settings::ResolvedSettings;

/// List known bug trackers
#[derive(Args, Debug)]
pub struct ConnectionsArgs {}

impl ConnectionsArgs {
    pub fn run(&self, settings: &ResolvedSettings) -> Result<()> {
        println!("Known bug trackers:");
        println!();
        for connection in &settings.connections {
            println!("{connection}");
        }
        Ok(())
    }
}
