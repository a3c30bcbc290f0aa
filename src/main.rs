//
//  bugz-cli
//  main.rs
//

use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use bugz_cli::auth::{AuthSession, CredentialCache};
use bugz_cli::cli::{Cli, Commands};
use bugz_cli::config::ConfigStore;
use bugz_cli::error::{BugzError, Result};
use bugz_cli::exit_codes;
use bugz_cli::rpc::XmlRpcClient;
use bugz_cli::settings::{LogConfig, ResolvedSettings};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Completion scripts must generate on a machine with no configuration.
    if let Commands::Completion(cmd) = &cli.command {
        match cmd.run() {
            Ok(()) => std::process::exit(exit_codes::SUCCESS),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(exit_codes::ERROR);
            }
        }
    }

    match run(cli).await {
        Ok(()) => std::process::exit(exit_codes::SUCCESS),
        Err(BugzError::Interrupted) => {
            eprintln!("{}", BugzError::Interrupted);
            std::process::exit(exit_codes::ERROR);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(exit_codes::ERROR);
        }
    }
}

/// Installs the tracing subscriber once the resolved verbosity is known.
///
/// `BUGZ_DEBUG` overrides the resolved level for ad-hoc debugging.
fn init_logging(config: LogConfig) {
    let filter = EnvFilter::try_from_env("BUGZ_DEBUG")
        .unwrap_or_else(|_| EnvFilter::new(config.directive()));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}

/// Loads configuration, resolves the connection, and dispatches the
/// sub-command. Ctrl-C aborts the command and reports the interrupt.
async fn run(cli: Cli) -> Result<()> {
    let store = ConfigStore::load(cli.global.config.as_deref())?;
    let settings = ResolvedSettings::resolve(&cli.global, &store)?;
    init_logging(settings.log_config());

    // No network and no session needed to list connection names.
    if let Commands::Connections(cmd) = &cli.command {
        return cmd.run(&settings);
    }

    info!("Using [{}] ({})", settings.connection, settings.safe_base());

    let transport = XmlRpcClient::new(&settings.base, settings.insecure)?;
    let cache = CredentialCache::open()?;
    let mut session = AuthSession::new(Box::new(transport), cache, &settings);

    tokio::select! {
        result = dispatch(&cli.command, &mut session, &settings) => result,
        _ = tokio::signal::ctrl_c() => Err(BugzError::Interrupted),
    }
}

async fn dispatch(
    command: &Commands,
    session: &mut AuthSession,
    settings: &ResolvedSettings,
) -> Result<()> {
    match command {
        Commands::Search(cmd) => cmd.run(session, settings).await,
        Commands::Get(cmd) => cmd.run(session, settings).await,
        Commands::Post(cmd) => cmd.run(session, settings).await,
        Commands::Modify(cmd) => cmd.run(session, settings).await,
        Commands::Attach(cmd) => cmd.run(session, settings).await,
        Commands::Attachment(cmd) => cmd.run(session, settings).await,
        Commands::Login(cmd) => cmd.run(session, settings).await,
        Commands::Logout(cmd) => cmd.run(session, settings).await,
        Commands::Connections(_) | Commands::Completion(_) => unreachable!(),
    }
}
