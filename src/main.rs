//! Closetly CLI Entry Point
//!
//! Connects under the bootstrap account, runs the login flow, then the menu
//! until the user quits. Prompts and tables go to stdout; logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use closetly::auth::{self, LoginOutcome};
use closetly::config::{self, ClientConfig};
use closetly::menu;
use closetly::{ClosetlyError, DialoguerTerminal, MySqlConnector, SessionManager, Terminal};

/// Closetly - browse, lend and style wardrobes stored in MySQL
#[derive(Parser)]
#[command(name = "closetly")]
#[command(about = "Browse, lend and style wardrobes stored in MySQL")]
#[command(version)]
struct Cli {
    /// Config file applied over the global and project files
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Database server host
    #[arg(long)]
    host: Option<String>,

    /// Database server port
    #[arg(long)]
    port: Option<u16>,

    /// Database name
    #[arg(long)]
    database: Option<String>,

    /// Show connection failure details and debug logs
    #[arg(long)]
    debug: bool,
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<ClientConfig> {
        let mut config = config::load_with_precedence(self.config.as_deref())
            .context("failed to load configuration")?;

        if let Some(host) = &self.host {
            config.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(database) = &self.database {
            config.server.database.clone_from(database);
        }
        config.debug |= self.debug;

        Ok(config)
    }
}

fn init_tracing(debug: bool) {
    let default_directive = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(err) => return fail(&err, cli.debug),
    };

    let debug = config.debug;
    match run(config).await {
        Ok(code) => code,
        Err(err) => fail(&err, debug),
    }
}

async fn run(config: ClientConfig) -> anyhow::Result<ExitCode> {
    let mut term = DialoguerTerminal;

    let bootstrap = config.bootstrap_credential()?;
    tracing::debug!(
        host = %config.server.host,
        port = config.server.port,
        database = %config.server.database,
        account = %bootstrap.user,
        "connecting"
    );
    let mut manager = SessionManager::open(MySqlConnector::new(config.server.clone()), bootstrap).await?;

    let code = match auth::login(&mut manager, &config, &mut term).await? {
        LoginOutcome::LoggedIn(user) => {
            if user.created {
                term.say(&format!("Welcome to Closetly, {}!", user.username));
            } else {
                term.say(&format!("Welcome back, {}!", user.username));
            }
            menu::run(&mut manager, &mut term, &user, config.debug).await?;
            term.say(menu::GOODBYE);
            ExitCode::SUCCESS
        }
        LoginOutcome::Rejected => {
            term.say(menu::GOODBYE);
            ExitCode::from(2)
        }
        LoginOutcome::Declined => ExitCode::SUCCESS,
    };

    if let Err(err) = manager.close().await {
        tracing::warn!(error = %err, "closing session failed");
    }

    Ok(code)
}

/// Report a fatal error and pick the exit status
fn fail(err: &anyhow::Error, debug: bool) -> ExitCode {
    tracing::debug!("fatal error: {err:#}");

    match err.downcast_ref::<ClosetlyError>() {
        Some(closetly_err) => {
            eprintln!("{}", closetly_err.user_message(debug));
            ExitCode::from(u8::try_from(closetly_err.exit_code()).unwrap_or(1))
        }
        None => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
