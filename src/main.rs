mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod prompt;
mod resolver;
mod store;

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use cli::{Cli, Command};
use commands::Context;
use prompt::SystemPrompter;
use tracing::warn;

fn main() -> Result<()> {
    let cli = Cli::parse_invocation();

    // Static output must work even when the environment cannot be resolved.
    if let Some(Command::Version) = cli.command {
        return print_version(&mut std::io::stdout());
    }

    let vars = config::snapshot_env();
    logging::init(config::is_truthy(&vars, config::DEBUG_VAR));

    let config = config::Config::load(&vars);
    let store = store::system();
    let prompter = SystemPrompter::new(config.timeout);
    let helper = commands::helper_path().unwrap_or_else(|e| {
        warn!(error = %e, "cannot locate the sudo-askpass executable");
        PathBuf::from(env!("CARGO_PKG_NAME"))
    });
    let ctx = Context {
        config: &config,
        store: store.as_ref(),
        prompter: &prompter,
        helper,
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        None => commands::askpass::run(&ctx, cli.prompt.as_deref(), &mut out)?,
        Some(Command::Setup) => {
            drop(out);
            commands::setup::run(&ctx)?
        }
        Some(Command::Test) => commands::test::run(&ctx, &mut out)?,
        Some(Command::Config) => commands::config::run(&ctx, &mut out)?,
        Some(Command::Store { stdin }) => commands::store::run(&ctx, stdin, &mut out)?,
        Some(Command::Remove) => commands::remove::run(&ctx, &mut out)?,
        Some(Command::Version) => print_version(&mut out)?,
    }

    Ok(())
}

fn print_version(out: &mut dyn Write) -> Result<()> {
    writeln!(out, "sudo-askpass {}", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}
