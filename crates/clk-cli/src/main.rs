use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use clk_cli::commands::{CommandError, CommandResult, admin, autocomplete, clock, info, masks};
use clk_cli::{
    AdminAction, Cli, ClockAction, Commands, Config, InfoAction, MasksAction, SettingsAction,
};
use clk_core::{Caller, Reply};
use clk_db::Database;

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(Database, Config)> {
    let config = match config_path {
        Some(path) => Config::load_from(Some(path)),
        None => Config::load(),
    }
    .context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

fn dispatch(db: &Database, config: &Config, caller: &Caller, command: &Commands) -> CommandResult {
    let now = Utc::now();
    match command {
        Commands::Clock(ClockAction::In { mask }) => clock::clock_in(db, caller, mask, now),
        Commands::Clock(ClockAction::Out { mask }) => clock::clock_out(db, caller, mask, now),
        Commands::Admin(AdminAction::ClockIn { target, mask }) => {
            admin::clock_in(db, caller, *target, mask, now)
        }
        Commands::Admin(AdminAction::ClockOut { target, mask }) => {
            admin::clock_out(db, caller, *target, mask, now)
        }
        Commands::Admin(AdminAction::SetDuration {
            target,
            mask,
            duration,
        }) => admin::add_duration(db, caller, *target, mask, duration, now),
        Commands::Information(InfoAction::Show { target }) => info::show(db, caller, *target, now),
        Commands::Information(InfoAction::Current { target }) => {
            info::current(db, caller, *target, now)
        }
        Commands::Information(InfoAction::Export { .. }) => {
            info::export(db, caller, &config.export_filename, now)
        }
        Commands::Information(InfoAction::Clear) => info::clear(db, caller),
        Commands::Settings(SettingsAction::Masks(MasksAction::Add { role, mask })) => {
            masks::add(db, caller, *role, mask)
        }
        Commands::Settings(SettingsAction::Masks(MasksAction::Remove { mask })) => {
            masks::remove(db, caller, mask)
        }
        Commands::Settings(SettingsAction::Masks(MasksAction::List)) => masks::list(db, caller),
        Commands::Autocomplete { field, partial } => {
            let choices = autocomplete::suggest(db, caller, *field, partial)?;
            Ok(Reply::Choices { choices })
        }
    }
}

/// Delivers a reply: attachments go to disk, everything else to stdout.
fn deliver(reply: &Reply, output: Option<&Path>, json: bool) -> Result<()> {
    if let Reply::File { filename, bytes } = reply {
        let path = output.map_or_else(|| PathBuf::from(filename), Path::to_path_buf);
        std::fs::write(&path, bytes)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "wrote attachment");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(reply)?);
    } else {
        print!("{reply}");
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let caller = cli.caller.resolve()?;
    let (db, config) = open_database(cli.config.as_deref())?;

    let output = match command {
        Commands::Information(InfoAction::Export { output }) => output.as_deref(),
        _ => None,
    };

    match dispatch(&db, &config, &caller, command) {
        Ok(reply) => deliver(&reply, output, cli.json),
        Err(CommandError::Rejected(rejection)) => {
            tracing::debug!(kind = %rejection.kind(), "command rejected");
            deliver(&Reply::ephemeral(rejection.to_string()), None, cli.json)
        }
        Err(err) => Err(anyhow::Error::new(err).context("command failed")),
    }
}
