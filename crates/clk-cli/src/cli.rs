//! Command-line argument definitions.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};

use clk_core::Caller;

use crate::commands::autocomplete::MaskField;

/// Guild time clock.
///
/// Members clock in and out under role-gated masks; administrators adjust,
/// export and clear the recorded sessions.
#[derive(Debug, Parser)]
#[command(name = "clk", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print replies as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(flatten)]
    pub caller: CallerArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Identity of the member issuing the command.
#[derive(Debug, Args)]
pub struct CallerArgs {
    /// Guild the command is issued in.
    #[arg(long, global = true)]
    pub guild: Option<i64>,

    /// User issuing the command.
    #[arg(long, global = true)]
    pub user: Option<i64>,

    /// Role held by the user (repeatable or comma-separated).
    #[arg(long = "role", global = true, value_delimiter = ',')]
    pub roles: Vec<i64>,
}

impl CallerArgs {
    pub fn resolve(&self) -> Result<Caller> {
        let (Some(guild_id), Some(user_id)) = (self.guild, self.user) else {
            bail!("--guild and --user are required");
        };
        Ok(Caller::new(guild_id, user_id, self.roles.clone()))
    }
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Clock yourself in or out of a mask.
    #[command(subcommand)]
    Clock(ClockAction),

    /// Manage other members' clock ins.
    #[command(subcommand)]
    Admin(AdminAction),

    /// Show, export or clear recorded clock ins.
    #[command(subcommand)]
    Information(InfoAction),

    /// Configure the guild.
    #[command(subcommand)]
    Settings(SettingsAction),

    /// Suggest mask names for a partially typed field.
    Autocomplete {
        /// Which mask field is being completed.
        #[arg(value_enum)]
        field: MaskField,

        /// Text typed so far.
        #[arg(default_value = "")]
        partial: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum ClockAction {
    /// Clock in to a mask.
    In { mask: String },
    /// Clock out of a mask.
    Out { mask: String },
}

#[derive(Debug, Subcommand)]
pub enum AdminAction {
    /// Clock a member in, regardless of their roles.
    ClockIn {
        /// Member to clock in.
        #[arg(long)]
        target: i64,
        mask: String,
    },
    /// Clock a member out.
    ClockOut {
        /// Member to clock out.
        #[arg(long)]
        target: i64,
        mask: String,
    },
    /// Add (or with a leading `-`, remove) time for a member.
    SetDuration {
        /// Member to adjust.
        #[arg(long)]
        target: i64,
        mask: String,
        /// Duration such as `1d2h3m4s` or `-30m`.
        #[arg(allow_hyphen_values = true)]
        duration: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum InfoAction {
    /// Show every clock in of a member, grouped by mask.
    Show {
        /// Member to show. Defaults to the caller.
        #[arg(long)]
        target: Option<i64>,
    },
    /// Show the masks a member is currently clocked in with.
    Current {
        /// Member to show. Defaults to the caller.
        #[arg(long)]
        target: Option<i64>,
    },
    /// Export daily totals per member as CSV.
    Export {
        /// Where to write the file. Defaults to the configured file name.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Delete every closed clock in.
    Clear,
}

#[derive(Debug, Subcommand)]
pub enum SettingsAction {
    /// Manage the guild's masks.
    #[command(subcommand)]
    Masks(MasksAction),
}

#[derive(Debug, Subcommand)]
pub enum MasksAction {
    /// Bind a new mask to a role.
    Add {
        /// Role allowed to use the mask.
        #[arg(long)]
        role: i64,
        mask: String,
    },
    /// Remove a mask.
    Remove { mask: String },
    /// List the guild's masks by role.
    List,
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_roles_and_negative_duration() {
        let cli = Cli::try_parse_from([
            "clk",
            "--guild",
            "1",
            "--user",
            "2",
            "--role",
            "10,11",
            "--role",
            "12",
            "admin",
            "set-duration",
            "--target",
            "3",
            "night_shift",
            "-30m",
        ])
        .unwrap();

        let caller = cli.caller.resolve().unwrap();
        assert_eq!(caller, Caller::new(1, 2, vec![10, 11, 12]));
        match cli.command {
            Some(Commands::Admin(AdminAction::SetDuration {
                target,
                mask,
                duration,
            })) => {
                assert_eq!(target, 3);
                assert_eq!(mask, "night_shift");
                assert_eq!(duration, "-30m");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_missing_identity_is_an_error() {
        let cli = Cli::try_parse_from(["clk", "--guild", "1", "clock", "in", "x"]).unwrap();
        let err = cli.caller.resolve().unwrap_err();
        assert!(err.to_string().contains("--user"));
    }
}
