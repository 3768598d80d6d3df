//! Guild time clock command layer.
//!
//! This crate provides the command handlers and the `clk` driver binary.

mod cli;
pub mod commands;
mod config;

pub use cli::{
    AdminAction, CallerArgs, Cli, ClockAction, Commands, InfoAction, MasksAction, SettingsAction,
};
pub use config::Config;
