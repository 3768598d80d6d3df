//! Command handlers.
//!
//! Every handler takes the database, the calling member and validated
//! primitive inputs, and returns either a [`Reply`] or a [`CommandError`].
//! Rejections are meant for the user; every other error is a fault.

pub mod admin;
pub mod autocomplete;
pub mod clock;
pub mod info;
pub mod masks;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use clk_core::{ClockSession, Reply, Rejection, SessionError, format_duration};
use clk_db::{Database, DbError};

#[derive(Debug, Error)]
pub enum CommandError {
    /// The command was refused; the message is shown to the user.
    #[error(transparent)]
    Rejected(#[from] Rejection),
    #[error(transparent)]
    Storage(#[from] DbError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("failed to build export: {0}")]
    Export(#[from] csv::Error),
}

pub type CommandResult = Result<Reply, CommandError>;

/// Formats a duration for a reply, spelling out an empty duration.
pub(crate) fn describe(duration: Duration) -> String {
    let formatted = format_duration(duration);
    if formatted.is_empty() {
        "0 seconds".to_string()
    } else {
        formatted
    }
}

/// Closes the member's open session under `mask`.
pub(crate) fn close_open_session(
    db: &Database,
    guild_id: i64,
    user_id: i64,
    mask: &str,
    now: DateTime<Utc>,
) -> Result<ClockSession, CommandError> {
    let Some(mut session) = db.find_open_session(guild_id, user_id, mask)? else {
        return Err(Rejection::NotClockedIn {
            mask: mask.to_string(),
        }
        .into());
    };
    session.close(now)?;
    db.save_session(&session)?;
    tracing::info!(session = %session, "clocked out");
    Ok(session)
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::TimeZone;

    use super::*;

    use clk_core::{Caller, MaskBinding};

    pub const GUILD: i64 = 100;
    pub const MEMBER: i64 = 42;
    pub const SHIFT_ROLE: i64 = 500;

    pub fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, h, m, 0).unwrap()
    }

    pub fn member() -> Caller {
        Caller::new(GUILD, MEMBER, vec![SHIFT_ROLE])
    }

    /// In-memory database with `night_shift` bound to the shift role.
    pub fn database() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.insert_mask(&MaskBinding {
            guild_id: GUILD,
            role_id: SHIFT_ROLE,
            mask: "night_shift".to_string(),
        })
        .unwrap();
        db
    }

    pub fn rejection(result: CommandResult) -> Rejection {
        match result {
            Err(CommandError::Rejected(rejection)) => rejection,
            other => panic!("expected a rejection, got {other:?}"),
        }
    }
}
