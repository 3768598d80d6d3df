//! Clock in and clock out for the calling member.

use chrono::{DateTime, Utc};

use clk_core::{Caller, ClockSession, Rejection, Reply, authorize_clock_in};
use clk_db::Database;

use super::{CommandResult, close_open_session, describe};

/// Clocks the caller in to `mask`.
///
/// An open session under the same mask is reported before a missing role.
pub fn clock_in(db: &Database, caller: &Caller, mask: &str, now: DateTime<Utc>) -> CommandResult {
    let open = db.find_open_session(caller.guild_id, caller.user_id, mask)?;
    let allowed = db.masks_for_roles(caller.guild_id, &caller.effective_roles())?;
    authorize_clock_in(open.is_some(), &allowed, mask)?;

    let session = ClockSession::clock_in(caller.guild_id, caller.user_id, mask, now);
    if !db.start_session(&session)? {
        return Err(Rejection::AlreadyClockedIn {
            mask: mask.to_string(),
        }
        .into());
    }
    tracing::info!(session = %session, "clocked in");

    Ok(Reply::ephemeral(format!(
        "You've clocked in with the mask `{mask}`."
    )))
}

/// Clocks the caller out of `mask`.
pub fn clock_out(db: &Database, caller: &Caller, mask: &str, now: DateTime<Utc>) -> CommandResult {
    let session = close_open_session(db, caller.guild_id, caller.user_id, mask, now)?;
    Ok(Reply::ephemeral(format!(
        "You've clocked out of the mask **{mask}**. Your duration for this session is **{}**.",
        describe(session.duration(now))
    )))
}
