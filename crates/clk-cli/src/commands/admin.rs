//! Administrative clock commands acting on another member.
//!
//! These skip role gating; the chat layer only exposes them to moderators.
//! The mask must still exist in the guild.

use chrono::{DateTime, Duration, Utc};

use clk_core::{Caller, ClockSession, Rejection, Reply, parse_duration_strict, reply::user_mention};
use clk_db::Database;

use super::{CommandError, CommandResult, close_open_session, describe};

fn require_mask(db: &Database, guild_id: i64, mask: &str) -> Result<(), CommandError> {
    if db.mask_exists(guild_id, mask)? {
        Ok(())
    } else {
        Err(Rejection::MaskNotFound {
            mask: mask.to_string(),
        }
        .into())
    }
}

/// Clocks `target` in to `mask`.
pub fn clock_in(
    db: &Database,
    caller: &Caller,
    target: i64,
    mask: &str,
    now: DateTime<Utc>,
) -> CommandResult {
    if db.find_open_session(caller.guild_id, target, mask)?.is_some() {
        return Err(Rejection::AlreadyClockedIn {
            mask: mask.to_string(),
        }
        .into());
    }
    require_mask(db, caller.guild_id, mask)?;

    let session = ClockSession::clock_in(caller.guild_id, target, mask, now);
    if !db.start_session(&session)? {
        return Err(Rejection::AlreadyClockedIn {
            mask: mask.to_string(),
        }
        .into());
    }
    tracing::info!(session = %session, by = caller.user_id, "clocked in by admin");

    Ok(Reply::ephemeral(format!(
        "Clocked {} in with the mask `{mask}`.",
        user_mention(target)
    )))
}

/// Clocks `target` out of `mask`.
pub fn clock_out(
    db: &Database,
    caller: &Caller,
    target: i64,
    mask: &str,
    now: DateTime<Utc>,
) -> CommandResult {
    let session = close_open_session(db, caller.guild_id, target, mask, now)?;
    Ok(Reply::ephemeral(format!(
        "Clocked {} out of the mask **{mask}**. Their duration for this session was **{}**.",
        user_mention(target),
        describe(session.duration(now))
    )))
}

/// Replaces `target`'s open session under `mask` with an adjustment of
/// `input` (e.g. `2h`, `-30m`).
pub fn add_duration(
    db: &Database,
    caller: &Caller,
    target: i64,
    mask: &str,
    input: &str,
    now: DateTime<Utc>,
) -> CommandResult {
    let amount = parse_duration_strict(input)?;
    require_mask(db, caller.guild_id, mask)?;

    let Some(mut session) = db.find_open_session(caller.guild_id, target, mask)? else {
        return Err(Rejection::NotClockedIn {
            mask: mask.to_string(),
        }
        .into());
    };
    session.adjust(amount, now)?;
    db.save_session(&session)?;
    tracing::info!(
        session = %session,
        by = caller.user_id,
        seconds = amount.num_seconds(),
        "recorded adjustment"
    );

    let content = if amount < Duration::zero() {
        format!(
            "Removed **{}** from {} under the mask `{mask}`.",
            describe(amount.abs()),
            user_mention(target)
        )
    } else {
        format!(
            "Added **{}** to {} under the mask `{mask}`.",
            describe(amount),
            user_mention(target)
        )
    };
    Ok(Reply::ephemeral(content))
}

#[cfg(test)]
mod tests {
    use super::*;

    use clk_core::RejectionKind;

    use crate::commands::test_support::{GUILD, at, database, member, rejection};

    const TARGET: i64 = 77;

    #[test]
    fn admin_clock_in_ignores_roles() {
        let db = database();
        let reply = clock_in(&db, &member(), TARGET, "night_shift", at(9, 0)).unwrap();
        assert_eq!(
            reply.content(),
            Some("Clocked <@77> in with the mask `night_shift`.")
        );
        assert!(
            db.find_open_session(GUILD, TARGET, "night_shift")
                .unwrap()
                .is_some()
        );
    }

    #[test]
    fn admin_clock_in_unknown_mask() {
        let db = database();
        let err = rejection(clock_in(&db, &member(), TARGET, "ghost", at(9, 0)));
        assert_eq!(
            err,
            Rejection::MaskNotFound {
                mask: "ghost".to_string()
            }
        );
    }

    #[test]
    fn admin_clock_in_conflict() {
        let db = database();
        clock_in(&db, &member(), TARGET, "night_shift", at(9, 0)).unwrap();
        let err = rejection(clock_in(&db, &member(), TARGET, "night_shift", at(9, 1)));
        assert_eq!(err.kind(), RejectionKind::Conflict);
    }

    #[test]
    fn admin_clock_out() {
        let db = database();
        clock_in(&db, &member(), TARGET, "night_shift", at(9, 0)).unwrap();
        let reply = clock_out(&db, &member(), TARGET, "night_shift", at(9, 45)).unwrap();
        assert_eq!(
            reply.content(),
            Some(
                "Clocked <@77> out of the mask **night_shift**. Their duration for this session was **45 minutes**."
            )
        );

        let err = rejection(clock_out(&db, &member(), TARGET, "night_shift", at(10, 0)));
        assert_eq!(err.kind(), RejectionKind::NotFound);
    }

    #[test]
    fn add_positive_duration() {
        let db = database();
        clock_in(&db, &member(), TARGET, "night_shift", at(9, 0)).unwrap();
        let reply = add_duration(&db, &member(), TARGET, "night_shift", "1h30m", at(12, 0)).unwrap();
        assert_eq!(
            reply.content(),
            Some("Added **1 hour, 30 minutes** to <@77> under the mask `night_shift`.")
        );

        let sessions = db.list_user_sessions(GUILD, TARGET).unwrap();
        assert_eq!(sessions.len(), 1);
        assert!(sessions[0].is_administrative());
        assert_eq!(sessions[0].duration(at(23, 0)), Duration::minutes(90));
    }

    #[test]
    fn add_negative_duration() {
        let db = database();
        clock_in(&db, &member(), TARGET, "night_shift", at(9, 0)).unwrap();
        let reply = add_duration(&db, &member(), TARGET, "night_shift", "-30m", at(12, 0)).unwrap();
        assert_eq!(
            reply.content(),
            Some("Removed **30 minutes** from <@77> under the mask `night_shift`.")
        );
        let sessions = db.list_user_sessions(GUILD, TARGET).unwrap();
        assert_eq!(sessions[0].duration(at(23, 0)), Duration::minutes(-30));
    }

    #[test]
    fn add_duration_replaces_the_open_session() {
        let db = database();
        clock_in(&db, &member(), TARGET, "night_shift", at(9, 0)).unwrap();
        let open_id = db
            .find_open_session(GUILD, TARGET, "night_shift")
            .unwrap()
            .unwrap()
            .id;
        add_duration(&db, &member(), TARGET, "night_shift", "10m", at(9, 30)).unwrap();

        assert!(
            db.find_open_session(GUILD, TARGET, "night_shift")
                .unwrap()
                .is_none()
        );
        let sessions = db.list_user_sessions(GUILD, TARGET).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, open_id);
        assert!(sessions[0].is_administrative());

        // The mask is free to clock in again
        assert!(clock_in(&db, &member(), TARGET, "night_shift", at(10, 0)).is_ok());
    }

    #[test]
    fn add_duration_without_open_session_is_not_found() {
        let db = database();
        let err = rejection(add_duration(
            &db,
            &member(),
            TARGET,
            "night_shift",
            "-30m",
            at(12, 0),
        ));
        assert_eq!(
            err,
            Rejection::NotClockedIn {
                mask: "night_shift".to_string()
            }
        );
        assert!(db.list_user_sessions(GUILD, TARGET).unwrap().is_empty());
    }

    #[test]
    fn add_duration_rejects_garbage() {
        let db = database();
        clock_in(&db, &member(), TARGET, "night_shift", at(9, 0)).unwrap();
        let err = rejection(add_duration(
            &db,
            &member(),
            TARGET,
            "night_shift",
            "a while",
            at(12, 0),
        ));
        assert_eq!(err.kind(), RejectionKind::Validation);
        assert!(
            db.find_open_session(GUILD, TARGET, "night_shift")
                .unwrap()
                .is_some()
        );
    }

    #[test]
    fn add_duration_unknown_mask() {
        let db = database();
        let err = rejection(add_duration(&db, &member(), TARGET, "ghost", "1h", at(12, 0)));
        assert_eq!(
            err,
            Rejection::MaskNotFound {
                mask: "ghost".to_string()
            }
        );
    }
}
