//! Information commands: per-member breakdowns, CSV export and cleanup.

use chrono::{DateTime, Duration, Utc};

use clk_core::reply::{timestamp_markup, user_mention};
use clk_core::{
    Caller, ClockSession, Embed, Reply, SessionKind, aggregate_daily, summarize_by_mask, write_csv,
};
use clk_db::Database;

use super::{CommandResult, describe};

/// Longest value the chat platform accepts in an embed field.
const FIELD_VALUE_LIMIT: usize = 1024;

fn session_line(session: &ClockSession, now: DateTime<Utc>) -> String {
    match session.kind {
        SessionKind::Attendance {
            clocked_in_at,
            clocked_out_at: None,
        } => format!(
            "\u{2022} {} - **Currently clocked in**",
            timestamp_markup(clocked_in_at)
        ),
        SessionKind::Attendance {
            clocked_in_at,
            clocked_out_at: Some(out),
        } => format!(
            "\u{2022} {} - {} (**{}**)",
            timestamp_markup(clocked_in_at),
            timestamp_markup(out),
            describe(session.duration(now))
        ),
        SessionKind::Adjustment {
            recorded_at,
            amount,
        } => {
            let label = if amount < Duration::zero() {
                "Removed"
            } else {
                "Added"
            };
            format!(
                "\u{2022} {} - **{label} {}**",
                timestamp_markup(recorded_at),
                describe(amount.abs())
            )
        }
    }
}

/// Joins lines up to the field limit, noting how many were left out.
fn join_lines(lines: &[String]) -> String {
    let mut value = String::new();
    for (i, line) in lines.iter().enumerate() {
        let remaining = lines.len() - i;
        let footer = format!("\n\u{2026} and {remaining} more");
        let needed = value.len() + usize::from(!value.is_empty()) + line.len();
        let room_for_footer = remaining > 1 && needed + footer.len() > FIELD_VALUE_LIMIT;
        if needed > FIELD_VALUE_LIMIT || room_for_footer {
            if value.is_empty() {
                return footer.trim_start().to_string();
            }
            value.push_str(&footer);
            return value;
        }
        if !value.is_empty() {
            value.push('\n');
        }
        value.push_str(line);
    }
    value
}

/// Shows every session of `target` (or the caller), one embed per mask.
pub fn show(
    db: &Database,
    caller: &Caller,
    target: Option<i64>,
    now: DateTime<Utc>,
) -> CommandResult {
    let user_id = target.unwrap_or(caller.user_id);
    let sessions = db.list_user_sessions(caller.guild_id, user_id)?;
    tracing::debug!(user_id, sessions = sessions.len(), "showing clock ins");
    if sessions.is_empty() {
        return Ok(Reply::text("No clock ins found."));
    }

    let embeds = summarize_by_mask(&sessions, now)
        .into_iter()
        .map(|summary| {
            let lines: Vec<String> = summary
                .sessions
                .iter()
                .map(|session| session_line(session, now))
                .collect();
            Embed::new()
                .title(summary.mask.as_str())
                .description(format!(
                    "This user has a total clock in time of **{}**.",
                    describe(summary.total)
                ))
                .field("Clock Ins", join_lines(&lines))
        })
        .collect();

    Ok(Reply::Embeds { embeds })
}

/// Lists the masks `target` (or the caller) is clocked in with right now.
pub fn current(
    db: &Database,
    caller: &Caller,
    target: Option<i64>,
    now: DateTime<Utc>,
) -> CommandResult {
    let user_id = target.unwrap_or(caller.user_id);
    let open = db.list_open_sessions(caller.guild_id, user_id)?;
    if open.is_empty() {
        return Ok(Reply::ephemeral(format!(
            "{} isn't clocked in with any masks.",
            user_mention(user_id)
        )));
    }

    let lines: Vec<String> = open
        .iter()
        .map(|session| {
            format!(
                "\u{2022} `{}` since {} (**{}**)",
                session.mask,
                timestamp_markup(session.started_at()),
                describe(session.duration(now))
            )
        })
        .collect();
    Ok(Reply::Embeds {
        embeds: vec![
            Embed::new()
                .title("Currently clocked in")
                .description(join_lines(&lines)),
        ],
    })
}

/// Exports daily totals for the whole guild as a CSV attachment.
pub fn export(db: &Database, caller: &Caller, filename: &str, now: DateTime<Utc>) -> CommandResult {
    let sessions = db.list_guild_sessions(caller.guild_id)?;
    let rows = aggregate_daily(&sessions, now);

    let mut bytes = Vec::new();
    write_csv(&rows, &mut bytes)?;
    tracing::info!(
        guild_id = caller.guild_id,
        rows = rows.len(),
        "exported clock ins"
    );

    Ok(Reply::File {
        filename: filename.to_string(),
        bytes,
    })
}

/// Deletes every closed session and adjustment in the guild.
pub fn clear(db: &Database, caller: &Caller) -> CommandResult {
    let deleted = db.delete_closed_sessions(caller.guild_id)?;
    let noun = if deleted == 1 { "clock in" } else { "clock ins" };
    Ok(Reply::text(format!(
        "Cleared {deleted} closed {noun} from the database."
    )))
}
