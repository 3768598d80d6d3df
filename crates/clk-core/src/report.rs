//! Aggregation of sessions for the info display and the CSV export.

use std::collections::BTreeMap;
use std::io::Write;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use crate::ClockSession;

/// Header row of the CSV export.
pub const CSV_HEADER: [&str; 5] = ["Year", "Month", "Day", "User ID", "Duration"];

/// Total tracked time for one user on one calendar day (UTC).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub user_id: i64,
    /// Summed duration in seconds. Negative when adjustments outweigh
    /// attendance.
    pub seconds: f64,
}

/// Sums session durations per user and per day of `started_at`.
///
/// Adjustments count towards the day they were recorded. Rows come out
/// ordered by user id, then by date.
pub fn aggregate_daily(sessions: &[ClockSession], now: DateTime<Utc>) -> Vec<DailyTotal> {
    let mut buckets: BTreeMap<(i64, NaiveDate), Duration> = BTreeMap::new();
    for session in sessions {
        let key = (session.user_id, session.started_at().date_naive());
        *buckets.entry(key).or_insert_with(Duration::zero) += session.duration(now);
    }

    tracing::debug!(
        sessions = sessions.len(),
        buckets = buckets.len(),
        "aggregated daily totals"
    );

    buckets
        .into_iter()
        .map(|((user_id, date), total)| DailyTotal {
            date,
            user_id,
            seconds: total_seconds(total),
        })
        .collect()
}

/// Converts a duration to fractional seconds with microsecond precision.
#[expect(
    clippy::cast_precision_loss,
    reason = "second totals stay far below 2^52 microseconds"
)]
fn total_seconds(duration: Duration) -> f64 {
    match duration.num_microseconds() {
        Some(micros) => micros as f64 / 1_000_000.0,
        None => duration.num_milliseconds() as f64 / 1_000.0,
    }
}

/// Formats seconds the way spreadsheet users expect: always with a decimal
/// point (`5400.0`, `-30.5`).
fn format_seconds(seconds: f64) -> String {
    format!("{seconds:?}")
}

/// Writes the daily totals as CSV.
///
/// The user id carries a trailing tab so spreadsheets keep it as text rather
/// than rounding the snowflake.
pub fn write_csv<W: Write>(rows: &[DailyTotal], writer: W) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(CSV_HEADER)?;
    for row in rows {
        wtr.write_record([
            row.date.year().to_string(),
            row.date.month().to_string(),
            row.date.day().to_string(),
            format!("{}\t", row.user_id),
            format_seconds(row.seconds),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// All sessions of one mask, for the info display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskSummary {
    /// Display name: first letter uppercased, the rest lowercased.
    pub mask: String,
    pub total: Duration,
    /// Newest first.
    pub sessions: Vec<ClockSession>,
}

/// Uppercases the first character and lowercases the rest.
fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
    })
}

/// Groups sessions by capitalized mask name, totalling each group as of `now`.
///
/// Masks differing only in case share a group. Groups are returned in name
/// order.
pub fn summarize_by_mask(sessions: &[ClockSession], now: DateTime<Utc>) -> Vec<MaskSummary> {
    let mut groups: BTreeMap<String, Vec<ClockSession>> = BTreeMap::new();
    for session in sessions {
        groups
            .entry(capitalize(&session.mask))
            .or_default()
            .push(session.clone());
    }

    groups
        .into_iter()
        .map(|(mask, mut sessions)| {
            sessions.sort_by_key(|s| std::cmp::Reverse(s.started_at()));
            let total = sessions
                .iter()
                .fold(Duration::zero(), |acc, s| acc + s.duration(now));
            MaskSummary {
                mask,
                total,
                sessions,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;

    fn at(day: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, h, m, 0).unwrap()
    }

    fn closed(user_id: i64, mask: &str, start: DateTime<Utc>, secs: i64) -> ClockSession {
        let mut session = ClockSession::clock_in(1, user_id, mask, start);
        session.close(start + Duration::seconds(secs)).unwrap();
        session
    }

    fn csv_string(rows: &[DailyTotal]) -> String {
        let mut out = Vec::new();
        write_csv(rows, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_same_user_same_day_is_one_row() {
        let sessions = vec![
            closed(42, "night_shift", at(14, 9, 0), 3600),
            closed(42, "day_shift", at(14, 13, 0), 1800),
        ];
        let rows = aggregate_daily(&sessions, at(20, 0, 0));
        assert_eq!(rows.len(), 1);
        assert!((rows[0].seconds - 5400.0).abs() < f64::EPSILON);

        assert_eq!(
            csv_string(&rows),
            "Year,Month,Day,User ID,Duration\n2025,3,14,42\t,5400.0\n"
        );
    }

    #[test]
    fn test_buckets_split_by_user_and_day() {
        let sessions = vec![
            closed(7, "x", at(15, 9, 0), 60),
            closed(42, "x", at(14, 9, 0), 120),
            closed(7, "x", at(14, 9, 0), 30),
            closed(42, "x", at(14, 22, 0), 15),
        ];
        let rows = aggregate_daily(&sessions, at(20, 0, 0));
        let keys: Vec<_> = rows.iter().map(|r| (r.user_id, r.date.day())).collect();
        assert_eq!(keys, vec![(7, 14), (7, 15), (42, 14)]);
        assert!((rows[2].seconds - 135.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_adjustments_are_summed_with_sign() {
        let sessions = vec![
            closed(42, "x", at(14, 9, 0), 3600),
            ClockSession::adjustment(1, 42, "x", Duration::minutes(-90), at(14, 18, 0)),
            ClockSession::adjustment(1, 42, "x", Duration::seconds(30), at(14, 19, 0)),
        ];
        let rows = aggregate_daily(&sessions, at(20, 0, 0));
        assert_eq!(rows.len(), 1);
        assert!((rows[0].seconds - -1770.0).abs() < f64::EPSILON);
        assert!(csv_string(&rows).ends_with(",-1770.0\n"));
    }

    #[test]
    fn test_open_sessions_count_until_now() {
        let sessions = vec![ClockSession::clock_in(1, 42, "x", at(14, 9, 0))];
        let rows = aggregate_daily(&sessions, at(14, 9, 45));
        assert!((rows[0].seconds - 2700.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fractional_seconds_are_kept() {
        let mut session = ClockSession::clock_in(1, 42, "x", at(14, 9, 0));
        session
            .close(at(14, 9, 0) + Duration::milliseconds(1_500))
            .unwrap();
        let rows = aggregate_daily(&[session], at(20, 0, 0));
        assert!(csv_string(&rows).ends_with(",1.5\n"));
    }

    #[test]
    fn test_empty_export_has_only_header() {
        let rows = aggregate_daily(&[], at(20, 0, 0));
        assert!(rows.is_empty());
        assert_eq!(csv_string(&rows), "Year,Month,Day,User ID,Duration\n");
    }

    #[test]
    fn test_summarize_by_mask_groups_and_totals() {
        let sessions = vec![
            closed(42, "night_shift", at(14, 9, 0), 600),
            closed(42, "day_shift", at(14, 10, 0), 60),
            closed(42, "night_shift", at(15, 9, 0), 300),
            ClockSession::adjustment(1, 42, "night_shift", Duration::seconds(-100), at(16, 0, 0)),
        ];
        let summaries = summarize_by_mask(&sessions, at(20, 0, 0));

        let masks: Vec<_> = summaries.iter().map(|s| s.mask.as_str()).collect();
        assert_eq!(masks, vec!["Day_shift", "Night_shift"]);

        let night = &summaries[1];
        assert_eq!(night.total, Duration::seconds(800));
        let starts: Vec<_> = night.sessions.iter().map(ClockSession::started_at).collect();
        assert_eq!(starts, vec![at(16, 0, 0), at(15, 9, 0), at(14, 9, 0)]);
    }

    #[test]
    fn test_capitalize_matches_title_case_of_first_letter() {
        assert_eq!(capitalize("night_shift"), "Night_shift");
        assert_eq!(capitalize("DAY"), "Day");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_summarize_by_mask_ignores_case() {
        let sessions = vec![
            closed(42, "Night", at(14, 9, 0), 600),
            closed(42, "night", at(15, 9, 0), 300),
            closed(42, "NIGHT", at(16, 9, 0), 60),
        ];
        let summaries = summarize_by_mask(&sessions, at(20, 0, 0));
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].mask, "Night");
        assert_eq!(summaries[0].total, Duration::seconds(960));
        assert_eq!(summaries[0].sessions.len(), 3);
    }
}
