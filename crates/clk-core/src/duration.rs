//! Human-readable duration formatting and compact duration parsing.

use std::sync::LazyLock;

use chrono::Duration;
use regex::Regex;

use crate::Rejection;

/// Pre-compiled pattern for `[-]NdNhNmNs` expressions.
static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(-)?\s*(?:(\d+)\s*d)?\s*(?:(\d+)\s*h)?\s*(?:(\d+)\s*m)?\s*(?:(\d+)\s*s)?$",
    )
    .unwrap()
});

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: u64 = 24 * SECONDS_PER_HOUR;

/// Upper bound on a parsed duration (~100 years).
const MAX_PARSED_SECONDS: i64 = 100 * 365 * 86_400;

/// Formats a duration as "X days, Y hours, Z minutes, W seconds".
///
/// Zero components are skipped and sub-second remainders are dropped, so a
/// zero duration formats as an empty string. Negative durations are prefixed
/// with "negative" and list the magnitude of each component.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.num_seconds().unsigned_abs();
    let components = [
        (total / SECONDS_PER_DAY, "day"),
        ((total % SECONDS_PER_DAY) / SECONDS_PER_HOUR, "hour"),
        ((total % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE, "minute"),
        (total % SECONDS_PER_MINUTE, "second"),
    ];

    let formatted = components
        .iter()
        .filter(|(value, _)| *value != 0)
        .map(|(value, unit)| {
            let plural = if *value == 1 { "" } else { "s" };
            format!("{value} {unit}{plural}")
        })
        .collect::<Vec<_>>()
        .join(", ");

    if duration < Duration::zero() && !formatted.is_empty() {
        format!("negative {formatted}")
    } else {
        formatted
    }
}

/// Parses `[-]NdNhNmNs`, returning zero for anything that doesn't match.
///
/// Every unit group is optional and a leading `-` negates the whole value.
/// Use [`parse_duration_strict`] to reject unmatched input instead.
pub fn parse_duration(input: &str) -> Duration {
    parse_components(input).unwrap_or_else(Duration::zero)
}

/// Parses `[-]NdNhNmNs`, rejecting input that names no unit at all.
pub fn parse_duration_strict(input: &str) -> Result<Duration, Rejection> {
    parse_components(input).ok_or_else(|| Rejection::InvalidDuration {
        input: input.to_string(),
    })
}

fn parse_components(input: &str) -> Option<Duration> {
    let caps = DURATION_RE.captures(input.trim())?;

    let units = [
        (caps.get(2), 86_400),
        (caps.get(3), 3_600),
        (caps.get(4), 60),
        (caps.get(5), 1),
    ];
    if units.iter().all(|(group, _)| group.is_none()) {
        return None;
    }

    let mut seconds: i64 = 0;
    for (group, multiplier) in units {
        let Some(group) = group else { continue };
        let value: i64 = group.as_str().parse().ok()?;
        seconds = value
            .checked_mul(multiplier)
            .and_then(|v| seconds.checked_add(v))?;
    }
    if seconds > MAX_PARSED_SECONDS {
        return None;
    }

    let duration = Duration::seconds(seconds);
    Some(if caps.get(1).is_some() { -duration } else { duration })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dhms(d: i64, h: i64, m: i64, s: i64) -> Duration {
        Duration::days(d) + Duration::hours(h) + Duration::minutes(m) + Duration::seconds(s)
    }

    #[test]
    fn test_format_duration_zero_is_empty() {
        assert_eq!(format_duration(Duration::zero()), "");
    }

    #[test]
    fn test_format_duration_singular_and_plural() {
        assert_eq!(format_duration(dhms(1, 0, 0, 0)), "1 day");
        assert_eq!(format_duration(dhms(2, 1, 0, 0)), "2 days, 1 hour");
        assert_eq!(
            format_duration(dhms(1, 2, 3, 4)),
            "1 day, 2 hours, 3 minutes, 4 seconds"
        );
        assert_eq!(format_duration(dhms(0, 0, 1, 1)), "1 minute, 1 second");
    }

    #[test]
    fn test_format_duration_skips_zero_components() {
        assert_eq!(format_duration(dhms(0, 1, 0, 1)), "1 hour, 1 second");
        assert_eq!(format_duration(dhms(3, 0, 0, 59)), "3 days, 59 seconds");
        assert_eq!(format_duration(dhms(0, 0, 45, 0)), "45 minutes");
    }

    #[test]
    fn test_format_duration_never_leaves_trailing_separator() {
        for (d, h, m, s) in [(0, 0, 0, 1), (0, 0, 2, 0), (0, 5, 0, 0), (7, 0, 0, 0)] {
            let formatted = format_duration(dhms(d, h, m, s));
            assert!(!formatted.ends_with(", "), "{formatted}");
            assert!(!formatted.starts_with(", "), "{formatted}");
        }
    }

    #[test]
    fn test_format_duration_truncates_subseconds() {
        assert_eq!(format_duration(Duration::milliseconds(1_500)), "1 second");
        assert_eq!(format_duration(Duration::milliseconds(999)), "");
    }

    #[test]
    fn test_format_duration_negative() {
        assert_eq!(
            format_duration(-dhms(0, 1, 30, 0)),
            "negative 1 hour, 30 minutes"
        );
        assert_eq!(format_duration(-dhms(2, 0, 0, 1)), "negative 2 days, 1 second");
        assert_eq!(format_duration(Duration::milliseconds(-400)), "");
    }

    #[test]
    fn test_parse_duration_full() {
        assert_eq!(parse_duration("1d2h3m4s"), dhms(1, 2, 3, 4));
    }

    #[test]
    fn test_parse_duration_negative() {
        assert_eq!(parse_duration("-30m"), Duration::minutes(-30));
        assert_eq!(parse_duration("-1h30m"), -dhms(0, 1, 30, 0));
    }

    #[test]
    fn test_parse_duration_partial_groups() {
        assert_eq!(parse_duration("2h"), Duration::hours(2));
        assert_eq!(parse_duration("1d4s"), dhms(1, 0, 0, 4));
        assert_eq!(parse_duration("90m"), Duration::minutes(90));
    }

    #[test]
    fn test_parse_duration_is_lenient_about_case_and_spacing() {
        assert_eq!(parse_duration(" 1H 30M "), dhms(0, 1, 30, 0));
        assert_eq!(parse_duration("- 5s"), Duration::seconds(-5));
    }

    #[test]
    fn test_parse_duration_unmatched_is_zero() {
        assert_eq!(parse_duration(""), Duration::zero());
        assert_eq!(parse_duration("soon"), Duration::zero());
        assert_eq!(parse_duration("-"), Duration::zero());
        assert_eq!(parse_duration("3h2d"), Duration::zero());
    }

    #[test]
    fn test_parse_duration_strict_rejects_unmatched() {
        for input in ["", "soon", "-", "1x", "3h2d"] {
            let err = parse_duration_strict(input).unwrap_err();
            assert_eq!(
                err,
                Rejection::InvalidDuration {
                    input: input.to_string()
                }
            );
        }
        assert_eq!(parse_duration_strict("-30m").unwrap(), Duration::minutes(-30));
    }

    #[test]
    fn test_parse_duration_rejects_huge_values() {
        assert_eq!(parse_duration("99999999999999999999d"), Duration::zero());
        assert!(parse_duration_strict("1000000d").is_err());
        assert_eq!(parse_duration("36500d"), Duration::days(36_500));
    }

    #[test]
    fn test_parse_then_format() {
        assert_eq!(
            format_duration(parse_duration("-1d2h3m4s")),
            "negative 1 day, 2 hours, 3 minutes, 4 seconds"
        );
    }
}
