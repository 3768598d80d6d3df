//! Clock sessions: attendance intervals and administrative adjustments.

use std::fmt;

use chrono::{DateTime, Datelike, Duration, Utc};
use thiserror::Error;
use uuid::Uuid;

/// Start date (year, month, day) that older records used to mark a row as an
/// administrative adjustment rather than a real attendance session.
pub const SENTINEL_DATE: (i32, u32, u32) = (2000, 1, 1);

fn is_sentinel(at: DateTime<Utc>) -> bool {
    (at.year(), at.month(), at.day()) == SENTINEL_DATE
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("session {0} is already closed")]
    AlreadyClosed(Uuid),
}

/// What a session records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    /// A real clock-in, open until `clocked_out_at` is set.
    Attendance {
        clocked_in_at: DateTime<Utc>,
        clocked_out_at: Option<DateTime<Utc>>,
    },
    /// A manual correction of a user's total. `amount` may be negative.
    Adjustment {
        recorded_at: DateTime<Utc>,
        amount: Duration,
    },
}

impl SessionKind {
    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Attendance { .. } => "attendance",
            Self::Adjustment { .. } => "adjustment",
        }
    }
}

/// One clock session for a user under a mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockSession {
    pub id: Uuid,
    pub guild_id: i64,
    pub user_id: i64,
    pub mask: String,
    pub kind: SessionKind,
}

impl ClockSession {
    /// Creates a new open session. Nothing is persisted.
    pub fn clock_in(
        guild_id: i64,
        user_id: i64,
        mask: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            guild_id,
            user_id,
            mask: mask.into(),
            kind: SessionKind::Attendance {
                clocked_in_at: at,
                clocked_out_at: None,
            },
        }
    }

    /// Creates an administrative adjustment of `amount`.
    pub fn adjustment(
        guild_id: i64,
        user_id: i64,
        mask: impl Into<String>,
        amount: Duration,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            guild_id,
            user_id,
            mask: mask.into(),
            kind: SessionKind::Adjustment {
                recorded_at,
                amount,
            },
        }
    }

    /// Builds a session from a row that may use the sentinel start date.
    ///
    /// A closed row starting on [`SENTINEL_DATE`] becomes an adjustment whose
    /// amount is the stored interval, recorded at `clock_out`. An open row on
    /// the sentinel date has no amount yet and stays an open attendance.
    pub fn from_legacy(
        id: Uuid,
        guild_id: i64,
        user_id: i64,
        mask: impl Into<String>,
        clock_in: DateTime<Utc>,
        clock_out: Option<DateTime<Utc>>,
    ) -> Self {
        let kind = match clock_out {
            Some(out) if is_sentinel(clock_in) => SessionKind::Adjustment {
                recorded_at: out,
                amount: out - clock_in,
            },
            _ => SessionKind::Attendance {
                clocked_in_at: clock_in,
                clocked_out_at: clock_out,
            },
        };
        Self {
            id,
            guild_id,
            user_id,
            mask: mask.into(),
            kind,
        }
    }

    /// Sets the end time of an open session.
    pub fn close(&mut self, at: DateTime<Utc>) -> Result<(), SessionError> {
        match &mut self.kind {
            SessionKind::Attendance { clocked_out_at, .. } if clocked_out_at.is_none() => {
                *clocked_out_at = Some(at);
                Ok(())
            }
            _ => Err(SessionError::AlreadyClosed(self.id)),
        }
    }

    /// Turns an open session into an adjustment of `amount`, keeping its id.
    pub fn adjust(&mut self, amount: Duration, at: DateTime<Utc>) -> Result<(), SessionError> {
        if !self.is_open() {
            return Err(SessionError::AlreadyClosed(self.id));
        }
        self.kind = SessionKind::Adjustment {
            recorded_at: at,
            amount,
        };
        Ok(())
    }

    /// Length of the session as of `now`.
    ///
    /// Open sessions grow with `now`; adjustments return their amount.
    pub fn duration(&self, now: DateTime<Utc>) -> Duration {
        match self.kind {
            SessionKind::Attendance {
                clocked_in_at,
                clocked_out_at: Some(out),
            } => out - clocked_in_at,
            SessionKind::Attendance { clocked_in_at, .. } => now - clocked_in_at,
            SessionKind::Adjustment { amount, .. } => amount,
        }
    }

    pub const fn is_administrative(&self) -> bool {
        matches!(self.kind, SessionKind::Adjustment { .. })
    }

    pub const fn is_open(&self) -> bool {
        matches!(
            self.kind,
            SessionKind::Attendance {
                clocked_out_at: None,
                ..
            }
        )
    }

    /// Clock-in time, or the time an adjustment was recorded.
    pub const fn started_at(&self) -> DateTime<Utc> {
        match self.kind {
            SessionKind::Attendance { clocked_in_at, .. } => clocked_in_at,
            SessionKind::Adjustment { recorded_at, .. } => recorded_at,
        }
    }

    /// Clock-out time. Adjustments end when they are recorded.
    pub const fn ended_at(&self) -> Option<DateTime<Utc>> {
        match self.kind {
            SessionKind::Attendance { clocked_out_at, .. } => clocked_out_at,
            SessionKind::Adjustment { recorded_at, .. } => Some(recorded_at),
        }
    }
}

impl fmt::Display for ClockSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} for user {} in guild {})",
            self.id,
            self.mask,
            self.user_id,
            self.guild_id
        )
    }
}
