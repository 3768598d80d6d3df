//! Storage layer for the guild time clock.
//!
//! Provides persistence for clock sessions and mask bindings using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! Handlers receive the database by reference for the duration of one command;
//! nothing holds it globally.
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Timestamps are stored as TEXT in RFC 3339 format with microseconds
//! (e.g., `2025-03-14T09:00:00.000000Z`), so lexicographic ordering matches
//! chronological ordering.
//!
//! ## Session Kinds
//!
//! The `kind` column distinguishes attendance from administrative adjustments.
//! Adjustments store their record time in both `clock_in` and `clock_out` and
//! their signed amount in `adjustment_us`. Attendance rows whose `clock_in`
//! falls on the legacy sentinel date are read back as adjustments.
//!
//! ## Open Sessions
//!
//! A partial unique index allows at most one open attendance row per
//! (guild, user, mask). [`Database::start_session`] reports a lost race
//! instead of inserting a second open row.

use std::path::Path;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use thiserror::Error;
use uuid::Uuid;

use clk_core::{ClockSession, MaskBinding, SessionKind};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Failed to parse a session timestamp.
    #[error("invalid timestamp for session {session_id}: {timestamp}")]
    TimestampParse {
        session_id: String,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored session id is not a UUID.
    #[error("invalid session id: {value}")]
    InvalidSessionId {
        value: String,
        #[source]
        source: uuid::Error,
    },
    /// A row that cannot be turned into a session.
    #[error("invalid session data for {session_id}: {message}")]
    InvalidSessionData { session_id: String, message: String },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// Raw `clock_ins` row before validation.
struct SessionRow {
    id: String,
    guild_id: i64,
    user_id: i64,
    mask: String,
    kind: String,
    clock_in: String,
    clock_out: Option<String>,
    adjustment_us: Option<i64>,
}

const SESSION_COLUMNS: &str =
    "id, guild_id, user_id, mask, kind, clock_in, clock_out, adjustment_us";

impl SessionRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            guild_id: row.get(1)?,
            user_id: row.get(2)?,
            mask: row.get(3)?,
            kind: row.get(4)?,
            clock_in: row.get(5)?,
            clock_out: row.get(6)?,
            adjustment_us: row.get(7)?,
        })
    }

    fn into_session(self) -> Result<ClockSession, DbError> {
        let id = Uuid::parse_str(&self.id).map_err(|source| DbError::InvalidSessionId {
            value: self.id.clone(),
            source,
        })?;
        let clock_in = parse_timestamp(&self.clock_in, &self.id)?;
        let clock_out = self
            .clock_out
            .as_deref()
            .map(|ts| parse_timestamp(ts, &self.id))
            .transpose()?;

        match self.kind.as_str() {
            "attendance" => Ok(ClockSession::from_legacy(
                id,
                self.guild_id,
                self.user_id,
                self.mask,
                clock_in,
                clock_out,
            )),
            "adjustment" => {
                let micros = self
                    .adjustment_us
                    .ok_or_else(|| DbError::InvalidSessionData {
                        session_id: self.id.clone(),
                        message: "adjustment without an amount".to_string(),
                    })?;
                Ok(ClockSession {
                    id,
                    guild_id: self.guild_id,
                    user_id: self.user_id,
                    mask: self.mask,
                    kind: SessionKind::Adjustment {
                        recorded_at: clock_in,
                        amount: Duration::microseconds(micros),
                    },
                })
            }
            other => Err(DbError::InvalidSessionData {
                session_id: self.id.clone(),
                message: format!("unknown session kind: {other}"),
            }),
        }
    }
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- clock_in/clock_out: RFC 3339 UTC with microseconds
            -- kind: 'attendance' or 'adjustment'
            CREATE TABLE IF NOT EXISTS clock_ins (
                id TEXT PRIMARY KEY,
                guild_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                mask TEXT NOT NULL,
                kind TEXT NOT NULL DEFAULT 'attendance',
                clock_in TEXT NOT NULL,
                clock_out TEXT,
                adjustment_us INTEGER
            );

            CREATE INDEX IF NOT EXISTS idx_clock_ins_member ON clock_ins(guild_id, user_id);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_clock_ins_one_open
                ON clock_ins(guild_id, user_id, mask)
                WHERE kind = 'attendance' AND clock_out IS NULL;

            CREATE TABLE IF NOT EXISTS clock_masks (
                guild_id INTEGER NOT NULL,
                role_id INTEGER NOT NULL,
                mask TEXT NOT NULL,
                UNIQUE (guild_id, mask)
            );

            CREATE INDEX IF NOT EXISTS idx_clock_masks_role ON clock_masks(guild_id, role_id);
            ",
        )?;
        Ok(())
    }

    /// Inserts a new open session unless one is already open for the same
    /// guild, user and mask.
    ///
    /// Returns `false` when the insert was refused.
    pub fn start_session(&self, session: &ClockSession) -> Result<bool, DbError> {
        let (clock_in, clock_out, adjustment_us) = session_columns(session)?;
        let inserted = self.conn.execute(
            "
            INSERT INTO clock_ins
            (id, guild_id, user_id, mask, kind, clock_in, clock_out, adjustment_us)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT DO NOTHING
            ",
            params![
                session.id.to_string(),
                session.guild_id,
                session.user_id,
                session.mask,
                session.kind.as_str(),
                clock_in,
                clock_out,
                adjustment_us,
            ],
        )?;
        if inserted == 0 {
            tracing::debug!(session = %session, "open session already exists");
        }
        Ok(inserted == 1)
    }

    /// Inserts or replaces a session by id.
    pub fn save_session(&self, session: &ClockSession) -> Result<(), DbError> {
        let (clock_in, clock_out, adjustment_us) = session_columns(session)?;
        self.conn.execute(
            "
            INSERT INTO clock_ins
            (id, guild_id, user_id, mask, kind, clock_in, clock_out, adjustment_us)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                guild_id = excluded.guild_id,
                user_id = excluded.user_id,
                mask = excluded.mask,
                kind = excluded.kind,
                clock_in = excluded.clock_in,
                clock_out = excluded.clock_out,
                adjustment_us = excluded.adjustment_us
            ",
            params![
                session.id.to_string(),
                session.guild_id,
                session.user_id,
                session.mask,
                session.kind.as_str(),
                clock_in,
                clock_out,
                adjustment_us,
            ],
        )?;
        Ok(())
    }

    /// Finds the latest open session for a member under a mask.
    pub fn find_open_session(
        &self,
        guild_id: i64,
        user_id: i64,
        mask: &str,
    ) -> Result<Option<ClockSession>, DbError> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "
                    SELECT {SESSION_COLUMNS}
                    FROM clock_ins
                    WHERE guild_id = ? AND user_id = ? AND mask = ?
                      AND kind = 'attendance' AND clock_out IS NULL
                    ORDER BY clock_in DESC
                    LIMIT 1
                    "
                ),
                params![guild_id, user_id, mask],
                SessionRow::from_row,
            )
            .optional()?;
        row.map(SessionRow::into_session).transpose()
    }

    /// Lists a member's open sessions, newest first.
    pub fn list_open_sessions(
        &self,
        guild_id: i64,
        user_id: i64,
    ) -> Result<Vec<ClockSession>, DbError> {
        self.query_sessions(
            "WHERE guild_id = ? AND user_id = ? AND kind = 'attendance' AND clock_out IS NULL",
            &[guild_id, user_id],
        )
    }

    /// Lists every session of a member, newest first.
    pub fn list_user_sessions(
        &self,
        guild_id: i64,
        user_id: i64,
    ) -> Result<Vec<ClockSession>, DbError> {
        self.query_sessions("WHERE guild_id = ? AND user_id = ?", &[guild_id, user_id])
    }

    /// Lists every session in a guild, newest first.
    pub fn list_guild_sessions(&self, guild_id: i64) -> Result<Vec<ClockSession>, DbError> {
        self.query_sessions("WHERE guild_id = ?", &[guild_id])
    }

    fn query_sessions(&self, filter: &str, args: &[i64]) -> Result<Vec<ClockSession>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "
            SELECT {SESSION_COLUMNS}
            FROM clock_ins
            {filter}
            ORDER BY clock_in DESC, id ASC
            "
        ))?;
        let rows = stmt.query_map(params_from_iter(args.iter()), SessionRow::from_row)?;
        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row?.into_session()?);
        }
        Ok(sessions)
    }

    /// Deletes every closed session and adjustment in a guild.
    ///
    /// Open sessions are kept. Returns the number of rows removed.
    pub fn delete_closed_sessions(&self, guild_id: i64) -> Result<usize, DbError> {
        let deleted = self.conn.execute(
            "DELETE FROM clock_ins WHERE guild_id = ? AND clock_out IS NOT NULL",
            params![guild_id],
        )?;
        tracing::info!(guild_id, deleted, "cleared closed sessions");
        Ok(deleted)
    }

    /// Binds a mask to a role.
    ///
    /// Returns `false` if the guild already has a mask with that name.
    pub fn insert_mask(&self, binding: &MaskBinding) -> Result<bool, DbError> {
        let inserted = self.conn.execute(
            "
            INSERT INTO clock_masks (guild_id, role_id, mask)
            VALUES (?, ?, ?)
            ON CONFLICT (guild_id, mask) DO NOTHING
            ",
            params![binding.guild_id, binding.role_id, binding.mask],
        )?;
        Ok(inserted == 1)
    }

    /// Removes a mask, returning the role it was bound to.
    pub fn delete_mask(&self, guild_id: i64, mask: &str) -> Result<Option<i64>, DbError> {
        let role_id = self
            .conn
            .query_row(
                "DELETE FROM clock_masks WHERE guild_id = ? AND mask = ? RETURNING role_id",
                params![guild_id, mask],
                |row| row.get(0),
            )
            .optional()?;
        Ok(role_id)
    }

    /// Whether the guild has a mask with this name.
    pub fn mask_exists(&self, guild_id: i64, mask: &str) -> Result<bool, DbError> {
        let exists = self.conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM clock_masks WHERE guild_id = ? AND mask = ?)",
            params![guild_id, mask],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Lists a guild's mask bindings ordered by role then mask name.
    pub fn list_masks(&self, guild_id: i64) -> Result<Vec<MaskBinding>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT guild_id, role_id, mask
            FROM clock_masks
            WHERE guild_id = ?
            ORDER BY role_id ASC, mask ASC
            ",
        )?;
        let rows = stmt.query_map(params![guild_id], |row| {
            Ok(MaskBinding {
                guild_id: row.get(0)?,
                role_id: row.get(1)?,
                mask: row.get(2)?,
            })
        })?;
        let mut masks = Vec::new();
        for row in rows {
            masks.push(row?);
        }
        Ok(masks)
    }

    /// Mask names granted to any of the given roles, sorted and deduplicated.
    pub fn masks_for_roles(&self, guild_id: i64, role_ids: &[i64]) -> Result<Vec<String>, DbError> {
        if role_ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; role_ids.len()].join(", ");
        let mut stmt = self.conn.prepare(&format!(
            "
            SELECT DISTINCT mask
            FROM clock_masks
            WHERE guild_id = ? AND role_id IN ({placeholders})
            ORDER BY mask ASC
            "
        ))?;
        let args = std::iter::once(&guild_id).chain(role_ids.iter());
        let rows = stmt.query_map(params_from_iter(args), |row| row.get::<_, String>(0))?;
        let mut masks = Vec::new();
        for row in rows {
            masks.push(row?);
        }
        Ok(masks)
    }
}

/// Storage columns for a session: `clock_in`, `clock_out`, `adjustment_us`.
fn session_columns(
    session: &ClockSession,
) -> Result<(String, Option<String>, Option<i64>), DbError> {
    match session.kind {
        SessionKind::Attendance {
            clocked_in_at,
            clocked_out_at,
        } => Ok((
            format_timestamp(clocked_in_at),
            clocked_out_at.map(format_timestamp),
            None,
        )),
        SessionKind::Adjustment {
            recorded_at,
            amount,
        } => {
            let micros = amount
                .num_microseconds()
                .ok_or_else(|| DbError::InvalidSessionData {
                    session_id: session.id.to_string(),
                    message: "adjustment amount out of range".to_string(),
                })?;
            let recorded = format_timestamp(recorded_at);
            Ok((recorded.clone(), Some(recorded), Some(micros)))
        }
    }
}

fn parse_timestamp(timestamp: &str, session_id: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            session_id: session_id.to_string(),
            timestamp: timestamp.to_string(),
            source,
        })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}
