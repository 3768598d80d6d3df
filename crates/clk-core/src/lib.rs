//! Core domain logic for the guild time clock.
//!
//! This crate contains the fundamental types and logic for:
//! - Sessions: clock-ins, clock-outs and administrative adjustments
//! - Durations: human-readable formatting and compact `1d2h3m4s` parsing
//! - Masks: name validation and role-based authorization
//! - Reports: per-user, per-day aggregation and CSV export
//! - Replies: the payloads handed back to the chat layer

pub mod duration;
pub mod mask;
mod rejection;
pub mod reply;
pub mod report;
pub mod session;

pub use duration::{format_duration, parse_duration, parse_duration_strict};
pub use mask::{Caller, MaskBinding, MaskName, authorize_clock_in, validate_mask_name};
pub use rejection::{Rejection, RejectionKind};
pub use reply::{Choice, Embed, EmbedField, Reply};
pub use report::{DailyTotal, MaskSummary, aggregate_daily, summarize_by_mask, write_csv};
pub use session::{ClockSession, SENTINEL_DATE, SessionError, SessionKind};
