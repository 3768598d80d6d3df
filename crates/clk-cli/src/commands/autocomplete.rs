//! Mask suggestions for partially typed command fields.

use clap::ValueEnum;

use clk_core::{Caller, Choice};
use clk_db::Database;

use super::CommandError;

/// The chat platform shows at most this many suggestions.
const MAX_CHOICES: usize = 25;

/// Which mask field is being completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MaskField {
    /// Masks the caller may clock in with.
    ClockIn,
    /// Masks the caller is clocked in with.
    ClockOut,
    /// Every mask in the guild.
    Mask,
}

/// Suggests masks containing `partial` (case-insensitive).
pub fn suggest(
    db: &Database,
    caller: &Caller,
    field: MaskField,
    partial: &str,
) -> Result<Vec<Choice>, CommandError> {
    let candidates: Vec<String> = match field {
        MaskField::ClockIn => db.masks_for_roles(caller.guild_id, &caller.effective_roles())?,
        MaskField::ClockOut => db
            .list_open_sessions(caller.guild_id, caller.user_id)?
            .into_iter()
            .map(|session| session.mask)
            .collect(),
        MaskField::Mask => db
            .list_masks(caller.guild_id)?
            .into_iter()
            .map(|binding| binding.mask)
            .collect(),
    };

    let needle = partial.trim().to_lowercase();
    let mut matches: Vec<String> = candidates
        .into_iter()
        .filter(|mask| mask.to_lowercase().contains(&needle))
        .collect();
    matches.sort();
    matches.dedup();
    matches.truncate(MAX_CHOICES);

    tracing::debug!(?field, partial, matches = matches.len(), "autocomplete");
    Ok(matches.into_iter().map(Choice::new).collect())
}
