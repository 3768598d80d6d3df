//! Masks: validated names, role bindings and clock-in authorization.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Rejection;

/// Checks that a mask name is identifier-like.
///
/// The first character must be a letter or underscore and the rest letters,
/// digits or underscores.
pub fn validate_mask_name(name: &str) -> Result<(), Rejection> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|first| first == '_' || first.is_alphabetic())
        && chars.all(|c| c == '_' || c.is_alphanumeric());
    if valid {
        Ok(())
    } else {
        Err(Rejection::InvalidMaskName {
            mask: name.to_string(),
        })
    }
}

/// A validated mask name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MaskName(String);

impl MaskName {
    pub fn new(name: impl Into<String>) -> Result<Self, Rejection> {
        let name = name.into();
        validate_mask_name(&name)?;
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MaskName {
    type Error = Rejection;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MaskName> for String {
    fn from(name: MaskName) -> Self {
        name.0
    }
}

impl fmt::Display for MaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MaskName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A role granted the use of a mask in a guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskBinding {
    pub guild_id: i64,
    pub role_id: i64,
    pub mask: String,
}

/// The authenticated member issuing a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub guild_id: i64,
    pub user_id: i64,
    pub role_ids: Vec<i64>,
}

impl Caller {
    pub const fn new(guild_id: i64, user_id: i64, role_ids: Vec<i64>) -> Self {
        Self {
            guild_id,
            user_id,
            role_ids,
        }
    }

    /// The caller's roles plus the guild's implicit everyone role, whose id
    /// is the guild id.
    pub fn effective_roles(&self) -> Vec<i64> {
        let mut roles = self.role_ids.clone();
        if !roles.contains(&self.guild_id) {
            roles.push(self.guild_id);
        }
        roles
    }
}

/// Decides whether a clock-in under `mask` may proceed.
///
/// An existing open session wins over a missing grant, so a member who lost
/// the role while clocked in is still told they are already clocked in.
pub fn authorize_clock_in(
    has_open_session: bool,
    allowed_masks: &[String],
    mask: &str,
) -> Result<(), Rejection> {
    if has_open_session {
        return Err(Rejection::AlreadyClockedIn {
            mask: mask.to_string(),
        });
    }
    if !allowed_masks.iter().any(|allowed| allowed == mask) {
        return Err(Rejection::PermissionDenied {
            mask: mask.to_string(),
        });
    }
    Ok(())
}
