//! User-facing rejection reasons.

use std::fmt;

use thiserror::Error;

/// Broad category of a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectionKind {
    /// The input was malformed.
    Validation,
    /// The caller holds no role granting the mask.
    PermissionDenied,
    /// The operation collides with existing state.
    Conflict,
    /// The operation targets something that does not exist.
    NotFound,
}

impl RejectionKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::PermissionDenied => "permission_denied",
            Self::Conflict => "conflict",
            Self::NotFound => "not_found",
        }
    }
}

impl fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed reason for refusing a command.
///
/// The `Display` text is the message shown to the user.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("That mask name is not a valid identifier.")]
    InvalidMaskName { mask: String },

    #[error("`{input}` is not a valid duration. Use a format like `1d2h3m4s` or `-30m`.")]
    InvalidDuration { input: String },

    #[error("You don't have permission to use that mask.")]
    PermissionDenied { mask: String },

    #[error("That mask already exists in your server.")]
    MaskExists { mask: String },

    #[error("You're already clocked in with that mask.")]
    AlreadyClockedIn { mask: String },

    #[error("You're not clocked in with that mask.")]
    NotClockedIn { mask: String },

    #[error("Couldn't find a mask with the name `{mask}`.")]
    MaskNotFound { mask: String },
}

impl Rejection {
    #[must_use]
    pub const fn kind(&self) -> RejectionKind {
        match self {
            Self::InvalidMaskName { .. } | Self::InvalidDuration { .. } => {
                RejectionKind::Validation
            }
            Self::PermissionDenied { .. } => RejectionKind::PermissionDenied,
            Self::MaskExists { .. } | Self::AlreadyClockedIn { .. } => RejectionKind::Conflict,
            Self::NotClockedIn { .. } | Self::MaskNotFound { .. } => RejectionKind::NotFound,
        }
    }
}
