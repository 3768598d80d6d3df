//! Reply payloads handed back to the chat layer.
//!
//! Handlers never talk to the chat platform directly. They return a [`Reply`]
//! and the caller decides how to deliver it: as a message, a set of embeds or
//! a file attachment.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A response to a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reply {
    /// A plain message. Ephemeral messages are only shown to the caller.
    Text { content: String, ephemeral: bool },
    /// One or more rich embeds.
    Embeds { embeds: Vec<Embed> },
    /// A file attachment.
    File {
        filename: String,
        #[serde(skip)]
        bytes: Vec<u8>,
    },
    /// Autocomplete suggestions.
    Choices { choices: Vec<Choice> },
}

impl Reply {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
            ephemeral: false,
        }
    }

    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
            ephemeral: true,
        }
    }

    /// Text content of a message reply, if any.
    pub fn content(&self) -> Option<&str> {
        match self {
            Self::Text { content, .. } => Some(content),
            _ => None,
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text { content, .. } => writeln!(f, "{content}"),
            Self::Embeds { embeds } => {
                for (i, embed) in embeds.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{embed}")?;
                }
                Ok(())
            }
            Self::File { filename, bytes } => {
                writeln!(f, "[attachment: {filename}, {} bytes]", bytes.len())
            }
            Self::Choices { choices } => {
                for choice in choices {
                    writeln!(f, "{}", choice.value)?;
                }
                Ok(())
            }
        }
    }
}

/// A rich embed with an optional title, description and fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
}

impl Embed {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline: false,
        });
        self
    }
}

impl fmt::Display for Embed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(title) = &self.title {
            writeln!(f, "# {title}")?;
        }
        if let Some(description) = &self.description {
            writeln!(f, "{description}")?;
        }
        for field in &self.fields {
            writeln!(f, "## {}", field.name)?;
            writeln!(f, "{}", field.value)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// An autocomplete suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub name: String,
    pub value: String,
}

impl Choice {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            name: value.clone(),
            value,
        }
    }
}

/// Chat timestamp markup, rendered by the client in the viewer's timezone.
pub fn timestamp_markup(at: DateTime<Utc>) -> String {
    format!("<t:{}:f>", at.timestamp())
}

pub fn user_mention(user_id: i64) -> String {
    format!("<@{user_id}>")
}

pub fn role_mention(role_id: i64) -> String {
    format!("<@&{role_id}>")
}
