//! Letter types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::PostalCode;

/// Maximum letter length in characters.
pub const MAX_CONTENT_LENGTH: usize = 500;

/// Delivery channel of a letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LetterKind {
    /// Visible to everyone, sender suppressed.
    Public,
    /// Visible to sender and recipient only.
    Private,
}

impl LetterKind {
    /// Lowercase name as stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            LetterKind::Public => "public",
            LetterKind::Private => "private",
        }
    }
}

impl std::fmt::Display for LetterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A delivered letter. Immutable once created.
///
/// Build with [`Letter::public`] or [`Letter::private`]; a public letter never
/// has a recipient and a private one always has one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Letter {
    pub id: String,
    pub content: String,
    pub sender_code: PostalCode,
    pub recipient_code: Option<PostalCode>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: LetterKind,
    pub is_anonymous: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<String>,
}

impl Letter {
    /// A new anonymous public letter.
    pub fn public(content: impl Into<String>, sender: PostalCode, at: DateTime<Utc>) -> Self {
        Self {
            id: new_letter_id(),
            content: content.into(),
            sender_code: sender,
            recipient_code: None,
            timestamp: at,
            kind: LetterKind::Public,
            is_anonymous: true,
            reply_to_id: None,
        }
    }

    /// A new private letter to `recipient`.
    pub fn private(
        content: impl Into<String>,
        sender: PostalCode,
        recipient: PostalCode,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: new_letter_id(),
            content: content.into(),
            sender_code: sender,
            recipient_code: Some(recipient),
            timestamp: at,
            kind: LetterKind::Private,
            is_anonymous: false,
            reply_to_id: None,
        }
    }

    /// Mark this letter as a reply to a public letter.
    pub fn in_reply_to(mut self, original_id: impl Into<String>) -> Self {
        self.reply_to_id = Some(original_id.into());
        self
    }

    /// Whether this letter is on the public feed.
    pub fn is_public(&self) -> bool {
        self.kind == LetterKind::Public
    }

    /// Whether the kind/recipient pairing holds.
    pub fn is_well_formed(&self) -> bool {
        match self.kind {
            LetterKind::Public => self.recipient_code.is_none(),
            LetterKind::Private => self.recipient_code.is_some(),
        }
    }
}

fn new_letter_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
