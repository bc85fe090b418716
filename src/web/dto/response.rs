//! Response DTOs for the web API.

use std::collections::BTreeMap;

use serde::Serialize;
use utoipa::ToSchema;

use crate::delivery::CooldownStatus;
use crate::i18n::I18n;
use crate::identity::User;
use crate::letter::Letter;

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// A registered user.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub username: String,
    pub postal_code: String,
    /// Milliseconds since the Unix epoch.
    pub joined_at: i64,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            postal_code: user.postal_code.to_string(),
            joined_at: user.joined_at.timestamp_millis(),
        }
    }
}

/// Cooldown state of one channel.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStatus {
    /// Whether a letter can be sent now.
    pub ready: bool,
    /// Hours until ready, rounded up; zero when ready.
    pub remaining_hours: u32,
    /// Last successful send, in milliseconds since the Unix epoch.
    pub last_post: Option<i64>,
}

impl ChannelStatus {
    /// Build from a cooldown check.
    pub fn new(status: CooldownStatus, last_post: Option<chrono::DateTime<chrono::Utc>>) -> Self {
        Self {
            ready: status.is_ready(),
            remaining_hours: status.remaining_hours(),
            last_post: last_post.map(|t| t.timestamp_millis()),
        }
    }
}

/// Both channels of a user.
#[derive(Debug, Serialize, ToSchema)]
pub struct CooldownsResponse {
    pub public: ChannelStatus,
    pub private: ChannelStatus,
}

/// The session user with their cooldowns.
#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub user: UserResponse,
    pub cooldowns: CooldownsResponse,
}

/// A letter as shown to a client.
///
/// Which codes are filled in depends on who is looking; see the
/// constructors.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LetterResponse {
    pub id: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_code: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// `public` or `private`.
    #[serde(rename = "type")]
    pub kind: String,
    pub is_anonymous: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<String>,
}

impl LetterResponse {
    fn from_letter(letter: &Letter) -> Self {
        Self {
            id: letter.id.clone(),
            content: letter.content.clone(),
            sender_code: Some(letter.sender_code.to_string()),
            recipient_code: letter.recipient_code.as_ref().map(|c| c.to_string()),
            timestamp: letter.timestamp.timestamp_millis(),
            kind: letter.kind.as_str().to_string(),
            is_anonymous: letter.is_anonymous,
            reply_to_id: letter.reply_to_id.clone(),
        }
    }

    /// A letter on the public feed. The sender is never shown.
    pub fn public(letter: &Letter) -> Self {
        Self {
            sender_code: None,
            ..Self::from_letter(letter)
        }
    }

    /// A letter in its recipient's inbox.
    pub fn for_recipient(letter: &Letter) -> Self {
        Self::from_letter(letter)
    }

    /// A letter as seen by its author.
    ///
    /// Replies hide the recipient, who wrote the anonymous original.
    pub fn for_sender(letter: &Letter) -> Self {
        let mut response = Self::from_letter(letter);
        if letter.reply_to_id.is_some() {
            response.recipient_code = None;
        }
        response
    }
}

/// A locale's string table.
#[derive(Debug, Serialize, ToSchema)]
pub struct LocaleResponse {
    pub locale: String,
    pub messages: BTreeMap<String, String>,
}

impl From<&I18n> for LocaleResponse {
    fn from(i18n: &I18n) -> Self {
        Self {
            locale: i18n.locale().to_string(),
            messages: i18n
                .messages()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}
