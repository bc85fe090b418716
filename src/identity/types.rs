//! User type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::code::PostalCode;
use crate::letter::LetterKind;

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Display name.
    pub username: String,
    /// Unique postal code.
    pub postal_code: PostalCode,
    /// Registration time.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub joined_at: DateTime<Utc>,
    /// Last successful public send.
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub last_public_post: Option<DateTime<Utc>>,
    /// Last successful private send.
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub last_private_post: Option<DateTime<Utc>>,
}

impl User {
    /// Create a user with no send history.
    pub fn new(username: impl Into<String>, postal_code: PostalCode, joined_at: DateTime<Utc>) -> Self {
        Self {
            username: username.into(),
            postal_code,
            joined_at,
            last_public_post: None,
            last_private_post: None,
        }
    }

    /// Last successful send on a channel.
    pub fn last_post(&self, kind: LetterKind) -> Option<DateTime<Utc>> {
        match kind {
            LetterKind::Public => self.last_public_post,
            LetterKind::Private => self.last_private_post,
        }
    }

    /// Record a successful send on a channel.
    pub fn record_post(&mut self, kind: LetterKind, at: DateTime<Utc>) {
        match kind {
            LetterKind::Public => self.last_public_post = Some(at),
            LetterKind::Private => self.last_private_post = Some(at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User::new(
            "Alice",
            PostalCode::parse("123456").unwrap(),
            DateTime::from_timestamp_millis(1_700_000_000_000).unwrap(),
        )
    }

    #[test]
    fn test_record_post_is_per_channel() {
        let mut user = sample_user();
        let at = DateTime::from_timestamp_millis(1_700_000_100_000).unwrap();

        user.record_post(LetterKind::Public, at);
        assert_eq!(user.last_post(LetterKind::Public), Some(at));
        assert_eq!(user.last_post(LetterKind::Private), None);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(sample_user()).unwrap();
        assert_eq!(json["username"], "Alice");
        assert_eq!(json["postalCode"], "123456");
        assert_eq!(json["joinedAt"], 1_700_000_000_000_i64);
        assert!(json["lastPublicPost"].is_null());
        assert!(json["lastPrivatePost"].is_null());
    }

    #[test]
    fn test_deserialize_stored_record() {
        let raw = r#"{"username":"Bob","postalCode":"987654","joinedAt":1700000000000,
                      "lastPublicPost":1700000050000,"lastPrivatePost":null}"#;
        let user: User = serde_json::from_str(raw).unwrap();
        assert_eq!(user.username, "Bob");
        assert_eq!(
            user.last_public_post.map(|t| t.timestamp_millis()),
            Some(1_700_000_050_000)
        );
        assert!(user.last_private_post.is_none());
    }
}
