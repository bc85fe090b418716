//! Delivery request, outcome and reason types.

use serde::{Deserialize, Serialize};

use crate::letter::{Letter, LetterKind};

/// A compose action submitted by a user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendLetterRequest {
    /// Raw letter text; trimmed before validation.
    pub content: String,
    /// Channel to send on.
    #[serde(rename = "type")]
    pub kind: LetterKind,
    /// Recipient address for private letters.
    #[serde(default)]
    pub recipient_code: Option<String>,
    /// Public letter this private letter answers.
    #[serde(default)]
    pub reply_to_id: Option<String>,
}

impl SendLetterRequest {
    /// A public letter.
    pub fn public(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            kind: LetterKind::Public,
            recipient_code: None,
            reply_to_id: None,
        }
    }

    /// A private letter to `recipient_code`.
    pub fn private(content: impl Into<String>, recipient_code: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            kind: LetterKind::Private,
            recipient_code: Some(recipient_code.into()),
            reply_to_id: None,
        }
    }

    /// A private reply to the public letter `original_id`.
    pub fn reply(content: impl Into<String>, original_id: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            kind: LetterKind::Private,
            recipient_code: None,
            reply_to_id: Some(original_id.into()),
        }
    }
}

/// Why a send was refused. None of these change any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "kebab-case")]
pub enum RejectReason {
    /// Content is empty after trimming.
    EmptyContent,
    /// Content exceeds the length limit.
    ContentTooLong {
        /// Limit in characters.
        max: usize,
    },
    /// Private letter without a usable recipient.
    InvalidRecipient,
    /// The moderation gate denied the content.
    ContentRejected,
    /// The channel was used too recently.
    CooldownActive {
        /// Hours until the channel is ready, rounded up.
        #[serde(rename = "remainingHours")]
        remaining_hours: u32,
    },
}

impl RejectReason {
    /// Machine-readable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::EmptyContent => "empty-content",
            RejectReason::ContentTooLong { .. } => "content-too-long",
            RejectReason::InvalidRecipient => "invalid-recipient",
            RejectReason::ContentRejected => "content-rejected",
            RejectReason::CooldownActive { .. } => "cooldown-active",
        }
    }

    /// Stage of the workflow that produced this reason.
    pub fn stage(&self) -> DeliveryStage {
        match self {
            RejectReason::EmptyContent
            | RejectReason::ContentTooLong { .. }
            | RejectReason::InvalidRecipient => DeliveryStage::Validating,
            RejectReason::ContentRejected => DeliveryStage::Moderating,
            RejectReason::CooldownActive { .. } => DeliveryStage::RateCheck,
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Result of a send that did not hit an infrastructure error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The letter was stored.
    Delivered(Letter),
    /// The letter was refused.
    Rejected(RejectReason),
}

impl DeliveryOutcome {
    /// Check if the letter was stored.
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered(_))
    }

    /// The refusal reason, if any.
    pub fn reason(&self) -> Option<RejectReason> {
        match self {
            DeliveryOutcome::Delivered(_) => None,
            DeliveryOutcome::Rejected(reason) => Some(*reason),
        }
    }
}

/// Stages a send passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStage {
    Validating,
    Moderating,
    RateCheck,
    Persisting,
    Done,
}

impl DeliveryStage {
    /// Lowercase name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStage::Validating => "validating",
            DeliveryStage::Moderating => "moderating",
            DeliveryStage::RateCheck => "rate-check",
            DeliveryStage::Persisting => "persisting",
            DeliveryStage::Done => "done",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_serialization() {
        let json = serde_json::to_value(RejectReason::CooldownActive { remaining_hours: 5 }).unwrap();
        assert_eq!(json["reason"], "cooldown-active");
        assert_eq!(json["remainingHours"], 5);

        let json = serde_json::to_value(RejectReason::EmptyContent).unwrap();
        assert_eq!(json, serde_json::json!({"reason": "empty-content"}));
    }

    #[test]
    fn test_codes_match_serialized_tags() {
        let reasons = [
            RejectReason::EmptyContent,
            RejectReason::ContentTooLong { max: 500 },
            RejectReason::InvalidRecipient,
            RejectReason::ContentRejected,
            RejectReason::CooldownActive { remaining_hours: 1 },
        ];
        for reason in reasons {
            let json = serde_json::to_value(reason).unwrap();
            assert_eq!(json["reason"], reason.code());
        }
    }

    #[test]
    fn test_request_from_json() {
        let req: SendLetterRequest =
            serde_json::from_str(r#"{"content":"hi","type":"private","recipientCode":"123456"}"#)
                .unwrap();
        assert_eq!(req, SendLetterRequest::private("hi", "123456"));

        let req: SendLetterRequest =
            serde_json::from_str(r#"{"content":"hi","type":"public"}"#).unwrap();
        assert_eq!(req, SendLetterRequest::public("hi"));
    }

    #[test]
    fn test_stage_of_reason() {
        assert_eq!(RejectReason::EmptyContent.stage(), DeliveryStage::Validating);
        assert_eq!(RejectReason::ContentRejected.stage(), DeliveryStage::Moderating);
        assert_eq!(
            RejectReason::CooldownActive { remaining_hours: 2 }.stage(),
            DeliveryStage::RateCheck
        );
    }
}
