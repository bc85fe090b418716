//! Request DTOs for the web API.

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::validation::{no_control_chars, not_empty_trimmed};
use crate::delivery::SendLetterRequest;
use crate::letter::LetterKind;

/// Registration request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    /// Display name.
    #[validate(
        length(max = 40, message = "Username must be at most 40 characters"),
        custom(function = "not_empty_trimmed"),
        custom(function = "no_control_chars")
    )]
    pub username: String,
}

/// Compose request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendLetterBody {
    /// Letter text.
    #[validate(custom(function = "no_control_chars"))]
    pub content: String,
    /// `public` or `private`.
    #[serde(rename = "type")]
    #[schema(value_type = String, example = "public")]
    pub kind: LetterKind,
    /// Recipient postal code, for private letters.
    #[serde(default)]
    pub recipient_code: Option<String>,
    /// Public letter being answered, for private replies.
    #[serde(default)]
    pub reply_to_id: Option<String>,
}

impl From<SendLetterBody> for SendLetterRequest {
    fn from(body: SendLetterBody) -> Self {
        Self {
            content: body.content,
            kind: body.kind,
            recipient_code: body.recipient_code,
            reply_to_id: body.reply_to_id,
        }
    }
}

/// Language selection for localized messages.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LangQuery {
    /// Locale code, e.g. `en` or `fa`.
    pub lang: Option<String>,
}
