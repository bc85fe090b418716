//! Letter feed and compose handlers.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;

use super::AppState;
use crate::delivery::{DeliveryOutcome, RejectReason, SendLetterRequest};
use crate::i18n::I18n;
use crate::web::dto::{ApiResponse, LangQuery, LetterResponse, SendLetterBody, ValidatedJson};
use crate::web::error::ApiError;

/// Localized text for a refused letter.
pub fn reject_message(strings: &I18n, reason: &RejectReason) -> String {
    match reason {
        RejectReason::EmptyContent => strings.t("reject.empty_content").to_string(),
        RejectReason::ContentTooLong { max } => {
            let max = max.to_string();
            strings.t_with("reject.content_too_long", &[("max", max.as_str())])
        }
        RejectReason::InvalidRecipient => strings.t("reject.invalid_recipient").to_string(),
        RejectReason::ContentRejected => strings.t("reject.content_rejected").to_string(),
        RejectReason::CooldownActive { remaining_hours } => {
            let hours = remaining_hours.to_string();
            strings.t_with("reject.cooldown_active", &[("hours", hours.as_str())])
        }
    }
}

/// GET /api/letters/public - Public feed, newest first.
#[utoipa::path(
    get,
    path = "/api/letters/public",
    tag = "letters",
    responses(
        (status = 200, description = "Public letters without their senders", body = Vec<LetterResponse>)
    )
)]
pub async fn list_public(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<Vec<LetterResponse>>> {
    let letters = state.office.letters().public_feed().await;
    Json(ApiResponse::new(
        letters.iter().map(LetterResponse::public).collect(),
    ))
}

/// GET /api/letters/inbox - Private letters addressed to the session user.
#[utoipa::path(
    get,
    path = "/api/letters/inbox",
    tag = "letters",
    params(LangQuery),
    responses(
        (status = 200, description = "Letters received, newest first", body = Vec<LetterResponse>),
        (status = 404, description = "Not registered")
    )
)]
pub async fn list_inbox(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<LangQuery>,
) -> Result<Json<ApiResponse<Vec<LetterResponse>>>, ApiError> {
    let (_, user) = state.require_user(&jar, query.lang.as_deref()).await?;
    let letters = state.office.letters().inbox(&user.postal_code).await;
    Ok(Json(ApiResponse::new(
        letters.iter().map(LetterResponse::for_recipient).collect(),
    )))
}

/// GET /api/letters/sent - Letters written by the session user.
#[utoipa::path(
    get,
    path = "/api/letters/sent",
    tag = "letters",
    params(LangQuery),
    responses(
        (status = 200, description = "Letters sent, newest first", body = Vec<LetterResponse>),
        (status = 404, description = "Not registered")
    )
)]
pub async fn list_sent(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<LangQuery>,
) -> Result<Json<ApiResponse<Vec<LetterResponse>>>, ApiError> {
    let (_, user) = state.require_user(&jar, query.lang.as_deref()).await?;
    let letters = state.office.letters().sent(&user.postal_code).await;
    Ok(Json(ApiResponse::new(
        letters.iter().map(LetterResponse::for_sender).collect(),
    )))
}

/// POST /api/letters - Send a letter.
#[utoipa::path(
    post,
    path = "/api/letters",
    tag = "letters",
    params(LangQuery),
    request_body = SendLetterBody,
    responses(
        (status = 201, description = "Letter delivered", body = LetterResponse),
        (status = 404, description = "Not registered"),
        (status = 422, description = "Letter refused: empty-content, content-too-long, invalid-recipient or content-rejected"),
        (status = 429, description = "Letter refused: cooldown-active")
    )
)]
pub async fn send_letter(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<LangQuery>,
    ValidatedJson(body): ValidatedJson<SendLetterBody>,
) -> Result<(StatusCode, Json<ApiResponse<LetterResponse>>), ApiError> {
    let lang = query.lang.as_deref();
    let (session, _) = state.require_user(&jar, lang).await?;

    let request = SendLetterRequest::from(body);
    match state.office.send(&session, &request).await? {
        DeliveryOutcome::Delivered(letter) => Ok((
            StatusCode::CREATED,
            Json(ApiResponse::new(LetterResponse::for_sender(&letter))),
        )),
        DeliveryOutcome::Rejected(reason) => {
            let message = reject_message(state.strings(lang), &reason);
            Err(ApiError::rejected(reason, message))
        }
    }
}
