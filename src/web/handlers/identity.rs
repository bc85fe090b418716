//! Registration and session identity handlers.

use axum::{
    extract::{Query, State},
    Json,
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;

use super::AppState;
use crate::delivery::PostOffice;
use crate::identity::User;
use crate::letter::LetterKind;
use crate::web::dto::{
    ApiResponse, ChannelStatus, CooldownsResponse, LangQuery, MeResponse, RegisterRequest,
    UserResponse, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::session::{new_session_id, session_cookie, session_id};

fn me_response(office: &PostOffice, user: &User) -> MeResponse {
    let channel = |kind| ChannelStatus::new(office.cooldown(user, kind), user.last_post(kind));
    MeResponse {
        user: UserResponse::from(user),
        cooldowns: CooldownsResponse {
            public: channel(LetterKind::Public),
            private: channel(LetterKind::Private),
        },
    }
}

/// POST /api/register - Register for a postal code.
///
/// Idempotent per session: a session that already has an identity gets it
/// back unchanged. A cookie naming no registered session is replaced by a
/// freshly drawn id.
#[utoipa::path(
    post,
    path = "/api/register",
    tag = "identity",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "The session's user", body = MeResponse),
        (status = 409, description = "No free postal code"),
        (status = 422, description = "Invalid username")
    )
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<(CookieJar, Json<ApiResponse<MeResponse>>), ApiError> {
    let identities = state.office.identities();
    let known = match session_id(&jar) {
        Some(id) => identities.current_user(&id).await?.map(|_| id),
        None => None,
    };
    let session = known.unwrap_or_else(new_session_id);

    let user = identities.register(&session, &req.username).await?;

    let response = me_response(&state.office, &user);
    Ok((jar.add(session_cookie(session)), Json(ApiResponse::new(response))))
}

/// GET /api/me - The session's user and cooldowns.
#[utoipa::path(
    get,
    path = "/api/me",
    tag = "identity",
    params(LangQuery),
    responses(
        (status = 200, description = "The session's user", body = MeResponse),
        (status = 404, description = "Not registered")
    )
)]
pub async fn me(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<LangQuery>,
) -> Result<Json<ApiResponse<MeResponse>>, ApiError> {
    let (_, user) = state.require_user(&jar, query.lang.as_deref()).await?;
    Ok(Json(ApiResponse::new(me_response(&state.office, &user))))
}
