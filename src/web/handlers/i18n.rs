//! String table handler.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use super::AppState;
use crate::web::dto::{ApiResponse, LocaleResponse};
use crate::web::error::ApiError;

/// GET /api/i18n/:lang - String table for a locale.
#[utoipa::path(
    get,
    path = "/api/i18n/{lang}",
    tag = "i18n",
    params(("lang" = String, Path, description = "Locale code (en, fa)")),
    responses(
        (status = 200, description = "Flattened string table", body = LocaleResponse),
        (status = 404, description = "Unknown locale")
    )
)]
pub async fn get_locale(
    State(state): State<Arc<AppState>>,
    Path(lang): Path<String>,
) -> Result<Json<ApiResponse<LocaleResponse>>, ApiError> {
    let strings = state
        .i18n
        .get(&lang)
        .ok_or_else(|| ApiError::not_found(format!("Locale not found: {lang}")))?;
    Ok(Json(ApiResponse::new(LocaleResponse::from(strings))))
}
