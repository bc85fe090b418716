//! Router configuration for the web API.

use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use super::dto::{
    ChannelStatus, CooldownsResponse, LetterResponse, LocaleResponse, MeResponse,
    RegisterRequest, SendLetterBody, UserResponse,
};
use super::handlers::{self, AppState};
use super::middleware::{api_rate_limit, create_cors_layer, RateLimitState};

/// OpenAPI document for the API.
#[derive(OpenApi)]
#[openapi(
    info(title = "Post Box API", description = "Anonymous and private letter exchange"),
    paths(
        handlers::identity::register,
        handlers::identity::me,
        handlers::letters::list_public,
        handlers::letters::list_inbox,
        handlers::letters::list_sent,
        handlers::letters::send_letter,
        handlers::i18n::get_locale,
    ),
    components(schemas(
        RegisterRequest,
        SendLetterBody,
        UserResponse,
        ChannelStatus,
        CooldownsResponse,
        MeResponse,
        LetterResponse,
        LocaleResponse,
    )),
    tags(
        (name = "identity", description = "Registration and session identity"),
        (name = "letters", description = "Feeds and sending"),
        (name = "i18n", description = "Localized strings")
    )
)]
pub struct ApiDoc;

/// Create the main API router.
pub fn create_router(
    app_state: Arc<AppState>,
    rate_limit: Arc<RateLimitState>,
    cors_origins: &[String],
) -> Router {
    let letter_routes = Router::new()
        .route("/", post(handlers::send_letter))
        .route("/public", get(handlers::list_public))
        .route("/inbox", get(handlers::list_inbox))
        .route("/sent", get(handlers::list_sent));

    let api_routes = Router::new()
        .route("/register", post(handlers::register))
        .route("/me", get(handlers::me))
        .route("/i18n/:lang", get(handlers::get_locale))
        .nest("/letters", letter_routes);

    Router::new()
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(move |req, next| {
                    let state = rate_limit.clone();
                    api_rate_limit(state, req, next)
                })),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}

/// Create a router serving the OpenAPI document.
pub fn create_openapi_router() -> Router {
    Router::new().route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
}
