//! Web server for Post Box.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;

use crate::config::ServerConfig;
use crate::{PostboxError, Result};

use super::handlers::AppState;
use super::middleware::RateLimitState;
use super::router::{create_health_router, create_openapi_router, create_router};

/// Web server for the API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// Per-IP request limiter.
    rate_limit: Arc<RateLimitState>,
    /// Allowed CORS origins.
    cors_origins: Vec<String>,
}

impl WebServer {
    /// Create a new web server.
    pub fn new(config: &ServerConfig, app_state: Arc<AppState>) -> Result<Self> {
        let addr = format!("{}:{}", config.host, config.port)
            .parse()
            .map_err(|e| PostboxError::Config(format!("invalid server address: {e}")))?;

        Ok(Self {
            addr,
            app_state,
            rate_limit: Arc::new(RateLimitState::new(config.api_rate_limit)),
            cors_origins: config.cors_origins.clone(),
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn build_router(&self) -> Router {
        create_router(
            self.app_state.clone(),
            self.rate_limit.clone(),
            &self.cors_origins,
        )
        .merge(create_health_router())
        .merge(create_openapi_router())
        .layer(CompressionLayer::new())
    }

    async fn bind(&self) -> Result<(TcpListener, Router)> {
        let router = self.build_router();
        let listener = TcpListener::bind(self.addr).await?;

        self.rate_limit.clone().start_cleanup_task();
        tracing::info!("Web server listening on http://{}", listener.local_addr()?);

        Ok((listener, router))
    }

    /// Run the web server until it fails.
    pub async fn run(self) -> Result<()> {
        let (listener, router) = self.bind().await?;

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;
        Ok(())
    }

    /// Run the server in the background and return the bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> Result<SocketAddr> {
        let (listener, router) = self.bind().await?;
        let local_addr = listener.local_addr()?;

        tokio::spawn(async move {
            if let Err(e) = axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}
