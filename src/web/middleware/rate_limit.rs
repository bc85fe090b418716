//! Per-IP request rate limiting.

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{
    collections::HashMap,
    net::SocketAddr,
    num::NonZeroU32,
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};

use crate::web::error::ApiError;

/// Rate limiter for a single client IP.
pub type IpRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Interval between sweeps of idle limiters.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// State for rate limiting.
pub struct RateLimitState {
    limiters: RwLock<HashMap<String, Arc<IpRateLimiter>>>,
    /// Requests per minute per IP.
    requests_per_minute: u32,
}

impl RateLimitState {
    /// Create a new rate limit state.
    pub fn new(requests_per_minute: u32) -> Self {
        Self {
            limiters: RwLock::new(HashMap::new()),
            requests_per_minute,
        }
    }

    fn limiter_for(&self, ip: &str) -> Arc<IpRateLimiter> {
        {
            let read_guard = self.limiters.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(limiter) = read_guard.get(ip) {
                return limiter.clone();
            }
        }

        let mut write_guard = self.limiters.write().unwrap_or_else(PoisonError::into_inner);

        // Another request may have created it meanwhile.
        if let Some(limiter) = write_guard.get(ip) {
            return limiter.clone();
        }

        let quota =
            Quota::per_minute(NonZeroU32::new(self.requests_per_minute).unwrap_or(NonZeroU32::MIN));
        let limiter = Arc::new(RateLimiter::direct(quota));
        write_guard.insert(ip.to_string(), limiter.clone());
        limiter
    }

    /// Check if a request from `ip` is allowed.
    pub fn check(&self, ip: &str) -> bool {
        self.limiter_for(ip).check().is_ok()
    }

    /// Number of tracked IPs.
    pub fn tracked(&self) -> usize {
        self.limiters.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Drop limiters no request is currently holding.
    pub fn cleanup(&self) {
        let mut guard = self.limiters.write().unwrap_or_else(PoisonError::into_inner);
        guard.retain(|_, v| Arc::strong_count(v) > 1);
    }

    /// Start a background task that periodically calls [`cleanup`](Self::cleanup).
    pub fn start_cleanup_task(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
            interval.tick().await;
            loop {
                interval.tick().await;
                self.cleanup();
            }
        });
    }
}

/// Extract client IP from request.
fn get_client_ip(req: &Request<Body>) -> String {
    // Reverse proxy headers first.
    if let Some(forwarded) = req
        .headers()
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(ip) = forwarded.split(',').next() {
            return ip.trim().to_string();
        }
    }

    if let Some(real_ip) = req
        .headers()
        .get("X-Real-IP")
        .and_then(|v| v.to_str().ok())
    {
        return real_ip.to_string();
    }

    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    "unknown".to_string()
}

/// Rate limiting middleware for the API.
pub async fn api_rate_limit(
    state: Arc<RateLimitState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = get_client_ip(&req);

    if !state.check(&ip) {
        tracing::warn!(ip = %ip, "API rate limit exceeded");
        return ApiError::too_many_requests("Too many requests. Please try again later.")
            .into_response();
    }

    next.run(req).await
}
