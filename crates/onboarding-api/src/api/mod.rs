//! HTTP API for the onboarding service.

mod handlers;
mod middleware;
mod types;

pub use middleware::{request_logging_middleware, rate_limit_middleware, RateLimitState};
pub use types::*;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use onboarding_core::RegistrationCoordinator;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Onboarding flow coordinator
    pub coordinator: Arc<RegistrationCoordinator>,
}

impl AppState {
    /// Create new application state.
    pub fn new(coordinator: RegistrationCoordinator) -> Self {
        Self {
            coordinator: Arc::new(coordinator),
        }
    }
}

/// Create the API router with default rate limiting.
pub fn create_router(state: AppState) -> Router {
    create_router_with_rate_limit(state, RateLimitState::new(30))
}

/// Create the API router with custom rate limiting.
pub fn create_router_with_rate_limit(state: AppState, rate_limit: RateLimitState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/user/pre-register", post(handlers::pre_register))
        .route("/api/v1/user/register", post(handlers::register))
        .layer(axum_middleware::from_fn_with_state(
            rate_limit.clone(),
            rate_limit_middleware,
        ))
        .layer(axum_middleware::from_fn(request_logging_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
