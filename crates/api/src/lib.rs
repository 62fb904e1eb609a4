//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes
//! - Authentication and school-access middleware
//! - Request extractors
//! - The Paystack payment gateway adapter

pub mod error;
pub mod extractors;
pub mod gateway;
pub mod middleware;
pub mod routes;

use axum::Router;
use scholaris_core::payment::PaymentGateway;
use scholaris_shared::JwtService;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiResult};

/// Settings handlers need besides services.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    /// Substring marking a manual income category as fee income.
    pub fee_marker: String,
    /// Where the gateway redirects the payer after checkout.
    pub payment_callback_url: Option<String>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            fee_marker: "Fee".to_string(),
            payment_callback_url: None,
        }
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// Hosted-checkout payment gateway.
    pub gateway: Arc<dyn PaymentGateway>,
    /// Request handling settings.
    pub settings: Arc<ApiSettings>,
}

impl AppState {
    /// Returns an owned handle to the connection pool for a repository.
    #[must_use]
    pub fn conn(&self) -> DatabaseConnection {
        (*self.db).clone()
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
