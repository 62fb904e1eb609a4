//! Scholaris API Server
//!
//! Main entry point for the Scholaris backend service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scholaris_api::{ApiSettings, AppState, create_router, gateway::PaystackGateway};
use scholaris_db::connect_with_config;
use scholaris_shared::{AppConfig, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scholaris=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = connect_with_config(&config.database).await?;
    info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );

    let jwt_service = JwtService::new(JwtConfig {
        secret: config.jwt.secret.clone(),
        #[allow(clippy::cast_possible_wrap)]
        access_token_expires_minutes: (config.jwt.access_token_expiry_secs / 60) as i64,
    });

    let gateway = PaystackGateway::new(&config.paystack)
        .context("Failed to configure payment gateway")?;
    if config.paystack.secret_key.is_empty() {
        tracing::warn!("Paystack secret key is empty; gateway calls will be rejected");
    }
    info!(base_url = %config.paystack.base_url, "Payment gateway configured");

    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(jwt_service),
        gateway: Arc::new(gateway),
        settings: Arc::new(ApiSettings {
            fee_marker: config.fees.category_marker.clone(),
            payment_callback_url: config.paystack.callback_url.clone(),
        }),
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
