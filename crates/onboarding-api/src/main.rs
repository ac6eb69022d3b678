//! Onboarding service - entry point.

use chrono::Duration;
use onboarding_api::api::{create_router_with_rate_limit, AppState, RateLimitState};
use onboarding_api::config::Config;
use onboarding_api::email::{LogNotifier, SmtpNotifier};
use onboarding_api::sealed::SealedStore;
use onboarding_core::{
    ChallengeNotifier, MemoryStore, OtpChallenge, RegistrationCoordinator, UserStore,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting onboarding service");

    // Initialize storage
    let store: Arc<dyn UserStore> = if config.store.persist {
        let Some(key) = config.store.seal_key.as_deref() else {
            error!("store persistence is enabled but no seal key is configured (STORE__SEAL_KEY)");
            std::process::exit(1);
        };
        match SealedStore::open(config.store.path.clone(), key).await {
            Ok(store) => Arc::new(store),
            Err(e) => {
                error!("Failed to open sealed store: {e}");
                std::process::exit(1);
            }
        }
    } else {
        info!("Persistence disabled, using in-memory store");
        Arc::new(MemoryStore::new())
    };

    // Initialize code delivery
    let notifier: Arc<dyn ChallengeNotifier> = if config.smtp.enabled {
        Arc::new(SmtpNotifier::new(config.smtp.clone()))
    } else {
        info!("SMTP disabled, verification codes go to the log");
        Arc::new(LogNotifier)
    };

    let coordinator = RegistrationCoordinator::new(store, notifier)
        .with_otp(OtpChallenge::new(
            config.challenge.otp_period_secs,
            config.challenge.otp_skew,
        ))
        .with_challenge_ttl(Duration::minutes(config.challenge.ttl_minutes));

    // Create application state and router
    let state = AppState::new(coordinator);
    let rate_limit = RateLimitState::new(config.rate_limit.global_per_minute);
    let app = create_router_with_rate_limit(state, rate_limit);

    // Bind to address
    let addr = SocketAddr::new(
        config
            .server
            .listen_addr
            .parse()
            .unwrap_or([0, 0, 0, 0].into()),
        config.server.port,
    );

    info!("Listening on {}", addr);

    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    // Run server
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
