use roleypoly_api::{AppState, config::ApiConfig, router};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ApiConfig::from_env().expect("failed to load configuration");
    tracing::info!(
        root_users = config.root_users.len(),
        allowed_callback_hosts = config.allowed_callback_hosts.len(),
        single_flight = config.cache.single_flight,
        "Loaded configuration"
    );

    let backends = config.kv.backends();
    let addr = config.bind_address.clone();
    let app = router(Arc::new(AppState::new(config, backends)));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
