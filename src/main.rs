use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use taxi_fleet::{
    TaxiResult, routes,
    state::{AppConfig, AppState},
};

#[tokio::main]
async fn main() -> TaxiResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("taxi_fleet=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    let bind_addr = config.bind_addr.clone();

    let app_state = AppState::new(config).await?;
    app_state.bootstrap_admin().await?;
    tracing::info!("Storage backend: {}", app_state.storage.backend_name());

    let app = routes::router(Arc::new(app_state));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| taxi_fleet::TaxiError::ConfigurationError(format!("cannot bind {}: {}", bind_addr, e)))?;
    tracing::info!("Listening on {}", bind_addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| taxi_fleet::TaxiError::internal_error(e.to_string()))?;
    Ok(())
}
