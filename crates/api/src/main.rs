use anyhow::Context;

use jobly_api::{app, ApiConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("invalid configuration")?;
    jobly_observability::init(config.log_format);

    tracing::info!(?config, "starting jobly-api");
    if config.uses_dev_secret() {
        tracing::warn!("JWT_SECRET not set; using insecure dev default");
    }

    let services = app::services::build_services(&config)
        .await
        .context("failed to initialise datastore")?;
    let store = services.store.clone();

    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr()))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app::build_app(services))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    store.close().await;
    tracing::info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("received shutdown signal");
}
