use std::sync::Arc;

use anyhow::Context;

use medfind_api::config::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    medfind_observability::init();

    let config = ApiConfig::from_env()?;
    let services = medfind_api::app::services::build_services(&config)
        .await
        .context("failed to initialize stores")?;

    let app = medfind_api::app::build_app(config.jwt_secret.clone(), Arc::new(services));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
