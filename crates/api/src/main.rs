use anyhow::Context;

use tallybank_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    tallybank_observability::init(config.log_format);

    for name in config.insecure_defaults() {
        tracing::warn!("{name} not set; using insecure dev default");
    }
    tracing::debug!(?config, "configuration loaded");

    let app = tallybank_api::app::build_app(&config).await?;

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
