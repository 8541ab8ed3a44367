use anyhow::Context;

use afterschool_api::{app, config::AppConfig};
use afterschool_infra::{inventory_store, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    afterschool_observability::init(config.log_format);

    let store = inventory_store::open(&config.store)
        .await
        .context("failed to open inventory store")?;

    if let Some(mode) = config.seed {
        let report = store
            .seed_lessons(seed::default_catalogue(), mode)
            .await
            .context("failed to seed lesson catalogue")?;
        tracing::info!(?mode, inserted = report.inserted, skipped = report.skipped, "catalogue seeded");
    }

    let app = app::build_app(store, &config);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
