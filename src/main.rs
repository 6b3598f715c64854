use anyhow::Context;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use pocket_api::app::{build_state, router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pocket_api=info,tower_http=info")),
        )
        .init();

    let config = pocket_api::config::config().clone();
    tracing::info!("Starting Pocket API in {:?} mode", config.environment);

    let security = &config.security;
    if config.is_production() && security.jwt_secret.is_empty() && security.auth_url.is_none() {
        anyhow::bail!("production requires JWT_SECRET or AUTH_URL");
    }

    let port = config.api.port;
    let state = build_state(config)
        .await
        .context("failed to initialize application state")?;

    let mut invalidations = state.cache.subscribe();
    tokio::spawn(async move {
        loop {
            match invalidations.recv().await {
                Ok(event) => {
                    tracing::debug!(table = event.table, scope = ?event.scope, "List view invalidated")
                }
                Err(RecvError::Lagged(missed)) => tracing::debug!("Missed {} invalidation events", missed),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let app = router(state);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Pocket API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
