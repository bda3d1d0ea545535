//! Demo server: loads the entity registration file, fills column listings from PostgreSQL,
//! and serves the batching routes under the configured prefix.

use batching_routes::{
    app, introspect_columns, load_from_path, resolve, AccessPolicy, AppState, PgRecordSource, Settings, TokenGate,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("batching_routes=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .connect(&settings.database_url)
        .await?;

    let mut config = load_from_path(&settings.config_path).await?;
    introspect_columns(&pool, &mut config).await?;
    let registry = resolve(&config)?;
    let policy = AccessPolicy::new(Arc::new(TokenGate::from_config(&config.access_tokens)));
    let state = AppState::new(registry, policy, Arc::new(PgRecordSource::new(pool)));

    let listener = TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!(prefix = %settings.prefix, "listening on {}", listener.local_addr()?);
    axum::serve(listener, app(state, &settings.prefix)).await?;
    Ok(())
}
