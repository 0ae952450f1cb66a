use std::sync::Arc;

use cinematch_api::{
    api::{create_router, AppState},
    config::Config,
    db::{create_pool, PgStore},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cinematch_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let state = match config.database_url.as_deref() {
        Some(url) => {
            let pool = create_pool(url).await?;
            tracing::info!("Using PostgreSQL store");
            AppState::with_store(Arc::new(PgStore::new(pool)), &config)
        }
        None => {
            tracing::info!("DATABASE_URL not set, using in-memory store");
            AppState::in_memory(&config)
        }
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!(address = %config.bind_address(), "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
