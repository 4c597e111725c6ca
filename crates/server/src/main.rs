use flashme_server::{AppState, app, config, storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flashme_server=info,tower_http=info".into()),
        )
        .init();

    let config = config::AppConfig::from_env()?;

    let data_dir = config::data_dir();
    tracing::info!("data directory: {}", data_dir.display());
    let db = storage::init_db(&data_dir)?;
    tracing::info!("database initialized");

    let host = config.host.clone();
    let state = AppState::new(db, config)?;
    tracing::info!(
        secrets = state.sessions.as_ref().secret_count(),
        "session cookie keys derived"
    );

    let port = config::port();
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    tracing::info!("starting server at {host} (listening on port {port})");
    axum::serve(listener, app(state)).await?;

    Ok(())
}
