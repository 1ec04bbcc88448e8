use tracing_subscriber::EnvFilter;
use watch_sync::{config::Config, error::AppErr, state::RoomRegistry};

#[tokio::main]
async fn main() -> Result<(), AppErr> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("watch_sync=info,tower_http=info")),
        )
        .init();

    let cfg   = Config::from_env()?;
    let rooms = RoomRegistry::new(cfg.log_capacity);
    let app   = watch_sync::app(cfg.clone(), rooms);

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!(addr = %cfg.bind_addr, "watch_sync v{} listening", env!("CARGO_PKG_VERSION"));
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
