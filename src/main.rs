// region:    --- Imports
use farm_trade_service::database::DatabaseManager;
use farm_trade_service::handlers::{self, AppState};
use farm_trade_service::scheduler::{LiveMarketView, ResetScheduler, SystemClock};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging setup
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    // database setup
    let db_manager = Arc::new(DatabaseManager::new().await?);
    if let Err(e) = db_manager.initialize_database().await {
        error!("{:<12} --> database initialization failed: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> database ready", "Main");

    // daily reset scheduler
    let view = Arc::new(LiveMarketView::new(Arc::clone(&db_manager)));
    let mut scheduler = ResetScheduler::new(view, Arc::new(SystemClock));
    scheduler.initialize().await?;
    scheduler.start();

    // cors for the mobile clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let routes_all = handlers::routes(AppState::new(Arc::clone(&db_manager))).layer(cors);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = TcpListener::bind(&bind_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
