use std::sync::Arc;

use doorlist_api::app::{router, AppState};
use doorlist_api::config;
use doorlist_api::store::PgStore;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    let config = config::config();

    tracing_subscriber::fmt::init();
    tracing::info!("Starting Doorlist API in {:?} mode", config.environment);

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let store = PgStore::connect(&database_url, config)
        .await
        .unwrap_or_else(|e| panic!("failed to connect database: {}", e));

    let app = router(AppState::new(Arc::new(store)));

    // Allow tests or deployments to override port via env
    let port = std::env::var("DOORLIST_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Doorlist API server listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}
