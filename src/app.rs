use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers;
use crate::middleware::auth::jwt_auth_middleware;
use crate::middleware::validate_tenant::validate_tenant_middleware;
use crate::store::RegistrationStore;

/// Injected application dependencies. Handlers and middleware get the store
/// through here rather than through module-level globals, so tests can swap
/// in the in-memory double.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RegistrationStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn RegistrationStore>) -> Self {
        Self { store }
    }
}

pub fn router(state: AppState) -> Router {
    // Staff routes: JWT first, then active-tenant validation
    let protected = Router::new()
        .route("/api/checkin", post(handlers::protected::checkin_post))
        .route(
            "/api/events/:event_id/reconcile",
            post(handlers::protected::reconcile_post),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            validate_tenant_middleware,
        ))
        .route_layer(middleware::from_fn(jwt_auth_middleware));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/register", post(handlers::public::register_post))
        .merge(protected)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Doorlist API",
            "version": version,
            "description": "Multi-tenant event registration and QR check-in backend",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "register": "/register (public - participant registration)",
                "checkin": "/api/checkin (protected - staff scanner)",
                "reconcile": "/api/events/:event_id/reconcile (protected)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
