//! Routers HTTP
//!
//! Cada módulo expone un `create_*_router` que se anida bajo su prefijo
//! en [`create_app`]. Todo lo que no sea login o health pasa por el
//! middleware de autenticación.

pub mod auth_routes;
pub mod dashboard_routes;
pub mod party_routes;
pub mod repair_routes;
pub mod spare_part_routes;
pub mod transaction_routes;
pub mod user_routes;
pub mod vehicle_routes;

use axum::{extract::State, middleware, response::Json, routing::get, Router};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::middleware::{auth_middleware, cors_from_config};
use crate::state::AppState;

/// Construir la aplicación completa con estado y capas
pub fn create_app(state: AppState) -> Router {
    let protected = Router::new()
        .merge(auth_routes::create_auth_router())
        .nest("/api/users", user_routes::create_user_router())
        .nest("/api/vehicles", vehicle_routes::create_vehicle_router())
        .nest("/api/spare-parts", spare_part_routes::create_spare_part_router())
        .nest("/api/customers", party_routes::create_customer_router())
        .nest("/api/suppliers", party_routes::create_supplier_router())
        .nest("/api/repairs", repair_routes::create_repair_router())
        .nest(
            "/api/transactions",
            transaction_routes::create_transaction_router(),
        )
        .nest("/api/dashboard", dashboard_routes::create_dashboard_router())
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health))
        .merge(auth_routes::create_public_auth_router())
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors_from_config(&state.config.cors_origins)),
        )
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "showroom-pos",
        "environment": state.config.environment,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
