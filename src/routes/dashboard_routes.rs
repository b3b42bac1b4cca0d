use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};

use crate::dto::ApiResponse;
use crate::middleware::AuthenticatedUser;
use crate::models::{
    dashboard::{AdminDashboard, CashierDashboard, DashboardMetrics, MechanicDashboard},
    user::UserRole,
};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_dashboard_router() -> Router<AppState> {
    Router::new()
        .route("/admin", get(admin_dashboard))
        .route("/cashier", get(cashier_dashboard))
        .route("/mechanic", get(mechanic_dashboard))
        .route("/metrics/refresh", post(refresh_metrics))
}

async fn admin_dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<AdminDashboard>>, AppError> {
    user.require_any(&[UserRole::Admin])?;
    let dashboard = state.dashboard.admin().await?;
    Ok(Json(ApiResponse::success(dashboard)))
}

async fn cashier_dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<CashierDashboard>>, AppError> {
    user.require_any(&[UserRole::Admin, UserRole::Cashier])?;
    let dashboard = state.dashboard.cashier().await?;
    Ok(Json(ApiResponse::success(dashboard)))
}

// El panel de mecánico siempre es el del usuario autenticado
async fn mechanic_dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<MechanicDashboard>>, AppError> {
    user.require_any(&[UserRole::Mechanic, UserRole::Admin])?;
    let dashboard = state.dashboard.mechanic(user.user_id).await?;
    Ok(Json(ApiResponse::success(dashboard)))
}

async fn refresh_metrics(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<DashboardMetrics>>, AppError> {
    user.require_any(&[UserRole::Admin])?;
    let metrics = state.dashboard.refresh_metrics().await?;
    Ok(Json(ApiResponse::success_with_message(metrics, "Metrics refreshed")))
}
