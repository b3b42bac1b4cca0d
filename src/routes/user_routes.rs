use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};

use crate::dto::ApiResponse;
use crate::middleware::AuthenticatedUser;
use crate::models::user::{User, UserFilter, UserRole};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_user_router() -> Router<AppState> {
    Router::new().route("/", get(list_users))
}

/// Usuarios filtrados por rol y estado
async fn list_users(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(filter): Query<UserFilter>,
) -> Result<Json<ApiResponse<Vec<User>>>, AppError> {
    user.require_any(&[UserRole::Admin, UserRole::Cashier])?;
    let users = state.auth.list_users(&filter).await?;
    Ok(Json(ApiResponse::success(users)))
}
