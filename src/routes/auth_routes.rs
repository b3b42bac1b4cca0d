use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};

use crate::dto::{
    auth_dto::{LoginRequest, LoginResponse, RegisterUserRequest},
    ApiResponse,
};
use crate::middleware::AuthenticatedUser;
use crate::models::user::{User, UserRole};
use crate::state::AppState;
use crate::utils::{errors::AppError, validation::ValidatedJson};

/// Rutas sin token
pub fn create_public_auth_router() -> Router<AppState> {
    Router::new().route("/api/auth/login", post(login))
}

/// Rutas que requieren usuario autenticado
pub fn create_auth_router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/profile", get(profile))
        .route("/api/auth/register", post(register))
}

async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, AppError> {
    let response = state.auth.login(request).await?;
    Ok(Json(ApiResponse::success_with_message(response, "Login successful")))
}

async fn profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let profile = state.auth.profile(user.user_id).await?;
    Ok(Json(ApiResponse::success(profile)))
}

async fn register(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<RegisterUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), AppError> {
    user.require_any(&[UserRole::Admin])?;
    let created = state.auth.register(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(created, "User registered")),
    ))
}
