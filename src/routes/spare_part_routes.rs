use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Extension, Json, Router,
};

use crate::dto::{
    spare_part_dto::{
        CreateSparePartRequest, StockAdjustmentRequest, StockAvailabilityQuery,
        StockAvailabilityResponse, UpdateSparePartRequest,
    },
    ApiResponse, PageRequest, Paginated,
};
use crate::middleware::AuthenticatedUser;
use crate::models::{
    spare_part::{SparePart, SparePartFilter},
    user::UserRole,
};
use crate::state::AppState;
use crate::utils::{errors::AppError, validation::ValidatedJson};

pub fn create_spare_part_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_spare_parts).post(create_spare_part))
        .route("/low-stock", get(low_stock))
        .route(
            "/:id",
            get(get_spare_part)
                .put(update_spare_part)
                .delete(delete_spare_part),
        )
        .route("/:id/stock", patch(adjust_stock))
        .route("/:id/availability", get(check_availability))
}

async fn list_spare_parts(
    State(state): State<AppState>,
    Query(filter): Query<SparePartFilter>,
    Query(page): Query<PageRequest>,
) -> Result<Json<ApiResponse<Paginated<SparePart>>>, AppError> {
    let parts = state.spare_parts.list(&filter, page.normalize()).await?;
    Ok(Json(ApiResponse::success(parts)))
}

async fn low_stock(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<SparePart>>>, AppError> {
    let parts = state.spare_parts.low_stock().await?;
    Ok(Json(ApiResponse::success(parts)))
}

async fn get_spare_part(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<SparePart>>, AppError> {
    let part = state.spare_parts.get(id).await?;
    Ok(Json(ApiResponse::success(part)))
}

async fn create_spare_part(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<CreateSparePartRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SparePart>>), AppError> {
    user.require_any(&[UserRole::Admin, UserRole::Cashier])?;
    let part = state.spare_parts.create(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(part, "Spare part created")),
    ))
}

async fn update_spare_part(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
    ValidatedJson(request): ValidatedJson<UpdateSparePartRequest>,
) -> Result<Json<ApiResponse<SparePart>>, AppError> {
    user.require_any(&[UserRole::Admin, UserRole::Cashier])?;
    let part = state.spare_parts.update(id, request).await?;
    Ok(Json(ApiResponse::success_with_message(part, "Spare part updated")))
}

async fn delete_spare_part(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    user.require_any(&[UserRole::Admin])?;
    state.spare_parts.delete(id).await?;
    Ok(Json(ApiResponse::message("Spare part deleted")))
}

async fn adjust_stock(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
    ValidatedJson(request): ValidatedJson<StockAdjustmentRequest>,
) -> Result<Json<ApiResponse<SparePart>>, AppError> {
    user.require_any(&[UserRole::Admin, UserRole::Cashier])?;
    let part = state.spare_parts.adjust_stock(id, request).await?;
    Ok(Json(ApiResponse::success_with_message(part, "Stock updated")))
}

async fn check_availability(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(query): Query<StockAvailabilityQuery>,
) -> Result<Json<ApiResponse<StockAvailabilityResponse>>, AppError> {
    if query.quantity < 1 {
        return Err(AppError::BadRequest("quantity must be at least 1".to_string()));
    }
    let available = state
        .spare_parts
        .check_stock_availability(id, query.quantity)
        .await?;
    Ok(Json(ApiResponse::success(StockAvailabilityResponse {
        spare_part_id: id,
        requested: query.quantity,
        available,
    })))
}
