use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Extension, Json, Router,
};

use crate::dto::{
    vehicle_dto::{CreateVehicleRequest, SetSellingPriceRequest, UpdateVehicleRequest},
    ApiResponse, PageRequest, Paginated,
};
use crate::middleware::AuthenticatedUser;
use crate::models::{
    user::UserRole,
    vehicle::{Vehicle, VehicleFilter},
};
use crate::state::AppState;
use crate::utils::{errors::AppError, validation::ValidatedJson};

pub fn create_vehicle_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_vehicles).post(create_vehicle))
        .route(
            "/:id",
            get(get_vehicle).put(update_vehicle).delete(delete_vehicle),
        )
        .route("/:id/selling-price", patch(set_selling_price))
}

async fn list_vehicles(
    State(state): State<AppState>,
    Query(filter): Query<VehicleFilter>,
    Query(page): Query<PageRequest>,
) -> Result<Json<ApiResponse<Paginated<Vehicle>>>, AppError> {
    let vehicles = state.vehicles.list(&filter, page.normalize()).await?;
    Ok(Json(ApiResponse::success(vehicles)))
}

async fn get_vehicle(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Vehicle>>, AppError> {
    let vehicle = state.vehicles.get(id).await?;
    Ok(Json(ApiResponse::success(vehicle)))
}

async fn create_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<CreateVehicleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Vehicle>>), AppError> {
    user.require_any(&[UserRole::Admin, UserRole::Cashier])?;
    let vehicle = state.vehicles.create(user.user_id, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(vehicle, "Vehicle created")),
    ))
}

async fn update_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
    ValidatedJson(request): ValidatedJson<UpdateVehicleRequest>,
) -> Result<Json<ApiResponse<Vehicle>>, AppError> {
    user.require_any(&[UserRole::Admin, UserRole::Cashier])?;
    let vehicle = state.vehicles.update(id, request).await?;
    Ok(Json(ApiResponse::success_with_message(vehicle, "Vehicle updated")))
}

async fn set_selling_price(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
    ValidatedJson(request): ValidatedJson<SetSellingPriceRequest>,
) -> Result<Json<ApiResponse<Vehicle>>, AppError> {
    user.require_any(&[UserRole::Admin])?;
    let vehicle = state
        .vehicles
        .set_selling_price(id, request.selling_price)
        .await?;
    Ok(Json(ApiResponse::success_with_message(vehicle, "Selling price updated")))
}

async fn delete_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    user.require_any(&[UserRole::Admin])?;
    state.vehicles.delete(id).await?;
    Ok(Json(ApiResponse::message("Vehicle deleted")))
}
