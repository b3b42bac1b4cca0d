use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch},
    Extension, Json, Router,
};

use crate::dto::{
    repair_dto::{CreateRepairOrderRequest, SparePartUsage, UpdateRepairProgressRequest},
    ApiResponse, PageRequest, Paginated,
};
use crate::middleware::AuthenticatedUser;
use crate::models::{
    repair::{
        MechanicWorkload, RepairOrder, RepairOrderDetail, RepairOrderFilter, RepairSparePart,
        RepairStats, RepairStatsFilter,
    },
    user::UserRole,
};
use crate::state::AppState;
use crate::utils::{errors::AppError, validation::ValidatedJson};

const WORKSHOP: &[UserRole] = &[UserRole::Admin, UserRole::Mechanic];

pub fn create_repair_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_repairs).post(open_repair))
        .route("/stats", get(repair_stats))
        .route("/workload", get(mechanic_workload))
        .route("/code/:code", get(get_repair_by_code))
        .route("/:id", get(get_repair).delete(delete_repair))
        .route("/:id/progress", patch(update_progress))
        .route(
            "/:id/spare-parts",
            get(list_repair_parts).post(attach_spare_part),
        )
        .route("/:id/spare-parts/:spare_part_id", delete(detach_spare_part))
}

async fn list_repairs(
    State(state): State<AppState>,
    Query(filter): Query<RepairOrderFilter>,
    Query(page): Query<PageRequest>,
) -> Result<Json<ApiResponse<Paginated<RepairOrder>>>, AppError> {
    let orders = state.repairs.list(&filter, page.normalize()).await?;
    Ok(Json(ApiResponse::success(orders)))
}

async fn repair_stats(
    State(state): State<AppState>,
    Query(filter): Query<RepairStatsFilter>,
) -> Result<Json<ApiResponse<RepairStats>>, AppError> {
    let stats = state.repairs.stats(&filter).await?;
    Ok(Json(ApiResponse::success(stats)))
}

async fn mechanic_workload(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<MechanicWorkload>>>, AppError> {
    let workload = state.repairs.workload().await?;
    Ok(Json(ApiResponse::success(workload)))
}

async fn get_repair(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<RepairOrderDetail>>, AppError> {
    let detail = state.repairs.get(id).await?;
    Ok(Json(ApiResponse::success(detail)))
}

async fn get_repair_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<RepairOrderDetail>>, AppError> {
    let detail = state.repairs.get_by_code(&code).await?;
    Ok(Json(ApiResponse::success(detail)))
}

async fn open_repair(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<CreateRepairOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RepairOrderDetail>>), AppError> {
    user.require_any(&[UserRole::Admin, UserRole::Cashier])?;
    let detail = state.repairs.open(user.user_id, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(detail, "Repair order created")),
    ))
}

async fn update_progress(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
    ValidatedJson(request): ValidatedJson<UpdateRepairProgressRequest>,
) -> Result<Json<ApiResponse<RepairOrderDetail>>, AppError> {
    user.require_any(WORKSHOP)?;
    let detail = state.repairs.update_progress(id, request).await?;
    Ok(Json(ApiResponse::success_with_message(detail, "Repair progress updated")))
}

async fn delete_repair(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    user.require_any(&[UserRole::Admin])?;
    state.repairs.delete(id).await?;
    Ok(Json(ApiResponse::message("Repair order deleted")))
}

async fn list_repair_parts(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<RepairSparePart>>>, AppError> {
    let lines = state.repairs.list_spare_parts(id).await?;
    Ok(Json(ApiResponse::success(lines)))
}

async fn attach_spare_part(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
    ValidatedJson(request): ValidatedJson<SparePartUsage>,
) -> Result<(StatusCode, Json<ApiResponse<RepairSparePart>>), AppError> {
    user.require_any(WORKSHOP)?;
    let line = state.repairs.attach_spare_part(id, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(line, "Spare part attached")),
    ))
}

async fn detach_spare_part(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path((id, spare_part_id)): Path<(i32, i32)>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    user.require_any(WORKSHOP)?;
    state.repairs.detach_spare_part(id, spare_part_id).await?;
    Ok(Json(ApiResponse::message("Spare part detached")))
}
