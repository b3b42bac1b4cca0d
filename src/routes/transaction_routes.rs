use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Extension, Json, Router,
};

use crate::dto::{
    transaction_dto::{CreatePurchaseRequest, CreateSalesRequest, PaymentUpdateRequest},
    ApiResponse, PageRequest, Paginated,
};
use crate::middleware::AuthenticatedUser;
use crate::models::{
    transaction::{PurchaseTransaction, SalesTransaction, TransactionFilter},
    user::UserRole,
};
use crate::state::AppState;
use crate::utils::{errors::AppError, validation::ValidatedJson};

const FRONT_DESK: &[UserRole] = &[UserRole::Admin, UserRole::Cashier];

pub fn create_transaction_router() -> Router<AppState> {
    Router::new()
        .route("/purchases", get(list_purchases).post(create_purchase))
        .route("/purchases/:id", get(get_purchase))
        .route("/purchases/:id/payment", patch(update_purchase_payment))
        .route("/sales", get(list_sales).post(create_sales))
        .route("/sales/:id", get(get_sales))
        .route("/sales/:id/payment", patch(update_sales_payment))
}

async fn create_purchase(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<CreatePurchaseRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PurchaseTransaction>>), AppError> {
    user.require_any(FRONT_DESK)?;
    let purchase = state
        .transactions
        .create_purchase(user.user_id, request)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(purchase, "Purchase recorded")),
    ))
}

async fn list_purchases(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(filter): Query<TransactionFilter>,
    Query(page): Query<PageRequest>,
) -> Result<Json<ApiResponse<Paginated<PurchaseTransaction>>>, AppError> {
    user.require_any(FRONT_DESK)?;
    let purchases = state
        .transactions
        .list_purchases(&filter, page.normalize())
        .await?;
    Ok(Json(ApiResponse::success(purchases)))
}

async fn get_purchase(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<PurchaseTransaction>>, AppError> {
    user.require_any(FRONT_DESK)?;
    let purchase = state.transactions.get_purchase(id).await?;
    Ok(Json(ApiResponse::success(purchase)))
}

async fn update_purchase_payment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
    ValidatedJson(request): ValidatedJson<PaymentUpdateRequest>,
) -> Result<Json<ApiResponse<PurchaseTransaction>>, AppError> {
    user.require_any(FRONT_DESK)?;
    let purchase = state
        .transactions
        .update_purchase_payment(id, request)
        .await?;
    Ok(Json(ApiResponse::success_with_message(purchase, "Payment updated")))
}

async fn create_sales(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<CreateSalesRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SalesTransaction>>), AppError> {
    user.require_any(FRONT_DESK)?;
    let sales = state.transactions.create_sales(user.user_id, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(sales, "Sale recorded")),
    ))
}

async fn list_sales(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(filter): Query<TransactionFilter>,
    Query(page): Query<PageRequest>,
) -> Result<Json<ApiResponse<Paginated<SalesTransaction>>>, AppError> {
    user.require_any(FRONT_DESK)?;
    let sales = state
        .transactions
        .list_sales(&filter, page.normalize())
        .await?;
    Ok(Json(ApiResponse::success(sales)))
}

async fn get_sales(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<SalesTransaction>>, AppError> {
    user.require_any(FRONT_DESK)?;
    let sales = state.transactions.get_sales(id).await?;
    Ok(Json(ApiResponse::success(sales)))
}

async fn update_sales_payment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
    ValidatedJson(request): ValidatedJson<PaymentUpdateRequest>,
) -> Result<Json<ApiResponse<SalesTransaction>>, AppError> {
    user.require_any(FRONT_DESK)?;
    let sales = state.transactions.update_sales_payment(id, request).await?;
    Ok(Json(ApiResponse::success_with_message(sales, "Payment updated")))
}
