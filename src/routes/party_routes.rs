use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};

use crate::dto::{
    party_dto::{
        CreateCustomerRequest, CreateSupplierRequest, UpdateCustomerRequest,
        UpdateSupplierRequest,
    },
    ApiResponse, PageRequest, Paginated,
};
use crate::middleware::AuthenticatedUser;
use crate::models::{
    party::{Customer, PartyFilter, Supplier},
    user::UserRole,
};
use crate::state::AppState;
use crate::utils::{errors::AppError, validation::ValidatedJson};

const WRITERS: &[UserRole] = &[UserRole::Admin, UserRole::Cashier];

pub fn create_customer_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route("/phone/:phone", get(get_customer_by_phone))
        .route("/email/:email", get(get_customer_by_email))
        .route(
            "/:id",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
}

pub fn create_supplier_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_suppliers).post(create_supplier))
        .route(
            "/:id",
            get(get_supplier).put(update_supplier).delete(delete_supplier),
        )
}

async fn list_customers(
    State(state): State<AppState>,
    Query(filter): Query<PartyFilter>,
    Query(page): Query<PageRequest>,
) -> Result<Json<ApiResponse<Paginated<Customer>>>, AppError> {
    let customers = state.parties.list_customers(&filter, page.normalize()).await?;
    Ok(Json(ApiResponse::success(customers)))
}

async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Customer>>, AppError> {
    let customer = state.parties.get_customer(id).await?;
    Ok(Json(ApiResponse::success(customer)))
}

async fn get_customer_by_phone(
    State(state): State<AppState>,
    Path(phone): Path<String>,
) -> Result<Json<ApiResponse<Customer>>, AppError> {
    let customer = state.parties.find_customer_by_phone(&phone).await?;
    Ok(Json(ApiResponse::success(customer)))
}

async fn get_customer_by_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<ApiResponse<Customer>>, AppError> {
    let customer = state.parties.find_customer_by_email(&email).await?;
    Ok(Json(ApiResponse::success(customer)))
}

async fn create_customer(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Customer>>), AppError> {
    user.require_any(WRITERS)?;
    let customer = state.parties.create_customer(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(customer, "Customer created")),
    ))
}

async fn update_customer(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
    ValidatedJson(request): ValidatedJson<UpdateCustomerRequest>,
) -> Result<Json<ApiResponse<Customer>>, AppError> {
    user.require_any(WRITERS)?;
    let customer = state.parties.update_customer(id, request).await?;
    Ok(Json(ApiResponse::success_with_message(customer, "Customer updated")))
}

async fn delete_customer(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    user.require_any(&[UserRole::Admin])?;
    state.parties.delete_customer(id).await?;
    Ok(Json(ApiResponse::message("Customer deleted")))
}

async fn list_suppliers(
    State(state): State<AppState>,
    Query(filter): Query<PartyFilter>,
    Query(page): Query<PageRequest>,
) -> Result<Json<ApiResponse<Paginated<Supplier>>>, AppError> {
    let suppliers = state.parties.list_suppliers(&filter, page.normalize()).await?;
    Ok(Json(ApiResponse::success(suppliers)))
}

async fn get_supplier(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Supplier>>, AppError> {
    let supplier = state.parties.get_supplier(id).await?;
    Ok(Json(ApiResponse::success(supplier)))
}

async fn create_supplier(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<CreateSupplierRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Supplier>>), AppError> {
    user.require_any(WRITERS)?;
    let supplier = state.parties.create_supplier(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(supplier, "Supplier created")),
    ))
}

async fn update_supplier(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
    ValidatedJson(request): ValidatedJson<UpdateSupplierRequest>,
) -> Result<Json<ApiResponse<Supplier>>, AppError> {
    user.require_any(WRITERS)?;
    let supplier = state.parties.update_supplier(id, request).await?;
    Ok(Json(ApiResponse::success_with_message(supplier, "Supplier updated")))
}

async fn delete_supplier(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    user.require_any(&[UserRole::Admin])?;
    state.parties.delete_supplier(id).await?;
    Ok(Json(ApiResponse::message("Supplier deleted")))
}
