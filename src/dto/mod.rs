//! DTOs de la API
//!
//! Shapes de request/response de los handlers HTTP.

pub mod auth_dto;
pub mod common_dto;
pub mod party_dto;
pub mod repair_dto;
pub mod spare_part_dto;
pub mod transaction_dto;
pub mod vehicle_dto;

pub use common_dto::{ApiResponse, Page, PageRequest, Paginated};
