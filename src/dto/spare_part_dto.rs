use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::spare_part::{NewSparePart, SparePartUpdate, StockOperation};
use crate::utils::validation::{validate_non_negative_amount, validate_not_blank};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSparePartRequest {
    #[validate(length(min = 1, max = 50), custom = "validate_not_blank")]
    pub code: String,
    #[validate(length(min = 1, max = 150))]
    pub name: String,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub category: String,
    #[validate(length(min = 1, max = 20))]
    pub unit: String,
    #[validate(custom = "validate_non_negative_amount")]
    pub purchase_price: Decimal,
    #[validate(custom = "validate_non_negative_amount")]
    pub selling_price: Decimal,
    #[validate(range(min = 0))]
    pub stock_quantity: Option<i32>,
    #[validate(range(min = 0))]
    pub minimum_stock: Option<i32>,
}

impl From<CreateSparePartRequest> for NewSparePart {
    fn from(request: CreateSparePartRequest) -> Self {
        Self {
            code: request.code.trim().to_string(),
            name: request.name,
            description: request.description,
            category: request.category,
            unit: request.unit,
            purchase_price: request.purchase_price,
            selling_price: request.selling_price,
            stock_quantity: request.stock_quantity.unwrap_or(0),
            minimum_stock: request.minimum_stock.unwrap_or(0),
        }
    }
}

// El stock no se toca aquí: solo vía ajuste de stock o reparaciones
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateSparePartRequest {
    #[validate(length(min = 1, max = 150))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub category: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub unit: Option<String>,
    #[validate(custom = "validate_non_negative_amount")]
    pub purchase_price: Option<Decimal>,
    #[validate(custom = "validate_non_negative_amount")]
    pub selling_price: Option<Decimal>,
    #[validate(range(min = 0))]
    pub minimum_stock: Option<i32>,
    pub is_active: Option<bool>,
}

impl From<UpdateSparePartRequest> for SparePartUpdate {
    fn from(request: UpdateSparePartRequest) -> Self {
        Self {
            name: request.name,
            description: request.description,
            category: request.category,
            unit: request.unit,
            purchase_price: request.purchase_price,
            selling_price: request.selling_price,
            minimum_stock: request.minimum_stock,
            is_active: request.is_active,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct StockAdjustmentRequest {
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub operation: StockOperation,
}

#[derive(Debug, Deserialize)]
pub struct StockAvailabilityQuery {
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StockAvailabilityResponse {
    pub spare_part_id: i32,
    pub requested: i32,
    pub available: bool,
}
