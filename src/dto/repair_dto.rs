use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use crate::models::repair::RepairStatus;
use crate::utils::validation::validate_non_negative_amount;

// Apertura de una orden de reparación; assigned_by sale del usuario autenticado
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRepairOrderRequest {
    pub vehicle_id: i32,
    pub mechanic_id: i32,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(custom = "validate_non_negative_amount")]
    pub estimated_cost: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SparePartUsage {
    pub spare_part_id: i32,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateRepairProgressRequest {
    pub status: RepairStatus,
    #[validate(custom = "validate_non_negative_amount")]
    pub actual_cost: Option<Decimal>,
    pub notes: Option<String>,
    #[validate]
    #[serde(default)]
    pub spare_parts: Vec<SparePartUsage>,
}

impl UpdateRepairProgressRequest {
    pub fn to_status(status: RepairStatus) -> Self {
        Self {
            status,
            actual_cost: None,
            notes: None,
            spare_parts: Vec::new(),
        }
    }
}
