use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use crate::models::vehicle::{ConditionStatus, NewVehicle, SourceType, VehicleDetailsUpdate};
use crate::utils::validation::{validate_non_negative_amount, validate_not_blank};

// Request para dar de alta un vehículo
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVehicleRequest {
    #[validate(length(min = 1, max = 50), custom = "validate_not_blank")]
    pub code: String,
    #[validate(length(min = 1, max = 100))]
    pub brand: String,
    #[validate(length(min = 1, max = 100))]
    pub model: String,
    #[validate(range(min = 1900, max = 2100))]
    pub year: i32,
    pub color: Option<String>,
    pub license_plate: Option<String>,
    pub chassis_number: Option<String>,
    #[validate(range(min = 0))]
    pub odometer: Option<i32>,
    pub source_type: SourceType,
    pub source_id: Option<i32>,
    #[validate(custom = "validate_non_negative_amount")]
    pub purchase_price: Decimal,
    pub condition_status: ConditionStatus,
    pub notes: Option<String>,
}

impl CreateVehicleRequest {
    pub fn into_new_vehicle(self, created_by: i32) -> NewVehicle {
        NewVehicle {
            code: self.code.trim().to_string(),
            brand: self.brand,
            model: self.model,
            year: self.year,
            color: self.color,
            license_plate: self.license_plate,
            chassis_number: self.chassis_number,
            odometer: self.odometer.unwrap_or(0),
            source_type: self.source_type,
            source_id: self.source_id,
            purchase_price: self.purchase_price,
            condition_status: self.condition_status,
            notes: self.notes,
            created_by,
        }
    }
}

// Request para actualizar datos descriptivos; estado y costos no forman parte
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateVehicleRequest {
    #[validate(length(min = 1, max = 100))]
    pub model: Option<String>,
    #[validate(range(min = 1900, max = 2100))]
    pub year: Option<i32>,
    pub color: Option<String>,
    pub license_plate: Option<String>,
    pub chassis_number: Option<String>,
    #[validate(range(min = 0))]
    pub odometer: Option<i32>,
    pub condition_status: Option<ConditionStatus>,
    pub notes: Option<String>,
}

impl From<UpdateVehicleRequest> for VehicleDetailsUpdate {
    fn from(request: UpdateVehicleRequest) -> Self {
        Self {
            model: request.model,
            year: request.year,
            color: request.color,
            license_plate: request.license_plate,
            chassis_number: request.chassis_number,
            odometer: request.odometer,
            condition_status: request.condition_status,
            notes: request.notes,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct SetSellingPriceRequest {
    #[validate(custom = "validate_non_negative_amount")]
    pub selling_price: Decimal,
}
