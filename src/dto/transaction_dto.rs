use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use crate::models::{transaction::PaymentStatus, vehicle::SourceType};
use crate::utils::validation::validate_non_negative_amount;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePurchaseRequest {
    pub source_type: SourceType,
    pub source_id: i32,
    pub vehicle_id: i32,
    #[validate(custom = "validate_non_negative_amount")]
    pub purchase_price: Decimal,
    #[validate(length(max = 50))]
    pub payment_method: Option<String>,
    pub payment_status: Option<PaymentStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSalesRequest {
    pub customer_id: i32,
    pub vehicle_id: i32,
    #[validate(custom = "validate_non_negative_amount")]
    pub selling_price: Decimal,
    #[validate(length(max = 50))]
    pub payment_method: Option<String>,
    pub payment_status: Option<PaymentStatus>,
    #[validate(custom = "validate_non_negative_amount")]
    pub down_payment: Option<Decimal>,
    pub notes: Option<String>,
}

// Actualización de pago; para ventas, anticipo + saldo deben sumar el precio
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PaymentUpdateRequest {
    pub payment_status: PaymentStatus,
    #[validate(custom = "validate_non_negative_amount")]
    pub down_payment: Option<Decimal>,
    #[validate(custom = "validate_non_negative_amount")]
    pub remaining_payment: Option<Decimal>,
    pub notes: Option<String>,
}
