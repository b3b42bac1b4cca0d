use serde::Deserialize;
use validator::Validate;

use crate::models::party::{CustomerUpdate, NewCustomer, NewSupplier, SupplierUpdate};
use crate::utils::validation::{validate_not_blank, validate_phone};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCustomerRequest {
    #[validate(length(min = 2, max = 150), custom = "validate_not_blank")]
    pub name: String,
    #[validate(custom = "validate_phone")]
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub address: Option<String>,
    #[validate(length(max = 50))]
    pub id_card_number: Option<String>,
}

impl From<CreateCustomerRequest> for NewCustomer {
    fn from(request: CreateCustomerRequest) -> Self {
        Self {
            name: request.name,
            phone: request.phone,
            email: request.email,
            address: request.address,
            id_card_number: request.id_card_number,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCustomerRequest {
    #[validate(length(min = 2, max = 150))]
    pub name: Option<String>,
    #[validate(custom = "validate_phone")]
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub address: Option<String>,
    #[validate(length(max = 50))]
    pub id_card_number: Option<String>,
}

impl From<UpdateCustomerRequest> for CustomerUpdate {
    fn from(request: UpdateCustomerRequest) -> Self {
        Self {
            name: request.name,
            phone: request.phone,
            email: request.email,
            address: request.address,
            id_card_number: request.id_card_number,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSupplierRequest {
    #[validate(length(min = 2, max = 150), custom = "validate_not_blank")]
    pub name: String,
    #[validate(length(max = 100))]
    pub contact_person: Option<String>,
    #[validate(custom = "validate_phone")]
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub address: Option<String>,
}

impl From<CreateSupplierRequest> for NewSupplier {
    fn from(request: CreateSupplierRequest) -> Self {
        Self {
            name: request.name,
            contact_person: request.contact_person,
            phone: request.phone,
            email: request.email,
            address: request.address,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateSupplierRequest {
    #[validate(length(min = 2, max = 150))]
    pub name: Option<String>,
    #[validate(length(max = 100))]
    pub contact_person: Option<String>,
    #[validate(custom = "validate_phone")]
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub address: Option<String>,
    pub is_active: Option<bool>,
}

impl From<UpdateSupplierRequest> for SupplierUpdate {
    fn from(request: UpdateSupplierRequest) -> Self {
        Self {
            name: request.name,
            contact_person: request.contact_person,
            phone: request.phone,
            email: request.email,
            address: request.address,
            is_active: request.is_active,
        }
    }
}
