use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::user::{UserRole, UserSummary};
use crate::utils::validation::{validate_not_blank, validate_phone};

// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(custom = "validate_not_blank")]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: UserSummary,
}

// Alta de usuario (solo admin)
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterUserRequest {
    #[validate(length(min = 3, max = 100))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, max = 100))]
    pub password: String,
    #[validate(length(min = 2, max = 150))]
    pub full_name: String,
    #[validate(custom = "validate_phone")]
    pub phone: Option<String>,
    pub role: UserRole,
}
