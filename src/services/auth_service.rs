//! Servicio de autenticación
//!
//! Login con bcrypt + JWT, perfil del usuario autenticado, alta y listado
//! de usuarios.

use std::sync::Arc;

use bcrypt::{hash, verify};
use tracing::{info, warn};

use crate::dto::auth_dto::{LoginRequest, LoginResponse, RegisterUserRequest};
use crate::models::user::{NewUser, User, UserFilter, UserRole, UserSummary};
use crate::repositories::Persistence;
use crate::utils::errors::{conflict_error, not_found_error, AppError, AppResult};
use crate::utils::jwt::{generate_token, JwtConfig};

const INVALID_CREDENTIALS: &str = "Invalid username or password";

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Persistence>,
    jwt: JwtConfig,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(store: Arc<dyn Persistence>, jwt: JwtConfig, bcrypt_cost: u32) -> Self {
        Self {
            store,
            jwt,
            bcrypt_cost,
        }
    }

    /// Autenticar usuario; credenciales erróneas y usuario inactivo dan el mismo error
    pub async fn login(&self, request: LoginRequest) -> AppResult<LoginResponse> {
        let username = request.username.trim();
        let mut uow = self.store.begin().await?;
        let user = uow.find_user_by_username(username).await?;
        uow.commit().await?;

        let user = match user {
            Some(user) if user.is_active => user,
            _ => {
                warn!("⚠️ Login fallido para {}", username);
                return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
            }
        };

        let valid = verify(&request.password, &user.password_hash)
            .map_err(|e| AppError::Hash(format!("Error verificando contraseña: {}", e)))?;
        if !valid {
            warn!("⚠️ Contraseña incorrecta para {}", username);
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let token = generate_token(&user, &self.jwt)?;
        info!("🔐 Login de {} ({})", user.username, user.role);

        Ok(LoginResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt.expiration,
            user: UserSummary::from(&user),
        })
    }

    pub async fn profile(&self, user_id: i32) -> AppResult<User> {
        let mut uow = self.store.begin().await?;
        let user = uow
            .find_user(user_id)
            .await?
            .ok_or_else(|| not_found_error("User", user_id))?;
        uow.commit().await?;
        Ok(user)
    }

    /// Usuarios por rol, p. ej. los mecánicos que se pueden asignar a una orden
    pub async fn list_users(&self, filter: &UserFilter) -> AppResult<Vec<User>> {
        let mut uow = self.store.begin().await?;
        let users = uow.list_users(filter).await?;
        uow.commit().await?;
        Ok(users)
    }

    pub async fn register(&self, request: RegisterUserRequest) -> AppResult<User> {
        let username = request.username.trim().to_string();
        let email = request.email.trim().to_lowercase();

        let mut uow = self.store.begin().await?;
        if uow.user_exists(&username, &email).await? {
            warn!("⚠️ Usuario o email ya registrado: {} / {}", username, email);
            return Err(conflict_error("User", "username or email", &username));
        }

        let password_hash = hash(&request.password, self.bcrypt_cost)
            .map_err(|e| AppError::Hash(format!("Error generando hash: {}", e)))?;
        let user = uow
            .insert_user(NewUser {
                username,
                email,
                password_hash,
                full_name: request.full_name,
                phone: request.phone,
                role: request.role,
            })
            .await?;
        uow.commit().await?;

        info!("✅ Usuario {} registrado como {}", user.username, user.role);
        Ok(user)
    }

    /// Crear el administrador inicial si su usuario aún no existe
    pub async fn ensure_admin(&self, username: &str, password: &str) -> AppResult<bool> {
        let mut uow = self.store.begin().await?;
        if uow.find_user_by_username(username).await?.is_some() {
            return Ok(false);
        }

        let password_hash = hash(password, self.bcrypt_cost)
            .map_err(|e| AppError::Hash(format!("Error generando hash: {}", e)))?;
        uow.insert_user(NewUser {
            username: username.to_string(),
            email: format!("{}@showroom.local", username),
            password_hash,
            full_name: "Administrator".to_string(),
            phone: None,
            role: UserRole::Admin,
        })
        .await?;
        uow.commit().await?;

        info!("✅ Administrador inicial {} creado", username);
        Ok(true)
    }
}
