//! Middleware de autenticación JWT
//!
//! Verifica el token, comprueba que el usuario siga existiendo y activo, e
//! inyecta `AuthenticatedUser` en las extensions de la request.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::{
    models::user::UserRole,
    state::AppState,
    utils::{
        errors::{forbidden_error, AppError},
        jwt::{extract_token_from_header, verify_token},
    },
};

/// Usuario autenticado que se inyecta en las requests
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    pub user_id: i32,
    pub username: String,
    pub role: UserRole,
}

impl AuthenticatedUser {
    /// Exigir uno de los roles indicados
    pub fn require_any(&self, roles: &[UserRole]) -> Result<(), AppError> {
        if roles.contains(&self.role) {
            return Ok(());
        }
        let allowed = roles
            .iter()
            .map(|r| r.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        Err(forbidden_error(
            "access this resource",
            &format!("role {} not in [{}]", self.role, allowed),
        ))
    }
}

/// Middleware de autenticación JWT
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Extraer token del header Authorization
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Authorization token required".to_string()))?;
    let token = extract_token_from_header(auth_header)?;

    let claims = verify_token(token, &state.jwt)?;

    // Verificar que el usuario existe y sigue activo
    let mut uow = state.store.begin().await?;
    let user = uow.find_user(claims.sub).await?;
    uow.commit().await?;

    let user = match user {
        Some(user) if user.is_active => user,
        Some(_) => {
            return Err(AppError::Unauthorized("User is inactive".to_string()));
        }
        None => {
            return Err(AppError::Unauthorized("User no longer exists".to_string()));
        }
    };

    request.extensions_mut().insert(AuthenticatedUser {
        user_id: user.id,
        username: user.username,
        role: user.role,
    });

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: UserRole) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: 1,
            username: "someone".into(),
            role,
        }
    }

    #[test]
    fn test_require_any() {
        assert!(user(UserRole::Admin)
            .require_any(&[UserRole::Admin, UserRole::Cashier])
            .is_ok());
        assert!(matches!(
            user(UserRole::Mechanic).require_any(&[UserRole::Admin, UserRole::Cashier]),
            Err(AppError::Forbidden(_))
        ));
    }
}
