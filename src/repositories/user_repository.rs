use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};

use super::{postgres::PgUnitOfWork, UserStore};
use crate::models::user::{NewUser, User, UserFilter};
use crate::utils::errors::AppResult;

#[async_trait]
impl UserStore for PgUnitOfWork {
    async fn find_user(&mut self, id: i32) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(self.conn()?)
            .await?;
        Ok(user)
    }

    async fn find_user_by_username(&mut self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(self.conn()?)
            .await?;
        Ok(user)
    }

    async fn user_exists(&mut self, username: &str, email: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 OR email = $2)",
        )
        .bind(username)
        .bind(email)
        .fetch_one(self.conn()?)
        .await?;
        Ok(exists)
    }

    async fn insert_user(&mut self, user: NewUser) -> AppResult<User> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash, full_name, phone, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(user.username)
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.full_name)
        .bind(user.phone)
        .bind(user.role)
        .fetch_one(self.conn()?)
        .await?;
        Ok(created)
    }

    async fn list_users(&mut self, filter: &UserFilter) -> AppResult<Vec<User>> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM users WHERE 1 = 1");
        if let Some(role) = filter.role {
            query.push(" AND role = ").push_bind(role);
        }
        if let Some(active) = filter.is_active {
            query.push(" AND is_active = ").push_bind(active);
        }
        query.push(" ORDER BY full_name ASC, id ASC");
        let users = query
            .build_query_as::<User>()
            .fetch_all(self.conn()?)
            .await?;
        Ok(users)
    }
}
