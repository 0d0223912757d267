use crate::models::user::User;
use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{is_unique_violation, RepositoryError, RepositoryResult};

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait UserRepository: Send + Sync {
    /// Fails with `AlreadyExists` when the email already owns an account.
    async fn create_user(
        &self,
        email: &str,
        fullname: &str,
        password_hash: &str,
    ) -> RepositoryResult<User>;
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;
    async fn update_password(&self, email: &str, password_hash: &str) -> RepositoryResult<()>;
}

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create_user(
        &self,
        email: &str,
        fullname: &str,
        password_hash: &str,
    ) -> RepositoryResult<User> {
        let id = Uuid::new_v4().to_string();

        let result = sqlx::query(
            "INSERT INTO users (id, email, fullname, password_hash) VALUES (?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(email)
        .bind(fullname)
        .bind(password_hash)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => self
                .find_by_email(email)
                .await?
                .ok_or(RepositoryError::NotFound),
            Err(e) if is_unique_violation(&e) => Err(RepositoryError::AlreadyExists),
            Err(e) => Err(RepositoryError::Database(e)),
        }
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, fullname, password_hash, created_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_password(&self, email: &str, password_hash: &str) -> RepositoryResult<()> {
        let result = sqlx::query("UPDATE users SET password_hash = ? WHERE email = ?")
            .bind(password_hash)
            .bind(email)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
