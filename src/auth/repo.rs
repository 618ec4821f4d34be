use async_trait::async_trait;

use crate::auth::repo_types::{NewUser, User, UserId};
use crate::db::{classify, PgStore, Violation};
use crate::error::{ServiceError, ServiceResult};

/// Persistence for user identity records.
///
/// Implementations enforce uniqueness of id and username atomically with the insert.
#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Fails with `DuplicateId` or `DuplicateUsername` on conflict.
    async fn create(&self, user: NewUser) -> ServiceResult<User>;

    async fn find_by_username(&self, username: &str) -> ServiceResult<Option<User>>;

    async fn find_by_id(&self, id: UserId) -> ServiceResult<Option<User>>;
}

#[async_trait]
impl UserRepo for PgStore {
    async fn create(&self, user: NewUser) -> ServiceResult<User> {
        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, password_hash, created_at
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(created) => Ok(created),
            Err(e) => match classify(&e) {
                Violation::Unique {
                    constraint: Some("users_username_key"),
                } => Err(ServiceError::DuplicateUsername(user.username)),
                Violation::Unique { .. } => Err(ServiceError::DuplicateId(user.id)),
                _ => Err(e.into()),
            },
        }
    }

    async fn find_by_username(&self, username: &str) -> ServiceResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> ServiceResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}
