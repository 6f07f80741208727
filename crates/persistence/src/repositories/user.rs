//! User directory repository.

use domain::models::UserProfile;
use domain::services::{StoreResult, UserDirectory};
use sqlx::PgPool;
use uuid::Uuid;

use super::store_error;
use crate::entities::UserEntity;
use crate::metrics::QueryTimer;

/// Repository for reading user profiles.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserDirectory for UserRepository {
    async fn find(&self, user_id: Uuid) -> StoreResult<Option<UserProfile>> {
        let timer = QueryTimer::new("find_user_by_id");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, name, email, role, permissions, is_active, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        Ok(result.map_err(store_error)?.map(UserProfile::from))
    }

    async fn list(&self, ids: Option<&[Uuid]>) -> StoreResult<Vec<UserProfile>> {
        let timer = QueryTimer::new("list_users");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, name, email, role, permissions, is_active, created_at, updated_at
            FROM users
            WHERE ($1::uuid[] IS NULL OR id = ANY($1))
            ORDER BY name ASC
            "#,
        )
        .bind(ids.map(<[Uuid]>::to_vec))
        .fetch_all(&self.pool)
        .await;
        timer.record();

        Ok(result
            .map_err(store_error)?
            .into_iter()
            .map(UserProfile::from)
            .collect())
    }
}
