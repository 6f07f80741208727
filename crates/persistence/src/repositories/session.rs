//! Session registry repository.
//!
//! Session ids are bearer secrets, so only their SHA-256 is stored.

use chrono::{DateTime, Utc};
use domain::models::SessionHandle;
use domain::services::{SessionRegistry, StoreResult};
use shared::crypto::sha256_hex;
use sqlx::PgPool;

use super::store_error;
use crate::entities::UserSessionEntity;
use crate::metrics::QueryTimer;

/// Repository for the session id to login record mapping.
#[derive(Clone)]
pub struct SessionRepository {
    pool: PgPool,
    purge_batch_size: i64,
}

impl SessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            purge_batch_size: 10_000,
        }
    }
}

#[async_trait::async_trait]
impl SessionRegistry for SessionRepository {
    async fn insert(&self, session_id: &str, handle: SessionHandle) -> StoreResult<()> {
        let timer = QueryTimer::new("insert_user_session");
        let result = sqlx::query(
            r#"
            INSERT INTO user_sessions (session_hash, user_id, login_history_id, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (session_hash) DO UPDATE
            SET user_id = EXCLUDED.user_id,
                login_history_id = EXCLUDED.login_history_id,
                created_at = EXCLUDED.created_at
            "#,
        )
        .bind(sha256_hex(session_id))
        .bind(handle.user_id)
        .bind(handle.login_history_id)
        .bind(handle.created_at)
        .execute(&self.pool)
        .await;
        timer.record();

        result.map(|_| ()).map_err(store_error)
    }

    async fn get(&self, session_id: &str) -> StoreResult<Option<SessionHandle>> {
        let timer = QueryTimer::new("find_user_session");
        let result = sqlx::query_as::<_, UserSessionEntity>(
            r#"
            SELECT session_hash, user_id, login_history_id, created_at
            FROM user_sessions
            WHERE session_hash = $1
            "#,
        )
        .bind(sha256_hex(session_id))
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        Ok(result.map_err(store_error)?.map(SessionHandle::from))
    }

    async fn remove(&self, session_id: &str) -> StoreResult<Option<SessionHandle>> {
        let timer = QueryTimer::new("delete_user_session");
        let result = sqlx::query_as::<_, UserSessionEntity>(
            r#"
            DELETE FROM user_sessions
            WHERE session_hash = $1
            RETURNING session_hash, user_id, login_history_id, created_at
            "#,
        )
        .bind(sha256_hex(session_id))
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        Ok(result.map_err(store_error)?.map(SessionHandle::from))
    }

    async fn purge_issued_before(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        let mut total: u64 = 0;

        // Batched so a large backlog never holds a long lock.
        loop {
            let timer = QueryTimer::new("purge_user_sessions");
            let result = sqlx::query(
                r#"
                WITH stale AS (
                    SELECT session_hash FROM user_sessions
                    WHERE created_at < $1
                    LIMIT $2
                )
                DELETE FROM user_sessions
                WHERE session_hash IN (SELECT session_hash FROM stale)
                "#,
            )
            .bind(cutoff)
            .bind(self.purge_batch_size)
            .execute(&self.pool)
            .await;
            timer.record();

            let deleted = result.map_err(store_error)?.rows_affected();
            total += deleted;
            if deleted < self.purge_batch_size as u64 {
                break;
            }
            tokio::task::yield_now().await;
        }

        Ok(total)
    }
}
