//! Login history repository.

use chrono::{DateTime, Utc};
use domain::models::{LoginHistoryQuery, LoginSession, NewLoginSession};
use domain::services::{LoginHistoryStore, StoreResult};
use shared::pagination::Page;
use sqlx::PgPool;
use uuid::Uuid;

use super::{store_error, FilterBuilder};
use crate::entities::LoginHistoryEntity;
use crate::metrics::QueryTimer;

const SELECT_COLUMNS: &str = r#"
    l.id, l.user_id, l.login_time, l.logout_time, l.session_duration, l.ip_address,
    l.user_agent, l.is_active,
    u.name AS actor_name, u.email AS actor_email, u.role AS actor_role
"#;

fn build_filter(query: &LoginHistoryQuery) -> FilterBuilder {
    let mut filter = FilterBuilder::new();
    filter.push_if(&query.user_id, "l.user_id =");
    filter.push_if(&query.is_active, "l.is_active =");
    filter.push_if(&query.start_date, "l.login_time >=");
    filter.push_if(&query.end_date, "l.login_time <=");
    filter
}

macro_rules! bind_login_filters {
    ($builder:expr, $query:expr) => {{
        let mut b = $builder;
        if let Some(user_id) = $query.user_id {
            b = b.bind(user_id);
        }
        if let Some(is_active) = $query.is_active {
            b = b.bind(is_active);
        }
        if let Some(start) = $query.start_date {
            b = b.bind(start);
        }
        if let Some(end) = $query.end_date {
            b = b.bind(end);
        }
        b
    }};
}

/// Repository for login history records.
#[derive(Clone)]
pub struct LoginHistoryRepository {
    pool: PgPool,
}

impl LoginHistoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads one row with the user joined.
    async fn fetch(&self, id: Uuid) -> Result<Option<LoginHistoryEntity>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {}
            FROM login_history l
            LEFT JOIN users u ON u.id = l.user_id
            WHERE l.id = $1
            "#,
            SELECT_COLUMNS
        );
        sqlx::query_as::<_, LoginHistoryEntity>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }
}

#[async_trait::async_trait]
impl LoginHistoryStore for LoginHistoryRepository {
    async fn create(&self, session: NewLoginSession) -> StoreResult<LoginSession> {
        let timer = QueryTimer::new("insert_login_history");
        let sql = format!(
            r#"
            WITH l AS (
                INSERT INTO login_history (user_id, login_time, ip_address, user_agent, is_active)
                VALUES ($1, $2, $3, $4, TRUE)
                RETURNING *
            )
            SELECT {}
            FROM l
            LEFT JOIN users u ON u.id = l.user_id
            "#,
            SELECT_COLUMNS
        );
        let result = sqlx::query_as::<_, LoginHistoryEntity>(&sql)
            .bind(session.user_id)
            .bind(session.login_time)
            .bind(&session.ip_address)
            .bind(&session.user_agent)
            .fetch_one(&self.pool)
            .await;
        timer.record();

        result.map(LoginSession::from).map_err(store_error)
    }

    async fn find(&self, id: Uuid) -> StoreResult<Option<LoginSession>> {
        let timer = QueryTimer::new("find_login_history");
        let result = self.fetch(id).await;
        timer.record();

        Ok(result.map_err(store_error)?.map(LoginSession::from))
    }

    async fn close(
        &self,
        id: Uuid,
        logout_time: DateTime<Utc>,
        session_duration: i64,
    ) -> StoreResult<Option<LoginSession>> {
        let timer = QueryTimer::new("close_login_history");
        // Guarded on is_active so a concurrent logout closes the row once.
        let updated = sqlx::query(
            r#"
            UPDATE login_history
            SET logout_time = $2, session_duration = $3, is_active = FALSE
            WHERE id = $1 AND is_active = TRUE
            "#,
        )
        .bind(id)
        .bind(logout_time)
        .bind(session_duration)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        if updated.rows_affected() == 0 {
            timer.record();
            return Ok(None);
        }

        let result = self.fetch(id).await;
        timer.record();
        Ok(result.map_err(store_error)?.map(LoginSession::from))
    }

    async fn list(&self, query: &LoginHistoryQuery) -> StoreResult<Page<LoginSession>> {
        let params = query.page_params();
        let filter = build_filter(query);
        let where_clause = filter.where_clause();
        let param_count = filter.param_count();

        let timer = QueryTimer::new("list_login_history");

        let count_sql = format!("SELECT COUNT(*) FROM login_history l WHERE {}", where_clause);
        let count_builder = sqlx::query_scalar::<_, i64>(&count_sql);
        let total = bind_login_filters!(count_builder, query)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;

        let list_sql = format!(
            r#"
            SELECT {}
            FROM login_history l
            LEFT JOIN users u ON u.id = l.user_id
            WHERE {}
            ORDER BY l.login_time DESC, l.id DESC
            LIMIT ${} OFFSET ${}
            "#,
            SELECT_COLUMNS,
            where_clause,
            param_count + 1,
            param_count + 2
        );
        let list_builder = sqlx::query_as::<_, LoginHistoryEntity>(&list_sql);
        let entities = bind_login_filters!(list_builder, query)
            .bind(params.limit)
            .bind(params.offset)
            .fetch_all(&self.pool)
            .await;
        timer.record();

        let items = entities
            .map_err(store_error)?
            .into_iter()
            .map(LoginSession::from)
            .collect();
        Ok(Page::new(items, total, params))
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> StoreResult<Vec<LoginSession>> {
        let timer = QueryTimer::new("list_login_history_for_user");
        let sql = format!(
            r#"
            SELECT {}
            FROM login_history l
            LEFT JOIN users u ON u.id = l.user_id
            WHERE l.user_id = $1
              AND ($2::timestamptz IS NULL OR l.login_time >= $2)
              AND ($3::timestamptz IS NULL OR l.login_time <= $3)
            ORDER BY l.login_time DESC
            "#,
            SELECT_COLUMNS
        );
        let result = sqlx::query_as::<_, LoginHistoryEntity>(&sql)
            .bind(user_id)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await;
        timer.record();

        Ok(result
            .map_err(store_error)?
            .into_iter()
            .map(LoginSession::from)
            .collect())
    }
}
