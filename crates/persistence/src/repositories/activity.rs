//! User activity repository.

use chrono::{DateTime, Utc};
use domain::models::{ActivityEntry, ActivityQuery, NewActivityEntry};
use domain::services::{ActivityStore, StoreResult};
use shared::pagination::Page;
use sqlx::PgPool;
use uuid::Uuid;

use super::{store_error, FilterBuilder};
use crate::entities::ActivityEntity;
use crate::metrics::QueryTimer;

const SELECT_COLUMNS: &str = r#"
    a.id, a.user_id, a.action, a.entity_type, a.entity_id, a.entity_name, a.old_values,
    a.new_values, a.ip_address, a.user_agent, a.metadata, a.created_at,
    u.name AS actor_name, u.email AS actor_email, u.role AS actor_role
"#;

fn build_filter(query: &ActivityQuery) -> FilterBuilder {
    let mut filter = FilterBuilder::new();
    filter.push_if(&query.user_id, "a.user_id =");
    filter.push_if(&query.action, "a.action =");
    filter.push_if(&query.entity_type, "a.entity_type =");
    filter.push_if(&query.start_date, "a.created_at >=");
    filter.push_if(&query.end_date, "a.created_at <=");
    filter
}

macro_rules! bind_activity_filters {
    ($builder:expr, $query:expr) => {{
        let mut b = $builder;
        if let Some(user_id) = $query.user_id {
            b = b.bind(user_id);
        }
        if let Some(action) = $query.action {
            b = b.bind(action.to_string());
        }
        if let Some(ref entity_type) = $query.entity_type {
            b = b.bind(entity_type);
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

/// Repository for user activity records.
#[derive(Clone)]
pub struct ActivityRepository {
    pool: PgPool,
}

impl ActivityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ActivityStore for ActivityRepository {
    async fn insert(&self, entry: NewActivityEntry) -> StoreResult<ActivityEntry> {
        let timer = QueryTimer::new("insert_user_activity");
        let sql = format!(
            r#"
            WITH a AS (
                INSERT INTO user_activities (
                    user_id, action, entity_type, entity_id, entity_name, old_values,
                    new_values, ip_address, user_agent, metadata, created_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                RETURNING *
            )
            SELECT {}
            FROM a
            LEFT JOIN users u ON u.id = a.user_id
            "#,
            SELECT_COLUMNS
        );
        let result = sqlx::query_as::<_, ActivityEntity>(&sql)
            .bind(entry.user_id)
            .bind(entry.action.to_string())
            .bind(&entry.entity_type)
            .bind(&entry.entity_id)
            .bind(&entry.entity_name)
            .bind(&entry.old_values)
            .bind(&entry.new_values)
            .bind(&entry.ip_address)
            .bind(&entry.user_agent)
            .bind(&entry.metadata)
            .bind(entry.created_at)
            .fetch_one(&self.pool)
            .await;
        timer.record();

        result.map(ActivityEntry::from).map_err(store_error)
    }

    async fn list(&self, query: &ActivityQuery) -> StoreResult<Page<ActivityEntry>> {
        let params = query.page_params();
        let filter = build_filter(query);
        let where_clause = filter.where_clause();
        let param_count = filter.param_count();

        let timer = QueryTimer::new("list_user_activities");

        let count_sql = format!("SELECT COUNT(*) FROM user_activities a WHERE {}", where_clause);
        let count_builder = sqlx::query_scalar::<_, i64>(&count_sql);
        let total = bind_activity_filters!(count_builder, query)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;

        let list_sql = format!(
            r#"
            SELECT {}
            FROM user_activities a
            LEFT JOIN users u ON u.id = a.user_id
            WHERE {}
            ORDER BY a.created_at DESC, a.id DESC
            LIMIT ${} OFFSET ${}
            "#,
            SELECT_COLUMNS,
            where_clause,
            param_count + 1,
            param_count + 2
        );
        let list_builder = sqlx::query_as::<_, ActivityEntity>(&list_sql);
        let entities = bind_activity_filters!(list_builder, query)
            .bind(params.limit)
            .bind(params.offset)
            .fetch_all(&self.pool)
            .await;
        timer.record();

        let items = entities
            .map_err(store_error)?
            .into_iter()
            .map(ActivityEntry::from)
            .collect();
        Ok(Page::new(items, total, params))
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> StoreResult<Vec<ActivityEntry>> {
        let timer = QueryTimer::new("list_user_activities_for_user");
        let sql = format!(
            r#"
            SELECT {}
            FROM user_activities a
            LEFT JOIN users u ON u.id = a.user_id
            WHERE a.user_id = $1
              AND ($2::timestamptz IS NULL OR a.created_at >= $2)
              AND ($3::timestamptz IS NULL OR a.created_at <= $3)
            ORDER BY a.created_at DESC
            "#,
            SELECT_COLUMNS
        );
        let result = sqlx::query_as::<_, ActivityEntity>(&sql)
            .bind(user_id)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await;
        timer.record();

        Ok(result
            .map_err(store_error)?
            .into_iter()
            .map(ActivityEntry::from)
            .collect())
    }
}
