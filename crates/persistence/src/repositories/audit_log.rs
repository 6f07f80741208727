//! Audit log repository for database operations.

use domain::models::{AuditEntry, AuditLogQuery, NewAuditEntry};
use domain::services::{AuditLogStore, StoreResult};
use shared::pagination::Page;
use sqlx::PgPool;

use super::{store_error, FilterBuilder};
use crate::entities::AuditLogEntity;
use crate::metrics::QueryTimer;

const SELECT_COLUMNS: &str = r#"
    a.id, a.action, a.entity_type, a.entity_id, a.user_id, a.user_name, a.user_email,
    a.user_role, a.changes, a.ip_address, a.user_agent, a.created_at,
    u.name AS actor_name, u.email AS actor_email, u.role AS actor_role
"#;

fn build_filter(query: &AuditLogQuery) -> FilterBuilder {
    let mut filter = FilterBuilder::new();
    filter.push_if(&query.user_id, "a.user_id =");
    filter.push_if(&query.action, "a.action =");
    filter.push_if(&query.entity_type, "a.entity_type =");
    filter.push_if(&query.entity_id, "a.entity_id =");
    filter.push_if(&query.start_date, "a.created_at >=");
    filter.push_if(&query.end_date, "a.created_at <=");
    filter
}

/// Binds the optional filters in the order `build_filter` numbered them.
macro_rules! bind_audit_filters {
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
        if let Some(ref entity_id) = $query.entity_id {
            b = b.bind(entity_id);
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

/// Repository for audit log database operations.
#[derive(Clone)]
pub struct AuditLogRepository {
    pool: PgPool,
}

impl AuditLogRepository {
    /// Create a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl AuditLogStore for AuditLogRepository {
    async fn insert(&self, entry: NewAuditEntry) -> StoreResult<AuditEntry> {
        let timer = QueryTimer::new("insert_audit_log");
        let sql = format!(
            r#"
            WITH a AS (
                INSERT INTO audit_logs (
                    action, entity_type, entity_id, user_id, user_name, user_email,
                    user_role, changes, ip_address, user_agent, created_at
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
        let result = sqlx::query_as::<_, AuditLogEntity>(&sql)
            .bind(entry.action.to_string())
            .bind(&entry.entity_type)
            .bind(&entry.entity_id)
            .bind(entry.user_id)
            .bind(&entry.user_name)
            .bind(&entry.user_email)
            .bind(&entry.user_role)
            .bind(&entry.changes)
            .bind(&entry.ip_address)
            .bind(&entry.user_agent)
            .bind(entry.created_at)
            .fetch_one(&self.pool)
            .await;
        timer.record();

        result.map(AuditEntry::from).map_err(store_error)
    }

    async fn list(&self, query: &AuditLogQuery) -> StoreResult<Page<AuditEntry>> {
        let params = query.page_params();
        let filter = build_filter(query);
        let where_clause = filter.where_clause();
        let param_count = filter.param_count();

        let timer = QueryTimer::new("list_audit_logs");

        let count_sql = format!("SELECT COUNT(*) FROM audit_logs a WHERE {}", where_clause);
        let count_builder = sqlx::query_scalar::<_, i64>(&count_sql);
        let total = bind_audit_filters!(count_builder, query)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;

        let list_sql = format!(
            r#"
            SELECT {}
            FROM audit_logs a
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
        let list_builder = sqlx::query_as::<_, AuditLogEntity>(&list_sql);
        let entities = bind_audit_filters!(list_builder, query)
            .bind(params.limit)
            .bind(params.offset)
            .fetch_all(&self.pool)
            .await;
        timer.record();

        let items = entities
            .map_err(store_error)?
            .into_iter()
            .map(AuditEntry::from)
            .collect();
        Ok(Page::new(items, total, params))
    }
}
