//! Repository implementations for database operations.
//!
//! Each repository implements one of the domain store traits on PostgreSQL.

pub mod activity;
pub mod audit_log;
pub mod login_history;
pub mod session;
pub mod settings;
pub mod user;

pub use activity::ActivityRepository;
pub use audit_log::AuditLogRepository;
pub use login_history::LoginHistoryRepository;
pub use session::SessionRepository;
pub use settings::SettingsRepository;
pub use user::UserRepository;

use domain::services::StoreError;

/// Maps a database error onto the storage error the domain understands.
pub(crate) fn store_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound(err.to_string()),
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(err.to_string())
        }
        other => StoreError::Database(other.to_string()),
    }
}

/// Dynamic WHERE clause with positional parameters.
///
/// Conditions are pushed in the order their values will be bound.
#[derive(Debug, Default)]
pub(crate) struct FilterBuilder {
    conditions: Vec<String>,
    param_count: usize,
}

impl FilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `<lhs> $n` for the next parameter, e.g. `push("a.user_id =")`.
    pub fn push(&mut self, lhs: &str) {
        self.param_count += 1;
        self.conditions.push(format!("{} ${}", lhs, self.param_count));
    }

    /// Adds `lhs` only when the filter value is present.
    pub fn push_if<T>(&mut self, value: &Option<T>, lhs: &str) {
        if value.is_some() {
            self.push(lhs);
        }
    }

    /// The WHERE clause, or `TRUE` when nothing filters.
    pub fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            "TRUE".to_string()
        } else {
            self.conditions.join(" AND ")
        }
    }

    pub fn param_count(&self) -> usize {
        self.param_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_builder_empty() {
        let filter = FilterBuilder::new();
        assert_eq!(filter.where_clause(), "TRUE");
        assert_eq!(filter.param_count(), 0);
    }

    #[test]
    fn test_filter_builder_numbers_parameters_in_order() {
        let mut filter = FilterBuilder::new();
        filter.push_if(&Some(1), "a.user_id =");
        filter.push_if::<i32>(&None, "a.action =");
        filter.push_if(&Some("x"), "a.entity_type =");

        assert_eq!(filter.where_clause(), "a.user_id = $1 AND a.entity_type = $2");
        assert_eq!(filter.param_count(), 2);
    }

    #[test]
    fn test_store_error_mapping() {
        assert!(matches!(store_error(sqlx::Error::RowNotFound), StoreError::NotFound(_)));
        assert!(matches!(store_error(sqlx::Error::PoolTimedOut), StoreError::Unavailable(_)));
        assert!(matches!(
            store_error(sqlx::Error::Protocol("bad".into())),
            StoreError::Database(_)
        ));
    }
}
