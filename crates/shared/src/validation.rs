//! Common validation utilities.

use chrono::{DateTime, Utc};
use validator::ValidationError;

/// Validates that an optional date window is not inverted.
pub fn validate_date_range(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<(), ValidationError> {
    match (start, end) {
        (Some(start), Some(end)) if start > end => {
            let mut err = ValidationError::new("date_range");
            err.message = Some("startDate must not be after endDate".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

/// Validates an entity type label used in audit and activity filters.
///
/// Entity types are short identifiers such as `truck` or `USER_SESSION`.
pub fn validate_entity_type(value: &str) -> Result<(), ValidationError> {
    let valid = !value.is_empty()
        && value.len() <= 64
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        let mut err = ValidationError::new("entity_type");
        err.message = Some("Entity type must be 1-64 alphanumeric, '_' or '-' characters".into());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_validate_date_range_ok() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        assert!(validate_date_range(Some(start), Some(end)).is_ok());
        assert!(validate_date_range(Some(start), None).is_ok());
        assert!(validate_date_range(None, Some(end)).is_ok());
        assert!(validate_date_range(None, None).is_ok());
        assert!(validate_date_range(Some(start), Some(start)).is_ok());
    }

    #[test]
    fn test_validate_date_range_inverted() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let err = validate_date_range(Some(start), Some(end)).unwrap_err();
        assert_eq!(err.code, "date_range");
    }

    #[test]
    fn test_validate_entity_type() {
        assert!(validate_entity_type("truck").is_ok());
        assert!(validate_entity_type("USER_SESSION").is_ok());
        assert!(validate_entity_type("maintenance-record").is_ok());
        assert!(validate_entity_type("").is_err());
        assert!(validate_entity_type("truck; DROP TABLE").is_err());
        assert!(validate_entity_type(&"x".repeat(65)).is_err());
    }
}
