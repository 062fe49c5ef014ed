use chrono::{NaiveDate, TimeZone, Utc};

use crate::error::CoreError;

/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Parse a deadline supplied by a client.
///
/// Accepts a full RFC 3339 timestamp or a bare `YYYY-MM-DD` date, which is
/// interpreted as midnight UTC (the date pickers in the web client send the
/// latter).
pub fn parse_deadline(field: &str, value: &str) -> Result<Timestamp, CoreError> {
    let value = value.trim();

    if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| {
            CoreError::Validation(format!(
                "Invalid {field} '{value}'. Expected an ISO 8601 date or timestamp"
            ))
        })
}
