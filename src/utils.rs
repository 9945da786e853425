//! Date/time helpers shared by evaluation and projection

use chrono::{DateTime, Utc};

/// Formats a DateTime to SCIM 2.0 compliant XSD dateTime format with
/// millisecond precision.
///
/// Example output: "2025-06-14T10:03:54.374Z"
pub fn format_scim_datetime(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Formats a DateTime to epoch timestamp (milliseconds since Unix epoch)
///
/// Example output: 1749895434374
pub fn format_epoch_datetime(dt: DateTime<Utc>) -> i64 {
    dt.timestamp_millis()
}

/// Formats a DateTime according to the specified format type
///
/// # Arguments
/// * `dt` - The DateTime to format
/// * `format_type` - Either "rfc3339" for standard format or "epoch" for timestamp
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use scim_query::utils::format_datetime_with_type;
///
/// let now = Utc::now();
/// let rfc3339 = format_datetime_with_type(now, "rfc3339");
/// let epoch = format_datetime_with_type(now, "epoch");
/// ```
pub fn format_datetime_with_type(dt: DateTime<Utc>, format_type: &str) -> String {
    match format_type {
        "epoch" => format_epoch_datetime(dt).to_string(),
        _ => format_scim_datetime(dt), // Default to rfc3339 for any other value
    }
}

/// Parses an RFC 3339 dateTime as written in a filter or stored value
pub fn parse_scim_datetime(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
