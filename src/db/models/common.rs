//! Common types and utilities shared across models.

use chrono::{DateTime, SecondsFormat, Utc};

/// Timestamp format stored in every `*_at` column.
///
/// Fixed-width millisecond RFC 3339 in UTC, so string comparison in SQL
/// orders the same way as time.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

/// Calendar date (UTC) used for workout entries
pub fn today() -> String {
    Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

/// Round to two decimal places, half away from zero
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamps_sort_lexically() {
        let a = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let b = a + chrono::Duration::milliseconds(5);
        let c = a + chrono::Duration::hours(30);
        let (sa, sb, sc) = (format_timestamp(a), format_timestamp(b), format_timestamp(c));
        assert_eq!(sa, "2024-01-01T09:00:00.000Z");
        assert!(sa < sb && sb < sc);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(22.857142), 22.86);
        assert_eq!(round2(18.5), 18.5);
        assert_eq!(round2(0.004), 0.0);
    }

    #[test]
    fn test_today_format() {
        let d = today();
        assert_eq!(d.len(), 10);
        assert!(chrono::NaiveDate::parse_from_str(&d, "%Y-%m-%d").is_ok());
    }
}
