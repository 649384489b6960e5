//! 时间解析：把存储或导出里的各种时间写法统一成 UTC
//!
//! 支持 RFC 3339（含 `Z` / 偏移量）、无时区的 ISO 写法（视为 UTC）、SQLite 的
//! `YYYY-MM-DD HH:MM:SS`、纯日期，以及秒 / 毫秒级 epoch。

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// 超过该值的 epoch 数值按毫秒处理
const EPOCH_MILLIS_THRESHOLD: i64 = 10_000_000_000;

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// 解析时间字符串；空串或无法识别时返回 None
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let candidate = value.trim();
    if candidate.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(candidate) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(candidate, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(candidate, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| Utc.from_utc_datetime(&naive));
    }
    candidate.parse::<i64>().ok().and_then(from_epoch)
}

/// epoch 秒或毫秒 → UTC
pub fn from_epoch(value: i64) -> Option<DateTime<Utc>> {
    if value.abs() > EPOCH_MILLIS_THRESHOLD {
        Utc.timestamp_millis_opt(value).single()
    } else {
        Utc.timestamp_opt(value, 0).single()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let dt = parse_timestamp("2026-02-27T10:00:00+02:00").unwrap();
        assert_eq!(dt.hour(), 8);
    }

    #[test]
    fn test_parse_zulu_and_naive() {
        let zulu = parse_timestamp("2026-02-27T10:00:00Z").unwrap();
        let naive = parse_timestamp("2026-02-27T10:00:00").unwrap();
        assert_eq!(zulu, naive);
    }

    #[test]
    fn test_parse_sqlite_current_timestamp() {
        let dt = parse_timestamp("2026-02-27 10:00:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2026, 2, 27, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_epoch_seconds_and_millis() {
        let secs = parse_timestamp("1772186400").unwrap();
        let millis = parse_timestamp("1772186400000").unwrap();
        assert_eq!(secs, millis);
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("   ").is_none());
        assert!(parse_timestamp("next tuesday").is_none());
    }
}
