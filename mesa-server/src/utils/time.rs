//! 时间工具函数 — 业务时区转换
//!
//! 所有日期/时刻→时间戳转换统一在这里完成，
//! 预订引擎内部只处理 `i64` Unix millis。

use chrono::{NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;

use super::{AppError, AppResult};

/// 解析日期字符串 (YYYY-MM-DD)
pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid date format: {}", date)))
}

/// 解析时刻字符串 (HH:MM)
pub fn parse_hhmm(time: &str) -> AppResult<NaiveTime> {
    NaiveTime::parse_from_str(time, "%H:%M")
        .map_err(|_| AppError::validation(format!("Invalid time format: {}", time)))
}

/// 日期 + 时刻 → Unix millis (业务时区)
///
/// DST gap fallback: 如果本地时间不存在 (夏令时跳跃)，fallback 到 UTC。
pub fn date_time_to_millis(date: NaiveDate, time: NaiveTime, tz: Tz) -> i64 {
    let naive = date.and_time(time);
    naive
        .and_local_timezone(tz)
        .latest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis())
}

/// Unix millis → 业务时区的 HH:MM 字符串
pub fn millis_to_hhmm(millis: i64, tz: Tz) -> String {
    match tz.timestamp_millis_opt(millis).latest() {
        Some(dt) => dt.format("%H:%M").to_string(),
        None => "??:??".to_string(),
    }
}

/// Unix millis → 业务时区的 YYYY-MM-DD 字符串
pub fn millis_to_date_string(millis: i64, tz: Tz) -> String {
    match tz.timestamp_millis_opt(millis).latest() {
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => String::new(),
    }
}

/// Unix millis → 业务时区的 NaiveDate
pub fn millis_to_date(millis: i64, tz: Tz) -> Option<NaiveDate> {
    tz.timestamp_millis_opt(millis)
        .latest()
        .map(|dt| dt.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TZ: Tz = chrono_tz::Europe::Madrid;

    #[test]
    fn date_roundtrip() {
        let date = parse_date("2026-08-27").unwrap();
        let time = parse_hhmm("19:30").unwrap();
        let millis = date_time_to_millis(date, time, TZ);
        assert_eq!(millis_to_hhmm(millis, TZ), "19:30");
        assert_eq!(millis_to_date_string(millis, TZ), "2026-08-27");
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse_date("27/08/2026").is_err());
        assert!(parse_hhmm("7pm").is_err());
        assert!(parse_hhmm("25:00").is_err());
    }
}
