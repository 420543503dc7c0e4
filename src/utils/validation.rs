use crate::domain::model::Schedule;
use crate::utils::error::{BookingError, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(BookingError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(BookingError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(BookingError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(BookingError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(BookingError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(BookingError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

fn base58_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // 32 位元組公鑰的 base58 編碼長度為 32~44 字元
    PATTERN.get_or_init(|| {
        Regex::new(r"^[1-9A-HJ-NP-Za-km-z]{32,44}$").expect("static base58 pattern")
    })
}

pub fn validate_base58_address(field_name: &str, address: &str) -> Result<()> {
    if base58_pattern().is_match(address) {
        Ok(())
    } else {
        Err(BookingError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: address.to_string(),
            reason: "Expected a base58 encoded public key".to_string(),
        })
    }
}

/// 解析表單的日期 (YYYY-MM-DD) 與時間 (HH:MM)，拒絕過去的時間
pub fn parse_schedule(date: &str, time: &str, now: NaiveDateTime) -> Result<Schedule> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|e| {
        BookingError::InvalidSchedule {
            reason: format!("date '{}' is not YYYY-MM-DD ({})", date, e),
        }
    })?;
    let time = NaiveTime::parse_from_str(time.trim(), "%H:%M").map_err(|e| {
        BookingError::InvalidSchedule {
            reason: format!("time '{}' is not HH:MM ({})", time, e),
        }
    })?;

    let schedule = Schedule { date, time };
    ensure_not_past(&schedule, now)?;
    Ok(schedule)
}

pub fn ensure_not_past(schedule: &Schedule, now: NaiveDateTime) -> Result<()> {
    let requested = schedule.date.and_time(schedule.time);
    if requested < now {
        return Err(BookingError::InvalidSchedule {
            reason: format!("{} {} is in the past", schedule.date, schedule.time.format("%H:%M")),
        });
    }
    Ok(())
}
