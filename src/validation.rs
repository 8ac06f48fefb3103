use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use regex::Regex;

use crate::config::AppConfig;
use crate::errors::{AppError, FieldError};
use crate::models::common::PageRequest;
use crate::models::product::SortOrder;

pub const PRICE_HISTORY_DAYS: [u32; 5] = [7, 30, 60, 90, 180];
pub const DEFAULT_PRICE_HISTORY_DAYS: u32 = 30;

fn parse_number(errors: &mut Vec<FieldError>, field: &str, raw: Option<&str>, default: i64) -> Option<i64> {
    match raw.map(str::trim) {
        None | Some("") => Some(default),
        Some(value) => match value.parse::<i64>() {
            Ok(number) => Some(number),
            Err(_) => {
                errors.push(FieldError::new(field, "must be a number"));
                None
            }
        },
    }
}

fn check_limit(errors: &mut Vec<FieldError>, limit: Option<i64>, max: u32) -> u32 {
    match limit {
        Some(limit) if limit < 1 => {
            errors.push(FieldError::new("limit", "must be at least 1"));
            0
        }
        Some(limit) if limit > i64::from(max) => {
            errors.push(FieldError::new("limit", format!("must be at most {max}")));
            0
        }
        Some(limit) => limit as u32,
        None => 0,
    }
}

/// `page`/`limit` query parameters of the admin list endpoints.
pub fn page_request(page: Option<&str>, limit: Option<&str>, config: &AppConfig) -> Result<PageRequest, AppError> {
    let mut errors = Vec::new();

    let page = match parse_number(&mut errors, "page", page, 1) {
        Some(page) if page < 1 => {
            errors.push(FieldError::new("page", "must be at least 1"));
            1
        }
        Some(page) => u32::try_from(page).unwrap_or(u32::MAX),
        None => 1,
    };
    let limit_value = parse_number(&mut errors, "limit", limit, i64::from(config.default_page_limit));
    let limit = check_limit(&mut errors, limit_value, config.max_page_limit);

    if !errors.is_empty() {
        return Err(AppError::validation(errors));
    }
    Ok(PageRequest::new(page, limit))
}

/// `limit`/`offset` query parameters of the product listing.
pub fn limit_offset(limit: Option<&str>, offset: Option<&str>, config: &AppConfig) -> Result<(u32, u32), AppError> {
    let mut errors = Vec::new();

    let limit_value = parse_number(&mut errors, "limit", limit, i64::from(config.default_page_limit));
    let limit = check_limit(&mut errors, limit_value, config.max_page_limit);

    let offset = match parse_number(&mut errors, "offset", offset, 0) {
        Some(offset) if offset < 0 => {
            errors.push(FieldError::new("offset", "must be at least 0"));
            0
        }
        Some(offset) => u32::try_from(offset).unwrap_or(u32::MAX),
        None => 0,
    };

    if !errors.is_empty() {
        return Err(AppError::validation(errors));
    }
    Ok((limit, offset))
}

pub fn sort_order(raw: Option<&str>) -> Result<SortOrder, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(SortOrder::default()),
        Some(value) => value.parse(),
    }
}

pub fn price_history_days(raw: Option<&str>) -> Result<u32, AppError> {
    let value = match raw.map(str::trim) {
        None | Some("") => return Ok(DEFAULT_PRICE_HISTORY_DAYS),
        Some(value) => value,
    };

    let days = value
        .parse::<u32>()
        .map_err(|_| AppError::validation(vec![FieldError::new("days", "must be a number")]))?;
    if !PRICE_HISTORY_DAYS.contains(&days) {
        let allowed: Vec<String> = PRICE_HISTORY_DAYS.iter().map(u32::to_string).collect();
        return Err(AppError::validation(vec![FieldError::new(
            "days",
            format!("allowed values: {}", allowed.join(", ")),
        )]));
    }
    Ok(days)
}

/// Accepts RFC 3339 or a bare date. A bare `dateTo` covers the whole day.
pub fn date_bound(field: &str, raw: Option<&str>, end_of_day: bool) -> Result<Option<DateTime<Utc>>, AppError> {
    let value = match raw.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(value) => value,
    };

    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(datetime.with_timezone(&Utc)));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let time = if end_of_day {
            NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
        } else {
            NaiveTime::from_hms_opt(0, 0, 0)
        };
        if let Some(time) = time {
            return Ok(Some(Utc.from_utc_datetime(&date.and_time(time))));
        }
    }

    Err(AppError::validation(vec![FieldError::new(
        field,
        "must be a date (YYYY-MM-DD) or an RFC 3339 timestamp",
    )]))
}

/// Comma separated list, blanks dropped.
pub fn tag_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

pub fn article_id(raw: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::bad_request("invalid article id"))
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern compiles")
    })
}

pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email)
}

/// Treats blank query values as absent.
pub fn non_blank(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}
