//! Answer validation. Every function either returns the normalized value or
//! the reason to re-prompt.

use chrono::NaiveDate;
use hackbot_core::error::ValidationError;
use regex::Regex;
use std::sync::OnceLock;

/// Text a participant sends to skip an optional step.
pub const SKIP_TEXT: &str = "-";

static BIRTH_DATE_RE: OnceLock<Regex> = OnceLock::new();
static PHONE_RE: OnceLock<Regex> = OnceLock::new();

fn birth_date_regex() -> &'static Regex {
    BIRTH_DATE_RE.get_or_init(|| {
        Regex::new(r"^(\d{1,2})\.(\d{1,2})\.(\d{4})$")
            .unwrap_or_else(|error| panic!("birth date regex failed to compile: {error}"))
    })
}

fn phone_regex() -> &'static Regex {
    PHONE_RE.get_or_init(|| {
        Regex::new(r"^\+?\d{7,15}$")
            .unwrap_or_else(|error| panic!("phone regex failed to compile: {error}"))
    })
}

/// `D.M.YYYY` or `DD.MM.YYYY`, and a date that exists.
pub fn parse_birth_date(input: &str) -> Result<NaiveDate, ValidationError> {
    let caps = birth_date_regex()
        .captures(input.trim())
        .ok_or(ValidationError::BirthDate)?;
    let part = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
    let (Some(day), Some(month), Some(year)) = (part(1), part(2), part(3)) else {
        return Err(ValidationError::BirthDate);
    };
    NaiveDate::from_ymd_opt(year as i32, month, day).ok_or(ValidationError::BirthDate)
}

/// Exactly 14 ASCII digits.
pub fn national_id(input: &str) -> Result<String, ValidationError> {
    let id = input.trim();
    if id.len() == 14 && id.bytes().all(|b| b.is_ascii_digit()) {
        Ok(id.to_string())
    } else {
        Err(ValidationError::NationalId)
    }
}

/// Absolute `http`/`https` URL with a host.
pub fn link(input: &str) -> Result<String, ValidationError> {
    let raw = input.trim();
    let parsed = url::Url::parse(raw).map_err(|_| ValidationError::Link)?;
    let has_host = parsed.host_str().is_some_and(|h| !h.is_empty());
    if matches!(parsed.scheme(), "http" | "https") && has_host {
        Ok(raw.to_string())
    } else {
        Err(ValidationError::Link)
    }
}

/// Optional `+`, then 7–15 digits. Spaces, dashes and parentheses are dropped.
pub fn phone(input: &str) -> Result<String, ValidationError> {
    let compact: String = input
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();
    if phone_regex().is_match(&compact) {
        Ok(compact)
    } else {
        Err(ValidationError::Phone)
    }
}

/// Non-empty free text of bounded length.
pub fn text(label: &'static str, input: &str, max_chars: usize) -> Result<String, ValidationError> {
    let value = input.trim();
    if value.is_empty() {
        return Err(ValidationError::Empty(label));
    }
    if value.chars().count() > max_chars {
        return Err(ValidationError::TooLong(label, max_chars));
    }
    Ok(value.to_string())
}

pub fn is_skip(input: &str) -> bool {
    input.trim() == SKIP_TEXT
}
