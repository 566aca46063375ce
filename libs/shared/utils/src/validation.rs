use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 100;
pub const PASSWORD_MIN_CHARS: usize = 8;

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
            .expect("email pattern compiles")
    })
}

pub fn validate_email(email: &str) -> Result<(), String> {
    if email_pattern().is_match(email.trim()) {
        Ok(())
    } else {
        Err("Invalid email address.".to_string())
    }
}

pub fn validate_name(name: &str) -> Result<(), String> {
    let len = name.trim().chars().count();
    if (NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&len) {
        Ok(())
    } else {
        Err(format!(
            "Name must be between {} and {} characters long.",
            NAME_MIN_CHARS, NAME_MAX_CHARS
        ))
    }
}

pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() >= PASSWORD_MIN_CHARS {
        Ok(())
    } else {
        Err(format!(
            "Password must be at least {} characters long.",
            PASSWORD_MIN_CHARS
        ))
    }
}

pub fn validate_passwords_match(password: &str, confirmation: &str) -> Result<(), String> {
    if password == confirmation {
        Ok(())
    } else {
        Err("Passwords must match.".to_string())
    }
}

/// Non-blank text, returned trimmed.
pub fn require_text(value: Option<&str>, message: &str) -> Result<String, String> {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(message.to_string()),
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| "Invalid date, expected YYYY-MM-DD.".to_string())
}

/// Accepts `HH:MM` as sent by a time input, or `HH:MM:SS`.
pub fn parse_time(raw: &str) -> Result<NaiveTime, String> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| "Invalid time, expected HH:MM.".to_string())
}

pub fn validate_booking_date(date: NaiveDate, today: NaiveDate) -> Result<(), String> {
    if date < today {
        Err("You cannot book an appointment in the past.".to_string())
    } else {
        Ok(())
    }
}
