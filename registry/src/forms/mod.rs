//! Form parsing
//!
//! Turns raw [`FormInput`] submissions into typed requests for the
//! registry. All field checks happen here: the stores trust what they get.
//!
//! Dates must be `YYYY-MM-DD` and times `HH:MM`. Functions that check a
//! date against "today" take it as an argument so callers (and tests)
//! control the clock.

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use sdk::errors::RegistryError;
use sdk::types::FormInput;
use std::sync::OnceLock;

use crate::store::accounts::{NewAccount, Role};
use crate::store::meetings::NewMeeting;
use crate::store::papers::NewPaper;
use crate::store::reviews::{NewReview, Rating, Recommendation};
use crate::store::sessions::NewSession;

/// Shortest password accepted at signup
pub const MIN_PASSWORD_LEN: usize = 6;

/// Session tracks offered on the session form
pub const TRACKS: &[&str] = &[
    "AI & Machine Learning",
    "Data Science",
    "Software Engineering",
    "Cybersecurity",
    "Cloud Computing",
    "IoT",
];

static EMAIL_PATTERN: OnceLock<Regex> = OnceLock::new();

fn email_pattern() -> &'static Regex {
    EMAIL_PATTERN.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid email pattern")
    })
}

/// Credentials from the login form
#[derive(Debug, Clone, PartialEq)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub role: Role,
}

pub fn parse_login(input: &FormInput) -> Result<LoginRequest, RegistryError> {
    Ok(LoginRequest {
        email: email(input, "email")?,
        password: password(input)?,
        role: input.field_str("role")?.parse()?,
    })
}

pub fn parse_signup(input: &FormInput) -> Result<NewAccount, RegistryError> {
    let password = password(input)?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(RegistryError::invalid_field(
            "password",
            format!("must be at least {} characters", MIN_PASSWORD_LEN),
        ));
    }

    Ok(NewAccount {
        name: input.field_str("name")?,
        email: email(input, "email")?,
        password,
        role: input.field_str("role")?.parse()?,
        affiliation: input.field_opt("affiliation"),
    })
}

pub fn parse_paper(input: &FormInput) -> Result<NewPaper, RegistryError> {
    let title = input.field_str("title")?;
    let abstract_text = input.field_str("abstract")?;
    let keywords = split_keywords(&input.field_str("keywords")?);

    Ok(NewPaper {
        title,
        abstract_text,
        keywords,
    })
}

pub fn parse_review(input: &FormInput) -> Result<NewReview, RegistryError> {
    let raw = input.field_str("rating")?;
    let value: i64 = raw
        .parse()
        .map_err(|_| RegistryError::invalid_field("rating", format!("'{}' is not a number", raw)))?;

    Ok(NewReview {
        rating: Rating::new(value)?,
        comments: input.field_str("comments")?,
        recommendation: input.field_str("recommendation")?.parse::<Recommendation>()?,
    })
}

pub fn parse_session(input: &FormInput, today: NaiveDate) -> Result<NewSession, RegistryError> {
    let title = input.field_str("title")?;
    let track = track(&input.field_str("track")?)?;
    let date = date(input, "date", today)?;
    let start_time = time(input, "start_time")?;
    let end_time = time(input, "end_time")?;

    Ok(NewSession {
        title,
        date,
        start_time,
        end_time,
        room: input.field_str("room")?,
        track,
        description: input.field_str("description")?,
    })
}

pub fn parse_meeting(input: &FormInput, today: NaiveDate) -> Result<NewMeeting, RegistryError> {
    Ok(NewMeeting {
        professor_email: email(input, "professor")?,
        date: date(input, "date", today)?,
        time: time(input, "time")?,
        topic: input.field_str("topic")?,
    })
}

/// Split a comma separated keyword list, dropping empty entries
pub fn split_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(String::from)
        .collect()
}

pub fn is_valid_email(value: &str) -> bool {
    email_pattern().is_match(value)
}

fn email(input: &FormInput, key: &str) -> Result<String, RegistryError> {
    let value = input.field_str(key)?;
    if !is_valid_email(&value) {
        return Err(RegistryError::invalid_field(key, format!("'{}' is not an email address", value)));
    }
    Ok(value)
}

// Passwords are compared verbatim, so they are not trimmed
fn password(input: &FormInput) -> Result<String, RegistryError> {
    match input.fields.get("password") {
        Some(p) if !p.is_empty() => Ok(p.clone()),
        _ => Err(RegistryError::MissingField("password".to_string())),
    }
}

fn track(value: &str) -> Result<String, RegistryError> {
    TRACKS
        .iter()
        .find(|t| t.eq_ignore_ascii_case(value))
        .map(|t| t.to_string())
        .ok_or_else(|| {
            RegistryError::invalid_field("track", format!("'{}' is not one of: {}", value, TRACKS.join(", ")))
        })
}

fn date(input: &FormInput, key: &str, today: NaiveDate) -> Result<NaiveDate, RegistryError> {
    let raw = input.field_str(key)?;
    let date = NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map_err(|_| RegistryError::invalid_field(key, format!("'{}' is not a YYYY-MM-DD date", raw)))?;

    if date < today {
        return Err(RegistryError::invalid_field(key, format!("{} is in the past", date)));
    }
    Ok(date)
}

fn time(input: &FormInput, key: &str) -> Result<NaiveTime, RegistryError> {
    let raw = input.field_str(key)?;
    NaiveTime::parse_from_str(&raw, "%H:%M")
        .map_err(|_| RegistryError::invalid_field(key, format!("'{}' is not an HH:MM time", raw)))
}
