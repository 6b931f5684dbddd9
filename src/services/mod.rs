//! Business operations behind the HTTP handlers.
//!
//! Every service loads whole tables through the repositories and joins in
//! memory; the pure rules live in [`pricing`], [`colors`] and [`listing`].

use chrono::NaiveDate;
use serde::{de, Deserialize, Deserializer};
use std::{fmt, str::FromStr};

use crate::errors::ServiceError;

pub mod calendar;
pub mod clients;
pub mod colors;
pub mod events;
pub mod listing;
pub mod palette;
pub mod pricing;
pub mod releases;
pub mod reservations;
pub mod staff;
pub mod transfer;

/// Today's date on the shop's clock
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Trims and drops empty optional text from forms
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trimmed required text, or a validation error carrying `message`
pub(crate) fn required(value: &str, message: &str) -> Result<String, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::ValidationError(message.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Deserializes an optional value from text, treating `""` as absent.
/// Forms and query strings send empty fields instead of omitting them.
pub fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text.parse().map(Some).map_err(de::Error::custom),
    }
}

/// Like [`blank_as_none`], but text that does not parse is also absent.
/// Used for sort options, where an unknown field falls back to the default.
pub fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|text| text.trim().parse().ok()))
}

/// Checkbox-style flag: accepts booleans and `"on"` / `"true"` / `"1"`
pub fn checkbox<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        None => false,
        Some(Flag::Bool(value)) => value,
        Some(Flag::Text(text)) => matches!(
            text.trim().to_ascii_lowercase().as_str(),
            "on" | "true" | "1" | "yes" | "si" | "sí"
        ),
    })
}
