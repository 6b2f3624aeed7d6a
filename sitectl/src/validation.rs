//! Field validation for form input.
//!
//! Every admin and public form deserializes into an input struct implementing [`Validate`].
//! Rules are collected by a [`Validator`], so a single response carries every failing field.

use lettre::Address;
use serde::{Deserialize, Serialize};
use url::Url;
use utoipa::ToSchema;

use crate::errors::{Error, Result};

/// A single failing field, surfaced next to the input that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Accumulates field errors.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) -> &mut Self {
        if !ok {
            self.errors.push(FieldError::new(field, message));
        }
        self
    }

    pub fn required(&mut self, field: &str, value: &str, message: &str) -> &mut Self {
        self.check(!is_blank(value), field, message)
    }

    pub fn url(&mut self, field: &str, value: &str, message: &str) -> &mut Self {
        self.check(is_valid_url(value), field, message)
    }

    pub fn min_chars(&mut self, field: &str, value: &str, min: usize, message: &str) -> &mut Self {
        self.check(value.trim().chars().count() >= min, field, message)
    }

    pub fn max_chars(&mut self, field: &str, value: &str, max: usize, message: &str) -> &mut Self {
        self.check(value.chars().count() <= max, field, message)
    }

    pub fn email(&mut self, field: &str, value: &str, message: &str) -> &mut Self {
        self.check(is_valid_email(value), field, message)
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn finish(&mut self) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation {
                errors: std::mem::take(&mut self.errors),
            })
        }
    }
}

/// Input that can check itself before it reaches the store.
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Absolute http(s) URL.
pub fn is_valid_url(value: &str) -> bool {
    Url::parse(value.trim()).is_ok_and(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
}

pub fn is_valid_email(value: &str) -> bool {
    value.trim().parse::<Address>().is_ok()
}

/// `+91` followed by exactly ten digits.
pub fn is_valid_phone(value: &str) -> bool {
    value
        .strip_prefix("+91")
        .is_some_and(|digits| digits.len() == 10 && digits.chars().all(|c| c.is_ascii_digit()))
}

/// Lowercase, whitespace runs to `-`, anything outside `[a-z0-9_-]` dropped.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut in_whitespace = false;
    for c in title.trim().chars().flat_map(char::to_lowercase) {
        if c.is_whitespace() {
            if !in_whitespace {
                slug.push('-');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            slug.push(c);
        }
    }
    slug
}

/// `None` for blank strings, trimmed text otherwise.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
