//! Coercion and format checks shared by the field schema.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static EMAIL_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+'-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$").ok()
});

static DOMAIN_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").ok());

/// Largest magnitude that round-trips through `f64` without losing integer precision.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Reason a numeric coercion was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NumberIssue {
    NotANumber,
    NotAnInteger,
}

/// Coerce a JSON number or numeric string into an integer.
#[allow(clippy::redundant_pub_crate)]
pub(crate) fn coerce_integer(value: &Value) -> Result<i64, NumberIssue> {
    if let Some(int) = value.as_i64() {
        return Ok(int);
    }
    let float = coerce_decimal(value)?;
    if float.fract() != 0.0 || float.abs() > MAX_SAFE_INTEGER {
        return Err(NumberIssue::NotAnInteger);
    }
    #[allow(clippy::cast_possible_truncation)]
    Ok(float as i64)
}

/// Coerce a JSON number or numeric string into a finite float.
#[allow(clippy::redundant_pub_crate)]
pub(crate) fn coerce_decimal(value: &Value) -> Result<f64, NumberIssue> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        _ => None,
    };
    parsed
        .filter(|float| float.is_finite())
        .ok_or(NumberIssue::NotANumber)
}

/// Interpret JSON booleans and the string spellings HTML forms submit.
#[allow(clippy::redundant_pub_crate)]
pub(crate) fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::String(raw) => match raw.trim() {
            "true" | "on" => Some(true),
            "false" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[allow(clippy::redundant_pub_crate)]
pub(crate) fn is_email(candidate: &str) -> bool {
    EMAIL_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(candidate))
}

#[allow(clippy::redundant_pub_crate)]
pub(crate) fn is_domain(candidate: &str) -> bool {
    DOMAIN_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(candidate))
}

/// JavaScript-style truthiness used when the backend stores empty strings or zeroes.
#[allow(clippy::redundant_pub_crate)]
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|float| float != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
