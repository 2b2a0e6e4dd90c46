// Shared validation rules and error formatting
use std::borrow::Cow;
use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use validator::{ValidationError, ValidationErrors};

pub static USERNAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9]+$").unwrap());

pub static CURRENCY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{3}$").unwrap());

pub fn validate_positive_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if *amount > Decimal::ZERO {
        return Ok(());
    }
    let mut error = ValidationError::new("range");
    error.message = Some(Cow::Borrowed("must be greater than 0"));
    Err(error)
}

/// Flatten validator output into one message per field, keyed by the JSON name.
pub fn field_errors(errors: &ValidationErrors) -> HashMap<String, String> {
    errors
        .field_errors()
        .into_iter()
        .filter_map(|(field, errs)| {
            let first = errs.first()?;
            Some((camel_case(&field.to_string()), describe(first)))
        })
        .collect()
}

fn describe(error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }

    let param = |name: &str| error.params.get(name).map(|v| v.to_string());

    match &*error.code {
        "length" => match (param("equal"), param("min"), param("max")) {
            (Some(equal), _, _) => format!("must be exactly {} characters", equal),
            (None, Some(min), Some(max)) => {
                format!("must be between {} and {} characters", min, max)
            }
            (None, Some(min), None) => format!("must be at least {} characters", min),
            (None, None, Some(max)) => format!("must be at most {} characters", max),
            (None, None, None) => "has an invalid length".to_string(),
        },
        "range" => match (param("min"), param("max")) {
            (Some(min), Some(max)) => format!("must be between {} and {}", min, max),
            (Some(min), None) => format!("must be at least {}", min),
            (None, Some(max)) => format!("must be at most {}", max),
            (None, None) => "is out of range".to_string(),
        },
        "email" => "must be a valid email address".to_string(),
        "required" => "is required".to_string(),
        _ => "is invalid".to_string(),
    }
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}
