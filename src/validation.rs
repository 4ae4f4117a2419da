//! Declarative checks applied to request bodies before they reach a service.
//!
//! Each body shape has a [`Schema`]: a table of field names and the rules the
//! field must satisfy. A field that is absent or `null` only fails
//! [`Rule::Required`]; every other rule is skipped for it.

use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::color::is_hex_color;
use crate::error::{ServiceError, ServiceResult};
use crate::models::task::{parse_date, TaskCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Required,
    String,
    NonEmpty,
    Integer,
    /// A non-empty array of integers.
    IntegerList,
    HexColor,
    Category,
    /// `YYYY-MM-DD`, or an RFC 3339 timestamp whose date part is used.
    Date,
}

pub type Schema = &'static [(&'static str, &'static [Rule])];

pub const CREATE_LABEL: Schema = &[
    ("name", &[Rule::Required, Rule::String, Rule::NonEmpty]),
    ("color", &[Rule::Required, Rule::String, Rule::NonEmpty, Rule::HexColor]),
];

pub const UPDATE_LABEL: Schema = &[
    ("name", &[Rule::String, Rule::NonEmpty]),
    ("color", &[Rule::String, Rule::NonEmpty, Rule::HexColor]),
];

pub const CREATE_TASK: Schema = &[
    ("title", &[Rule::Required, Rule::String, Rule::NonEmpty]),
    ("description", &[Rule::Required, Rule::String]),
    ("dueDate", &[Rule::Date]),
    ("category", &[Rule::Required, Rule::Category]),
];

pub const UPDATE_TASK: Schema = &[
    ("title", &[Rule::String]),
    ("description", &[Rule::String]),
    ("dueDate", &[Rule::Date]),
    ("category", &[Rule::Category]),
];

pub const UPDATE_LABELS: Schema = &[
    ("taskId", &[Rule::Required, Rule::Integer]),
    ("labelIds", &[Rule::Required, Rule::IntegerList]),
];

fn is_i32(value: &Value) -> bool {
    value
        .as_i64()
        .is_some_and(|n| i32::try_from(n).is_ok())
}

fn check(field: &str, rule: Rule, value: &Value) -> Result<(), String> {
    let ok = match rule {
        Rule::Required => !value.is_null(),
        Rule::String => value.is_string(),
        Rule::NonEmpty => value.as_str().is_some_and(|s| !s.trim().is_empty()),
        Rule::Integer => is_i32(value),
        Rule::IntegerList => value
            .as_array()
            .is_some_and(|items| !items.is_empty() && items.iter().all(is_i32)),
        Rule::HexColor => value.as_str().is_some_and(is_hex_color),
        Rule::Category => value
            .as_str()
            .is_some_and(|s| TaskCategory::from_str(s).is_ok()),
        Rule::Date => value.as_str().and_then(parse_date).is_some(),
    };

    if ok {
        return Ok(());
    }

    Err(match rule {
        Rule::Required | Rule::NonEmpty => format!("The '{field}' field cannot be null"),
        Rule::String => format!("The '{field}' field must be a string"),
        Rule::Integer => format!("The '{field}' field must be an integer"),
        Rule::IntegerList => format!("The '{field}' field must be a non-empty array of integers"),
        Rule::HexColor => format!("The '{field}' field must be a valid hex color"),
        Rule::Category => format!(
            "The '{field}' field must be one of: {}",
            TaskCategory::ALL.map(|c| c.to_string()).join(", ")
        ),
        Rule::Date => format!("The '{field}' field must be a valid date"),
    })
}

/// Checks `body` against `schema`, reporting the first failing field.
pub fn validate(schema: Schema, body: &Value) -> ServiceResult<()> {
    let Some(object) = body.as_object() else {
        return Err(ServiceError::validation("Request body must be a JSON object"));
    };

    for (field, rules) in schema {
        match object.get(*field).filter(|v| !v.is_null()) {
            None if rules.contains(&Rule::Required) => {
                return Err(ServiceError::validation(format!(
                    "The '{field}' field cannot be null"
                )));
            }
            None => continue,
            Some(value) => {
                for rule in rules.iter().filter(|r| **r != Rule::Required) {
                    check(field, *rule, value).map_err(ServiceError::Validation)?;
                }
            }
        }
    }

    Ok(())
}

/// Validates, then deserializes the body into its typed request.
pub fn parse<T: DeserializeOwned>(schema: Schema, body: Value) -> ServiceResult<T> {
    validate(schema, &body)?;
    serde_json::from_value(body).map_err(|e| ServiceError::validation(e.to_string()))
}
