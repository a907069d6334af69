//! Cell normalization.
//!
//! Converts loosely typed spreadsheet cells into the canonical representation
//! of their column role. Used by the preview and by the import path, so both
//! read `"Yes"`, `45292` and `"2024-01-01"` the same way.

use serde_json::Value;

use crate::schema::{FieldRole, role_of};
use crate::utils::{format_iso_date, parse_date_literal, serial_to_date};

/// Normalize one cell for the given role. `Value::Null` stands for "no value".
pub fn normalize(raw: &Value, role: FieldRole) -> Value {
    match role {
        FieldRole::Flag => normalize_flag(raw),
        FieldRole::Date => normalize_date(raw),
        FieldRole::Text | FieldRole::Amount | FieldRole::Passthrough => raw.clone(),
    }
}

/// Normalize a cell by field name, using the schema table to find its role.
/// Field names are matched ignoring ASCII case.
pub fn normalize_field(raw: &Value, field: &str) -> Value {
    normalize(raw, role_of(field))
}

/// Recognised Yes/No tokens, after trimming and lower-casing.
pub fn parse_flag_token(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "yes" | "true" => Some(true),
        "no" | "false" => Some(false),
        _ => None,
    }
}

fn normalize_flag(raw: &Value) -> Value {
    match raw {
        Value::Bool(_) => raw.clone(),
        Value::String(s) => match parse_flag_token(s) {
            Some(flag) => Value::Bool(flag),
            // Unrecognised text is kept so the row rules can report it
            None => raw.clone(),
        },
        _ => Value::Null,
    }
}

fn normalize_date(raw: &Value) -> Value {
    let date = match raw {
        Value::Number(n) => n.as_f64().and_then(serial_to_date),
        Value::String(s) => parse_date_literal(s),
        _ => None,
    };

    match date {
        Some(date) => Value::String(format_iso_date(date)),
        None => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flag_tokens() {
        assert_eq!(normalize(&json!(" Yes "), FieldRole::Flag), json!(true));
        assert_eq!(normalize(&json!("TRUE"), FieldRole::Flag), json!(true));
        assert_eq!(normalize(&json!("no"), FieldRole::Flag), json!(false));
        assert_eq!(normalize(&json!("False"), FieldRole::Flag), json!(false));
    }

    #[test]
    fn test_flag_passthrough_and_null() {
        assert_eq!(normalize(&json!("maybe"), FieldRole::Flag), json!("maybe"));
        assert_eq!(normalize(&json!(true), FieldRole::Flag), json!(true));
        assert_eq!(normalize(&json!(1), FieldRole::Flag), Value::Null);
        assert_eq!(normalize(&Value::Null, FieldRole::Flag), Value::Null);
    }

    #[test]
    fn test_date_from_serial() {
        assert_eq!(normalize(&json!(45292), FieldRole::Date), json!("2024-01-01"));
        assert_eq!(
            normalize(&json!(45292.5), FieldRole::Date),
            json!("2024-01-01")
        );
    }

    #[test]
    fn test_date_from_string() {
        assert_eq!(
            normalize(&json!("2024-01-05T08:00:00Z"), FieldRole::Date),
            json!("2024-01-05")
        );
        assert_eq!(
            normalize(&json!("01/05/2024"), FieldRole::Date),
            json!("2024-01-05")
        );
    }

    #[test]
    fn test_date_unparseable_is_null() {
        assert_eq!(normalize(&json!("bad"), FieldRole::Date), Value::Null);
        assert_eq!(normalize(&Value::Null, FieldRole::Date), Value::Null);
        assert_eq!(normalize(&json!(true), FieldRole::Date), Value::Null);
    }

    #[test]
    fn test_canonical_values_are_fixed_points() {
        assert_eq!(
            normalize(&json!("2024-01-05"), FieldRole::Date),
            json!("2024-01-05")
        );
        assert_eq!(normalize(&json!(true), FieldRole::Flag), json!(true));
        assert_eq!(normalize(&json!("Alice"), FieldRole::Text), json!("Alice"));
        assert_eq!(normalize(&json!(12.5), FieldRole::Amount), json!(12.5));
    }

    #[test]
    fn test_normalize_field_uses_schema_roles() {
        assert_eq!(normalize_field(&json!("yes"), "Verified"), json!(true));
        // Not a schema column, so no date handling even though the name says so
        assert_eq!(normalize_field(&json!(45292), "Created Date"), json!(45292));
    }

    #[test]
    fn test_normalize_field_lowercase_names() {
        assert_eq!(normalize_field(&json!("Yes"), "verified"), json!(true));
        assert_eq!(normalize_field(&json!(45292), "date"), json!("2024-01-01"));
        assert_eq!(normalize_field(&json!("2024-01-05"), "date"), json!("2024-01-05"));
        assert_eq!(normalize_field(&json!("Yes"), "name"), json!("Yes"));
    }
}
