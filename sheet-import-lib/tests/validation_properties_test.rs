//! Property tests for ordering, purity and normalization fixed points

use proptest::prelude::*;
use serde_json::{Value, json};
use sheet_import_lib::schema::RawRow;
use sheet_import_lib::{FieldRole, Severity, normalize};

mod common;

fn cell() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-10.0f64..2_000_000.0).prop_map(|n| json!(n)),
        (0i64..60_000).prop_map(|n| json!(n)),
        prop::sample::select(vec![
            "", " ", "Yes", "no", "TRUE", "maybe", "2024-01-05", "2099-12-31", "bad", "12.5", "-3",
        ])
        .prop_map(|s| Value::String(s.to_string())),
        "[a-z ]{0,120}".prop_map(Value::String),
    ]
}

fn row() -> impl Strategy<Value = RawRow> {
    (cell(), cell(), cell(), cell()).prop_map(|(name, amount, date, verified)| {
        let mut row = RawRow::new();
        row.insert("Name".to_string(), name);
        row.insert("Amount".to_string(), amount);
        row.insert("Date".to_string(), date);
        row.insert("Verified".to_string(), verified);
        row
    })
}

proptest! {
    #[test]
    fn errors_come_before_warnings_in_row_order(rows in prop::collection::vec(row(), 0..20)) {
        let findings = common::create_row_validator().validate_rows(&rows);

        let first_warning = findings
            .iter()
            .position(|f| f.severity == Severity::Warning)
            .unwrap_or(findings.len());
        prop_assert!(findings[first_warning..].iter().all(|f| f.severity == Severity::Warning));
        prop_assert!(findings[..first_warning].iter().all(|f| f.severity == Severity::Error));

        for group in [&findings[..first_warning], &findings[first_warning..]] {
            prop_assert!(group.windows(2).all(|pair| pair[0].row <= pair[1].row));
        }
    }

    #[test]
    fn validation_is_repeatable(rows in prop::collection::vec(row(), 0..10)) {
        let validator = common::create_row_validator();
        prop_assert_eq!(validator.validate_rows(&rows), validator.validate_rows(&rows));
    }

    #[test]
    fn normalization_is_idempotent(value in cell()) {
        for role in [FieldRole::Text, FieldRole::Amount, FieldRole::Date, FieldRole::Flag] {
            let once = normalize(&value, role);
            prop_assert_eq!(normalize(&once, role), once);
        }
    }
}

#[test]
fn test_canonical_values_are_unchanged() {
    assert_eq!(normalize(&json!("2024-01-05"), FieldRole::Date), json!("2024-01-05"));
    assert_eq!(normalize(&json!(true), FieldRole::Flag), json!(true));
    assert_eq!(normalize(&json!(false), FieldRole::Flag), json!(false));
}
