//! The fixed import schema shared by the preview and the import path.
//!
//! Every consumer (normalizer, structural checks, row rules, import) reads the
//! same [`FIELD_RULES`] table, so the two sides cannot drift apart.

use serde_json::{Map, Value};

/// Decoded spreadsheet row: header -> cell, in header order.
pub type RawRow = Map<String, Value>;

pub const NAME_COLUMN: &str = "Name";
pub const AMOUNT_COLUMN: &str = "Amount";
pub const DATE_COLUMN: &str = "Date";
pub const VERIFIED_COLUMN: &str = "Verified";

/// Maximum number of data rows accepted in one sheet
pub const MAX_ROWS: usize = 10_000;

/// Names longer than this are flagged with a warning
pub const MAX_NAME_LENGTH: usize = 100;

/// Amounts above this are flagged with a warning
pub const MAX_AMOUNT: f64 = 1_000_000.0;

/// Uploaded files larger than this are rejected before decoding (10 MiB)
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Semantic role of a column. Drives normalization and the row rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldRole {
    Text,
    Amount,
    Date,
    Flag,
    /// Columns outside the schema. Carried along, never validated.
    Passthrough,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub column: &'static str,
    pub role: FieldRole,
    pub required: bool,
}

pub const FIELD_RULES: [FieldRule; 4] = [
    FieldRule {
        column: NAME_COLUMN,
        role: FieldRole::Text,
        required: true,
    },
    FieldRule {
        column: AMOUNT_COLUMN,
        role: FieldRole::Amount,
        required: true,
    },
    FieldRule {
        column: DATE_COLUMN,
        role: FieldRole::Date,
        required: true,
    },
    FieldRule {
        column: VERIFIED_COLUMN,
        role: FieldRole::Flag,
        required: true,
    },
];

pub fn required_columns() -> impl Iterator<Item = &'static str> {
    FIELD_RULES
        .iter()
        .filter(|rule| rule.required)
        .map(|rule| rule.column)
}

/// Rule for a sheet header. Headers must match the column name exactly.
pub fn rule_for(column: &str) -> Option<&'static FieldRule> {
    FIELD_RULES.iter().find(|rule| rule.column == column)
}

/// Rule for a field name given by a caller, e.g. `"verified"` or `" Date"`.
pub fn rule_for_field(field: &str) -> Option<&'static FieldRule> {
    let field = field.trim();
    FIELD_RULES
        .iter()
        .find(|rule| rule.column.eq_ignore_ascii_case(field))
}

pub fn role_of(field: &str) -> FieldRole {
    rule_for_field(field)
        .map(|rule| rule.role)
        .unwrap_or(FieldRole::Passthrough)
}

/// Column -> role lookup, built once per validation pass from a sheet header.
#[derive(Debug, Clone, Default)]
pub struct ResolvedRoles {
    roles: Vec<(String, FieldRole)>,
}

impl ResolvedRoles {
    pub fn get(&self, column: &str) -> FieldRole {
        self.roles
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, role)| *role)
            .unwrap_or(FieldRole::Passthrough)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, FieldRole)> {
        self.roles.iter().map(|(name, role)| (name.as_str(), *role))
    }
}

/// Resolve the role of every header column. Schema columns are always
/// present in the result, even when the header lacks them.
pub fn resolve_roles<'a>(header: impl IntoIterator<Item = &'a String>) -> ResolvedRoles {
    let mut roles: Vec<(String, FieldRole)> = FIELD_RULES
        .iter()
        .map(|rule| (rule.column.to_string(), rule.role))
        .collect();

    for column in header {
        if rule_for(column).is_none() {
            roles.push((column.clone(), FieldRole::Passthrough));
        }
    }

    ResolvedRoles { roles }
}

/// Columns of `row` that are not part of the schema, in header order.
pub fn extra_columns(row: &RawRow) -> Vec<String> {
    row.keys()
        .filter(|column| rule_for(column).is_none())
        .cloned()
        .collect()
}
