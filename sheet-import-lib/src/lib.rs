#![allow(clippy::needless_return)]

pub mod aggregator;
pub mod decoder;
pub mod export;
pub mod file_guard;
pub mod finding;
pub mod normalizer;
pub mod pending;
pub mod pipeline;
pub mod record;
pub mod report;
pub mod row_validator;
pub mod schema;
pub mod store;
pub mod structure;
pub mod transport;
pub mod utils;

// Test utilities - only compiled when testing or with test feature
// #[cfg(test)] alone doesn't work for integration tests (they're external crates)
// The feature flag makes it available to integration tests via dev-dependencies
#[cfg(any(test, feature = "test"))]
pub mod test_utils;

pub use aggregator::{FindingsBySheet, format_findings};
pub use decoder::{DecodeError, decode_bytes, decode_workbook};
pub use file_guard::{FileCandidate, check_file};
pub use finding::{Finding, Severity};
pub use normalizer::{normalize, normalize_field};
pub use pipeline::{ImportError, Importer, WorkbookPreview, preview_workbook};
pub use record::{CanonicalRow, PersistedRecord, Sheet};
pub use row_validator::{RowValidator, validate_rows};
pub use schema::{FieldRole, RawRow};
pub use structure::{check_columns_only, check_rows, check_structure};
pub use transport::{FailurePayload, TransportFailure};

pub const ERRORS_LOG_FILE: &str = "errors.log";
