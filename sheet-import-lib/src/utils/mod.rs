mod datetime;
mod filesystem;
mod string;

pub use datetime::{
    format_iso_date, get_local_datetime_with_format, get_utc_iso_datetime, parse_date_literal,
    serial_to_date,
};
pub use filesystem::write_error_to_log;
pub use string::normalize_string;
