pub mod admin;
pub mod quotes;

use chrono::NaiveDate;

/// All date parameters must be YYYY-MM-DD; the core treats dates opaquely,
/// so validation happens at this boundary.
pub(crate) fn valid_date(date: &str) -> bool {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok()
}
