//! Dataset loading.

pub mod loader;
pub mod parse;

pub use loader::{load_records, REQUIRED_COLUMNS};
pub use parse::parse_day_first_date;
