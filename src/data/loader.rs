//! CSV loading for the sales dataset.
//!
//! The loader validates the schema up front, coerces every row through the
//! typed parsers in [`super::parse`], and fails the whole load on the first
//! malformed numeric value. Only dates are lossy: an unparseable date leaves
//! the record undated and is counted in the [`LoadReport`](crate::models::LoadReport).

use super::parse::{parse_day_first_date, parse_money, parse_quantity, parse_rating};
use crate::error::LoadError;
use crate::models::{LoadReport, RecordSet, SalesRecord};
use csv::{ReaderBuilder, StringRecord};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Columns every dataset must provide. Matched case-insensitively.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    "Branch",
    "City",
    "category",
    "payment_method",
    "date",
    "quantity",
    "rating",
    "Revenue",
    "Profit",
];

/// Positions of the required columns in the header row.
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    branch: usize,
    city: usize,
    category: usize,
    payment_method: usize,
    date: usize,
    quantity: usize,
    rating: usize,
    revenue: usize,
    profit: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self, LoadError> {
        let positions: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.trim().to_lowercase(), idx))
            .collect();

        let find = |column: &str| {
            positions
                .get(&column.to_lowercase())
                .copied()
                .ok_or_else(|| LoadError::MissingColumn(column.to_string()))
        };

        Ok(Self {
            branch: find("Branch")?,
            city: find("City")?,
            category: find("category")?,
            payment_method: find("payment_method")?,
            date: find("date")?,
            quantity: find("quantity")?,
            rating: find("rating")?,
            revenue: find("Revenue")?,
            profit: find("Profit")?,
        })
    }
}

/// Load the dataset from a CSV file.
pub fn load_records<P: AsRef<Path>>(path: P) -> Result<RecordSet, LoadError> {
    let path = path.as_ref();
    info!("Loading sales data from: {}", path.display());
    let file = File::open(path)?;
    load_from_reader(file)
}

/// Load the dataset from any CSV source.
pub fn load_from_reader<R: Read>(reader: R) -> Result<RecordSet, LoadError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns = ColumnIndex::from_headers(rdr.headers()?)?;

    let mut records = Vec::new();
    let mut undated = 0;

    for (idx, result) in rdr.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        let row = result?;
        let record = parse_row(&row, &columns, line)?;
        if record.date.is_none() {
            debug!("Unparseable date at line {}: {:?}", line, field(&row, columns.date));
            undated += 1;
        }
        records.push(record);
    }

    if !records.is_empty() && undated == records.len() {
        return Err(LoadError::UnparseableColumn("date".to_string()));
    }

    let report = LoadReport {
        rows_read: records.len(),
        invalid_dates: undated,
    };

    if report.invalid_dates > 0 {
        warn!(
            "{} of {} rows have an unparseable date and are excluded from date-based views",
            report.invalid_dates, report.rows_read
        );
    }
    info!("Loaded {} sales records", report.rows_read);

    Ok(RecordSet::with_report(records, report))
}

fn field(row: &StringRecord, idx: usize) -> &str {
    row.get(idx).unwrap_or("")
}

fn parse_row(row: &StringRecord, columns: &ColumnIndex, line: usize) -> Result<SalesRecord, LoadError> {
    let invalid = |column: &str, value: &str, reason: String| LoadError::InvalidValue {
        line,
        column: column.to_string(),
        value: value.to_string(),
        reason,
    };

    let raw_quantity = field(row, columns.quantity);
    let quantity = parse_quantity(raw_quantity).map_err(|e| invalid("quantity", raw_quantity, e))?;

    let raw_rating = field(row, columns.rating);
    let rating = parse_rating(raw_rating).map_err(|e| invalid("rating", raw_rating, e))?;

    let raw_revenue = field(row, columns.revenue);
    let revenue =
        parse_money(raw_revenue).map_err(|e| invalid("Revenue", raw_revenue, e.to_string()))?;

    let raw_profit = field(row, columns.profit);
    let profit =
        parse_money(raw_profit).map_err(|e| invalid("Profit", raw_profit, e.to_string()))?;

    Ok(SalesRecord {
        branch: field(row, columns.branch).to_string(),
        city: field(row, columns.city).to_string(),
        category: field(row, columns.category).to_string(),
        payment_method: field(row, columns.payment_method).to_string(),
        date: parse_day_first_date(field(row, columns.date)),
        quantity,
        revenue,
        profit,
        rating,
    })
}
