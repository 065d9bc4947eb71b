//! Record builders shared by unit tests.

use crate::models::SalesRecord;
use chrono::NaiveDate;
use rust_decimal::Decimal;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A record with revenue in whole currency units and neutral other fields.
pub fn record(branch: &str, city: &str, category: &str, revenue: i64, on: NaiveDate) -> SalesRecord {
    SalesRecord {
        branch: branch.to_string(),
        city: city.to_string(),
        category: category.to_string(),
        payment_method: "Cash".to_string(),
        date: Some(on),
        quantity: 1,
        revenue: Decimal::from(revenue),
        profit: Decimal::from(revenue) / Decimal::TEN,
        rating: Decimal::from(5),
    }
}

#[allow(clippy::too_many_arguments)]
pub fn sale(
    branch: &str,
    city: &str,
    category: &str,
    payment: &str,
    on: NaiveDate,
    quantity: u32,
    revenue: i64,
    profit: i64,
    rating: i64,
) -> SalesRecord {
    SalesRecord {
        branch: branch.to_string(),
        city: city.to_string(),
        category: category.to_string(),
        payment_method: payment.to_string(),
        date: Some(on),
        quantity,
        revenue: Decimal::from(revenue),
        profit: Decimal::from(profit),
        rating: Decimal::from(rating),
    }
}

/// Eight transactions across three cities, three categories and four months.
///
/// Totals: revenue 700, profit 100, quantity 19, rating mean 6.875.
pub fn sample_records() -> Vec<SalesRecord> {
    vec![
        sale("WALM001", "Dallas", "A", "Cash", date(2024, 1, 5), 1, 100, 20, 8),
        sale("WALM001", "Dallas", "B", "Ewallet", date(2024, 2, 10), 2, 50, 5, 6),
        sale("WALM002", "Houston", "A", "Credit card", date(2024, 12, 1), 3, 200, 30, 9),
        sale("WALM002", "Houston", "C", "Cash", date(2023, 11, 15), 1, 50, 10, 7),
        sale("WALM010", "Austin", "B", "Ewallet", date(2024, 2, 20), 4, 80, 8, 4),
        sale("WALM010", "Austin", "C", "Cash", date(2024, 1, 25), 2, 120, 15, 10),
        sale("WALM001", "Dallas", "A", "Cash", date(2024, 12, 31), 5, 30, 3, 5),
        sale("WALM067", "Houston", "B", "Credit card", date(2023, 11, 2), 1, 70, 9, 6),
    ]
}
