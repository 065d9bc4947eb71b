//! Data models for the sales dashboard.
//!
//! This module contains the core data structures shared by the loader,
//! the query engine and the dashboard pages: records, filter
//! specifications and the keys/results produced by aggregation.

use crate::error::FilterError;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::fmt;

/// One sales transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesRecord {
    /// Branch identifier (e.g. `WALM001`).
    pub branch: String,
    /// City the branch is located in.
    pub city: String,
    /// Product category.
    pub category: String,
    /// Payment method used.
    pub payment_method: String,
    /// Transaction date. `None` when the source value could not be parsed.
    pub date: Option<NaiveDate>,
    /// Units sold.
    pub quantity: u32,
    /// Revenue in currency units.
    pub revenue: Decimal,
    /// Profit in currency units.
    pub profit: Decimal,
    /// Customer rating, 0 to 10.
    pub rating: Decimal,
}

impl SalesRecord {
    /// Returns the numeric value of the given field.
    pub fn value(&self, field: ValueField) -> Decimal {
        match field {
            ValueField::Revenue => self.revenue,
            ValueField::Profit => self.profit,
            ValueField::Quantity => Decimal::from(self.quantity),
            ValueField::Rating => self.rating,
        }
    }

    /// Returns the group key of this record for the given field.
    ///
    /// Temporal fields return `None` for undated records.
    pub fn group_key(&self, field: GroupField) -> Option<GroupKey> {
        let key = match field {
            GroupField::Branch => GroupKey::Label(self.branch.clone()),
            GroupField::City => GroupKey::Label(self.city.clone()),
            GroupField::Category => GroupKey::Label(self.category.clone()),
            GroupField::PaymentMethod => GroupKey::Label(self.payment_method.clone()),
            GroupField::Year => GroupKey::Bucket(TimeBucket::of(self.date?, Period::Year)),
            GroupField::Month => GroupKey::Bucket(TimeBucket::of(self.date?, Period::Month)),
        };
        Some(key)
    }
}

/// Statistics gathered while loading the dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Data rows read from the source.
    pub rows_read: usize,
    /// Rows whose date could not be parsed.
    pub invalid_dates: usize,
}

/// The full, immutable collection of loaded sales records.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    records: Vec<SalesRecord>,
    report: LoadReport,
}

impl RecordSet {
    /// Creates a record set, deriving the load report from the records.
    #[cfg(test)]
    pub fn new(records: Vec<SalesRecord>) -> Self {
        let report = LoadReport {
            rows_read: records.len(),
            invalid_dates: records.iter().filter(|r| r.date.is_none()).count(),
        };
        Self::with_report(records, report)
    }

    /// Creates a record set from a report the loader already tallied.
    pub(crate) fn with_report(records: Vec<SalesRecord>, report: LoadReport) -> Self {
        Self { records, report }
    }

    /// All records in source order.
    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn load_report(&self) -> LoadReport {
        self.report
    }
}

/// A categorical predicate: either unrestricted or an exact value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    /// Parses a user-facing choice. Empty input and `All` (any case) are unrestricted.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            Selection::All
        } else {
            Selection::Only(trimmed.to_string())
        }
    }

    /// Exact, case-sensitive match.
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(expected) => expected == value,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => write!(f, "All"),
            Selection::Only(value) => write!(f, "{}", value),
        }
    }
}

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a range, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, FilterError> {
        let range = Self { start, end };
        range.validate()?;
        Ok(range)
    }

    /// The smallest range covering every dated record, if any.
    pub fn covering(records: &[SalesRecord]) -> Option<Self> {
        let mut dates = records.iter().filter_map(|r| r.date);
        let first = dates.next()?;
        let (start, end) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
        Some(Self { start, end })
    }

    pub fn validate(&self) -> Result<(), FilterError> {
        if self.start > self.end {
            return Err(FilterError::InvertedDateRange {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Optional predicates narrowing a record set.
///
/// Every predicate defaults to "no restriction"; active predicates are
/// combined with AND semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterSpec {
    pub city: Selection,
    pub category: Selection,
    pub payment_method: Selection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    /// Case-insensitive substring of the branch code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

impl FilterSpec {
    /// The branch query, if it is non-blank.
    pub fn branch_query(&self) -> Option<&str> {
        self.branch
            .as_deref()
            .map(str::trim)
            .filter(|query| !query.is_empty())
    }

    pub fn is_unrestricted(&self) -> bool {
        self.city.is_all()
            && self.category.is_all()
            && self.payment_method.is_all()
            && self.date_range.is_none()
            && self.branch_query().is_none()
    }

    pub fn validate(&self) -> Result<(), FilterError> {
        match self.date_range {
            Some(range) => range.validate(),
            None => Ok(()),
        }
    }

    /// Human-readable list of the active predicates.
    pub fn describe(&self) -> Vec<String> {
        let mut active = Vec::new();
        if let Selection::Only(ref city) = self.city {
            active.push(format!("City = {}", city));
        }
        if let Selection::Only(ref category) = self.category {
            active.push(format!("Category = {}", category));
        }
        if let Selection::Only(ref payment) = self.payment_method {
            active.push(format!("Payment = {}", payment));
        }
        if let Some(range) = self.date_range {
            active.push(format!("Date = {}", range));
        }
        if let Some(query) = self.branch_query() {
            active.push(format!("Branch contains \"{}\"", query));
        }
        active
    }
}

/// Headline metrics for a subset of records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiSummary {
    pub total_revenue: Decimal,
    pub total_profit: Decimal,
    /// `None` when the subset is empty; never reported as zero.
    pub average_rating: Option<Decimal>,
    pub total_quantity: u64,
    pub record_count: usize,
}

/// Field a record set can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupField {
    Branch,
    City,
    Category,
    PaymentMethod,
    Year,
    Month,
}

impl GroupField {
    pub fn is_temporal(&self) -> bool {
        matches!(self, GroupField::Year | GroupField::Month)
    }

    /// Trend series keep chronological order; categorical breakdowns rank.
    pub fn default_order(&self) -> GroupOrder {
        if self.is_temporal() {
            GroupOrder::Natural
        } else {
            GroupOrder::Ranked
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GroupField::Branch => "Branch",
            GroupField::City => "City",
            GroupField::Category => "Category",
            GroupField::PaymentMethod => "Payment Method",
            GroupField::Year => "Year",
            GroupField::Month => "Month",
        }
    }
}

/// Numeric field an aggregation is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueField {
    Revenue,
    Profit,
    Quantity,
    Rating,
}

impl ValueField {
    pub fn label(&self) -> &'static str {
        match self {
            ValueField::Revenue => "Revenue",
            ValueField::Profit => "Profit",
            ValueField::Quantity => "Quantity",
            ValueField::Rating => "Rating",
        }
    }
}

/// Aggregation applied to each group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggFn {
    Sum,
    Mean,
    Count,
}

impl fmt::Display for AggFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggFn::Sum => write!(f, "Total"),
            AggFn::Mean => write!(f, "Average"),
            AggFn::Count => write!(f, "Count"),
        }
    }
}

/// Ordering of grouped results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupOrder {
    /// Value descending, ties broken by key ascending.
    Ranked,
    /// Key ascending; chronological for time buckets.
    Natural,
}

/// Calendar period used for time bucketing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Year,
    Month,
}

/// A calendar bucket. Ordering is chronological, never lexical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimeBucket {
    Year(i32),
    Month { year: i32, month: u32 },
}

impl TimeBucket {
    pub fn of(date: NaiveDate, period: Period) -> Self {
        match period {
            Period::Year => TimeBucket::Year(date.year()),
            Period::Month => TimeBucket::Month {
                year: date.year(),
                month: date.month(),
            },
        }
    }
}

impl fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeBucket::Year(year) => write!(f, "{}", year),
            TimeBucket::Month { year, month } => write!(f, "{}-{:02}", year, month),
        }
    }
}

impl Serialize for TimeBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Key of one group in an aggregate result.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupKey {
    Label(String),
    Bucket(TimeBucket),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Label(label) => write!(f, "{}", label),
            GroupKey::Bucket(bucket) => write!(f, "{}", bucket),
        }
    }
}

impl Serialize for GroupKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One group of an aggregate result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupEntry {
    pub key: GroupKey,
    pub value: Decimal,
    /// Records that fell into the group.
    pub count: usize,
}

/// Ordered mapping of group key to aggregated value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedResult {
    pub group_field: GroupField,
    pub value_field: ValueField,
    pub agg: AggFn,
    pub order: GroupOrder,
    pub entries: Vec<GroupEntry>,
}

impl GroupedResult {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value of the group whose rendered key equals `key`.
    #[cfg(test)]
    pub fn value_of(&self, key: &str) -> Option<Decimal> {
        self.entries
            .iter()
            .find(|entry| entry.key.to_string() == key)
            .map(|entry| entry.value)
    }

    /// Rendered keys in result order.
    #[cfg(test)]
    pub fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.key.to_string()).collect()
    }
}
