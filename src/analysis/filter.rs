//! Predicate evaluation over a record set.

use crate::error::FilterError;
use crate::models::{FilterSpec, GroupField, SalesRecord};
use std::collections::BTreeSet;

/// Return the records matching every active predicate of `filter`, in input order.
///
/// City, category and payment method match exactly; the branch query is a
/// case-insensitive substring; the date range is inclusive and never matches
/// an undated record. A filter with an inverted date range is rejected.
pub fn apply_filter<'a>(
    records: &'a [SalesRecord],
    filter: &FilterSpec,
) -> Result<Vec<&'a SalesRecord>, FilterError> {
    filter.validate()?;

    let branch_query = filter.branch_query().map(str::to_lowercase);

    Ok(records
        .iter()
        .filter(|record| matches_filter(record, filter, branch_query.as_deref()))
        .collect())
}

fn matches_filter(record: &SalesRecord, filter: &FilterSpec, branch_query: Option<&str>) -> bool {
    if !filter.city.matches(&record.city)
        || !filter.category.matches(&record.category)
        || !filter.payment_method.matches(&record.payment_method)
    {
        return false;
    }

    if let Some(range) = filter.date_range {
        match record.date {
            Some(date) if range.contains(date) => {}
            _ => return false,
        }
    }

    match branch_query {
        Some(query) => record.branch.to_lowercase().contains(query),
        None => true,
    }
}

/// Sorted distinct values of a field, as offered in a filter dropdown.
pub fn distinct_values(records: &[SalesRecord], field: GroupField) -> Vec<String> {
    records
        .iter()
        .filter_map(|record| record.group_key(field))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|key| key.to_string())
        .collect()
}
