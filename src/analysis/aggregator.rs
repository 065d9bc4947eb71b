//! Sales aggregation.
//!
//! This module turns a filtered subset of records into KPIs, grouped
//! tables, top-N rankings and calendar buckets. Every function is a pure
//! computation over the slice it is given.

use crate::models::{
    AggFn, GroupEntry, GroupField, GroupKey, GroupOrder, GroupedResult, KpiSummary, Period,
    SalesRecord, TimeBucket, ValueField,
};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Compute headline metrics for a subset.
///
/// An empty subset reports zero totals and an undefined average rating.
pub fn kpi_summary(subset: &[&SalesRecord]) -> KpiSummary {
    let mut total_revenue = Decimal::ZERO;
    let mut total_profit = Decimal::ZERO;
    let mut rating_sum = Decimal::ZERO;
    let mut total_quantity: u64 = 0;

    for record in subset {
        total_revenue += record.revenue;
        total_profit += record.profit;
        rating_sum += record.rating;
        total_quantity += u64::from(record.quantity);
    }

    KpiSummary {
        total_revenue,
        total_profit,
        average_rating: mean(rating_sum, subset.len()),
        total_quantity,
        record_count: subset.len(),
    }
}

fn mean(sum: Decimal, count: usize) -> Option<Decimal> {
    if count == 0 {
        None
    } else {
        Some(sum / Decimal::from(count))
    }
}

/// Bucket dated records by calendar period, in chronological order.
///
/// Undated records belong to no bucket.
pub fn time_bucket<'a>(
    subset: &[&'a SalesRecord],
    period: Period,
) -> Vec<(TimeBucket, Vec<&'a SalesRecord>)> {
    let mut buckets: BTreeMap<TimeBucket, Vec<&'a SalesRecord>> = BTreeMap::new();

    for &record in subset {
        if let Some(date) = record.date {
            buckets
                .entry(TimeBucket::of(date, period))
                .or_default()
                .push(record);
        }
    }

    buckets.into_iter().collect()
}

/// Group a subset by `group_field` and aggregate `value_field` in each group.
///
/// Time fields are bucketed first. `GroupOrder::Ranked` sorts by value
/// descending with key-ascending tie breaks; `GroupOrder::Natural` keeps
/// key order, which is chronological for time buckets.
pub fn group_aggregate(
    subset: &[&SalesRecord],
    group_field: GroupField,
    value_field: ValueField,
    agg: AggFn,
    order: GroupOrder,
) -> GroupedResult {
    let groups: BTreeMap<GroupKey, Vec<&SalesRecord>> = match group_field {
        GroupField::Year => bucketed(subset, Period::Year),
        GroupField::Month => bucketed(subset, Period::Month),
        _ => {
            let mut groups: BTreeMap<GroupKey, Vec<&SalesRecord>> = BTreeMap::new();
            for &record in subset {
                if let Some(key) = record.group_key(group_field) {
                    groups.entry(key).or_default().push(record);
                }
            }
            groups
        }
    };

    let mut entries: Vec<GroupEntry> = groups
        .into_iter()
        .map(|(key, records)| {
            let sum: Decimal = records.iter().map(|r| r.value(value_field)).sum();
            let count = records.len();
            let value = match agg {
                AggFn::Sum => sum,
                // Groups are never empty.
                AggFn::Mean => mean(sum, count).unwrap_or(Decimal::ZERO),
                AggFn::Count => Decimal::from(count),
            };
            GroupEntry { key, value, count }
        })
        .collect();

    if order == GroupOrder::Ranked {
        sort_ranked(&mut entries);
    }

    GroupedResult {
        group_field,
        value_field,
        agg,
        order,
        entries,
    }
}

fn bucketed<'a>(
    subset: &[&'a SalesRecord],
    period: Period,
) -> BTreeMap<GroupKey, Vec<&'a SalesRecord>> {
    time_bucket(subset, period)
        .into_iter()
        .map(|(bucket, records)| (GroupKey::Bucket(bucket), records))
        .collect()
}

fn sort_ranked(entries: &mut [GroupEntry]) {
    entries.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.key.cmp(&b.key)));
}

/// Keep the `n` highest-valued groups, ties broken by key ascending.
pub fn top_n(grouped: &GroupedResult, n: usize) -> Vec<(GroupKey, Decimal)> {
    let mut entries = grouped.entries.clone();
    sort_ranked(&mut entries);
    entries.truncate(n);
    entries.into_iter().map(|e| (e.key, e.value)).collect()
}

/// Share of each group in the grouped total, in percent.
pub fn shares(grouped: &GroupedResult) -> Vec<(GroupKey, Decimal)> {
    let total: Decimal = grouped.entries.iter().map(|e| e.value).sum();
    grouped
        .entries
        .iter()
        .map(|e| {
            let share = if total.is_zero() {
                Decimal::ZERO
            } else {
                e.value / total * Decimal::ONE_HUNDRED
            };
            (e.key.clone(), share)
        })
        .collect()
}
