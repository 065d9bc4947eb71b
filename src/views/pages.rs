//! Page builders registered in the dispatch table.

use super::{scope, AggregateView, Insight, Page, Panel, Predicate, ShareEntry, ViewKind, ViewRequest};
use crate::analysis::{
    apply_filter, describe, group_aggregate, histogram, kpi_summary, shares, split_histogram,
    top_n,
};
use crate::error::FilterError;
use crate::models::{
    AggFn, DateRange, FilterSpec, GroupField, GroupOrder, GroupedResult, RecordSet, SalesRecord,
    ValueField,
};
use crate::report::format::{money, number};
use rust_decimal::Decimal;
use tracing::debug;

fn new_page(kind: ViewKind, filter: FilterSpec, matched: usize, ignored: Vec<String>) -> Page {
    let title = super::find(kind).map_or("Dashboard", |def| def.title).to_string();
    let mut notes = Vec::new();
    if !ignored.is_empty() {
        debug!("{:?} page ignores: {}", kind, ignored.join(", "));
        notes.push(format!("Not applicable on this page: {}", ignored.join("; ")));
    }
    Page {
        kind,
        title,
        filter,
        matched,
        panels: Vec::new(),
        notes,
    }
}

fn undated_note(set: &RecordSet) -> Option<String> {
    let invalid = set.load_report().invalid_dates;
    (invalid > 0).then(|| {
        format!(
            "{} record(s) with an unparseable date are excluded from date-based panels.",
            invalid
        )
    })
}

fn all_records(set: &RecordSet) -> Vec<&SalesRecord> {
    set.records().iter().collect()
}

fn ranked_view(grouped: &GroupedResult, n: usize) -> AggregateView {
    AggregateView::Ranked {
        group_field: grouped.group_field,
        value_field: grouped.value_field,
        agg: grouped.agg,
        entries: top_n(grouped, n),
    }
}

fn share_view(grouped: &GroupedResult) -> AggregateView {
    let entries = grouped
        .entries
        .iter()
        .zip(shares(grouped))
        .map(|(entry, (_, share))| ShareEntry {
            key: entry.key.clone(),
            value: entry.value,
            share,
        })
        .collect();
    AggregateView::Shares {
        group_field: grouped.group_field,
        value_field: grouped.value_field,
        entries,
    }
}

fn histogram_view(subset: &[&SalesRecord], field: ValueField, bins: usize) -> AggregateView {
    let hist = histogram(subset, field, bins);
    debug!("{} histogram over {} values", field.label(), hist.total());
    AggregateView::Histogram {
        field: hist.field,
        bins: hist.bins,
    }
}

fn records_view(subset: &[&SalesRecord], max_rows: usize) -> AggregateView {
    AggregateView::Records {
        total: subset.len(),
        rows: subset.iter().take(max_rows).map(|&r| r.clone()).collect(),
    }
}

/// Headline KPIs, yearly revenue trend, category mix and order-size distribution.
///
/// Without an explicit date range the page uses the full span of the data,
/// which leaves undated records out.
pub(super) fn overview(set: &RecordSet, request: &ViewRequest) -> Result<Page, FilterError> {
    let (mut filter, ignored) = scope(
        &request.filter,
        &[Predicate::City, Predicate::Category, Predicate::Dates],
    );
    if filter.date_range.is_none() {
        filter.date_range = DateRange::covering(set.records());
    }

    let subset = apply_filter(set.records(), &filter)?;
    let mut page = new_page(ViewKind::Overview, filter, subset.len(), ignored);
    page.notes.extend(undated_note(set));

    page.panels.push(Panel::new("Key Metrics", AggregateView::Kpis(kpi_summary(&subset))));
    page.panels.push(Panel::new(
        "Revenue Trend by Year",
        AggregateView::Grouped(group_aggregate(
            &subset,
            GroupField::Year,
            ValueField::Revenue,
            AggFn::Sum,
            GroupField::Year.default_order(),
        )),
    ));
    page.panels.push(Panel::new(
        "Revenue Distribution by Category",
        share_view(&group_aggregate(
            &subset,
            GroupField::Category,
            ValueField::Revenue,
            AggFn::Sum,
            GroupOrder::Ranked,
        )),
    ));
    page.panels.push(Panel::new(
        "Revenue Distribution Across Orders",
        histogram_view(&subset, ValueField::Revenue, request.bins),
    ));

    Ok(page)
}

/// Rating and payment behaviour for a city / payment method selection.
///
/// The city ranking always covers the whole dataset.
pub(super) fn customers(set: &RecordSet, request: &ViewRequest) -> Result<Page, FilterError> {
    let (filter, ignored) = scope(&request.filter, &[Predicate::City, Predicate::Payment]);
    let subset = apply_filter(set.records(), &filter)?;
    let mut page = new_page(ViewKind::Customers, filter, subset.len(), ignored);

    page.panels.push(Panel::new(
        "Customer Ratings Distribution",
        AggregateView::SplitHistogram(split_histogram(
            &subset,
            ValueField::Rating,
            GroupField::PaymentMethod,
            request.bins,
        )),
    ));
    page.panels.push(Panel::new(
        "Revenue Share by Payment Method",
        share_view(&group_aggregate(
            &subset,
            GroupField::PaymentMethod,
            ValueField::Revenue,
            AggFn::Sum,
            GroupOrder::Ranked,
        )),
    ));

    let by_city = group_aggregate(
        &all_records(set),
        GroupField::City,
        ValueField::Revenue,
        AggFn::Mean,
        GroupOrder::Ranked,
    );
    page.panels.push(Panel::new(
        format!("Top {} Cities by Average Revenue", request.top_n),
        ranked_view(&by_city, request.top_n),
    ));

    Ok(page)
}

/// Category-level profit trend, quantity and revenue.
///
/// Only the profit trend follows the category selection; the category
/// breakdowns compare every category.
pub(super) fn products(set: &RecordSet, request: &ViewRequest) -> Result<Page, FilterError> {
    let (filter, ignored) = scope(&request.filter, &[Predicate::Category]);
    let subset = apply_filter(set.records(), &filter)?;
    let mut page = new_page(ViewKind::Products, filter, subset.len(), ignored);
    page.notes.extend(undated_note(set));

    let all = all_records(set);

    page.panels.push(Panel::new(
        format!("Average Profit Over Time ({})", page.filter.category),
        AggregateView::Grouped(group_aggregate(
            &subset,
            GroupField::Month,
            ValueField::Profit,
            AggFn::Mean,
            GroupField::Month.default_order(),
        )),
    ));
    page.panels.push(Panel::new(
        "Quantity Sold by Category",
        share_view(&group_aggregate(
            &all,
            GroupField::Category,
            ValueField::Quantity,
            AggFn::Sum,
            GroupOrder::Ranked,
        )),
    ));
    page.panels.push(Panel::new(
        "Total Revenue by Category",
        AggregateView::Grouped(group_aggregate(
            &all,
            GroupField::Category,
            ValueField::Revenue,
            AggFn::Sum,
            GroupOrder::Ranked,
        )),
    ));
    page.panels.push(Panel::new(
        "Transactions by Category",
        AggregateView::Grouped(group_aggregate(
            &all,
            GroupField::Category,
            ValueField::Quantity,
            AggFn::Count,
            GroupOrder::Ranked,
        )),
    ));

    Ok(page)
}

/// Branch search plus dataset-wide branch rankings.
pub(super) fn branches(set: &RecordSet, request: &ViewRequest) -> Result<Page, FilterError> {
    let (filter, ignored) = scope(&request.filter, &[Predicate::Branch]);
    let subset = apply_filter(set.records(), &filter)?;
    let query = filter.branch_query().map(str::to_string);
    let mut page = new_page(ViewKind::Branches, filter, subset.len(), ignored);

    if let Some(query) = query {
        if subset.is_empty() {
            page.panels.push(Panel::new(
                format!("Branch Search: {}", query),
                AggregateView::Message(format!("No data found for branch code: {}", query)),
            ));
        } else {
            page.panels.push(Panel::new(
                format!("Key Metrics of {}", query),
                AggregateView::Kpis(kpi_summary(&subset)),
            ));
            page.panels.push(Panel::new(
                format!("Transactions Matching {}", query),
                records_view(&subset, request.max_rows),
            ));
        }
    }

    let all = all_records(set);
    let by_branch = group_aggregate(
        &all,
        GroupField::Branch,
        ValueField::Profit,
        AggFn::Sum,
        GroupOrder::Ranked,
    );
    page.panels.push(Panel::new(
        format!("Top {} Most Profitable Branches", request.top_n),
        ranked_view(&by_branch, request.top_n),
    ));
    page.panels.push(Panel::new(
        "Rating Distribution Across Branches",
        histogram_view(&all, ValueField::Rating, request.bins),
    ));

    Ok(page)
}

/// Key business insights over every record matching the request.
pub(super) fn insights(set: &RecordSet, request: &ViewRequest) -> Result<Page, FilterError> {
    let filter = request.filter.clone();
    let subset = apply_filter(set.records(), &filter)?;
    let mut page = new_page(ViewKind::Insights, filter, subset.len(), Vec::new());
    page.notes.extend(undated_note(set));

    if subset.is_empty() {
        page.panels.push(Panel::new(
            "Key Insights",
            AggregateView::Message("No records match the current filters.".to_string()),
        ));
        return Ok(page);
    }

    page.panels.push(Panel::new(
        "Key Insights",
        AggregateView::Insights(derive_insights(&subset)),
    ));
    Ok(page)
}

fn leader(
    subset: &[&SalesRecord],
    group_field: GroupField,
    value_field: ValueField,
    agg: AggFn,
) -> GroupedResult {
    group_aggregate(subset, group_field, value_field, agg, GroupOrder::Ranked)
}

fn insight(topic: &str, statement: String) -> Insight {
    Insight {
        topic: topic.to_string(),
        statement,
    }
}

fn derive_insights(subset: &[&SalesRecord]) -> Vec<Insight> {
    let mut insights = Vec::new();

    let city_revenue = leader(subset, GroupField::City, ValueField::Revenue, AggFn::Sum);
    if let Some(top) = city_revenue.entries.first() {
        insights.push(insight(
            "Top Performing City by Revenue",
            format!("{} ({})", top.key, money(top.value)),
        ));
    }

    let city_profit = leader(subset, GroupField::City, ValueField::Profit, AggFn::Sum);
    let top_cities: Vec<String> = top_n(&city_profit, 3)
        .into_iter()
        .map(|(key, _)| key.to_string())
        .collect();
    if let Some((first, rest)) = top_cities.split_first() {
        let statement = if rest.is_empty() {
            first.clone()
        } else {
            format!("{}, followed by {}", first, rest.join(" and "))
        };
        insights.push(insight("Most Profitable City", statement));
    }
    if city_profit.len() > 1 {
        if let Some(last) = city_profit.entries.last() {
            insights.push(insight(
                "Least Profitable City",
                format!("{} ({})", last.key, money(last.value)),
            ));
        }
    }

    let category_quantity = leader(subset, GroupField::Category, ValueField::Quantity, AggFn::Sum);
    if let Some(top) = category_quantity.entries.first() {
        insights.push(insight(
            "Best-Selling Category",
            format!("{} ({} units)", top.key, top.value),
        ));
    }

    let category_profit = leader(subset, GroupField::Category, ValueField::Profit, AggFn::Sum);
    if let Some(top) = category_profit.entries.first() {
        insights.push(insight(
            "Most Profitable Category",
            format!("{} ({})", top.key, money(top.value)),
        ));
    }

    let category_count = leader(subset, GroupField::Category, ValueField::Quantity, AggFn::Count);
    if category_count.len() > 1 {
        if let Some(last) = category_count.entries.last() {
            insights.push(insight(
                "Fewest Transactions",
                format!("{} ({} transactions)", last.key, last.value),
            ));
        }
    }

    let month_revenue = leader(subset, GroupField::Month, ValueField::Revenue, AggFn::Sum);
    if let Some(top) = month_revenue.entries.first() {
        insights.push(insight(
            "Peak Sales Month",
            format!("{} ({})", top.key, money(top.value)),
        ));
    }

    let payment_count = leader(subset, GroupField::PaymentMethod, ValueField::Revenue, AggFn::Count);
    if let Some(top) = payment_count.entries.first() {
        insights.push(insight(
            "Popular Payment Method",
            format!("{} ({} transactions)", top.key, top.value),
        ));
    }

    let payment_mean = leader(subset, GroupField::PaymentMethod, ValueField::Revenue, AggFn::Mean);
    if let Some(top) = payment_mean.entries.first() {
        insights.push(insight(
            "High-Spending Payment Method",
            format!("{} ({} per transaction)", top.key, money(top.value)),
        ));
    }

    let kpis = kpi_summary(subset);
    if let Some(average) = kpis.average_rating {
        insights.push(insight(
            "Average Customer Rating",
            format!("{} / 10", number(average, 1)),
        ));
    }

    let satisfied = subset
        .iter()
        .filter(|r| r.rating >= Decimal::from(8))
        .count();
    let share = Decimal::from(satisfied) * Decimal::ONE_HUNDRED / Decimal::from(subset.len());
    insights.push(insight(
        "High Satisfaction",
        format!("{}% of transactions rated 8 or higher", number(share, 1)),
    ));

    insights
}

/// Summary statistics for the whole dataset and a filtered record listing.
pub(super) fn dataset(set: &RecordSet, request: &ViewRequest) -> Result<Page, FilterError> {
    let (filter, ignored) = scope(&request.filter, &[Predicate::Category, Predicate::Branch]);
    let subset = apply_filter(set.records(), &filter)?;
    let mut page = new_page(ViewKind::Dataset, filter, subset.len(), ignored);

    let all = all_records(set);
    let summary = [
        ValueField::Quantity,
        ValueField::Rating,
        ValueField::Revenue,
        ValueField::Profit,
    ]
    .into_iter()
    .filter_map(|field| describe(&all, field))
    .collect();

    page.panels.push(Panel::new("Summary Statistics", AggregateView::Summary(summary)));
    page.panels.push(Panel::new(
        format!("Showing {} Records", subset.len()),
        records_view(&subset, request.max_rows),
    ));

    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{date, sample_records};
    use crate::models::Selection;

    fn sample_set() -> RecordSet {
        RecordSet::new(sample_records())
    }

    fn request(filter: FilterSpec) -> ViewRequest {
        ViewRequest {
            filter,
            ..Default::default()
        }
    }

    #[test]
    fn test_overview_defaults_to_full_date_span() {
        let page = overview(&sample_set(), &ViewRequest::default()).unwrap();

        assert_eq!(
            page.filter.date_range,
            Some(DateRange {
                start: date(2023, 11, 2),
                end: date(2024, 12, 31),
            })
        );
        assert_eq!(page.matched, 8);
        match &page.panels[0].view {
            AggregateView::Kpis(kpis) => assert_eq!(kpis.total_revenue, Decimal::from(700)),
            other => panic!("unexpected view: {other:?}"),
        }
        match &page.panels[1].view {
            AggregateView::Grouped(grouped) => assert_eq!(grouped.keys(), vec!["2023", "2024"]),
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[test]
    fn test_overview_excludes_undated_records() {
        let mut records = sample_records();
        records[0].date = None;
        let set = RecordSet::new(records);

        let page = overview(&set, &ViewRequest::default()).unwrap();
        assert_eq!(page.matched, 7);
        assert!(page.notes.iter().any(|n| n.contains("unparseable date")));
    }

    #[test]
    fn test_overview_rejects_inverted_range() {
        let filter = FilterSpec {
            date_range: Some(DateRange {
                start: date(2024, 6, 1),
                end: date(2024, 1, 1),
            }),
            ..Default::default()
        };
        assert!(matches!(
            overview(&sample_set(), &request(filter)),
            Err(FilterError::InvertedDateRange { .. })
        ));
    }

    #[test]
    fn test_overview_notes_ignored_predicates() {
        let filter = FilterSpec {
            payment_method: Selection::Only("Cash".to_string()),
            ..Default::default()
        };
        let page = overview(&sample_set(), &request(filter)).unwrap();
        assert_eq!(page.matched, 8);
        assert!(page.notes.iter().any(|n| n.contains("Payment = Cash")));
    }

    #[test]
    fn test_customers_ranks_cities_over_whole_dataset() {
        let filter = FilterSpec {
            city: Selection::Only("Dallas".to_string()),
            ..Default::default()
        };
        let page = customers(&sample_set(), &request(filter)).unwrap();
        assert_eq!(page.matched, 3);

        match &page.panels[2].view {
            AggregateView::Ranked { entries, .. } => {
                let cities: Vec<String> = entries.iter().map(|(k, _)| k.to_string()).collect();
                // Mean revenue: Houston 106.67, Austin 100, Dallas 60.
                assert_eq!(cities, vec!["Houston", "Austin", "Dallas"]);
            }
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[test]
    fn test_products_profit_trend_is_chronological() {
        let filter = FilterSpec {
            category: Selection::Only("A".to_string()),
            ..Default::default()
        };
        let page = products(&sample_set(), &request(filter)).unwrap();

        match &page.panels[0].view {
            AggregateView::Grouped(grouped) => {
                assert_eq!(grouped.keys(), vec!["2024-01", "2024-12"]);
                // December: profits 30 and 3.
                assert_eq!(grouped.value_of("2024-12"), Some(Decimal::new(165, 1)));
            }
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[test]
    fn test_branch_search_hit_and_miss() {
        let hit = FilterSpec {
            branch: Some("walm00".to_string()),
            ..Default::default()
        };
        let page = branches(&sample_set(), &request(hit)).unwrap();
        assert_eq!(page.matched, 5);
        match &page.panels[0].view {
            AggregateView::Kpis(kpis) => assert_eq!(kpis.total_quantity, 12),
            other => panic!("unexpected view: {other:?}"),
        }

        let miss = FilterSpec {
            branch: Some("ZZZ".to_string()),
            ..Default::default()
        };
        let page = branches(&sample_set(), &request(miss)).unwrap();
        assert!(matches!(page.panels[0].view, AggregateView::Message(_)));
        assert_eq!(page.panels.len(), 3);
    }

    #[test]
    fn test_branches_without_query_only_ranks() {
        let page = branches(&sample_set(), &ViewRequest::default()).unwrap();
        assert_eq!(page.panels.len(), 2);
        match &page.panels[0].view {
            AggregateView::Ranked { entries, .. } => {
                assert_eq!(entries[0].0.to_string(), "WALM002");
                assert_eq!(entries[0].1, Decimal::from(40));
            }
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[test]
    fn test_insights_are_derived_from_data() {
        let page = insights(&sample_set(), &ViewRequest::default()).unwrap();
        let AggregateView::Insights(items) = &page.panels[0].view else {
            panic!("expected insights");
        };

        let statement = |topic: &str| {
            items
                .iter()
                .find(|i| i.topic == topic)
                .map(|i| i.statement.clone())
                .unwrap_or_default()
        };

        assert_eq!(statement("Top Performing City by Revenue"), "Houston ($320.00)");
        assert_eq!(
            statement("Most Profitable City"),
            "Houston, followed by Dallas and Austin"
        );
        assert_eq!(statement("Popular Payment Method"), "Cash (4 transactions)");
        assert_eq!(statement("Average Customer Rating"), "6.9 / 10");
        assert_eq!(
            statement("High Satisfaction"),
            "37.5% of transactions rated 8 or higher"
        );
    }

    #[test]
    fn test_insights_note_undated_records() {
        let mut records = sample_records();
        records[3].date = None;
        let set = RecordSet::new(records);

        let page = insights(&set, &ViewRequest::default()).unwrap();
        assert_eq!(page.matched, 8);
        assert!(page.notes.iter().any(|n| n.contains("1 record(s) with an unparseable date")));
    }

    #[test]
    fn test_insights_on_empty_subset() {
        let filter = FilterSpec {
            city: Selection::Only("Atlantis".to_string()),
            ..Default::default()
        };
        let page = insights(&sample_set(), &request(filter)).unwrap();
        assert_eq!(page.matched, 0);
        assert!(matches!(page.panels[0].view, AggregateView::Message(_)));
    }

    #[test]
    fn test_dataset_limits_rows() {
        let req = ViewRequest {
            max_rows: 2,
            ..Default::default()
        };
        let page = dataset(&sample_set(), &req).unwrap();

        match &page.panels[0].view {
            AggregateView::Summary(stats) => assert_eq!(stats.len(), 4),
            other => panic!("unexpected view: {other:?}"),
        }
        match &page.panels[1].view {
            AggregateView::Records { total, rows } => {
                assert_eq!(*total, 8);
                assert_eq!(rows.len(), 2);
            }
            other => panic!("unexpected view: {other:?}"),
        }
    }
}
