//! Dashboard pages.
//!
//! Each page is a named view variant that narrows the record set with the
//! predicates it supports and assembles a list of aggregate panels. Pages
//! are selected through the [`VIEWS`] dispatch table.

mod pages;

use crate::analysis::{HistogramBin, SplitHistogram, SummaryStats};
use crate::error::FilterError;
use crate::models::{
    AggFn, FilterSpec, GroupField, GroupKey, GroupedResult, KpiSummary, RecordSet, SalesRecord,
    ValueField,
};
use rust_decimal::Decimal;
use serde::Serialize;

/// The dashboard sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    /// Headline KPIs, yearly revenue trend, category mix
    #[default]
    Overview,
    /// Ratings and payment behaviour
    Customers,
    /// Category profit, quantity and revenue
    Products,
    /// Branch search and branch rankings
    Branches,
    /// Key business insights derived from the data
    Insights,
    /// Summary statistics and record listing
    Dataset,
}

/// Everything a page needs besides the data: the user's filter and display knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewRequest {
    pub filter: FilterSpec,
    /// Length of ranked lists.
    pub top_n: usize,
    /// Histogram bin count.
    pub bins: usize,
    /// Maximum records listed in a table.
    pub max_rows: usize,
}

impl Default for ViewRequest {
    fn default() -> Self {
        Self {
            filter: FilterSpec::default(),
            top_n: 15,
            bins: 20,
            max_rows: 50,
        }
    }
}

/// Builds one page from the record set.
pub type PageBuilder = fn(&RecordSet, &ViewRequest) -> Result<Page, FilterError>;

/// One entry of the dispatch table.
pub struct ViewDef {
    pub kind: ViewKind,
    pub title: &'static str,
    pub build: PageBuilder,
}

/// Every dashboard page, in menu order.
pub static VIEWS: &[ViewDef] = &[
    ViewDef {
        kind: ViewKind::Overview,
        title: "Sales Overview",
        build: pages::overview,
    },
    ViewDef {
        kind: ViewKind::Customers,
        title: "Customer Insights",
        build: pages::customers,
    },
    ViewDef {
        kind: ViewKind::Products,
        title: "Product Performance",
        build: pages::products,
    },
    ViewDef {
        kind: ViewKind::Branches,
        title: "Branch Performance",
        build: pages::branches,
    },
    ViewDef {
        kind: ViewKind::Insights,
        title: "Key Insights",
        build: pages::insights,
    },
    ViewDef {
        kind: ViewKind::Dataset,
        title: "Dataset Explorer",
        build: pages::dataset,
    },
];

/// Look up a page in the dispatch table.
pub fn find(kind: ViewKind) -> Option<&'static ViewDef> {
    VIEWS.iter().find(|def| def.kind == kind)
}

/// A group's value together with its percentage of the total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareEntry {
    pub key: GroupKey,
    pub value: Decimal,
    pub share: Decimal,
}

/// A single derived business statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Insight {
    pub topic: String,
    pub statement: String,
}

/// A derived view of the filtered records, ready for presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum AggregateView {
    Kpis(KpiSummary),
    Grouped(GroupedResult),
    Ranked {
        group_field: GroupField,
        value_field: ValueField,
        agg: AggFn,
        entries: Vec<(GroupKey, Decimal)>,
    },
    Shares {
        group_field: GroupField,
        value_field: ValueField,
        entries: Vec<ShareEntry>,
    },
    Histogram {
        field: ValueField,
        bins: Vec<HistogramBin>,
    },
    SplitHistogram(SplitHistogram),
    Summary(Vec<SummaryStats>),
    Records {
        total: usize,
        rows: Vec<SalesRecord>,
    },
    Insights(Vec<Insight>),
    Message(String),
}

/// A titled panel on a page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    pub title: String,
    pub view: AggregateView,
}

impl Panel {
    pub fn new(title: impl Into<String>, view: AggregateView) -> Self {
        Self {
            title: title.into(),
            view,
        }
    }
}

/// A rendered dashboard page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub kind: ViewKind,
    pub title: String,
    /// The predicates this page actually applied.
    pub filter: FilterSpec,
    /// Records matching `filter`.
    pub matched: usize,
    pub panels: Vec<Panel>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

/// Filter predicates a page may honour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Predicate {
    City,
    Category,
    Payment,
    Dates,
    Branch,
}

/// Split `filter` into the predicates a page supports and descriptions of the rest.
pub(crate) fn scope(filter: &FilterSpec, allowed: &[Predicate]) -> (FilterSpec, Vec<String>) {
    let mut kept = FilterSpec::default();
    let mut dropped = FilterSpec::default();
    let keep = |predicate: Predicate| allowed.contains(&predicate);

    let target = if keep(Predicate::City) { &mut kept } else { &mut dropped };
    target.city = filter.city.clone();

    let target = if keep(Predicate::Category) { &mut kept } else { &mut dropped };
    target.category = filter.category.clone();

    let target = if keep(Predicate::Payment) { &mut kept } else { &mut dropped };
    target.payment_method = filter.payment_method.clone();

    let target = if keep(Predicate::Dates) { &mut kept } else { &mut dropped };
    target.date_range = filter.date_range;

    let target = if keep(Predicate::Branch) { &mut kept } else { &mut dropped };
    target.branch = filter.branch.clone();

    (kept, dropped.describe())
}
