//! Distributions and descriptive statistics.

use crate::models::{GroupField, GroupKey, SalesRecord, ValueField};
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use std::collections::BTreeMap;

/// One equal-width histogram bin. The last bin of a histogram is closed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Distribution of one value field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub field: ValueField,
    pub bins: Vec<HistogramBin>,
}

impl Histogram {
    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }
}

/// Per-group counts over shared bin edges.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitHistogram {
    pub field: ValueField,
    pub split_by: GroupField,
    pub edges: Vec<(f64, f64)>,
    pub series: Vec<HistogramSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramSeries {
    pub key: GroupKey,
    pub counts: Vec<usize>,
}

/// Count, mean, sample standard deviation, extremes and linear-interpolated quartiles of one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub field: ValueField,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; undefined below two observations.
    pub std: Option<f64>,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

fn values(subset: &[&SalesRecord], field: ValueField) -> Vec<f64> {
    subset
        .iter()
        .map(|r| r.value(field).to_f64().unwrap_or_default())
        .collect()
}

/// Equal-width edges between the minimum and maximum value.
///
/// All-equal input collapses into a single zero-width bin.
fn bin_edges(values: &[f64], bins: usize) -> Vec<(f64, f64)> {
    let Some(min) = values.iter().copied().reduce(f64::min) else {
        return Vec::new();
    };
    let max = values.iter().copied().fold(min, f64::max);

    if max == min {
        return vec![(min, max)];
    }

    let bins = bins.max(1);
    let width = (max - min) / bins as f64;
    (0..bins)
        .map(|i| {
            let lower = min + width * i as f64;
            let upper = if i + 1 == bins { max } else { min + width * (i + 1) as f64 };
            (lower, upper)
        })
        .collect()
}

fn bin_index(value: f64, edges: &[(f64, f64)]) -> usize {
    let (min, _) = edges[0];
    let (_, max) = edges[edges.len() - 1];
    if max == min {
        return 0;
    }
    let width = (max - min) / edges.len() as f64;
    let idx = ((value - min) / width).floor();
    if idx < 0.0 {
        0
    } else {
        (idx as usize).min(edges.len() - 1)
    }
}

fn count_into(values: &[f64], edges: &[(f64, f64)]) -> Vec<usize> {
    let mut counts = vec![0; edges.len()];
    if edges.is_empty() {
        return counts;
    }
    for &value in values {
        counts[bin_index(value, edges)] += 1;
    }
    counts
}

/// Bucket a value field into `bins` equal-width bins.
pub fn histogram(subset: &[&SalesRecord], field: ValueField, bins: usize) -> Histogram {
    let values = values(subset, field);
    let edges = bin_edges(&values, bins);
    let counts = count_into(&values, &edges);

    Histogram {
        field,
        bins: edges
            .into_iter()
            .zip(counts)
            .map(|((lower, upper), count)| HistogramBin { lower, upper, count })
            .collect(),
    }
}

/// Histogram of `field` with one series per value of `split_by`.
pub fn split_histogram(
    subset: &[&SalesRecord],
    field: ValueField,
    split_by: GroupField,
    bins: usize,
) -> SplitHistogram {
    let edges = bin_edges(&values(subset, field), bins);

    let mut groups: BTreeMap<GroupKey, Vec<&SalesRecord>> = BTreeMap::new();
    for &record in subset {
        if let Some(key) = record.group_key(split_by) {
            groups.entry(key).or_default().push(record);
        }
    }

    let series = groups
        .into_iter()
        .map(|(key, records)| HistogramSeries {
            key,
            counts: count_into(&values(&records, field), &edges),
        })
        .collect();

    SplitHistogram {
        field,
        split_by,
        edges,
        series,
    }
}

/// Linear-interpolated quantile of sorted values.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Count, mean, spread and quartiles of a field. `None` for an empty subset.
pub fn describe(subset: &[&SalesRecord], field: ValueField) -> Option<SummaryStats> {
    let mut sorted = values(subset, field);
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let count = sorted.len();
    let mean = sorted.iter().sum::<f64>() / count as f64;
    let std = (count > 1).then(|| {
        let var = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
        var.sqrt()
    });

    Some(SummaryStats {
        field,
        count,
        mean,
        std,
        min: sorted[0],
        q1: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q3: quantile(&sorted, 0.75),
        max: sorted[count - 1],
    })
}
