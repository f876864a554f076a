//! Histogram bins for the dashboard's two distribution charts.

use serde::{Deserialize, Serialize};

use crate::listing::{Listing, PRICE_PER_ACRE_FIELD, SCORE_FIELD};
use crate::numeric::parse_numeric;

const SCORE_BIN_COUNT: usize = 10;
const PRICE_STEP: f64 = 10_000.0;
const PRICE_TARGET_BINS: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinSet {
    pub bins: Vec<HistogramBin>,
}

impl BinSet {
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn total(&self) -> usize {
        self.bins.iter().map(|bin| bin.count).sum()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.bins.iter().map(|bin| bin.label.as_str()).collect()
    }

    pub fn counts(&self) -> Vec<usize> {
        self.bins.iter().map(|bin| bin.count).collect()
    }

    pub fn max_count(&self) -> usize {
        self.bins.iter().map(|bin| bin.count).max().unwrap_or(0)
    }

    fn from_edges(edges: &[f64], label: impl Fn(f64, f64) -> String, samples: &[f64]) -> Self {
        let mut counts = vec![0usize; edges.len().saturating_sub(1)];
        for sample in samples {
            if let Some(idx) = bin_index(edges, *sample) {
                counts[idx] += 1;
            }
        }

        let bins = edges
            .windows(2)
            .zip(counts)
            .map(|(pair, count)| HistogramBin {
                label: label(pair[0], pair[1]),
                count,
            })
            .collect();

        Self { bins }
    }
}

/// Ten equal bins over `[0.0, 1.0]`; samples outside the range are dropped.
pub fn score_bins(samples: impl IntoIterator<Item = f64>) -> BinSet {
    let edges: Vec<f64> = (0..=SCORE_BIN_COUNT)
        .map(|idx| idx as f64 / SCORE_BIN_COUNT as f64)
        .collect();
    let samples = valid_samples(samples);

    BinSet::from_edges(&edges, |lo, hi| format!("{lo:.1}-{hi:.1}"), &samples)
}

/// Range-adaptive bins, widths rounded up to whole 10k steps.
///
/// No valid samples yields an empty set so the chart draws nothing.
pub fn price_per_acre_bins(samples: impl IntoIterator<Item = f64>) -> BinSet {
    let samples = valid_samples(samples);
    let edges = price_edges(&samples);
    if edges.is_empty() {
        return BinSet::default();
    }

    BinSet::from_edges(
        &edges,
        |lo, hi| {
            format!(
                "${}k-${}k",
                (lo / 1_000.0).round() as i64,
                (hi / 1_000.0).round() as i64
            )
        },
        &samples,
    )
}

pub fn score_distribution(listings: &[Listing]) -> BinSet {
    score_bins(field_samples(listings, SCORE_FIELD))
}

pub fn price_per_acre_distribution(listings: &[Listing]) -> BinSet {
    price_per_acre_bins(field_samples(listings, PRICE_PER_ACRE_FIELD))
}

fn field_samples<'a>(listings: &'a [Listing], field: &'a str) -> impl Iterator<Item = f64> + 'a {
    listings
        .iter()
        .map(move |listing| listing.get(field).map(parse_numeric).unwrap_or(f64::NAN))
}

fn valid_samples(samples: impl IntoIterator<Item = f64>) -> Vec<f64> {
    samples.into_iter().filter(|value| value.is_finite()).collect()
}

fn price_edges(samples: &[f64]) -> Vec<f64> {
    let Some(min) = samples.iter().copied().reduce(f64::min) else {
        return Vec::new();
    };
    let max = samples.iter().copied().fold(min, f64::max);

    let min_price = (min / PRICE_STEP).floor() * PRICE_STEP;
    let max_price = (max / PRICE_STEP).ceil() * PRICE_STEP;
    let width = PRICE_STEP.max(((max_price - min_price) / PRICE_TARGET_BINS / PRICE_STEP).ceil() * PRICE_STEP);

    let mut edges = Vec::new();
    let mut edge = min_price;
    while edge <= max_price {
        edges.push(edge);
        edge += width;
    }

    match edges.last().copied() {
        _ if edges.len() < 2 => edges.push(max_price + width),
        // Width rounding can stop short of the maximum; close the range.
        Some(last) if last < max_price => edges.push(last + width),
        _ => {}
    }

    edges
}

// Half-open bins; a sample equal to the final edge lands in the last bin.
fn bin_index(edges: &[f64], sample: f64) -> Option<usize> {
    let bin_count = edges.len().checked_sub(1)?;
    if bin_count == 0 {
        return None;
    }

    edges
        .windows(2)
        .position(|pair| sample >= pair[0] && sample < pair[1])
        .or_else(|| (sample == edges[bin_count]).then_some(bin_count - 1))
}
