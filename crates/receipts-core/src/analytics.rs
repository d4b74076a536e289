//! Descriptive aggregates behind the three dashboard tabs.
//!
//! Everything here is a read-only pass over a [`Dataset`]. "Top N" series keep
//! the N largest values; ties keep the order in which labels first appear in
//! the upload.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, FixedOffset, Timelike};
use serde::Serialize;

use crate::receipts::{Dataset, LineItem};

pub const DEFAULT_TOP_N: usize = 10;
pub const PRICE_HISTOGRAM_BINS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountEntry {
    pub label: String,
    pub count: usize,
}

/// A count together with its share of all rows, in percent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareEntry {
    pub label: String,
    pub count: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmountEntry {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelMixRow {
    pub brand: String,
    pub counts: BTreeMap<String, usize>,
}

/// Brand × channel purchase counts. Every row carries an entry for every
/// channel in `channels`, zero when the brand never sold through it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelMix {
    pub channels: Vec<String>,
    pub rows: Vec<ChannelMixRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HourCount {
    pub hour: u32,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub price: f64,
    pub discount_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub records: usize,
    pub total_revenue: f64,
    pub total_discount: f64,
    pub first_purchase: Option<DateTime<FixedOffset>>,
    pub last_purchase: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrandPerformance {
    pub purchase_counts: Vec<CountEntry>,
    pub revenue: Vec<AmountEntry>,
    pub channel_mix: ChannelMix,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShoppingHabits {
    pub locations: Vec<ShareEntry>,
    pub hourly_activity: Vec<HourCount>,
    pub channels: Vec<ShareEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingDiscounts {
    pub price_histogram: Vec<HistogramBin>,
    pub discount_scatter: Vec<ScatterPoint>,
    pub brand_average_discount: Vec<AmountEntry>,
}

#[must_use]
pub fn summarize(dataset: &Dataset) -> DatasetSummary {
    DatasetSummary {
        records: dataset.len(),
        total_revenue: dataset.iter().map(|r| r.total_price).sum(),
        total_discount: dataset.iter().map(|r| r.discount).sum(),
        first_purchase: dataset.iter().map(|r| r.date).min(),
        last_purchase: dataset.iter().map(|r| r.date).max(),
    }
}

/// Brand performance tab: purchase frequency, revenue and channel mix.
#[must_use]
pub fn brand_performance(dataset: &Dataset, top: usize) -> BrandPerformance {
    BrandPerformance {
        purchase_counts: brand_purchase_counts(dataset, top),
        revenue: brand_revenue(dataset, top),
        channel_mix: brand_channel_mix(dataset, top),
    }
}

/// Shopping habits tab: where and when people buy, and through which channel.
#[must_use]
pub fn shopping_habits(dataset: &Dataset, top: usize) -> ShoppingHabits {
    ShoppingHabits {
        locations: location_counts(dataset, top),
        hourly_activity: hourly_activity(dataset),
        channels: channel_distribution(dataset),
    }
}

/// Pricing & discounts tab.
#[must_use]
pub fn pricing_discounts(dataset: &Dataset, top: usize) -> PricingDiscounts {
    PricingDiscounts {
        price_histogram: price_histogram(dataset, PRICE_HISTOGRAM_BINS),
        discount_scatter: discount_scatter(dataset),
        brand_average_discount: brand_average_discount(dataset, top),
    }
}

#[must_use]
pub fn brand_purchase_counts(dataset: &Dataset, top: usize) -> Vec<CountEntry> {
    let mut counts = count_by(dataset, |r| &r.brand);
    counts.truncate(top);
    counts
}

#[must_use]
pub fn brand_revenue(dataset: &Dataset, top: usize) -> Vec<AmountEntry> {
    let mut totals: Vec<AmountEntry> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for record in dataset {
        let slot = *index.entry(record.brand.as_str()).or_insert_with(|| {
            totals.push(AmountEntry {
                label: record.brand.clone(),
                value: 0.0,
            });
            totals.len() - 1
        });
        totals[slot].value += record.total_price;
    }
    largest(totals, top)
}

/// Crosstab of brand against channel. Brands are listed alphabetically and
/// only the first `top` are kept.
#[must_use]
pub fn brand_channel_mix(dataset: &Dataset, top: usize) -> ChannelMix {
    let mut table: BTreeMap<&str, BTreeMap<&str, usize>> = BTreeMap::new();
    let mut channels: BTreeSet<&str> = BTreeSet::new();
    for record in dataset {
        channels.insert(record.channel.as_str());
        *table
            .entry(record.brand.as_str())
            .or_default()
            .entry(record.channel.as_str())
            .or_insert(0) += 1;
    }

    let channels: Vec<String> = channels.into_iter().map(str::to_string).collect();
    let rows = table
        .into_iter()
        .take(top)
        .map(|(brand, seen)| ChannelMixRow {
            brand: brand.to_string(),
            counts: channels
                .iter()
                .map(|c| (c.clone(), seen.get(c.as_str()).copied().unwrap_or(0)))
                .collect(),
        })
        .collect();

    ChannelMix { channels, rows }
}

#[must_use]
pub fn location_counts(dataset: &Dataset, top: usize) -> Vec<ShareEntry> {
    let mut shares = with_share(dataset.len(), count_by(dataset, |r| &r.location));
    shares.truncate(top);
    shares
}

/// Purchases per hour of day for the hours that occur, in hour order.
#[must_use]
pub fn hourly_activity(dataset: &Dataset) -> Vec<HourCount> {
    let mut hours: BTreeMap<u32, usize> = BTreeMap::new();
    for record in dataset {
        *hours.entry(record.date.hour()).or_insert(0) += 1;
    }
    hours
        .into_iter()
        .map(|(hour, count)| HourCount { hour, count })
        .collect()
}

#[must_use]
pub fn channel_distribution(dataset: &Dataset) -> Vec<ShareEntry> {
    with_share(dataset.len(), count_by(dataset, |r| &r.channel))
}

/// Equal-width histogram of unit prices.
///
/// Bins span `[min, max]`; every bin is half-open except the last, which also
/// takes the maximum. When all prices are equal the range widens to
/// `[price - 0.5, price + 0.5]`.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn price_histogram(dataset: &Dataset, bins: usize) -> Vec<HistogramBin> {
    if dataset.is_empty() || bins == 0 {
        return Vec::new();
    }

    let (mut lo, mut hi) = dataset
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), r| {
            (lo.min(r.price), hi.max(r.price))
        });
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / bins as f64;
    let mut histogram: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lower: lo + width * i as f64,
            upper: if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();

    for record in dataset {
        let slot = ((record.price - lo) / width) as usize;
        histogram[slot.min(bins - 1)].count += 1;
    }
    histogram
}

/// Unit price against discount percentage, skipping rows without a percentage.
#[must_use]
pub fn discount_scatter(dataset: &Dataset) -> Vec<ScatterPoint> {
    dataset
        .iter()
        .filter_map(|r| {
            r.discount_pct.map(|pct| ScatterPoint {
                price: r.price,
                discount_pct: pct,
            })
        })
        .collect()
}

/// Mean discount percentage per brand. Rows without a percentage are ignored,
/// and brands left with no values are dropped.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn brand_average_discount(dataset: &Dataset, top: usize) -> Vec<AmountEntry> {
    let mut order: Vec<&str> = Vec::new();
    let mut sums: HashMap<&str, (f64, usize)> = HashMap::new();
    for record in dataset {
        let Some(pct) = record.discount_pct else {
            continue;
        };
        let entry = sums.entry(record.brand.as_str()).or_insert_with(|| {
            order.push(record.brand.as_str());
            (0.0, 0)
        });
        entry.0 += pct;
        entry.1 += 1;
    }

    let means = order
        .into_iter()
        .map(|brand| {
            let (sum, n) = sums[&brand];
            AmountEntry {
                label: brand.to_string(),
                value: sum / n as f64,
            }
        })
        .collect();
    largest(means, top)
}

/// Counts rows per label, most frequent first.
fn count_by<F>(dataset: &Dataset, key: F) -> Vec<CountEntry>
where
    F: Fn(&LineItem) -> &String,
{
    let mut counts: Vec<CountEntry> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for record in dataset {
        let label = key(record);
        match index.get(label.as_str()) {
            Some(&slot) => counts[slot].count += 1,
            None => {
                index.insert(label.as_str(), counts.len());
                counts.push(CountEntry {
                    label: label.clone(),
                    count: 1,
                });
            }
        }
    }
    // stable: ties stay in first-seen order
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

#[allow(clippy::cast_precision_loss)]
fn with_share(total: usize, counts: Vec<CountEntry>) -> Vec<ShareEntry> {
    counts
        .into_iter()
        .map(|c| ShareEntry {
            percent: if total == 0 {
                0.0
            } else {
                c.count as f64 / total as f64 * 100.0
            },
            label: c.label,
            count: c.count,
        })
        .collect()
}

fn largest(mut entries: Vec<AmountEntry>, top: usize) -> Vec<AmountEntry> {
    entries.sort_by(|a, b| b.value.total_cmp(&a.value));
    entries.truncate(top);
    entries
}

#[cfg(test)]
#[path = "analytics_test.rs"]
mod tests;
