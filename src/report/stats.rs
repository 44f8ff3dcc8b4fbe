use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::models::ListingRecord;

const TOP_BRANDS: usize = 10;
const TOP_MODELS: usize = 10;
const TOP_YEARS: usize = 6;
const TOP_LOCATIONS: usize = 7;

/// Label used for listings missing the grouped field
pub const UNKNOWN: &str = "Unknown";

/// The 24 hours ending at a snapshot's capture time, `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReportWindow {
    pub fn ending_at(end: DateTime<Utc>) -> Self {
        Self {
            start: end - Duration::hours(24),
            end,
        }
    }

    pub fn hours(&self) -> f64 {
        (self.end - self.start).num_minutes() as f64 / 60.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceBand {
    Under100k,
    From100kTo200k,
    From200kTo300k,
    Over300k,
}

impl PriceBand {
    pub const ALL: [PriceBand; 4] = [
        PriceBand::Under100k,
        PriceBand::From100kTo200k,
        PriceBand::From200kTo300k,
        PriceBand::Over300k,
    ];

    /// Upper bounds are inclusive for the two middle bands
    pub fn of(price: u64) -> Self {
        match price {
            p if p < 100_000 => PriceBand::Under100k,
            p if p <= 200_000 => PriceBand::From100kTo200k,
            p if p <= 300_000 => PriceBand::From200kTo300k,
            _ => PriceBand::Over300k,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PriceBand::Under100k => "< 100,000",
            PriceBand::From100kTo200k => "100,000 – 200,000",
            PriceBand::From200kTo300k => "200,000 – 300,000",
            PriceBand::Over300k => "> 300,000",
        }
    }
}

/// Value with its occurrence count and share of all listings
#[derive(Debug, Clone, PartialEq)]
pub struct Share {
    pub label: String,
    pub count: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BandCount {
    pub band: PriceBand,
    pub count: usize,
    pub percent: f64,
}

/// Everything a market report shows, computed from one snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct MarketStats {
    pub window: ReportWindow,
    pub total: usize,
    pub listings_per_hour: f64,

    pub priced: usize,
    pub priced_percent: f64,
    pub unpriced: usize,
    pub unpriced_percent: f64,
    pub price_range: Option<(u64, u64)>,
    pub median_price: Option<u64>,
    pub price_bands: Vec<BandCount>,

    pub top_brands: Vec<Share>,
    pub top_models: Vec<Share>,
    pub top_years: Vec<Share>,
    pub transmission: Vec<Share>,
    pub fuel: Vec<Share>,
    pub top_locations: Vec<Share>,

    pub resellers: usize,
    pub private_owners: usize,
    pub private_percent: f64,
}

/// Computes `MarketStats` over a snapshot's listings
#[derive(Debug, Clone)]
pub struct ReportAggregator {
    recency_sentinel: String,
}

impl ReportAggregator {
    pub fn new(recency_sentinel: impl Into<String>) -> Self {
        Self {
            recency_sentinel: recency_sentinel.into(),
        }
    }

    pub fn aggregate(&self, records: &[ListingRecord], window: ReportWindow) -> MarketStats {
        // Older snapshots may predate crawl-time cutoff filtering
        let recent: Vec<&ListingRecord> = records
            .iter()
            .filter(|r| !r.has_recency_label(&self.recency_sentinel))
            .collect();
        let total = recent.len();

        let mut prices: Vec<u64> = recent.iter().filter_map(|r| r.price).collect();
        prices.sort_unstable();
        let priced = prices.len();
        let unpriced = total - priced;

        let price_bands = PriceBand::ALL
            .iter()
            .map(|&band| {
                let count = prices.iter().filter(|&&p| PriceBand::of(p) == band).count();
                BandCount {
                    band,
                    count,
                    percent: percent(count, total),
                }
            })
            .collect();

        let resellers = recent.iter().filter(|r| r.is_reseller()).count();
        let private_owners = total - resellers;
        let hours = window.hours();

        MarketStats {
            window,
            total,
            listings_per_hour: if hours > 0.0 { total as f64 / hours } else { 0.0 },
            priced,
            priced_percent: percent(priced, total),
            unpriced,
            unpriced_percent: percent(unpriced, total),
            price_range: prices.first().zip(prices.last()).map(|(lo, hi)| (*lo, *hi)),
            median_price: median(&prices),
            price_bands,
            top_brands: rank(recent.iter().map(|r| r.brand().to_string()), total, Some(TOP_BRANDS)),
            top_models: rank(recent.iter().map(|r| r.title.clone()), total, Some(TOP_MODELS)),
            top_years: rank(
                recent
                    .iter()
                    .map(|r| r.year.map_or_else(|| UNKNOWN.to_string(), |y| y.to_string())),
                total,
                Some(TOP_YEARS),
            ),
            transmission: rank(recent.iter().map(|r| or_unknown(&r.transmission)), total, None),
            fuel: rank(recent.iter().map(|r| or_unknown(&r.fuel)), total, None),
            top_locations: rank(
                recent.iter().map(|r| or_unknown(&r.location)),
                total,
                Some(TOP_LOCATIONS),
            ),
            resellers,
            private_owners,
            private_percent: percent(private_owners, total),
        }
    }
}

/// Element at index `len / 2` of an ascending list. For even lengths this is
/// the upper of the two middle values, not their mean.
pub fn median(sorted: &[u64]) -> Option<u64> {
    sorted.get(sorted.len() / 2).copied()
}

pub fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 * 100.0 / total as f64
    }
}

fn or_unknown(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| UNKNOWN.to_string())
}

/// Frequency ranking, most frequent first; ties keep first-appearance order
fn rank<I>(values: I, total: usize, limit: Option<usize>) -> Vec<Share>
where
    I: IntoIterator<Item = String>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();

    for value in values {
        match index.get(&value) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(value.clone(), counts.len());
                counts.push((value, 1));
            }
        }
    }

    // stable sort keeps first-appearance order among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    if let Some(limit) = limit {
        counts.truncate(limit);
    }

    counts
        .into_iter()
        .map(|(label, count)| Share {
            label,
            count,
            percent: percent(count, total),
        })
        .collect()
}
