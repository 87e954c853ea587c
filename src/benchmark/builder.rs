use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::stats::{mean, median, percentile};
use crate::types::Property;

/// Revenue and ADR statistics for every property sharing a bedroom count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketBenchmark {
    pub avg_revenue: f64,
    pub median_revenue: f64,
    /// 75th indexed percentile of revenue.
    pub top_25_pct: f64,
    pub avg_adr: f64,
    /// Non-zero ADRs in the group, kept for percentile-rank lookups.
    pub adr_distribution: Vec<f64>,
    pub property_count: usize,
}

/// Bedroom count (as a string key) → benchmark. Built once per batch, then
/// shared read-only across scoring workers.
pub type BenchmarkMap = BTreeMap<String, MarketBenchmark>;

/// Looks up the benchmark for a property's bedroom count.
pub fn benchmark_for<'a>(benchmarks: &'a BenchmarkMap, property: &Property) -> Option<&'a MarketBenchmark> {
    property.bedroom_key().and_then(|key| benchmarks.get(&key))
}

/// Group the population by bedroom count and compute per-group statistics.
///
/// Properties without a bedroom count are ignored. A group with no revenue
/// data produces no entry at all, so scorers see it as "no market data".
pub fn build_benchmarks<'a, I>(population: I) -> BenchmarkMap
where
    I: IntoIterator<Item = &'a Property>,
{
    let mut groups: HashMap<i64, Vec<&Property>> = HashMap::new();
    for property in population {
        if let Some(bedrooms) = property.bedrooms {
            if property.revenue.is_some() {
                groups.entry(bedrooms).or_default().push(property);
            }
        }
    }

    groups
        .into_iter()
        .map(|(bedrooms, members)| (bedrooms.to_string(), summarize(&members)))
        .collect()
}

fn summarize(members: &[&Property]) -> MarketBenchmark {
    // Zero amounts are treated as missing, same as nulls.
    let revenues: Vec<f64> = members
        .iter()
        .filter_map(|p| p.revenue)
        .filter(|r| *r != 0.0)
        .collect();
    let adrs: Vec<f64> = members
        .iter()
        .filter_map(|p| p.adr)
        .filter(|a| *a != 0.0)
        .collect();

    MarketBenchmark {
        avg_revenue: mean(&revenues),
        median_revenue: median(&revenues),
        top_25_pct: percentile(&revenues, 75.0),
        avg_adr: mean(&adrs),
        adr_distribution: adrs,
        property_count: members.len(),
    }
}
