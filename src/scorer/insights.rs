use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::{GROUP_TOP_PROPERTIES, MAX_KEY_STRENGTHS};
use crate::db::reader::MarketStats;
use crate::scorer::composite::round2;
use crate::types::{Grade, InvestmentScore, InvestmentTier, Property};

/// Sub-score at which a factor counts as a headline strength.
const STRENGTH_THRESHOLD: f64 = 85.0;

/// Short, human-readable reasons behind a high score, most important first.
pub fn key_strengths(property: &Property, score: &InvestmentScore) -> Vec<String> {
    let c = &score.components;
    let ratio = score.revenue_vs_market_avg;

    let candidates = [
        (c.revenue >= STRENGTH_THRESHOLD, "Exceptional Revenue Performance"),
        (c.occupancy >= STRENGTH_THRESHOLD, "High Occupancy Consistency"),
        (c.reviews >= STRENGTH_THRESHOLD, "Outstanding Reviews"),
        (c.amenities >= STRENGTH_THRESHOLD, "Premium Amenities"),
        (property.host.superhost, "Superhost"),
        (property.host.guest_favorite, "Guest Favorite"),
        (ratio > 1.5, "150%+ Above Market Average"),
        (ratio > 1.25 && ratio <= 1.5, "Above Market Average"),
        (property.amenities.pool(), "Pool"),
        (property.amenities.has_waterfront, "Waterfront"),
    ];

    candidates
        .into_iter()
        .filter(|(hit, _)| *hit)
        .map(|(_, label)| label.to_string())
        .take(MAX_KEY_STRENGTHS)
        .collect()
}

// ---------------------------------------------------------------------------
// Top performers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopPerformer {
    pub property_id: String,
    pub market_area: String,
    pub bedroom_count: Option<i64>,
    pub total_score: f64,
    pub grade: Grade,
    pub investment_tier: InvestmentTier,
    pub revenue: Option<f64>,
    pub revenue_vs_market_avg: f64,
    pub occupancy: Option<f64>,
    pub adr: Option<f64>,
    pub is_top_opportunity: bool,
    pub key_strengths: Vec<String>,
}

impl TopPerformer {
    /// `property` is `None` when the listing vanished after it was scored.
    pub fn new(score: InvestmentScore, property: Option<&Property>) -> Self {
        let key_strengths = property.map(|p| key_strengths(p, &score)).unwrap_or_default();
        Self {
            revenue: property.and_then(|p| p.revenue),
            occupancy: property.and_then(|p| p.occupancy),
            adr: property.and_then(|p| p.adr),
            property_id: score.property_id,
            market_area: score.market_area,
            bedroom_count: score.bedroom_count,
            total_score: score.total_score,
            grade: score.grade,
            investment_tier: score.investment_tier,
            revenue_vs_market_avg: score.revenue_vs_market_avg,
            is_top_opportunity: score.is_top_opportunity,
            key_strengths,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketGroup {
    pub market_area: String,
    pub property_count: usize,
    pub avg_score: f64,
    pub top_properties: Vec<TopPerformer>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BedroomGroup {
    pub bedroom_count: i64,
    pub property_count: usize,
    pub avg_score: f64,
    pub top_properties: Vec<TopPerformer>,
}

/// (count, rounded average, leading members). Members arrive best first.
fn summarize(members: &[&TopPerformer]) -> (usize, f64, Vec<TopPerformer>) {
    let avg = members.iter().map(|p| p.total_score).sum::<f64>() / members.len() as f64;
    let top = members
        .iter()
        .take(GROUP_TOP_PROPERTIES)
        .map(|p| (*p).clone())
        .collect();
    (members.len(), round2(avg), top)
}

/// Performers grouped by market area, best average first.
pub fn group_by_market(performers: &[TopPerformer]) -> Vec<MarketGroup> {
    let mut groups: BTreeMap<&str, Vec<&TopPerformer>> = BTreeMap::new();
    for p in performers {
        groups.entry(p.market_area.as_str()).or_default().push(p);
    }

    let mut out: Vec<MarketGroup> = groups
        .into_iter()
        .map(|(market, members)| {
            let (property_count, avg_score, top_properties) = summarize(&members);
            MarketGroup {
                market_area: market.to_string(),
                property_count,
                avg_score,
                top_properties,
            }
        })
        .collect();
    out.sort_by(|a, b| b.avg_score.total_cmp(&a.avg_score));
    out
}

/// Performers grouped by bedroom count, ascending. Unknown counts are left out.
pub fn group_by_bedroom(performers: &[TopPerformer]) -> Vec<BedroomGroup> {
    let mut groups: BTreeMap<i64, Vec<&TopPerformer>> = BTreeMap::new();
    for p in performers {
        if let Some(bedrooms) = p.bedroom_count {
            groups.entry(bedrooms).or_default().push(p);
        }
    }

    groups
        .into_iter()
        .map(|(bedroom_count, members)| {
            let (property_count, avg_score, top_properties) = summarize(&members);
            BedroomGroup {
                bedroom_count,
                property_count,
                avg_score,
                top_properties,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Market comparison
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketComparison {
    pub market_area: String,
    pub bedroom_count: i64,
    pub market_avg_revenue: f64,
    pub market_avg_adr: f64,
    pub market_avg_occupancy: f64,
    pub market_avg_score: f64,
    pub property_count: i64,
    pub revenue_vs_market: f64,
    pub adr_vs_market: f64,
    /// Score points above (or below) the segment average.
    pub score_vs_market: f64,
}

fn ratio(value: Option<f64>, avg: f64) -> f64 {
    if avg == 0.0 {
        0.0
    } else {
        value.unwrap_or(0.0) / avg
    }
}

/// How a scored property sits within its market and bedroom segment.
/// `None` when the segment holds no scored property.
pub fn market_comparison(
    property: &Property,
    score: &InvestmentScore,
    bedroom_count: i64,
    stats: &MarketStats,
) -> Option<MarketComparison> {
    if stats.property_count == 0 {
        return None;
    }
    let avg_revenue = stats.avg_revenue.unwrap_or(0.0);
    let avg_adr = stats.avg_adr.unwrap_or(0.0);
    let avg_score = stats.avg_score.unwrap_or(0.0);

    Some(MarketComparison {
        market_area: property.market_area.clone(),
        bedroom_count,
        market_avg_revenue: avg_revenue,
        market_avg_adr: avg_adr,
        market_avg_occupancy: stats.avg_occupancy.unwrap_or(0.0),
        market_avg_score: avg_score,
        property_count: stats.property_count,
        revenue_vs_market: ratio(property.revenue, avg_revenue),
        adr_vs_market: ratio(property.adr, avg_adr),
        score_vs_market: score.total_score - avg_score,
    })
}
