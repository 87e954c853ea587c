use crate::benchmark::BenchmarkMap;
use crate::config::{ScoreWeights, ScoringConfig};
use crate::error::{AppError, Result};
use crate::scorer::classifier::classify;
use crate::scorer::factors::{
    amenity_score, host_status_score, market_positioning_score, occupancy_score, revenue_score,
    review_score, seasonal_stability_score,
};
use crate::types::{
    ComponentScores, InvestmentScore, Property, RevenueMetrics, ReviewStatistics, ScoreBreakdown,
};

/// Combines the seven factor scores into one graded investment score.
///
/// Holds only immutable configuration, so one instance can be shared across
/// scoring workers behind an `Arc`.
#[derive(Debug, Clone)]
pub struct CompositeCalculator {
    cfg: ScoringConfig,
}

impl CompositeCalculator {
    pub fn new(cfg: ScoringConfig) -> Self {
        Self { cfg }
    }

    /// Score one property against a frozen benchmark map.
    ///
    /// Fails only when the property itself is malformed (non-finite amounts,
    /// occupancy outside [0, 1], negative counts). Missing data is not an error.
    pub fn score(
        &self,
        property: &Property,
        reviews: Option<&ReviewStatistics>,
        benchmarks: &BenchmarkMap,
    ) -> Result<InvestmentScore> {
        validate(property, reviews)?;

        let revenue = revenue_score(property, benchmarks);
        let components = ComponentScores {
            revenue: revenue.score,
            occupancy: occupancy_score(property, reviews),
            positioning: market_positioning_score(property, benchmarks),
            reviews: review_score(property, reviews),
            amenities: amenity_score(property, reviews),
            host_status: host_status_score(property),
            seasonal: seasonal_stability_score(reviews),
        };

        // Ladders see the unrounded total; rounding is for storage only.
        let raw_total = weighted_total(&components, &self.cfg.weights).clamp(0.0, 100.0);
        let (grade, investment_tier, is_top_opportunity) = classify(raw_total, &self.cfg);

        let revenue_metrics = RevenueMetrics {
            revenue_ratio: revenue.revenue_ratio,
            potential_gap: revenue.potential_gap,
        };

        Ok(InvestmentScore {
            property_id: property.property_id.clone(),
            total_score: round2(raw_total),
            grade,
            investment_tier,
            components,
            market_area: property.market_area.clone(),
            bedroom_count: property.bedrooms,
            revenue_vs_market_avg: revenue.revenue_ratio,
            revenue_potential_gap: revenue.potential_gap,
            is_top_opportunity,
            calculated_at: None,
            breakdown: ScoreBreakdown {
                component_scores: components,
                weights: self.cfg.weights,
                revenue_metrics,
            },
        })
    }
}

pub fn weighted_total(c: &ComponentScores, w: &ScoreWeights) -> f64 {
    c.revenue * w.revenue_performance
        + c.occupancy * w.occupancy_quality
        + c.positioning * w.market_positioning
        + c.reviews * w.review_strength
        + c.amenities * w.amenity_value
        + c.host_status * w.host_status
        + c.seasonal * w.seasonal_stability
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn validate(property: &Property, reviews: Option<&ReviewStatistics>) -> Result<()> {
    let invalid = |reason: String| AppError::InvalidProperty {
        property_id: property.property_id.clone(),
        reason,
    };

    let amounts = [
        ("revenue", property.revenue),
        ("revenue_potential", property.revenue_potential),
        ("adr", property.adr),
        ("occupancy", property.occupancy),
        ("stars", property.stars),
        ("property_rating", property.property_rating),
    ];
    if let Some((name, _)) = amounts.iter().find(|(_, v)| v.is_some_and(|v| !v.is_finite())) {
        return Err(invalid(format!("{name} is not a finite number")));
    }

    if let Some(occupancy) = property.occupancy {
        if !(0.0..=1.0).contains(&occupancy) {
            return Err(invalid(format!("occupancy {occupancy} outside [0, 1]")));
        }
    }
    if property.bedrooms.is_some_and(|b| b < 0) {
        return Err(invalid("negative bedroom count".to_string()));
    }
    if property.review_count < 0 {
        return Err(invalid("negative review count".to_string()));
    }

    if let Some(r) = reviews {
        let rates = [
            ("avg_reviews_per_month", r.avg_reviews_per_month),
            ("pct_stayed_with_kids", r.pct_stayed_with_kids),
        ];
        if let Some((name, _)) = rates.iter().find(|(_, v)| v.is_some_and(|v| !v.is_finite())) {
            return Err(invalid(format!("review statistic {name} is not a finite number")));
        }
    }

    Ok(())
}
