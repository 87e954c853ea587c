use crate::config::ScoringConfig;
use crate::types::{Grade, InvestmentTier};

/// Classify a total score on both ladders.
/// Returns (Grade, InvestmentTier, is_top_opportunity).
pub fn classify(total_score: f64, cfg: &ScoringConfig) -> (Grade, InvestmentTier, bool) {
    let grade = cfg
        .grade_ladder
        .iter()
        .find(|(min, _)| total_score >= *min)
        .map(|(_, g)| *g)
        .unwrap_or(Grade::D);

    let tier = cfg
        .tier_ladder
        .iter()
        .find(|(min, _)| total_score >= *min)
        .map(|(_, t)| *t)
        .unwrap_or(InvestmentTier::Underperforming);

    let is_top = total_score >= cfg.top_opportunity_threshold;

    (grade, tier, is_top)
}
