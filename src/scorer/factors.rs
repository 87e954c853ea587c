//! The seven sub-scores. Every function is pure and returns a value in [0, 100].
//!
//! Missing data never fails a scorer; each one falls back to a fixed neutral
//! value instead, so an incomplete listing still gets a full score record.

use crate::benchmark::{benchmark_for, BenchmarkMap};
use crate::stats::percentile_rank;
use crate::types::{PriceTier, Property, ReviewStatistics};

/// Score used wherever there is nothing to compare against.
pub const NEUTRAL_SCORE: f64 = 50.0;

fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, 100.0)
}

/// Treats zero like a missing amount.
fn non_zero(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0)
}

// ---------------------------------------------------------------------------
// Revenue performance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevenueScore {
    pub score: f64,
    pub revenue_ratio: f64,
    pub potential_gap: f64,
}

impl RevenueScore {
    const NO_DATA: Self = Self { score: 0.0, revenue_ratio: 0.0, potential_gap: 0.0 };
    const AT_MARKET: Self = Self { score: NEUTRAL_SCORE, revenue_ratio: 1.0, potential_gap: 0.0 };
}

/// Revenue against the bedroom-count market average, plus an upside bonus
/// when the listing's revenue potential is well above what it earns.
pub fn revenue_score(property: &Property, benchmarks: &BenchmarkMap) -> RevenueScore {
    let (Some(revenue), Some(_)) = (non_zero(property.revenue), property.bedrooms) else {
        return RevenueScore::NO_DATA;
    };
    let Some(market) = benchmark_for(benchmarks, property) else {
        return RevenueScore::AT_MARKET;
    };
    if market.avg_revenue == 0.0 {
        return RevenueScore::AT_MARKET;
    }

    let revenue_ratio = revenue / market.avg_revenue;
    let potential_gap = non_zero(property.revenue_potential)
        .map(|potential| (potential - revenue) / revenue)
        .unwrap_or(0.0);

    let mut score = (revenue_ratio * 100.0).min(100.0);
    if revenue_ratio > 1.0 {
        score += (revenue_ratio - 1.0) * 50.0;
    }
    if potential_gap > 0.2 {
        score += 20.0;
    }

    // Bonuses stack on the capped base; only the final value is clamped.
    RevenueScore { score: clamp_score(score), revenue_ratio, potential_gap }
}

// ---------------------------------------------------------------------------
// Occupancy quality
// ---------------------------------------------------------------------------

/// Missing months at or below this count carry no penalty.
const GAP_PENALTY_FREE_MONTHS: i64 = 3;

pub fn occupancy_score(property: &Property, reviews: Option<&ReviewStatistics>) -> f64 {
    let base = property.occupancy.unwrap_or(0.0) * 100.0;
    let Some(reviews) = reviews else {
        return clamp_score(base);
    };

    let months_overall = reviews.months_overall.unwrap_or(0);
    let consistency_bonus = if months_overall > 0 {
        reviews.months_with_reviews.unwrap_or(0) as f64 / months_overall as f64 * 20.0
    } else {
        0.0
    };

    let missing = reviews.missing_months_trailing_12.unwrap_or(0);
    let gap_penalty = if missing > GAP_PENALTY_FREE_MONTHS {
        missing as f64 * 5.0
    } else {
        0.0
    };

    clamp_score(base + consistency_bonus - gap_penalty)
}

// ---------------------------------------------------------------------------
// Market positioning
// ---------------------------------------------------------------------------

/// Fixed desirability of each price tier. Upscale is the sweet spot; the top
/// tiers lose a little to a thinner guest pool.
pub fn tier_score(tier: Option<PriceTier>) -> f64 {
    match tier {
        Some(PriceTier::Luxury) => 85.0,
        Some(PriceTier::UpperUpscale) => 90.0,
        Some(PriceTier::Upscale) => 100.0,
        Some(PriceTier::UpperMidscale) => 80.0,
        Some(PriceTier::Midscale) => 60.0,
        Some(PriceTier::Economy) => 40.0,
        None => NEUTRAL_SCORE,
    }
}

/// Maps an ADR percentile onto the positioning curve.
fn adr_curve(adr_percentile: f64) -> f64 {
    if (60.0..=85.0).contains(&adr_percentile) {
        100.0
    } else if adr_percentile > 85.0 {
        70.0
    } else {
        adr_percentile
    }
}

pub fn market_positioning_score(property: &Property, benchmarks: &BenchmarkMap) -> f64 {
    if property.bedrooms.is_none() {
        return NEUTRAL_SCORE;
    }
    let Some(market) = benchmark_for(benchmarks, property) else {
        return NEUTRAL_SCORE;
    };

    let adr_score = match non_zero(property.adr) {
        Some(adr) => adr_curve(percentile_rank(adr, &market.adr_distribution)),
        None => NEUTRAL_SCORE,
    };

    clamp_score(adr_score * 0.6 + tier_score(property.price_tier) * 0.4)
}

// ---------------------------------------------------------------------------
// Review strength
// ---------------------------------------------------------------------------

pub fn review_score(property: &Property, reviews: Option<&ReviewStatistics>) -> f64 {
    let Some(reviews) = reviews else {
        let rating = non_zero(property.stars).unwrap_or(property.property_rating.unwrap_or(0.0));
        return clamp_score(rating / 5.0 * 100.0);
    };

    let volume = (property.review_count as f64 / 50.0 * 100.0).min(100.0);
    let rating = property.stars.unwrap_or(0.0) / 5.0 * 100.0;
    let velocity = (reviews.avg_reviews_per_month.unwrap_or(0.0) * 20.0).min(100.0);

    let high_season = reviews.high_season_reviews.unwrap_or(0);
    let recency_bonus = if high_season > 10 {
        15.0
    } else if high_season > 5 {
        10.0
    } else {
        0.0
    };

    clamp_score(volume * 0.3 + rating * 0.4 + velocity * 0.3 + recency_bonus)
}

// ---------------------------------------------------------------------------
// Amenity value
// ---------------------------------------------------------------------------

const HIGH_VALUE_POINTS: f64 = 15.0;
const MEDIUM_VALUE_POINTS: f64 = 8.0;
const FAMILY_POINTS: f64 = 10.0;
const BASIC_POINTS: f64 = 5.0;

/// Family amenities only count when more than this share of guests brought kids.
const FAMILY_GUEST_SHARE: f64 = 0.3;

fn count(flags: &[bool]) -> f64 {
    flags.iter().filter(|&&f| f).count() as f64
}

pub fn amenity_score(property: &Property, reviews: Option<&ReviewStatistics>) -> f64 {
    let a = &property.amenities;

    let high_value = count(&[
        a.pool(),
        a.hot_tub(),
        a.has_waterfront,
        a.has_beach_access,
        a.system_view_ocean,
        a.system_view_mountain,
        a.system_firepit,
        a.system_grill,
    ]);
    let medium_value = count(&[a.gym(), a.games(), a.has_lake_access, a.has_outdoor_dining_area]);
    let basic = count(&[a.has_aircon, a.has_kitchen, a.has_parking, a.has_pets_allowed]);

    let family_market = reviews
        .and_then(|r| r.pct_stayed_with_kids)
        .is_some_and(|pct| pct > FAMILY_GUEST_SHARE);
    let family = if family_market {
        count(&[a.system_crib, a.system_pack_n_play, a.system_play_slide])
    } else {
        0.0
    };

    clamp_score(
        high_value * HIGH_VALUE_POINTS
            + medium_value * MEDIUM_VALUE_POINTS
            + family * FAMILY_POINTS
            + basic * BASIC_POINTS,
    )
}

// ---------------------------------------------------------------------------
// Host status
// ---------------------------------------------------------------------------

pub fn host_status_score(property: &Property) -> f64 {
    let host = &property.host;
    let mut score = 0.0;
    if host.superhost {
        score += 60.0;
    }
    if host.guest_favorite {
        score += 40.0;
    }
    if host.instant_book {
        score += 20.0;
    }
    clamp_score(score)
}

// ---------------------------------------------------------------------------
// Seasonal stability
// ---------------------------------------------------------------------------

pub fn seasonal_stability_score(reviews: Option<&ReviewStatistics>) -> f64 {
    let Some(reviews) = reviews else {
        return NEUTRAL_SCORE;
    };

    let high_season = reviews.high_season_reviews.unwrap_or(0) as f64;
    let total = match reviews.total_reviews {
        Some(t) if t != 0 => t as f64,
        _ => 1.0,
    };
    let concentration = high_season / total;

    let mut score: f64 = if (0.4..=0.6).contains(&concentration) {
        100.0
    } else if concentration > 0.8 {
        40.0
    } else {
        70.0
    };

    // Booked every month of the trailing year.
    if reviews.missing_months_trailing_12.unwrap_or(0) == 0 {
        score = (score + 20.0).min(100.0);
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark::build_benchmarks;
    use crate::types::{Amenities, HostStatus};

    fn three_bed(revenue: Option<f64>) -> Property {
        Property {
            property_id: "p1".to_string(),
            market_area: "Destin".to_string(),
            bedrooms: Some(3),
            revenue,
            ..Default::default()
        }
    }

    /// Two 3-bedroom comps averaging 50,000 with ADRs 100..=400.
    fn market() -> BenchmarkMap {
        let comps = vec![
            Property { adr: Some(100.0), ..three_bed(Some(40_000.0)) },
            Property { adr: Some(200.0), ..three_bed(Some(60_000.0)) },
            Property { adr: Some(300.0), ..three_bed(Some(45_000.0)) },
            Property { adr: Some(400.0), ..three_bed(Some(55_000.0)) },
        ];
        build_benchmarks(&comps)
    }

    fn stats() -> ReviewStatistics {
        ReviewStatistics {
            total_reviews: Some(40),
            months_overall: Some(24),
            months_with_reviews: Some(18),
            high_season_reviews: Some(20),
            missing_months_trailing_12: Some(0),
            ..Default::default()
        }
    }

    // --- revenue ---

    #[test]
    fn revenue_null_scores_zero() {
        let r = revenue_score(&three_bed(None), &market());
        assert_eq!(r, RevenueScore { score: 0.0, revenue_ratio: 0.0, potential_gap: 0.0 });

        let no_beds = Property { bedrooms: None, ..three_bed(Some(60_000.0)) };
        assert_eq!(revenue_score(&no_beds, &market()).score, 0.0);
    }

    #[test]
    fn revenue_without_benchmark_is_at_market() {
        let r = revenue_score(&three_bed(Some(60_000.0)), &BenchmarkMap::new());
        assert_eq!(r.score, 50.0);
        assert_eq!(r.revenue_ratio, 1.0);
        assert_eq!(r.potential_gap, 0.0);
    }

    #[test]
    fn revenue_above_market_clamps_only_at_the_end() {
        // ratio 1.2: base min(100, 120) = 100, +10 bonus, final clamp → 100
        let r = revenue_score(&three_bed(Some(60_000.0)), &market());
        assert!((r.revenue_ratio - 1.2).abs() < 1e-12);
        assert_eq!(r.score, 100.0);
    }

    #[test]
    fn revenue_below_market_is_linear() {
        let r = revenue_score(&three_bed(Some(40_000.0)), &market());
        assert!((r.revenue_ratio - 0.8).abs() < 1e-12);
        assert!((r.score - 80.0).abs() < 1e-9);
    }

    #[test]
    fn revenue_potential_gap_bonus() {
        let p = Property { revenue_potential: Some(30_000.0), ..three_bed(Some(20_000.0)) };
        let r = revenue_score(&p, &market());
        // ratio 0.4 → 40, gap 0.5 → +20
        assert!((r.potential_gap - 0.5).abs() < 1e-12);
        assert!((r.score - 60.0).abs() < 1e-9);

        let small_gap = Property { revenue_potential: Some(22_000.0), ..three_bed(Some(20_000.0)) };
        assert!((revenue_score(&small_gap, &market()).score - 40.0).abs() < 1e-9);
    }

    // --- occupancy ---

    #[test]
    fn occupancy_without_reviews_is_base() {
        let p = Property { occupancy: Some(0.62), ..three_bed(None) };
        assert!((occupancy_score(&p, None) - 62.0).abs() < 1e-9);
        assert_eq!(occupancy_score(&three_bed(None), None), 0.0);
    }

    #[test]
    fn occupancy_consistency_bonus_and_gap_penalty() {
        let p = Property { occupancy: Some(0.5), ..three_bed(None) };
        let mut r = stats();
        // 50 + 18/24*20 = 65
        assert!((occupancy_score(&p, Some(&r)) - 65.0).abs() < 1e-9);

        // 3 missing months: no penalty
        r.missing_months_trailing_12 = Some(3);
        assert!((occupancy_score(&p, Some(&r)) - 65.0).abs() < 1e-9);

        // 4 missing months: full 20 point penalty, not partial
        r.missing_months_trailing_12 = Some(4);
        assert!((occupancy_score(&p, Some(&r)) - 45.0).abs() < 1e-9);
    }

    #[test]
    fn occupancy_clamps_to_range() {
        let full = Property { occupancy: Some(1.0), ..three_bed(None) };
        assert_eq!(occupancy_score(&full, Some(&stats())), 100.0);

        let empty = Property { occupancy: Some(0.0), ..three_bed(None) };
        let r = ReviewStatistics { missing_months_trailing_12: Some(12), ..Default::default() };
        assert_eq!(occupancy_score(&empty, Some(&r)), 0.0);
    }

    // --- positioning ---

    #[test]
    fn positioning_without_benchmark_is_neutral() {
        let p = Property { adr: Some(250.0), price_tier: Some(PriceTier::Upscale), ..three_bed(None) };
        assert_eq!(market_positioning_score(&p, &BenchmarkMap::new()), 50.0);

        let no_beds = Property { bedrooms: None, ..p };
        assert_eq!(market_positioning_score(&no_beds, &market()), 50.0);
    }

    #[test]
    fn positioning_sweet_spot() {
        // 350 beats 100/200/300 → 75th percentile → 100; Upscale → 100
        let p = Property { adr: Some(350.0), price_tier: Some(PriceTier::Upscale), ..three_bed(None) };
        assert!((market_positioning_score(&p, &market()) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn positioning_outlier_and_low_percentiles() {
        // above everything → 100th percentile → 70; no tier → 50
        let high = Property { adr: Some(900.0), ..three_bed(None) };
        assert!((market_positioning_score(&high, &market()) - (70.0 * 0.6 + 50.0 * 0.4)).abs() < 1e-9);

        // beats one of four → 25; Economy → 40
        let low = Property { adr: Some(150.0), price_tier: Some(PriceTier::Economy), ..three_bed(None) };
        assert!((market_positioning_score(&low, &market()) - (25.0 * 0.6 + 40.0 * 0.4)).abs() < 1e-9);
    }

    #[test]
    fn positioning_without_adr_uses_neutral_adr_score() {
        let p = Property { price_tier: Some(PriceTier::Luxury), ..three_bed(None) };
        assert!((market_positioning_score(&p, &market()) - (50.0 * 0.6 + 85.0 * 0.4)).abs() < 1e-9);
    }

    #[test]
    fn tier_table() {
        assert_eq!(tier_score(Some(PriceTier::UpperUpscale)), 90.0);
        assert_eq!(tier_score(Some(PriceTier::UpperMidscale)), 80.0);
        assert_eq!(tier_score(Some(PriceTier::Midscale)), 60.0);
        assert_eq!(tier_score(None), 50.0);
    }

    // --- reviews ---

    #[test]
    fn review_fallbacks_without_stats() {
        let starred = Property { stars: Some(4.5), property_rating: Some(3.0), ..three_bed(None) };
        assert!((review_score(&starred, None) - 90.0).abs() < 1e-9);

        let rated = Property { property_rating: Some(4.0), ..three_bed(None) };
        assert!((review_score(&rated, None) - 80.0).abs() < 1e-9);

        assert_eq!(review_score(&three_bed(None), None), 0.0);
    }

    #[test]
    fn review_weighted_combination() {
        let p = Property { stars: Some(5.0), review_count: 25, ..three_bed(None) };
        let r = ReviewStatistics {
            avg_reviews_per_month: Some(2.0),
            high_season_reviews: Some(8),
            ..Default::default()
        };
        // volume 50*0.3 + rating 100*0.4 + velocity 40*0.3 + 10
        assert!((review_score(&p, Some(&r)) - 77.0).abs() < 1e-9);
    }

    #[test]
    fn review_score_caps_at_100() {
        let p = Property { stars: Some(5.0), review_count: 500, ..three_bed(None) };
        let r = ReviewStatistics {
            avg_reviews_per_month: Some(9.0),
            high_season_reviews: Some(40),
            ..Default::default()
        };
        assert_eq!(review_score(&p, Some(&r)), 100.0);
    }

    // --- amenities ---

    #[test]
    fn amenity_groups_add_up() {
        let p = Property {
            amenities: Amenities {
                has_pool: true,
                system_pool: true, // same signal as has_pool
                has_lake_access: true,
                has_kitchen: true,
                has_parking: true,
                ..Default::default()
            },
            ..three_bed(None)
        };
        // 15 + 8 + 5 + 5
        assert_eq!(amenity_score(&p, None), 33.0);
    }

    #[test]
    fn family_amenities_need_family_guests() {
        let p = Property {
            amenities: Amenities {
                system_crib: true,
                system_pack_n_play: true,
                system_play_slide: true,
                ..Default::default()
            },
            ..three_bed(None)
        };
        assert_eq!(amenity_score(&p, None), 0.0);

        let few_kids = ReviewStatistics { pct_stayed_with_kids: Some(0.3), ..Default::default() };
        assert_eq!(amenity_score(&p, Some(&few_kids)), 0.0);

        let families = ReviewStatistics { pct_stayed_with_kids: Some(0.45), ..Default::default() };
        assert_eq!(amenity_score(&p, Some(&families)), 30.0);
    }

    #[test]
    fn amenity_score_is_monotonic_and_capped() {
        let families = ReviewStatistics { pct_stayed_with_kids: Some(0.9), ..Default::default() };
        let setters: [fn(&mut Amenities); 21] = [
            |a| a.has_pool = true,
            |a| a.has_hottub = true,
            |a| a.has_waterfront = true,
            |a| a.has_beach_access = true,
            |a| a.system_view_ocean = true,
            |a| a.system_view_mountain = true,
            |a| a.system_firepit = true,
            |a| a.system_grill = true,
            |a| a.has_gym = true,
            |a| a.system_pool_table = true,
            |a| a.has_lake_access = true,
            |a| a.has_outdoor_dining_area = true,
            |a| a.system_crib = true,
            |a| a.system_pack_n_play = true,
            |a| a.system_play_slide = true,
            |a| a.has_aircon = true,
            |a| a.has_kitchen = true,
            |a| a.has_parking = true,
            |a| a.has_pets_allowed = true,
            |a| a.system_movie = true,
            |a| a.has_outdoor_furniture = true,
        ];

        let mut p = three_bed(None);
        let mut previous = amenity_score(&p, Some(&families));
        for set in setters {
            set(&mut p.amenities);
            let score = amenity_score(&p, Some(&families));
            assert!(score >= previous, "{score} < {previous}");
            assert!(score <= 100.0);
            previous = score;
        }
        assert_eq!(previous, 100.0);
    }

    // --- host ---

    #[test]
    fn host_status_caps_at_100() {
        let all = Property {
            host: HostStatus { superhost: true, guest_favorite: true, instant_book: true },
            ..three_bed(None)
        };
        assert_eq!(host_status_score(&all), 100.0);

        let superhost = Property {
            host: HostStatus { superhost: true, instant_book: true, ..Default::default() },
            ..three_bed(None)
        };
        assert_eq!(host_status_score(&superhost), 80.0);
        assert_eq!(host_status_score(&three_bed(None)), 0.0);
    }

    // --- seasonal ---

    #[test]
    fn seasonal_without_reviews_is_neutral() {
        assert_eq!(seasonal_stability_score(None), 50.0);
    }

    #[test]
    fn seasonal_balanced_year_round_caps_at_100() {
        // concentration 20/40 = 0.5, no missing months
        assert_eq!(seasonal_stability_score(Some(&stats())), 100.0);
    }

    #[test]
    fn seasonal_curve() {
        let mut r = stats();
        r.missing_months_trailing_12 = Some(2);

        r.high_season_reviews = Some(36); // 0.9
        assert_eq!(seasonal_stability_score(Some(&r)), 40.0);

        r.high_season_reviews = Some(30); // 0.75
        assert_eq!(seasonal_stability_score(Some(&r)), 70.0);

        r.high_season_reviews = Some(4); // 0.1
        assert_eq!(seasonal_stability_score(Some(&r)), 70.0);

        r.missing_months_trailing_12 = Some(0);
        assert_eq!(seasonal_stability_score(Some(&r)), 90.0);
    }

    #[test]
    fn seasonal_full_year_bonus_lifts_every_curve_band() {
        let mut r = stats();
        r.missing_months_trailing_12 = Some(0);

        r.high_season_reviews = Some(36); // 0.9
        assert_eq!(seasonal_stability_score(Some(&r)), 60.0);

        r.high_season_reviews = Some(30); // 0.75
        assert_eq!(seasonal_stability_score(Some(&r)), 90.0);

        r.high_season_reviews = Some(20); // 0.5
        assert_eq!(seasonal_stability_score(Some(&r)), 100.0);
    }

    #[test]
    fn seasonal_zero_total_uses_unit_denominator() {
        let r = ReviewStatistics {
            total_reviews: Some(0),
            high_season_reviews: Some(0),
            missing_months_trailing_12: Some(6),
            ..Default::default()
        };
        // concentration 0 → 70
        assert_eq!(seasonal_stability_score(Some(&r)), 70.0);
    }
}
