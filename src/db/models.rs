//! Database row types matching `migrations/0001_init.sql`.
//! Decoded by hand with `FromRow::from_row` so one bad row can be skipped.

use crate::error::{AppError, Result};
use crate::types::{
    Amenities, ComponentScores, Grade, HostStatus, InvestmentScore, InvestmentTier, PriceTier,
    Property, PropertyRecord, ReviewStatistics, ScoreBreakdown,
};

/// One `properties` row LEFT JOINed with its `property_reviews` row.
#[derive(Debug, sqlx::FromRow)]
pub struct PropertyRow {
    pub property_id: String,
    pub market_area: String,
    pub bedrooms: Option<i64>,
    pub revenue: Option<f64>,
    pub revenue_potential: Option<f64>,
    pub adr: Option<f64>,
    pub price_tier: Option<String>,
    pub occupancy: Option<f64>,
    pub stars: Option<f64>,
    pub property_rating: Option<f64>,
    pub property_reviews: i64,

    pub superhost: bool,
    pub is_guest_favorite: bool,
    pub instant_book: bool,

    pub has_aircon: bool,
    pub has_gym: bool,
    pub has_hottub: bool,
    pub has_kitchen: bool,
    pub has_parking: bool,
    pub has_pets_allowed: bool,
    pub has_pool: bool,
    pub system_gym: bool,
    pub system_pool_table: bool,
    pub system_arcade_machine: bool,
    pub system_movie: bool,
    pub system_bowling: bool,
    pub system_chess: bool,
    pub system_golf: bool,
    pub system_crib: bool,
    pub system_pack_n_play: bool,
    pub system_play_slide: bool,
    pub system_firepit: bool,
    pub system_grill: bool,
    pub system_pool: bool,
    pub system_jacuzzi: bool,
    pub system_view_ocean: bool,
    pub system_view_mountain: bool,
    pub has_outdoor_furniture: bool,
    pub has_waterfront: bool,
    pub has_lake_access: bool,
    pub has_beach_access: bool,
    pub has_outdoor_dining_area: bool,

    /// Non-null iff a `property_reviews` row exists.
    pub review_property_id: Option<String>,
    pub review_total_reviews: Option<i64>,
    pub review_months_overall: Option<i64>,
    pub review_months_with_reviews: Option<i64>,
    pub review_months_without_reviews_overall: Option<i64>,
    pub review_avg_reviews_per_month: Option<f64>,
    pub review_high_season_quarter: Option<i64>,
    pub review_high_season_reviews: Option<i64>,
    pub review_missing_months_trailing_12: Option<i64>,
    pub review_pct_stayed_with_kids: Option<f64>,
    pub review_pct_stayed_with_a_pet: Option<f64>,
    pub review_pct_group_trip: Option<f64>,
}

impl PropertyRow {
    pub fn into_record(self) -> PropertyRecord {
        let reviews = self.review_property_id.as_ref().map(|_| ReviewStatistics {
            total_reviews: self.review_total_reviews,
            months_overall: self.review_months_overall,
            months_with_reviews: self.review_months_with_reviews,
            months_without_reviews: self.review_months_without_reviews_overall,
            avg_reviews_per_month: self.review_avg_reviews_per_month,
            high_season_quarter: self.review_high_season_quarter,
            high_season_reviews: self.review_high_season_reviews,
            missing_months_trailing_12: self.review_missing_months_trailing_12,
            pct_stayed_with_kids: self.review_pct_stayed_with_kids,
            pct_stayed_with_pet: self.review_pct_stayed_with_a_pet,
            pct_group_trip: self.review_pct_group_trip,
        });

        let property = Property {
            property_id: self.property_id,
            market_area: self.market_area,
            bedrooms: self.bedrooms,
            revenue: self.revenue,
            revenue_potential: self.revenue_potential,
            adr: self.adr,
            price_tier: self.price_tier.as_deref().and_then(PriceTier::from_label),
            occupancy: self.occupancy,
            stars: self.stars,
            property_rating: self.property_rating,
            review_count: self.property_reviews,
            amenities: Amenities {
                has_aircon: self.has_aircon,
                has_gym: self.has_gym,
                has_hottub: self.has_hottub,
                has_kitchen: self.has_kitchen,
                has_parking: self.has_parking,
                has_pets_allowed: self.has_pets_allowed,
                has_pool: self.has_pool,
                system_gym: self.system_gym,
                system_pool_table: self.system_pool_table,
                system_arcade_machine: self.system_arcade_machine,
                system_movie: self.system_movie,
                system_bowling: self.system_bowling,
                system_chess: self.system_chess,
                system_golf: self.system_golf,
                system_crib: self.system_crib,
                system_pack_n_play: self.system_pack_n_play,
                system_play_slide: self.system_play_slide,
                system_firepit: self.system_firepit,
                system_grill: self.system_grill,
                system_pool: self.system_pool,
                system_jacuzzi: self.system_jacuzzi,
                system_view_ocean: self.system_view_ocean,
                system_view_mountain: self.system_view_mountain,
                has_outdoor_furniture: self.has_outdoor_furniture,
                has_waterfront: self.has_waterfront,
                has_lake_access: self.has_lake_access,
                has_beach_access: self.has_beach_access,
                has_outdoor_dining_area: self.has_outdoor_dining_area,
            },
            host: HostStatus {
                superhost: self.superhost,
                guest_favorite: self.is_guest_favorite,
                instant_book: self.instant_book,
            },
        };

        PropertyRecord { property, reviews }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct ScoreRow {
    pub property_id: String,
    pub total_score: f64,
    pub grade: String,
    pub investment_tier: String,
    pub revenue_score: f64,
    pub occupancy_score: f64,
    pub positioning_score: f64,
    pub review_score: f64,
    pub amenity_score: f64,
    pub host_status_score: f64,
    pub seasonal_score: f64,
    pub market_area: String,
    pub bedroom_count: Option<i64>,
    pub revenue_vs_market_avg: Option<f64>,
    pub revenue_potential_gap: Option<f64>,
    pub is_top_opportunity: bool,
    pub score_breakdown: String,
    pub calculated_at: i64,
}

impl ScoreRow {
    pub fn into_score(self) -> Result<InvestmentScore> {
        let corrupt = |what: &str| AppError::InvalidProperty {
            property_id: self.property_id.clone(),
            reason: format!("stored score has invalid {what}"),
        };
        let grade = Grade::from_label(&self.grade).ok_or_else(|| corrupt("grade"))?;
        let investment_tier =
            InvestmentTier::from_label(&self.investment_tier).ok_or_else(|| corrupt("investment tier"))?;
        let breakdown: ScoreBreakdown = serde_json::from_str(&self.score_breakdown)?;

        Ok(InvestmentScore {
            property_id: self.property_id.clone(),
            total_score: self.total_score,
            grade,
            investment_tier,
            components: ComponentScores {
                revenue: self.revenue_score,
                occupancy: self.occupancy_score,
                positioning: self.positioning_score,
                reviews: self.review_score,
                amenities: self.amenity_score,
                host_status: self.host_status_score,
                seasonal: self.seasonal_score,
            },
            market_area: self.market_area.clone(),
            bedroom_count: self.bedroom_count,
            revenue_vs_market_avg: self.revenue_vs_market_avg.unwrap_or(0.0),
            revenue_potential_gap: self.revenue_potential_gap.unwrap_or(0.0),
            is_top_opportunity: self.is_top_opportunity,
            calculated_at: Some(self.calculated_at),
            breakdown,
        })
    }
}
