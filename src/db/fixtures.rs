//! Test helpers: an in-memory store and seeding of ingestion-owned tables.

use crate::types::{Property, ReviewStatistics};

/// Single-connection in-memory database with the schema applied.
pub async fn test_pool() -> sqlx::SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

pub async fn insert_property(pool: &sqlx::SqlitePool, p: &Property) {
    let a = &p.amenities;
    sqlx::query(
        r#"
        INSERT INTO properties (
            property_id, market_area, bedrooms, revenue, revenue_potential, adr, price_tier,
            occupancy, stars, property_rating, property_reviews,
            superhost, is_guest_favorite, instant_book,
            has_aircon, has_gym, has_hottub, has_kitchen, has_parking, has_pets_allowed, has_pool,
            system_gym, system_pool_table, system_arcade_machine, system_movie, system_bowling,
            system_chess, system_golf, system_crib, system_pack_n_play, system_play_slide,
            system_firepit, system_grill, system_pool, system_jacuzzi, system_view_ocean,
            system_view_mountain, has_outdoor_furniture, has_waterfront, has_lake_access,
            has_beach_access, has_outdoor_dining_area
        ) VALUES (
            ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
            ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?
        )
        "#,
    )
    .bind(&p.property_id)
    .bind(&p.market_area)
    .bind(p.bedrooms)
    .bind(p.revenue)
    .bind(p.revenue_potential)
    .bind(p.adr)
    .bind(p.price_tier.map(|t| t.to_string()))
    .bind(p.occupancy)
    .bind(p.stars)
    .bind(p.property_rating)
    .bind(p.review_count)
    .bind(p.host.superhost)
    .bind(p.host.guest_favorite)
    .bind(p.host.instant_book)
    .bind(a.has_aircon)
    .bind(a.has_gym)
    .bind(a.has_hottub)
    .bind(a.has_kitchen)
    .bind(a.has_parking)
    .bind(a.has_pets_allowed)
    .bind(a.has_pool)
    .bind(a.system_gym)
    .bind(a.system_pool_table)
    .bind(a.system_arcade_machine)
    .bind(a.system_movie)
    .bind(a.system_bowling)
    .bind(a.system_chess)
    .bind(a.system_golf)
    .bind(a.system_crib)
    .bind(a.system_pack_n_play)
    .bind(a.system_play_slide)
    .bind(a.system_firepit)
    .bind(a.system_grill)
    .bind(a.system_pool)
    .bind(a.system_jacuzzi)
    .bind(a.system_view_ocean)
    .bind(a.system_view_mountain)
    .bind(a.has_outdoor_furniture)
    .bind(a.has_waterfront)
    .bind(a.has_lake_access)
    .bind(a.has_beach_access)
    .bind(a.has_outdoor_dining_area)
    .execute(pool)
    .await
    .unwrap();
}

pub async fn insert_reviews(pool: &sqlx::SqlitePool, property_id: &str, r: &ReviewStatistics) {
    sqlx::query(
        r#"
        INSERT INTO property_reviews (
            property_id, review_total_reviews, review_months_overall, review_months_with_reviews,
            review_months_without_reviews_overall, review_avg_reviews_per_month,
            review_high_season_quarter, review_high_season_reviews,
            review_missing_months_trailing_12, review_pct_stayed_with_kids,
            review_pct_stayed_with_a_pet, review_pct_group_trip
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(property_id)
    .bind(r.total_reviews)
    .bind(r.months_overall)
    .bind(r.months_with_reviews)
    .bind(r.months_without_reviews)
    .bind(r.avg_reviews_per_month)
    .bind(r.high_season_quarter)
    .bind(r.high_season_reviews)
    .bind(r.missing_months_trailing_12)
    .bind(r.pct_stayed_with_kids)
    .bind(r.pct_stayed_with_pet)
    .bind(r.pct_group_trip)
    .execute(pool)
    .await
    .unwrap();
}

/// A three-bedroom listing in one shared market.
pub fn listing(id: &str, revenue: Option<f64>, adr: Option<f64>) -> Property {
    Property {
        property_id: id.to_string(),
        market_area: "Destin".to_string(),
        bedrooms: Some(3),
        revenue,
        adr,
        ..Default::default()
    }
}
