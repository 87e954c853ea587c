use futures_util::TryStreamExt;
use serde::Serialize;
use sqlx::FromRow;
use tracing::warn;

use crate::db::models::{PropertyRow, ScoreRow};
use crate::error::Result;
use crate::types::{InvestmentScore, PropertyRecord};

const PROPERTY_SELECT: &str = r#"
    SELECT
        p.*,
        r.property_id AS review_property_id,
        r.review_total_reviews,
        r.review_months_overall,
        r.review_months_with_reviews,
        r.review_months_without_reviews_overall,
        r.review_avg_reviews_per_month,
        r.review_high_season_quarter,
        r.review_high_season_reviews,
        r.review_missing_months_trailing_12,
        r.review_pct_stayed_with_kids,
        r.review_pct_stayed_with_a_pet,
        r.review_pct_group_trip
    FROM properties p
    LEFT JOIN property_reviews r ON r.property_id = p.property_id
"#;

const SCORE_SELECT: &str = r#"
    SELECT property_id, total_score, grade, investment_tier,
           revenue_score, occupancy_score, positioning_score, review_score,
           amenity_score, host_status_score, seasonal_score,
           market_area, bedroom_count, revenue_vs_market_avg, revenue_potential_gap,
           is_top_opportunity, score_breakdown, calculated_at
    FROM investment_scores
"#;

/// The scoring population. Rows that could not be decoded are counted, not returned.
#[derive(Debug, Default)]
pub struct Population {
    pub records: Vec<PropertyRecord>,
    pub rejected: usize,
}

/// Stream every property with its review statistics.
pub async fn load_population(pool: &sqlx::SqlitePool) -> Result<Population> {
    let sql = format!("{PROPERTY_SELECT} ORDER BY p.property_id");
    let mut rows = sqlx::query(&sql).fetch(pool);
    let mut population = Population::default();

    while let Some(row) = rows.try_next().await? {
        match PropertyRow::from_row(&row) {
            Ok(decoded) => population.records.push(decoded.into_record()),
            Err(e) => {
                warn!(error = %e, "Skipping undecodable property row");
                population.rejected += 1;
            }
        }
    }

    Ok(population)
}

pub async fn load_property(pool: &sqlx::SqlitePool, property_id: &str) -> Result<Option<PropertyRecord>> {
    let sql = format!("{PROPERTY_SELECT} WHERE p.property_id = ?");
    let row = sqlx::query_as::<_, PropertyRow>(&sql)
        .bind(property_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(PropertyRow::into_record))
}

pub async fn load_score(pool: &sqlx::SqlitePool, property_id: &str) -> Result<Option<InvestmentScore>> {
    let sql = format!("{SCORE_SELECT} WHERE property_id = ?");
    let row = sqlx::query_as::<_, ScoreRow>(&sql)
        .bind(property_id)
        .fetch_optional(pool)
        .await?;
    row.map(ScoreRow::into_score).transpose()
}

/// Highest totals first, optionally restricted to one market area.
pub async fn top_scores(
    pool: &sqlx::SqlitePool,
    market_area: Option<&str>,
    min_score: f64,
    limit: i64,
) -> Result<Vec<InvestmentScore>> {
    let sql = format!(
        "{SCORE_SELECT} WHERE total_score >= ? AND (? IS NULL OR market_area = ?) \
         ORDER BY total_score DESC, property_id LIMIT ?"
    );
    let rows = sqlx::query_as::<_, ScoreRow>(&sql)
        .bind(min_score)
        .bind(market_area)
        .bind(market_area)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    rows.into_iter().map(ScoreRow::into_score).collect()
}

#[derive(Debug, Default, sqlx::FromRow)]
pub struct ScoreSummaryRow {
    pub scored: i64,
    pub avg_score: Option<f64>,
    pub top_opportunities: i64,
}

pub async fn score_summary(pool: &sqlx::SqlitePool) -> Result<ScoreSummaryRow> {
    let row = sqlx::query_as::<_, ScoreSummaryRow>(
        r#"
        SELECT COUNT(*) AS scored,
               AVG(total_score) AS avg_score,
               COALESCE(SUM(is_top_opportunity), 0) AS top_opportunities
        FROM investment_scores
        "#,
    )
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// (label, count) pairs for a grouping column of `investment_scores`.
pub async fn score_counts_by(pool: &sqlx::SqlitePool, column: ScoreGrouping) -> Result<Vec<(String, i64)>> {
    let col = column.column();
    let sql = format!(
        "SELECT {col} AS label, COUNT(*) AS n FROM investment_scores GROUP BY {col} ORDER BY {col}"
    );
    let rows: Vec<(String, i64)> = sqlx::query_as(&sql).fetch_all(pool).await?;
    Ok(rows)
}

#[derive(Debug, Clone, Copy)]
pub enum ScoreGrouping {
    Grade,
    Tier,
}

impl ScoreGrouping {
    fn column(self) -> &'static str {
        match self {
            ScoreGrouping::Grade => "grade",
            ScoreGrouping::Tier => "investment_tier",
        }
    }
}

/// Averages over scored properties sharing a market area and bedroom count.
#[derive(Debug, Clone, Default, PartialEq, sqlx::FromRow)]
pub struct MarketStats {
    pub avg_revenue: Option<f64>,
    pub avg_adr: Option<f64>,
    pub avg_occupancy: Option<f64>,
    pub avg_score: Option<f64>,
    pub property_count: i64,
}

pub async fn market_stats(pool: &sqlx::SqlitePool, market_area: &str, bedrooms: i64) -> Result<MarketStats> {
    let row = sqlx::query_as::<_, MarketStats>(
        r#"
        SELECT AVG(p.revenue) AS avg_revenue,
               AVG(p.adr) AS avg_adr,
               AVG(p.occupancy) AS avg_occupancy,
               AVG(s.total_score) AS avg_score,
               COUNT(p.property_id) AS property_count
        FROM properties p
        JOIN investment_scores s ON s.property_id = p.property_id
        WHERE p.market_area = ? AND p.bedrooms = ?
        "#,
    )
    .bind(market_area)
    .bind(bedrooms)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct ComparableProperty {
    pub property_id: String,
    pub revenue: Option<f64>,
    pub adr: Option<f64>,
    pub occupancy: Option<f64>,
    pub total_score: f64,
    pub grade: String,
}

/// Best-scored neighbours: same market and bedroom count, excluding `property_id`.
pub async fn comparable_properties(
    pool: &sqlx::SqlitePool,
    property_id: &str,
    market_area: &str,
    bedrooms: i64,
    limit: i64,
) -> Result<Vec<ComparableProperty>> {
    let rows = sqlx::query_as::<_, ComparableProperty>(
        r#"
        SELECT p.property_id, p.revenue, p.adr, p.occupancy, s.total_score, s.grade
        FROM properties p
        JOIN investment_scores s ON s.property_id = p.property_id
        WHERE p.market_area = ? AND p.bedrooms = ? AND p.property_id <> ?
        ORDER BY s.total_score DESC, p.property_id
        LIMIT ?
        "#,
    )
    .bind(market_area)
    .bind(bedrooms)
    .bind(property_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Filtered listing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PropertySort {
    #[default]
    TotalScore,
    Revenue,
    Occupancy,
    Grade,
}

impl PropertySort {
    /// Unknown names sort by total score.
    pub fn from_param(name: &str) -> Self {
        match name {
            "revenue" => PropertySort::Revenue,
            "occupancy" => PropertySort::Occupancy,
            "grade" => PropertySort::Grade,
            _ => PropertySort::TotalScore,
        }
    }

    fn column(self) -> &'static str {
        match self {
            PropertySort::TotalScore => "s.total_score",
            PropertySort::Revenue => "p.revenue",
            PropertySort::Occupancy => "p.occupancy",
            PropertySort::Grade => "s.grade",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PropertyFilter {
    /// Case-insensitive substring of the market area.
    pub market: Option<String>,
    pub bedrooms: Option<i64>,
    pub min_revenue: Option<f64>,
    pub min_score: Option<f64>,
    pub sort: PropertySort,
    pub descending: bool,
    pub skip: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct ScoredProperty {
    pub property_id: String,
    pub market_area: String,
    pub bedrooms: Option<i64>,
    pub revenue: Option<f64>,
    pub adr: Option<f64>,
    pub occupancy: Option<f64>,
    pub total_score: f64,
    pub grade: String,
    pub investment_tier: String,
    pub is_top_opportunity: bool,
}

/// Scored properties matching `filter`. Unscored properties are not listed.
pub async fn list_properties(pool: &sqlx::SqlitePool, filter: &PropertyFilter) -> Result<Vec<ScoredProperty>> {
    let mut qb = sqlx::QueryBuilder::<sqlx::Sqlite>::new(
        r#"
        SELECT p.property_id, p.market_area, p.bedrooms, p.revenue, p.adr, p.occupancy,
               s.total_score, s.grade, s.investment_tier, s.is_top_opportunity
        FROM properties p
        JOIN investment_scores s ON s.property_id = p.property_id
        WHERE 1 = 1
        "#,
    );
    if let Some(market) = &filter.market {
        qb.push(" AND p.market_area LIKE ").push_bind(format!("%{market}%"));
    }
    if let Some(bedrooms) = filter.bedrooms {
        qb.push(" AND p.bedrooms = ").push_bind(bedrooms);
    }
    if let Some(min_revenue) = filter.min_revenue {
        qb.push(" AND p.revenue >= ").push_bind(min_revenue);
    }
    if let Some(min_score) = filter.min_score {
        qb.push(" AND s.total_score >= ").push_bind(min_score);
    }
    qb.push(" ORDER BY ")
        .push(filter.sort.column())
        .push(if filter.descending { " DESC" } else { " ASC" })
        .push(", p.property_id");
    qb.push(" LIMIT ").push_bind(filter.limit);
    qb.push(" OFFSET ").push_bind(filter.skip);

    let rows = qb.build_query_as::<ScoredProperty>().fetch_all(pool).await?;
    Ok(rows)
}
