use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::health::BatchHealth;
use crate::config::{COMPARABLE_LIMIT, DEFAULT_PROPERTY_LIMIT, DEFAULT_TOP_LIMIT, MAX_TOP_LIMIT};
use crate::db::reader::{
    comparable_properties, list_properties, load_property, load_score, market_stats,
    score_counts_by, score_summary, top_scores, ComparableProperty, PropertyFilter, PropertySort,
    ScoreGrouping, ScoredProperty,
};
use crate::error::AppError;
use crate::scorer::insights::{
    group_by_bedroom, group_by_market, market_comparison, BedroomGroup, MarketComparison,
    MarketGroup, TopPerformer,
};
use crate::scorer::{BatchReport, SharedReport};
use crate::types::{ComponentScores, Grade, InvestmentScore, InvestmentTier};

#[derive(Clone)]
pub struct ApiState {
    pub pool: sqlx::SqlitePool,
    pub health: Arc<BatchHealth>,
    pub last_report: SharedReport,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/scores/top", get(get_top_scores))
        .route("/scores/:property_id", get(get_score))
        .route("/scores/:property_id/analysis", get(get_score_analysis))
        .route("/properties", get(get_properties))
        .route("/stats/summary", get(get_stats_summary))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Query param structs
// ---------------------------------------------------------------------------

#[derive(Deserialize, Default)]
pub struct TopScoresQuery {
    pub limit: Option<i64>,
    pub market_area: Option<String>,
    pub min_score: Option<f64>,
}

#[derive(Deserialize, Default)]
pub struct PropertiesQuery {
    pub market: Option<String>,
    pub bedrooms: Option<i64>,
    pub min_revenue: Option<f64>,
    pub min_score: Option<f64>,
    /// `total_score`, `revenue`, `occupancy` or `grade`.
    pub sort_by: Option<String>,
    /// `desc` (default) or anything else for ascending.
    pub order: Option<String>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl PropertiesQuery {
    fn into_filter(self) -> PropertyFilter {
        PropertyFilter {
            market: self.market,
            bedrooms: self.bedrooms,
            min_revenue: self.min_revenue,
            min_score: self.min_score,
            sort: self.sort_by.as_deref().map(PropertySort::from_param).unwrap_or_default(),
            descending: self.order.map_or(true, |o| o.eq_ignore_ascii_case("desc")),
            skip: self.skip.unwrap_or(0).max(0),
            limit: self.limit.unwrap_or(DEFAULT_PROPERTY_LIMIT).clamp(1, MAX_TOP_LIMIT),
        }
    }
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub batch_running: bool,
    pub batches_completed: u64,
    pub last_batch_at_ns: Option<u64>,
    pub last_batch_failed: u64,
}

#[derive(Serialize)]
pub struct TopPerformersResponse {
    pub total_count: usize,
    pub top_properties: Vec<TopPerformer>,
    pub by_market: Vec<MarketGroup>,
    pub by_bedroom: Vec<BedroomGroup>,
}

#[derive(Debug, Serialize)]
pub struct PropertyAnalysisResponse {
    pub property_id: String,
    pub market_area: String,
    pub bedrooms: Option<i64>,
    pub revenue: Option<f64>,
    pub adr: Option<f64>,
    pub occupancy: Option<f64>,
    pub total_score: f64,
    pub grade: Grade,
    pub investment_tier: InvestmentTier,
    pub component_scores: ComponentScores,
    pub calculated_at: Option<i64>,
    /// `None` when the bedroom count is unknown.
    pub market_comparison: Option<MarketComparison>,
    pub comparable_properties: Vec<ComparableProperty>,
}

#[derive(Serialize)]
pub struct SummaryResponse {
    pub scored_properties: i64,
    pub avg_score: Option<f64>,
    pub top_opportunities: i64,
    pub by_tier: BTreeMap<String, i64>,
    pub by_grade: BTreeMap<String, i64>,
    pub last_batch: Option<BatchReport>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    let last = state.health.last_batch_at_ns();
    Json(HealthResponse {
        status: "ok",
        batch_running: state.health.batch_running(),
        batches_completed: state.health.batches_completed(),
        last_batch_at_ns: (last != 0).then_some(last),
        last_batch_failed: state.health.last_batch_failed(),
    })
}

async fn get_score(
    State(state): State<ApiState>,
    Path(property_id): Path<String>,
) -> Result<Json<InvestmentScore>, AppError> {
    if let Some(score) = load_score(&state.pool, &property_id).await? {
        return Ok(Json(score));
    }
    // Tell an unknown property apart from one the batch has not reached.
    match load_property(&state.pool, &property_id).await? {
        Some(_) => Err(AppError::ScoreNotFound(property_id)),
        None => Err(AppError::PropertyNotFound(property_id)),
    }
}

async fn get_score_analysis(
    State(state): State<ApiState>,
    Path(property_id): Path<String>,
) -> Result<Json<PropertyAnalysisResponse>, AppError> {
    let Some(record) = load_property(&state.pool, &property_id).await? else {
        return Err(AppError::PropertyNotFound(property_id));
    };
    let Some(score) = load_score(&state.pool, &property_id).await? else {
        return Err(AppError::ScoreNotFound(property_id));
    };
    let property = record.property;

    let (comparison, comparables) = match property.bedrooms {
        Some(bedrooms) => {
            let stats = market_stats(&state.pool, &property.market_area, bedrooms).await?;
            let comparables = comparable_properties(
                &state.pool,
                &property_id,
                &property.market_area,
                bedrooms,
                COMPARABLE_LIMIT,
            )
            .await?;
            (market_comparison(&property, &score, bedrooms, &stats), comparables)
        }
        None => (None, Vec::new()),
    };

    Ok(Json(PropertyAnalysisResponse {
        property_id,
        market_area: property.market_area,
        bedrooms: property.bedrooms,
        revenue: property.revenue,
        adr: property.adr,
        occupancy: property.occupancy,
        total_score: score.total_score,
        grade: score.grade,
        investment_tier: score.investment_tier,
        component_scores: score.components,
        calculated_at: score.calculated_at,
        market_comparison: comparison,
        comparable_properties: comparables,
    }))
}

async fn get_properties(
    State(state): State<ApiState>,
    Query(params): Query<PropertiesQuery>,
) -> Result<Json<Vec<ScoredProperty>>, AppError> {
    let rows = list_properties(&state.pool, &params.into_filter()).await?;
    Ok(Json(rows))
}

async fn get_top_scores(
    State(state): State<ApiState>,
    Query(params): Query<TopScoresQuery>,
) -> Result<Json<TopPerformersResponse>, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_TOP_LIMIT).clamp(1, MAX_TOP_LIMIT);
    let min_score = params.min_score.unwrap_or(0.0);

    let scores = top_scores(&state.pool, params.market_area.as_deref(), min_score, limit).await?;

    let mut top_properties = Vec::with_capacity(scores.len());
    for score in scores {
        let record = load_property(&state.pool, &score.property_id).await?;
        top_properties.push(TopPerformer::new(score, record.as_ref().map(|r| &r.property)));
    }

    Ok(Json(TopPerformersResponse {
        total_count: top_properties.len(),
        by_market: group_by_market(&top_properties),
        by_bedroom: group_by_bedroom(&top_properties),
        top_properties,
    }))
}

async fn get_stats_summary(
    State(state): State<ApiState>,
) -> Result<Json<SummaryResponse>, AppError> {
    let summary = score_summary(&state.pool).await?;
    let by_tier = score_counts_by(&state.pool, ScoreGrouping::Tier).await?;
    let by_grade = score_counts_by(&state.pool, ScoreGrouping::Grade).await?;
    let last_batch = state.last_report.read().ok().and_then(|r| r.clone());

    Ok(Json(SummaryResponse {
        scored_properties: summary.scored,
        avg_score: summary.avg_score,
        top_opportunities: summary.top_opportunities,
        by_tier: by_tier.into_iter().collect(),
        by_grade: by_grade.into_iter().collect(),
        last_batch,
    }))
}
