use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::types::{Grade, InvestmentTier};

/// Rescoring interval in serving mode (seconds).
pub const SCORE_INTERVAL_SECS: u64 = 3600;

/// Default number of parallel scoring chunks.
pub const SCORE_WORKERS: usize = 4;

/// Rows returned by `/scores/top` when no limit is given.
pub const DEFAULT_TOP_LIMIT: i64 = 10;

/// Upper bound on `/scores/top?limit=`.
pub const MAX_TOP_LIMIT: i64 = 100;

/// Rows returned by `/properties` when no limit is given.
pub const DEFAULT_PROPERTY_LIMIT: i64 = 50;

/// Maximum number of key strengths attached to a top performer.
pub const MAX_KEY_STRENGTHS: usize = 5;

/// Top performers listed inside each market or bedroom group.
pub const GROUP_TOP_PROPERTIES: usize = 5;

/// Comparable properties attached to a property analysis.
pub const COMPARABLE_LIMIT: i64 = 5;

/// Tolerance for the weights-sum-to-one check.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Total score at or above which a property is flagged as a top opportunity.
pub const TOP_OPPORTUNITY_THRESHOLD: f64 = 85.0;

/// Descending grade ladder; anything below the last rung is `D`.
pub const GRADE_LADDER: &[(f64, Grade)] = &[
    (90.0, Grade::APlus),
    (85.0, Grade::A),
    (80.0, Grade::AMinus),
    (75.0, Grade::BPlus),
    (70.0, Grade::B),
    (65.0, Grade::BMinus),
    (60.0, Grade::CPlus),
    (55.0, Grade::C),
    (50.0, Grade::CMinus),
];

/// Descending tier ladder; anything below the last rung is `UNDERPERFORMING`.
pub const TIER_LADDER: &[(f64, InvestmentTier)] = &[
    (85.0, InvestmentTier::Prime),
    (75.0, InvestmentTier::Strong),
    (65.0, InvestmentTier::Moderate),
    (50.0, InvestmentTier::Acceptable),
];

// ---------------------------------------------------------------------------
// Scoring configuration
// ---------------------------------------------------------------------------

/// Composite weights. Field names match the persisted breakdown JSON.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub revenue_performance: f64,
    pub occupancy_quality: f64,
    pub market_positioning: f64,
    pub review_strength: f64,
    pub amenity_value: f64,
    pub host_status: f64,
    pub seasonal_stability: f64,
}

impl ScoreWeights {
    pub const DEFAULT: Self = Self {
        revenue_performance: 0.25,
        occupancy_quality: 0.20,
        market_positioning: 0.15,
        review_strength: 0.15,
        amenity_value: 0.10,
        host_status: 0.05,
        seasonal_stability: 0.10,
    };

    fn as_array(&self) -> [f64; 7] {
        [
            self.revenue_performance,
            self.occupancy_quality,
            self.market_positioning,
            self.review_strength,
            self.amenity_value,
            self.host_status,
            self.seasonal_stability,
        ]
    }

    pub fn sum(&self) -> f64 {
        self.as_array().iter().sum()
    }

    /// Weights must be finite, non-negative and sum to 1.
    pub fn validate(&self) -> Result<()> {
        if self.as_array().iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(AppError::Config(format!(
                "score weights must be finite and non-negative: {self:?}"
            )));
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(AppError::Config(format!(
                "score weights must sum to 1.0, got {sum}"
            )));
        }
        Ok(())
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Everything the composite calculator needs besides its inputs.
/// Built once and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    pub weights: ScoreWeights,
    pub grade_ladder: Vec<(f64, Grade)>,
    pub tier_ladder: Vec<(f64, InvestmentTier)>,
    pub top_opportunity_threshold: f64,
}

impl ScoringConfig {
    pub fn new(weights: ScoreWeights, top_opportunity_threshold: f64) -> Result<Self> {
        weights.validate()?;
        if !(0.0..=100.0).contains(&top_opportunity_threshold) {
            return Err(AppError::Config(format!(
                "TOP_OPPORTUNITY_THRESHOLD must be within 0..=100, got {top_opportunity_threshold}"
            )));
        }
        Ok(Self {
            weights,
            grade_ladder: GRADE_LADDER.to_vec(),
            tier_ladder: TIER_LADDER.to_vec(),
            top_opportunity_threshold,
        })
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::DEFAULT,
            grade_ladder: GRADE_LADDER.to_vec(),
            tier_ladder: TIER_LADDER.to_vec(),
            top_opportunity_threshold: TOP_OPPORTUNITY_THRESHOLD,
        }
    }
}

// ---------------------------------------------------------------------------
// Process configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub db_path: String,
    pub api_port: u16,
    /// Keep running after the first batch: serve the API and rescore periodically (SERVE_API)
    pub serve_api: bool,
    /// Rescoring period in serving mode (SCORE_INTERVAL_SECS)
    pub score_interval_secs: u64,
    /// Parallel scoring chunks (SCORE_WORKERS)
    pub score_workers: usize,
    pub scoring: ScoringConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let weights = ScoreWeights {
            revenue_performance: env_f64(
                "SCORE_WEIGHT_REVENUE",
                ScoreWeights::DEFAULT.revenue_performance,
            )?,
            occupancy_quality: env_f64(
                "SCORE_WEIGHT_OCCUPANCY",
                ScoreWeights::DEFAULT.occupancy_quality,
            )?,
            market_positioning: env_f64(
                "SCORE_WEIGHT_POSITIONING",
                ScoreWeights::DEFAULT.market_positioning,
            )?,
            review_strength: env_f64("SCORE_WEIGHT_REVIEWS", ScoreWeights::DEFAULT.review_strength)?,
            amenity_value: env_f64("SCORE_WEIGHT_AMENITIES", ScoreWeights::DEFAULT.amenity_value)?,
            host_status: env_f64("SCORE_WEIGHT_HOST_STATUS", ScoreWeights::DEFAULT.host_status)?,
            seasonal_stability: env_f64(
                "SCORE_WEIGHT_SEASONAL",
                ScoreWeights::DEFAULT.seasonal_stability,
            )?,
        };
        let threshold = env_f64("TOP_OPPORTUNITY_THRESHOLD", TOP_OPPORTUNITY_THRESHOLD)?;

        Ok(Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| "rental_scores.db".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            serve_api: std::env::var("SERVE_API")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            score_interval_secs: std::env::var("SCORE_INTERVAL_SECS")
                .unwrap_or_else(|_| SCORE_INTERVAL_SECS.to_string())
                .parse::<u64>()
                .unwrap_or(SCORE_INTERVAL_SECS)
                .max(1),
            score_workers: std::env::var("SCORE_WORKERS")
                .unwrap_or_else(|_| SCORE_WORKERS.to_string())
                .parse::<usize>()
                .unwrap_or(SCORE_WORKERS)
                .max(1),
            scoring: ScoringConfig::new(weights, threshold)?,
        })
    }
}

fn env_f64(name: &str, default: f64) -> Result<f64> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<f64>()
            .map_err(|_| AppError::Config(format!("{name} must be a number, got {raw:?}"))),
        Err(_) => Ok(default),
    }
}
