use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Property
// ---------------------------------------------------------------------------

/// A short-term-rental listing as handed over by ingestion. Read-only here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Property {
    pub property_id: String,
    pub market_area: String,
    pub bedrooms: Option<i64>,
    pub revenue: Option<f64>,
    pub revenue_potential: Option<f64>,
    /// Average daily rate.
    pub adr: Option<f64>,
    pub price_tier: Option<PriceTier>,
    /// Fraction of available nights booked, in [0, 1].
    pub occupancy: Option<f64>,
    /// Star rating, 0–5.
    pub stars: Option<f64>,
    /// Listing rating, 0–5. Used when `stars` is missing.
    pub property_rating: Option<f64>,
    pub review_count: i64,
    pub amenities: Amenities,
    pub host: HostStatus,
}

impl Property {
    /// Bedroom count rendered as a benchmark key.
    pub fn bedroom_key(&self) -> Option<String> {
        self.bedrooms.map(|b| b.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostStatus {
    pub superhost: bool,
    pub guest_favorite: bool,
    pub instant_book: bool,
}

/// Independent amenity flags. `has_*` come from the listing itself,
/// `system_*` from the provider's amenity detection; several overlap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amenities {
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
}

impl Amenities {
    pub fn pool(&self) -> bool {
        self.has_pool || self.system_pool
    }

    pub fn hot_tub(&self) -> bool {
        self.has_hottub || self.system_jacuzzi
    }

    pub fn gym(&self) -> bool {
        self.has_gym || self.system_gym
    }

    pub fn games(&self) -> bool {
        self.system_pool_table || self.system_arcade_machine
    }
}

// ---------------------------------------------------------------------------
// Price tier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceTier {
    Economy,
    Midscale,
    #[serde(rename = "Upper Midscale")]
    UpperMidscale,
    Upscale,
    #[serde(rename = "Upper Upscale")]
    UpperUpscale,
    Luxury,
}

impl PriceTier {
    /// Parse the provider label. Unknown labels yield `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Economy" => Some(PriceTier::Economy),
            "Midscale" => Some(PriceTier::Midscale),
            "Upper Midscale" => Some(PriceTier::UpperMidscale),
            "Upscale" => Some(PriceTier::Upscale),
            "Upper Upscale" => Some(PriceTier::UpperUpscale),
            "Luxury" => Some(PriceTier::Luxury),
            _ => None,
        }
    }
}

impl std::fmt::Display for PriceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PriceTier::Economy => "Economy",
            PriceTier::Midscale => "Midscale",
            PriceTier::UpperMidscale => "Upper Midscale",
            PriceTier::Upscale => "Upscale",
            PriceTier::UpperUpscale => "Upper Upscale",
            PriceTier::Luxury => "Luxury",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Review statistics
// ---------------------------------------------------------------------------

/// Aggregated review history for one property. Every field may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewStatistics {
    pub total_reviews: Option<i64>,
    pub months_overall: Option<i64>,
    pub months_with_reviews: Option<i64>,
    pub months_without_reviews: Option<i64>,
    pub avg_reviews_per_month: Option<f64>,
    /// 1–4.
    pub high_season_quarter: Option<i64>,
    pub high_season_reviews: Option<i64>,
    pub missing_months_trailing_12: Option<i64>,
    pub pct_stayed_with_kids: Option<f64>,
    pub pct_stayed_with_pet: Option<f64>,
    pub pct_group_trip: Option<f64>,
}

/// A property together with its review history, as loaded for scoring.
#[derive(Debug, Clone)]
pub struct PropertyRecord {
    pub property: Property,
    pub reviews: Option<ReviewStatistics>,
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "A-")]
    AMinus,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "B-")]
    BMinus,
    #[serde(rename = "C+")]
    CPlus,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "C-")]
    CMinus,
    #[serde(rename = "D")]
    D,
}

impl Grade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::AMinus => "A-",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::BMinus => "B-",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::CMinus => "C-",
            Grade::D => "D",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        [
            Grade::APlus,
            Grade::A,
            Grade::AMinus,
            Grade::BPlus,
            Grade::B,
            Grade::BMinus,
            Grade::CPlus,
            Grade::C,
            Grade::CMinus,
            Grade::D,
        ]
        .into_iter()
        .find(|g| g.as_str() == label)
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvestmentTier {
    Prime,
    Strong,
    Moderate,
    Acceptable,
    Underperforming,
}

impl InvestmentTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvestmentTier::Prime => "PRIME",
            InvestmentTier::Strong => "STRONG",
            InvestmentTier::Moderate => "MODERATE",
            InvestmentTier::Acceptable => "ACCEPTABLE",
            InvestmentTier::Underperforming => "UNDERPERFORMING",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        [
            InvestmentTier::Prime,
            InvestmentTier::Strong,
            InvestmentTier::Moderate,
            InvestmentTier::Acceptable,
            InvestmentTier::Underperforming,
        ]
        .into_iter()
        .find(|t| t.as_str() == label)
    }
}

impl std::fmt::Display for InvestmentTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Score output
// ---------------------------------------------------------------------------

/// The seven sub-scores, each in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ComponentScores {
    pub revenue: f64,
    pub occupancy: f64,
    pub positioning: f64,
    pub reviews: f64,
    pub amenities: f64,
    pub host_status: f64,
    pub seasonal: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RevenueMetrics {
    /// Property revenue over the bedroom-count market average.
    pub revenue_ratio: f64,
    /// (potential − revenue) / revenue.
    pub potential_gap: f64,
}

/// Audit trail stored next to every score: what went in and how it was weighted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub component_scores: ComponentScores,
    pub weights: crate::config::ScoreWeights,
    pub revenue_metrics: RevenueMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentScore {
    pub property_id: String,
    /// 0–100, two decimals.
    pub total_score: f64,
    pub grade: Grade,
    pub investment_tier: InvestmentTier,
    pub components: ComponentScores,
    pub market_area: String,
    pub bedroom_count: Option<i64>,
    pub revenue_vs_market_avg: f64,
    pub revenue_potential_gap: f64,
    pub is_top_opportunity: bool,
    /// Nanosecond timestamp of the write. `None` until the score is stored.
    #[serde(default)]
    pub calculated_at: Option<i64>,
    pub breakdown: ScoreBreakdown,
}
