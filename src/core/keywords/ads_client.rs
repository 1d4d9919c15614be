use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by the advertising-platform client.
#[derive(Debug, Clone, Error)]
pub enum AdsError {
    #[error("Google Ads API error: {0}")]
    Api(String),
    #[error("Google Ads request timed out: {0}")]
    Timeout(String),
}

/// Fields for a new keyword plan, the root of the temporary resource tree.
#[derive(Debug, Clone)]
pub struct NewKeywordPlan {
    pub name: String,
    pub forecast_window: ForecastWindow,
}

/// Forecast period attached to a keyword plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastWindow {
    #[allow(dead_code)]
    NextMonth,
    NextQuarter,
    #[allow(dead_code)]
    NextYear,
}

/// Fields for a plan campaign, scoped to one geo target and language.
#[derive(Debug, Clone)]
pub struct NewPlanCampaign {
    pub name: String,
    pub plan_resource: String,
    pub geo_target: String,
    pub language_constant: String,
    pub network: PlanNetwork,
    pub cpc_bid_micros: i64,
}

/// Fields for a plan ad group.
#[derive(Debug, Clone)]
pub struct NewPlanAdGroup {
    pub name: String,
    pub campaign_resource: String,
    pub cpc_bid_micros: i64,
}

/// One keyword entry to attach under a plan ad group.
#[derive(Debug, Clone)]
pub struct NewPlanKeyword {
    pub text: String,
    pub ad_group_resource: String,
    pub match_type: MatchType,
    pub cpc_bid_micros: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    Exact,
    #[allow(dead_code)]
    Phrase,
    #[allow(dead_code)]
    Broad,
}

/// Which search network the plan or idea query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanNetwork {
    #[allow(dead_code)]
    GoogleSearch,
    GoogleSearchAndPartners,
}

/// Per-query historical metrics as returned by the platform.
///
/// `monthly_searches` is ordered oldest month first. The summary fields are
/// optional because the platform omits them for low-volume terms.
#[derive(Debug, Clone, Default)]
pub struct HistoricalEntry {
    pub search_query: String,
    pub monthly_searches: Vec<i64>,
    pub avg_monthly_searches: Option<i64>,
    pub competition_index: Option<i64>,
    pub low_top_of_page_bid_micros: Option<i64>,
    pub high_top_of_page_bid_micros: Option<i64>,
}

/// One result from a generate-keyword-ideas query.
#[derive(Debug, Clone, Default)]
pub struct IdeaResult {
    pub text: String,
    pub avg_monthly_searches: Option<i64>,
    pub competition: Competition,
    pub low_top_of_page_bid_micros: Option<i64>,
    pub high_top_of_page_bid_micros: Option<i64>,
}

/// Competition level reported on the idea path. The idea response carries an
/// enum rather than the 0-100 index of the historical response; `as_index`
/// exposes the raw ordinal so records keep a single competition column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Competition {
    #[default]
    Unspecified,
    Unknown,
    Low,
    Medium,
    High,
}

impl Competition {
    pub fn as_index(self) -> i64 {
        match self {
            Competition::Unspecified => 0,
            Competition::Unknown => 1,
            Competition::Low => 2,
            Competition::Medium => 3,
            Competition::High => 4,
        }
    }
}

/// Seed for a keyword-ideas query.
#[derive(Debug, Clone)]
pub enum IdeaSeed {
    Keywords(Vec<String>),
    Url(String),
    KeywordsAndUrl { keywords: Vec<String>, url: String },
}

/// A fully-resolved keyword-ideas query, ready to send.
#[derive(Debug, Clone)]
pub struct IdeaQuery {
    pub seed: IdeaSeed,
    pub geo_target: String,
    pub language_constant: String,
    pub network: PlanNetwork,
}

/// Trait describing the minimal advertising-platform operations the core
/// layer needs. The infra layer implements this against the Google Ads REST
/// API; tests implement it in memory.
///
/// Creation calls return the remote resource name of the created resource;
/// the platform, not in-memory state, is the source of truth for the plan
/// tree.
#[async_trait]
pub trait AdsClient: Send + Sync {
    async fn create_keyword_plan(&self, plan: &NewKeywordPlan) -> Result<String, AdsError>;
    async fn create_plan_campaign(&self, campaign: &NewPlanCampaign) -> Result<String, AdsError>;
    async fn create_plan_ad_group(&self, ad_group: &NewPlanAdGroup) -> Result<String, AdsError>;
    async fn create_plan_keywords(&self, keywords: &[NewPlanKeyword]) -> Result<(), AdsError>;
    async fn delete_keyword_plan(&self, plan_resource: &str) -> Result<(), AdsError>;
    async fn historical_metrics(
        &self,
        plan_resource: &str,
    ) -> Result<Vec<HistoricalEntry>, AdsError>;
    async fn keyword_ideas(&self, query: &IdeaQuery) -> Result<Vec<IdeaResult>, AdsError>;
    /// Suggest geo-target constant resource names for a country code,
    /// best match first.
    async fn suggest_geo_targets(&self, country_code: &str) -> Result<Vec<String>, AdsError>;
    /// Look up the language constant resource name for a language code.
    async fn find_language_constant(
        &self,
        language_code: &str,
    ) -> Result<Option<String>, AdsError>;
}
