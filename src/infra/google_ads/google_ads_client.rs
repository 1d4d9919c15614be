use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use serde_json::json;

use crate::core::keywords::ads_client::{
    AdsClient, AdsError, Competition, ForecastWindow, HistoricalEntry, IdeaQuery, IdeaResult,
    IdeaSeed, MatchType, NewKeywordPlan, NewPlanAdGroup, NewPlanCampaign, NewPlanKeyword,
    PlanNetwork,
};

use super::auth::{AccessTokenSource, AuthError, RefreshTokenAuth, ServiceAccountAuth};
use super::config::{AdsConfig, CredentialConfig};

const API_BASE_URL: &str = "https://googleads.googleapis.com/v16";

/// Google Ads REST client. It deliberately exposes only the calls the core
/// layer needs, mapped onto the keyword-planning endpoints.
pub struct GoogleAdsApiClient {
    client: Client,
    base_url: String,
    customer_id: u64,
    login_customer_id: Option<u64>,
    developer_token: String,
    auth: Box<dyn AccessTokenSource>,
}

impl GoogleAdsApiClient {
    /// Build the client and the matching token source from configuration.
    pub async fn from_config(config: &AdsConfig) -> Result<Self, AdsError> {
        let auth: Box<dyn AccessTokenSource> = match &config.credentials {
            CredentialConfig::ServiceAccountKeyFile(path) => {
                Box::new(ServiceAccountAuth::from_file(path).await.map_err(auth_error)?)
            }
            CredentialConfig::ServiceAccountJson(key_json) => {
                Box::new(ServiceAccountAuth::from_json(key_json).map_err(auth_error)?)
            }
            CredentialConfig::RefreshToken {
                client_id,
                client_secret,
                refresh_token,
            } => Box::new(RefreshTokenAuth::new(
                client_id.clone(),
                client_secret.clone(),
                refresh_token.clone(),
            )),
        };

        Self::new(config, auth)
    }

    /// Build the client around an existing token source.
    pub fn new(config: &AdsConfig, auth: Box<dyn AccessTokenSource>) -> Result<Self, AdsError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AdsError::Api(e.to_string()))?;

        Ok(Self {
            client,
            base_url: API_BASE_URL.to_string(),
            customer_id: config.customer_id,
            login_customer_id: config.login_customer_id,
            developer_token: config.developer_token.clone(),
            auth,
        })
    }

    /// POST a JSON body to an API path and return the parsed response.
    /// Every remote call runs under the client-level deadline; a timeout
    /// maps to its own error variant so callers can treat it as transient.
    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T, AdsError> {
        let token = self.auth.access_token().await.map_err(auth_error)?;
        let url = format!("{}/{}", self.base_url, path);

        let mut request = self
            .client
            .post(&url)
            .bearer_auth(token)
            .header("developer-token", &self.developer_token)
            .json(&body);
        if let Some(login_customer_id) = self.login_customer_id {
            request = request.header("login-customer-id", login_customer_id.to_string());
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                AdsError::Timeout(format!("{}: {}", path, e))
            } else {
                AdsError::Api(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdsError::Api(format!(
                "{} returned {}: {}",
                path, status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AdsError::Api(format!("{}: malformed response: {}", path, e)))
    }

    /// Run a mutate call and pull the resource name out of the first result.
    async fn mutate_for_resource(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<String, AdsError> {
        let response: ApiMutateResponse = self.post_json(path, body).await?;
        response
            .results
            .into_iter()
            .flatten()
            .next()
            .and_then(|result| result.resource_name)
            .ok_or_else(|| {
                AdsError::Api(format!("{} returned no resource name", path))
            })
    }
}

#[async_trait]
impl AdsClient for GoogleAdsApiClient {
    async fn create_keyword_plan(&self, plan: &NewKeywordPlan) -> Result<String, AdsError> {
        let path = format!("customers/{}/keywordPlans:mutate", self.customer_id);
        let body = json!({
            "operations": [{
                "create": {
                    "name": plan.name,
                    "forecastPeriod": { "dateInterval": forecast_window(plan.forecast_window) },
                }
            }]
        });
        self.mutate_for_resource(&path, body).await
    }

    async fn create_plan_campaign(&self, campaign: &NewPlanCampaign) -> Result<String, AdsError> {
        let path = format!(
            "customers/{}/keywordPlanCampaigns:mutate",
            self.customer_id
        );
        let body = json!({
            "operations": [{
                "create": {
                    "name": campaign.name,
                    "keywordPlan": campaign.plan_resource,
                    "keywordPlanNetwork": plan_network(campaign.network),
                    "cpcBidMicros": campaign.cpc_bid_micros.to_string(),
                    "geoTargets": [{ "geoTargetConstant": campaign.geo_target }],
                    "languageConstants": [campaign.language_constant],
                }
            }]
        });
        self.mutate_for_resource(&path, body).await
    }

    async fn create_plan_ad_group(&self, ad_group: &NewPlanAdGroup) -> Result<String, AdsError> {
        let path = format!("customers/{}/keywordPlanAdGroups:mutate", self.customer_id);
        let body = json!({
            "operations": [{
                "create": {
                    "name": ad_group.name,
                    "keywordPlanCampaign": ad_group.campaign_resource,
                    "cpcBidMicros": ad_group.cpc_bid_micros.to_string(),
                }
            }]
        });
        self.mutate_for_resource(&path, body).await
    }

    async fn create_plan_keywords(&self, keywords: &[NewPlanKeyword]) -> Result<(), AdsError> {
        let path = format!(
            "customers/{}/keywordPlanAdGroupKeywords:mutate",
            self.customer_id
        );
        let operations: Vec<serde_json::Value> = keywords
            .iter()
            .map(|keyword| {
                json!({
                    "create": {
                        "text": keyword.text,
                        "keywordPlanAdGroup": keyword.ad_group_resource,
                        "matchType": match_type(keyword.match_type),
                        "cpcBidMicros": keyword.cpc_bid_micros.to_string(),
                    }
                })
            })
            .collect();

        let _: ApiMutateResponse = self
            .post_json(&path, json!({ "operations": operations }))
            .await?;
        Ok(())
    }

    async fn delete_keyword_plan(&self, plan_resource: &str) -> Result<(), AdsError> {
        let path = format!("customers/{}/keywordPlans:mutate", self.customer_id);
        let body = json!({ "operations": [{ "remove": plan_resource }] });
        let _: ApiMutateResponse = self.post_json(&path, body).await?;
        Ok(())
    }

    async fn historical_metrics(
        &self,
        plan_resource: &str,
    ) -> Result<Vec<HistoricalEntry>, AdsError> {
        let path = format!("{}:generateHistoricalMetrics", plan_resource);
        let response: ApiHistoricalResponse = self.post_json(&path, json!({})).await?;

        Ok(response
            .metrics
            .into_iter()
            .flatten()
            .map(|metric| {
                let keyword_metrics = metric.keyword_metrics.unwrap_or_default();
                HistoricalEntry {
                    search_query: metric.search_query.unwrap_or_default(),
                    monthly_searches: keyword_metrics
                        .monthly_search_volumes
                        .into_iter()
                        .flatten()
                        .map(|volume| volume.monthly_searches.unwrap_or(0))
                        .collect(),
                    avg_monthly_searches: keyword_metrics.avg_monthly_searches,
                    competition_index: keyword_metrics.competition_index,
                    low_top_of_page_bid_micros: keyword_metrics.low_top_of_page_bid_micros,
                    high_top_of_page_bid_micros: keyword_metrics.high_top_of_page_bid_micros,
                }
            })
            .collect())
    }

    async fn keyword_ideas(&self, query: &IdeaQuery) -> Result<Vec<IdeaResult>, AdsError> {
        let path = format!("customers/{}:generateKeywordIdeas", self.customer_id);
        let mut body = json!({
            "language": query.language_constant,
            "geoTargetConstants": [query.geo_target],
            "keywordPlanNetwork": plan_network(query.network),
            "pageSize": 1000,
        });

        match &query.seed {
            IdeaSeed::Keywords(keywords) => {
                body["keywordSeed"] = json!({ "keywords": keywords });
            }
            IdeaSeed::Url(url) => {
                body["urlSeed"] = json!({ "url": url });
            }
            IdeaSeed::KeywordsAndUrl { keywords, url } => {
                body["keywordAndUrlSeed"] = json!({ "keywords": keywords, "url": url });
            }
        }

        let response: ApiIdeasResponse = self.post_json(&path, body).await?;

        Ok(response
            .results
            .into_iter()
            .flatten()
            .map(|result| {
                let metrics = result.keyword_idea_metrics.unwrap_or_default();
                IdeaResult {
                    text: result.text.unwrap_or_default(),
                    avg_monthly_searches: metrics.avg_monthly_searches,
                    competition: competition(metrics.competition.as_deref()),
                    low_top_of_page_bid_micros: metrics.low_top_of_page_bid_micros,
                    high_top_of_page_bid_micros: metrics.high_top_of_page_bid_micros,
                }
            })
            .collect())
    }

    async fn suggest_geo_targets(&self, country_code: &str) -> Result<Vec<String>, AdsError> {
        let body = json!({
            "locale": "en",
            "countryCode": country_code,
            "locationNames": { "names": [country_code] },
        });
        let response: ApiGeoSuggestResponse =
            self.post_json("geoTargetConstants:suggest", body).await?;

        Ok(response
            .geo_target_constant_suggestions
            .into_iter()
            .flatten()
            .filter_map(|suggestion| suggestion.geo_target_constant)
            .filter_map(|constant| constant.resource_name)
            .collect())
    }

    async fn find_language_constant(
        &self,
        language_code: &str,
    ) -> Result<Option<String>, AdsError> {
        let path = format!("customers/{}/googleAds:search", self.customer_id);
        let query = format!(
            "SELECT language_constant.resource_name FROM language_constant \
             WHERE language_constant.code = '{}'",
            language_code.replace('\'', "")
        );
        let response: ApiSearchResponse =
            self.post_json(&path, json!({ "query": query })).await?;

        Ok(response
            .results
            .into_iter()
            .flatten()
            .filter_map(|row| row.language_constant)
            .filter_map(|constant| constant.resource_name)
            .next())
    }
}

fn auth_error(error: AuthError) -> AdsError {
    AdsError::Api(error.to_string())
}

fn forecast_window(window: ForecastWindow) -> &'static str {
    match window {
        ForecastWindow::NextMonth => "NEXT_MONTH",
        ForecastWindow::NextQuarter => "NEXT_QUARTER",
        ForecastWindow::NextYear => "NEXT_YEAR",
    }
}

fn plan_network(network: PlanNetwork) -> &'static str {
    match network {
        PlanNetwork::GoogleSearch => "GOOGLE_SEARCH",
        PlanNetwork::GoogleSearchAndPartners => "GOOGLE_SEARCH_AND_PARTNERS",
    }
}

fn match_type(match_type: MatchType) -> &'static str {
    match match_type {
        MatchType::Exact => "EXACT",
        MatchType::Phrase => "PHRASE",
        MatchType::Broad => "BROAD",
    }
}

fn competition(value: Option<&str>) -> Competition {
    match value {
        Some("LOW") => Competition::Low,
        Some("MEDIUM") => Competition::Medium,
        Some("HIGH") => Competition::High,
        Some("UNKNOWN") => Competition::Unknown,
        _ => Competition::Unspecified,
    }
}

// ============================================================================
// RESPONSE STRUCTURES
// ============================================================================
// The REST surface serializes int64 fields as JSON strings, so numeric
// fields go through `flexible_i64`.

#[derive(Debug, Deserialize)]
struct ApiMutateResponse {
    results: Option<Vec<ApiMutateResult>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiMutateResult {
    resource_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiHistoricalResponse {
    metrics: Option<Vec<ApiHistoricalMetric>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiHistoricalMetric {
    search_query: Option<String>,
    keyword_metrics: Option<ApiKeywordMetrics>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ApiKeywordMetrics {
    #[serde(default, deserialize_with = "flexible_i64")]
    avg_monthly_searches: Option<i64>,
    #[serde(default, deserialize_with = "flexible_i64")]
    competition_index: Option<i64>,
    #[serde(default, deserialize_with = "flexible_i64")]
    low_top_of_page_bid_micros: Option<i64>,
    #[serde(default, deserialize_with = "flexible_i64")]
    high_top_of_page_bid_micros: Option<i64>,
    monthly_search_volumes: Option<Vec<ApiMonthlyVolume>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiMonthlyVolume {
    #[serde(default, deserialize_with = "flexible_i64")]
    monthly_searches: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ApiIdeasResponse {
    results: Option<Vec<ApiIdeaResult>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiIdeaResult {
    text: Option<String>,
    keyword_idea_metrics: Option<ApiIdeaMetrics>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ApiIdeaMetrics {
    #[serde(default, deserialize_with = "flexible_i64")]
    avg_monthly_searches: Option<i64>,
    competition: Option<String>,
    #[serde(default, deserialize_with = "flexible_i64")]
    low_top_of_page_bid_micros: Option<i64>,
    #[serde(default, deserialize_with = "flexible_i64")]
    high_top_of_page_bid_micros: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiGeoSuggestResponse {
    geo_target_constant_suggestions: Option<Vec<ApiGeoSuggestion>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiGeoSuggestion {
    geo_target_constant: Option<ApiResourceName>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResourceName {
    resource_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiSearchResponse {
    results: Option<Vec<ApiSearchRow>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiSearchRow {
    language_constant: Option<ApiResourceName>,
}

/// Accept an int64 serialized as either a JSON number or a string.
fn flexible_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(number)) => Ok(Some(number)),
        Some(Raw::Text(text)) => text
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

// ============================================================================
// TESTS
// ============================================================================
