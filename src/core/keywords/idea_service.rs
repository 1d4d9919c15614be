use std::sync::Arc;

use super::ads_client::{AdsClient, IdeaQuery, IdeaResult, IdeaSeed, PlanNetwork};
use super::constant_resolver::ConstantResolver;
use super::keyword_models::{IdeaFilter, KeywordError, KeywordRecord, MetricsRequest};
use super::metric_transform::record_from_idea;

/// Language code assumed when the request does not name one.
const DEFAULT_LANGUAGE_CODE: &str = "en_US";

/// The stateless alternative to the plan lifecycle: a one-shot
/// generate-keyword-ideas query that creates no remote resources.
///
/// Ideas lack the historical monthly series, so the windowed search counts
/// on the resulting records are always 0.
pub struct IdeaService<C: AdsClient> {
    client: Arc<C>,
    constants: Arc<ConstantResolver<C>>,
    filter: IdeaFilter,
}

impl<C: AdsClient> IdeaService<C> {
    pub fn new(client: Arc<C>, constants: Arc<ConstantResolver<C>>) -> Self {
        Self {
            client,
            constants,
            filter: IdeaFilter::default(),
        }
    }

    /// Override how non-matching results are treated. The default skips
    /// them; [`IdeaFilter::StopOnFirstMismatch`] reproduces the legacy
    /// stop-early behavior.
    pub fn with_filter(mut self, filter: IdeaFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Fetch forecast-style metrics for the requested keywords and/or page
    /// URL, scoped to the given location.
    ///
    /// At least one of a non-empty keyword list or a non-empty page URL is
    /// required; otherwise this fails before any remote call. The output
    /// never contains more records than there are input keywords.
    pub async fn idea_metrics(
        &self,
        request: &MetricsRequest,
        location_id: &str,
    ) -> Result<Vec<KeywordRecord>, KeywordError> {
        let keywords = &request.keywords;
        let page_url = request
            .page_url
            .as_deref()
            .filter(|url| !url.is_empty());

        let seed = match (keywords.is_empty(), page_url) {
            (true, None) => {
                return Err(KeywordError::Validation(
                    "At least one of keywords or page URL is required, but neither was specified."
                        .to_string(),
                ));
            }
            (true, Some(url)) => IdeaSeed::Url(url.to_string()),
            (false, None) => IdeaSeed::Keywords(keywords.clone()),
            (false, Some(url)) => IdeaSeed::KeywordsAndUrl {
                keywords: keywords.clone(),
                url: url.to_string(),
            },
        };

        let language_code = request
            .language_code
            .as_deref()
            .unwrap_or(DEFAULT_LANGUAGE_CODE);

        let geo_target = self.constants.geo_target(location_id).await?;
        let language_constant = self.constants.language(language_code).await?;

        let query = IdeaQuery {
            seed,
            geo_target,
            language_constant,
            network: PlanNetwork::GoogleSearchAndPartners,
        };
        let ideas = self.client.keyword_ideas(&query).await?;
        tracing::debug!("Keyword ideas query returned {} results", ideas.len());

        Ok(filter_ideas(ideas, keywords, self.filter)
            .iter()
            .map(record_from_idea)
            .collect())
    }
}

/// Walk the idea results in platform order and keep the ones whose text
/// exactly matches an input keyword (case-sensitive), capped at one record
/// per input keyword.
///
/// In stop-early mode the walk ends at the first non-matching result, which
/// means later matches are lost whenever the platform interleaves related
/// suggestions - the historical behavior this mode exists to reproduce.
fn filter_ideas(
    ideas: Vec<IdeaResult>,
    keywords: &[String],
    filter: IdeaFilter,
) -> Vec<IdeaResult> {
    let mut accepted = Vec::new();

    for idea in ideas {
        if accepted.len() >= keywords.len() {
            break;
        }
        if keywords.iter().any(|keyword| *keyword == idea.text) {
            accepted.push(idea);
        } else if filter == IdeaFilter::StopOnFirstMismatch {
            break;
        }
    }

    accepted
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::keywords::ads_client::{
        AdsError, Competition, HistoricalEntry, NewKeywordPlan, NewPlanAdGroup, NewPlanCampaign,
        NewPlanKeyword,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct IdeaClient {
        ideas: Vec<IdeaResult>,
        remote_calls: AtomicUsize,
        seen_query: Mutex<Option<IdeaQuery>>,
    }

    impl IdeaClient {
        fn new(ideas: Vec<IdeaResult>) -> Self {
            Self {
                ideas,
                remote_calls: AtomicUsize::new(0),
                seen_query: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl AdsClient for IdeaClient {
        async fn create_keyword_plan(&self, _: &NewKeywordPlan) -> Result<String, AdsError> {
            unreachable!("idea path never creates remote resources")
        }

        async fn create_plan_campaign(&self, _: &NewPlanCampaign) -> Result<String, AdsError> {
            unreachable!()
        }

        async fn create_plan_ad_group(&self, _: &NewPlanAdGroup) -> Result<String, AdsError> {
            unreachable!()
        }

        async fn create_plan_keywords(&self, _: &[NewPlanKeyword]) -> Result<(), AdsError> {
            unreachable!()
        }

        async fn delete_keyword_plan(&self, _: &str) -> Result<(), AdsError> {
            unreachable!()
        }

        async fn historical_metrics(&self, _: &str) -> Result<Vec<HistoricalEntry>, AdsError> {
            unreachable!()
        }

        async fn keyword_ideas(&self, query: &IdeaQuery) -> Result<Vec<IdeaResult>, AdsError> {
            self.remote_calls.fetch_add(1, Ordering::SeqCst);
            *self.seen_query.lock().unwrap() = Some(query.clone());
            Ok(self.ideas.clone())
        }

        async fn suggest_geo_targets(&self, _: &str) -> Result<Vec<String>, AdsError> {
            self.remote_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec!["geoTargetConstants/2840".to_string()])
        }

        async fn find_language_constant(
            &self,
            code: &str,
        ) -> Result<Option<String>, AdsError> {
            self.remote_calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(code, DEFAULT_LANGUAGE_CODE);
            Ok(Some("languageConstants/1000".to_string()))
        }
    }

    fn idea(text: &str) -> IdeaResult {
        IdeaResult {
            text: text.to_string(),
            avg_monthly_searches: Some(100),
            competition: Competition::Medium,
            low_top_of_page_bid_micros: Some(250_000),
            high_top_of_page_bid_micros: Some(750_000),
        }
    }

    fn service(client: Arc<IdeaClient>) -> IdeaService<IdeaClient> {
        let constants = Arc::new(ConstantResolver::new(Arc::clone(&client)));
        IdeaService::new(client, constants)
    }

    #[tokio::test]
    async fn missing_seed_fails_before_any_remote_call() {
        let client = Arc::new(IdeaClient::new(Vec::new()));
        let service = service(Arc::clone(&client));

        let result = service.idea_metrics(&MetricsRequest::default(), "2840").await;

        assert!(matches!(result, Err(KeywordError::Validation(_))));
        assert_eq!(client.remote_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn stop_early_mode_loses_matches_behind_a_mismatch() {
        let client = Arc::new(IdeaClient::new(vec![
            idea("a"),
            idea("b"),
            idea("x"),
            idea("c"),
        ]));
        let constants = Arc::new(ConstantResolver::new(Arc::clone(&client)));
        let service = IdeaService::new(Arc::clone(&client), constants)
            .with_filter(IdeaFilter::StopOnFirstMismatch);

        let request = MetricsRequest::for_keywords(["a", "b", "c"]);
        let records = service.idea_metrics(&request, "2840").await.unwrap();

        let texts: Vec<&str> = records.iter().map(|r| r.keyword.as_str()).collect();
        assert_eq!(texts, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn skip_mode_collects_matches_past_a_mismatch() {
        let client = Arc::new(IdeaClient::new(vec![
            idea("a"),
            idea("b"),
            idea("x"),
            idea("c"),
        ]));
        let service = service(client);

        let request = MetricsRequest::for_keywords(["a", "b", "c"]);
        let records = service.idea_metrics(&request, "2840").await.unwrap();

        let texts: Vec<&str> = records.iter().map(|r| r.keyword.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn output_never_exceeds_the_input_keyword_count() {
        let client = Arc::new(IdeaClient::new(vec![
            idea("a"),
            idea("a"),
            idea("a"),
            idea("a"),
        ]));
        let service = service(client);

        let request = MetricsRequest::for_keywords(["a", "b"]);
        let records = service.idea_metrics(&request, "2840").await.unwrap();

        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn matching_is_case_sensitive() {
        let client = Arc::new(IdeaClient::new(vec![idea("Rust"), idea("rust")]));
        let service = service(client);

        let request = MetricsRequest::for_keywords(["rust"]);
        let records = service.idea_metrics(&request, "2840").await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].keyword, "rust");
    }

    #[tokio::test]
    async fn url_only_requests_use_a_url_seed() {
        let client = Arc::new(IdeaClient::new(Vec::new()));
        let service = service(Arc::clone(&client));

        let request = MetricsRequest {
            keywords: Vec::new(),
            language_code: None,
            page_url: Some("https://example.com".to_string()),
        };
        service.idea_metrics(&request, "2840").await.unwrap();

        let query = client.seen_query.lock().unwrap().clone().unwrap();
        assert!(matches!(query.seed, IdeaSeed::Url(ref url) if url == "https://example.com"));
    }

    #[tokio::test]
    async fn keywords_and_url_combine_into_one_seed() {
        let client = Arc::new(IdeaClient::new(Vec::new()));
        let service = service(Arc::clone(&client));

        let request = MetricsRequest {
            keywords: vec!["a".to_string()],
            language_code: None,
            page_url: Some("https://example.com".to_string()),
        };
        service.idea_metrics(&request, "2840").await.unwrap();

        let query = client.seen_query.lock().unwrap().clone().unwrap();
        assert!(matches!(query.seed, IdeaSeed::KeywordsAndUrl { .. }));
    }

    #[tokio::test]
    async fn records_zero_the_windowed_counts() {
        let client = Arc::new(IdeaClient::new(vec![idea("a")]));
        let service = service(client);

        let request = MetricsRequest::for_keywords(["a"]);
        let records = service.idea_metrics(&request, "2840").await.unwrap();

        assert_eq!(records[0].searches_last_month, 0);
        assert_eq!(records[0].searches_last_year, 0);
        assert_eq!(records[0].searches_first_month, 0);
        assert_eq!(records[0].avg_monthly_searches, 100);
        assert_eq!(
            records[0].competition_index,
            Competition::Medium.as_index()
        );
    }
}
