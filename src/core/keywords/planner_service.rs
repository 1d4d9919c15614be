use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use super::ads_client::{
    AdsClient, ForecastWindow, HistoricalEntry, MatchType, NewKeywordPlan, NewPlanAdGroup,
    NewPlanCampaign, NewPlanKeyword, PlanNetwork,
};
use super::constant_resolver::ConstantResolver;
use super::keyword_models::{FailurePolicy, KeywordError, KeywordRecord, MetricsRequest};
use super::metric_transform::record_from_historical;

/// Default CPC bid attached to the temporary plan resources, in micros.
const DEFAULT_CPC_BID_MICROS: i64 = 1_000_000;

/// Language constant pinned on the plan campaign. The per-request language
/// code only matters on the idea path; historical plans always use this.
const CAMPAIGN_LANGUAGE_CONSTANT: &str = "languageConstants/1000";

/// Orchestrates the keyword-plan lifecycle to obtain a historical-metrics
/// report.
///
/// One call builds the full temporary resource chain on the platform
/// (plan -> campaign -> ad group -> keywords), fetches the derived report,
/// and tears the plan down again. The chain is call-scoped: concurrent
/// calls get disjoint plans and never contend with each other.
///
/// Teardown is guaranteed whenever plan creation succeeded, including when
/// a later creation step fails mid-sequence, so no orphaned resources are
/// left behind. How a failing deletion itself is handled is governed by the
/// configured [`FailurePolicy`] rather than being silently swallowed.
pub struct PlannerService<C: AdsClient> {
    client: Arc<C>,
    constants: Arc<ConstantResolver<C>>,
    cleanup_policy: FailurePolicy,
}

impl<C: AdsClient> PlannerService<C> {
    pub fn new(client: Arc<C>, constants: Arc<ConstantResolver<C>>) -> Self {
        Self {
            client,
            constants,
            cleanup_policy: FailurePolicy::BestEffort,
        }
    }

    /// Override the policy applied when plan deletion fails.
    pub fn with_cleanup_policy(mut self, policy: FailurePolicy) -> Self {
        self.cleanup_policy = policy;
        self
    }

    /// Fetch historical keyword metrics for the requested keywords, scoped
    /// to the given location.
    ///
    /// Fails fast with a validation error before any remote call when the
    /// keyword list is empty. The geo target is resolved up front so a
    /// lookup failure also happens before anything remote is created.
    pub async fn historical_metrics(
        &self,
        request: &MetricsRequest,
        location_id: &str,
    ) -> Result<Vec<KeywordRecord>, KeywordError> {
        if request.keywords.is_empty() {
            return Err(KeywordError::Validation(
                "historical metrics require at least one keyword".to_string(),
            ));
        }

        let geo_target = self.constants.geo_target(location_id).await?;

        let plan = NewKeywordPlan {
            name: format!("Keyword plan #{}", printable_timestamp()),
            forecast_window: ForecastWindow::NextQuarter,
        };
        let plan_resource = self.client.create_keyword_plan(&plan).await?;
        tracing::info!("Created keyword plan {}", plan_resource);

        // Everything after plan creation runs in a separate step so the
        // plan is deleted on both the success and the failure path.
        let outcome = self
            .build_and_fetch(&plan_resource, &geo_target, &request.keywords)
            .await;
        let cleanup = self.teardown(&plan_resource).await;

        let entries = outcome?;
        cleanup?;

        Ok(entries.iter().map(record_from_historical).collect())
    }

    /// Create the campaign, ad group and keyword entries under an existing
    /// plan, then fetch the historical report. Any failure here aborts the
    /// sequence; the caller is responsible for deleting the plan.
    async fn build_and_fetch(
        &self,
        plan_resource: &str,
        geo_target: &str,
        keywords: &[String],
    ) -> Result<Vec<HistoricalEntry>, KeywordError> {
        let campaign = NewPlanCampaign {
            name: format!("Keyword plan campaign #{}", printable_timestamp()),
            plan_resource: plan_resource.to_string(),
            geo_target: geo_target.to_string(),
            language_constant: CAMPAIGN_LANGUAGE_CONSTANT.to_string(),
            network: PlanNetwork::GoogleSearchAndPartners,
            cpc_bid_micros: DEFAULT_CPC_BID_MICROS,
        };
        let campaign_resource = self.client.create_plan_campaign(&campaign).await?;

        let ad_group = NewPlanAdGroup {
            name: format!("Keyword plan ad group #{}", printable_timestamp()),
            campaign_resource,
            cpc_bid_micros: DEFAULT_CPC_BID_MICROS,
        };
        let ad_group_resource = self.client.create_plan_ad_group(&ad_group).await?;

        let entries: Vec<NewPlanKeyword> = keywords
            .iter()
            .map(|text| NewPlanKeyword {
                text: text.clone(),
                ad_group_resource: ad_group_resource.clone(),
                match_type: MatchType::Exact,
                cpc_bid_micros: DEFAULT_CPC_BID_MICROS,
            })
            .collect();
        self.client.create_plan_keywords(&entries).await?;

        Ok(self.client.historical_metrics(plan_resource).await?)
    }

    /// Delete the plan, applying the configured cleanup policy. Deleting
    /// the plan cascades to the campaign, ad group and keywords on the
    /// platform side.
    async fn teardown(&self, plan_resource: &str) -> Result<(), KeywordError> {
        match self.cleanup_policy {
            FailurePolicy::Abort => {
                self.client.delete_keyword_plan(plan_resource).await?;
                Ok(())
            }
            FailurePolicy::Retry {
                attempts,
                base_delay,
            } => {
                let attempts = attempts.max(1);
                let mut attempt = 0;
                loop {
                    match self.client.delete_keyword_plan(plan_resource).await {
                        Ok(()) => return Ok(()),
                        Err(err) => {
                            tracing::warn!(
                                "Deleting keyword plan {} failed (attempt {}): {}",
                                plan_resource,
                                attempt + 1,
                                err
                            );
                            if attempt + 1 >= attempts {
                                return Err(err.into());
                            }
                        }
                    }
                    tokio::time::sleep(backoff_delay(base_delay, attempt)).await;
                    attempt += 1;
                }
            }
            FailurePolicy::BestEffort => {
                if let Err(err) = self.client.delete_keyword_plan(plan_resource).await {
                    tracing::warn!(
                        "Leaving keyword plan {} behind, deletion failed: {}",
                        plan_resource,
                        err
                    );
                }
                Ok(())
            }
        }
    }
}

/// Exponential backoff with random jitter on top.
fn backoff_delay(base_delay: Duration, attempt: u32) -> Duration {
    let exp = base_delay.saturating_mul(1u32 << attempt.min(16));
    let jitter_ms = if base_delay.is_zero() {
        0
    } else {
        rand::thread_rng().gen_range(0..=base_delay.as_millis() as u64 / 2)
    };
    exp + Duration::from_millis(jitter_ms)
}

/// Printable local timestamp used in the human-readable names of the
/// temporary plan resources.
fn printable_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z").to_string()
}

// ============================================================================
// TESTS
// ============================================================================
