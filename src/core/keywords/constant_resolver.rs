use std::sync::Arc;

use dashmap::DashMap;

use super::ads_client::AdsClient;
use super::keyword_models::KeywordError;

/// Resolves and caches the platform constants (geo-target and language
/// resource names) that scope every query.
///
/// The cache is owned by this instance and injected wherever it is needed,
/// rather than living in process-global state. Entries are populated lazily
/// and kept for the resolver's lifetime. A lookup that returns nothing
/// leaves the key unset, so the next call asks the platform again; there is
/// no negative caching. Concurrent first-time lookups for the same key may
/// race and issue duplicate requests, which is harmless - both resolve to
/// the same constant.
pub struct ConstantResolver<C: AdsClient> {
    client: Arc<C>,
    geo_targets: DashMap<String, String>,
    languages: DashMap<String, String>,
}

impl<C: AdsClient> ConstantResolver<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            geo_targets: DashMap::new(),
            languages: DashMap::new(),
        }
    }

    /// Resolve the geo-target constant for a country code.
    ///
    /// When the platform offers several suggestions the first one wins;
    /// there is no disambiguation step. A lookup failure is a hard error
    /// for the caller.
    pub async fn geo_target(&self, country_code: &str) -> Result<String, KeywordError> {
        if let Some(cached) = self.geo_targets.get(country_code) {
            return Ok(cached.clone());
        }

        let suggestions = self.client.suggest_geo_targets(country_code).await?;
        let constant = suggestions
            .into_iter()
            .next()
            .ok_or_else(|| KeywordError::ConstantNotFound {
                kind: "geo target",
                key: country_code.to_string(),
            })?;

        self.geo_targets
            .insert(country_code.to_string(), constant.clone());
        Ok(constant)
    }

    /// Resolve the language constant for a language code.
    pub async fn language(&self, language_code: &str) -> Result<String, KeywordError> {
        if let Some(cached) = self.languages.get(language_code) {
            return Ok(cached.clone());
        }

        let constant = self
            .client
            .find_language_constant(language_code)
            .await?
            .ok_or_else(|| KeywordError::ConstantNotFound {
                kind: "language",
                key: language_code.to_string(),
            })?;

        self.languages
            .insert(language_code.to_string(), constant.clone());
        Ok(constant)
    }
}

// ============================================================================
// TESTS
// ============================================================================
