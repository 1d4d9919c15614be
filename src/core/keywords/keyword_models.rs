// Keyword research core - domain models shared by both query paths.
//
// This module contains the flat record shape the exporter consumes, the
// request type callers hand in, and the error/policy types the services
// use. Following the same pattern as the rest of the core layer, this is
// platform-agnostic with no HTTP-specific code.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use super::ads_client::AdsError;

// ============================================================================
// DOMAIN MODELS
// ============================================================================

/// One row of keyword-performance data, as written to the report.
///
/// Both query paths produce this shape with every metric field populated
/// (0 where the source response lacks a value), so the exporter never has
/// to care which path produced a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRecord {
    pub keyword: String,
    pub avg_monthly_searches: i64,
    pub competition_index: i64,
    pub low_top_of_page_bid_micros: i64,
    pub high_top_of_page_bid_micros: i64,
    pub searches_last_month: i64,
    pub searches_last_year: i64,
    pub searches_first_month: i64,
}

/// Caller-supplied query input.
///
/// `language_code` falls back to `en_US` on the idea path when absent.
/// `page_url` only matters for the idea path, where it can stand in for
/// (or combine with) the keyword list as the seed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsRequest {
    pub keywords: Vec<String>,
    #[serde(default)]
    pub language_code: Option<String>,
    #[serde(default)]
    pub page_url: Option<String>,
}

impl MetricsRequest {
    #[allow(dead_code)]
    pub fn for_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
            language_code: None,
            page_url: None,
        }
    }
}

// ============================================================================
// ERRORS
// ============================================================================

/// Errors surfaced by the keyword services.
///
/// Callers can tell bad input apart from upstream failures; a raw transport
/// error never escapes the core layer.
#[derive(Debug, Error)]
pub enum KeywordError {
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error(transparent)]
    Api(#[from] AdsError),
    #[error("No {kind} constant found for '{key}'")]
    ConstantNotFound { kind: &'static str, key: String },
}

// ============================================================================
// POLICIES
// ============================================================================

/// What to do when a non-essential remote call (cleanup, mainly) fails.
///
/// Creation-step failures always abort the sequence; this policy only
/// governs the calls that used to be silently log-and-continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Surface the error to the caller.
    Abort,
    /// Retry with exponential backoff and jitter, then surface the error.
    Retry {
        attempts: u32,
        base_delay: Duration,
    },
    /// Log a warning and keep going.
    BestEffort,
}

/// How the idea-metrics path treats results that don't match an input
/// keyword.
///
/// `StopOnFirstMismatch` reproduces the historical behavior where iteration
/// ended at the first non-matching result, tying output completeness to the
/// platform's result ordering. `SkipMismatches` is the corrected default:
/// walk the whole stream and collect up to one record per input keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdeaFilter {
    #[default]
    SkipMismatches,
    StopOnFirstMismatch,
}
