//! Pure conversion from platform responses to [`KeywordRecord`]s, including
//! the monthly-window derivation used by the historical path.

use super::ads_client::{HistoricalEntry, IdeaResult};
use super::keyword_models::KeywordRecord;

/// The three derived search counts pulled out of a monthly series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MonthlyWindows {
    pub last_month: i64,
    pub last_year: i64,
    pub first_month: i64,
}

/// Derive the windowed search counts from a monthly series ordered oldest
/// month first.
///
/// "Last year" is the value 12 months before the newest entry, so any
/// series shorter than 13 months reports 0 there. A single-entry series
/// reports the same value for the first and last month. An empty series
/// reports 0 everywhere.
pub fn monthly_windows(series: &[i64]) -> MonthlyWindows {
    let Some((&last_month, _)) = series.split_last() else {
        return MonthlyWindows::default();
    };

    let last_year = match series.len().checked_sub(13) {
        Some(index) => series[index],
        None => 0,
    };

    MonthlyWindows {
        last_month,
        last_year,
        first_month: series[0],
    }
}

/// Flatten a historical-metrics entry into the record shape, deriving the
/// windowed counts and defaulting absent summary fields to 0.
pub fn record_from_historical(entry: &HistoricalEntry) -> KeywordRecord {
    let windows = monthly_windows(&entry.monthly_searches);

    KeywordRecord {
        keyword: entry.search_query.clone(),
        avg_monthly_searches: entry.avg_monthly_searches.unwrap_or(0),
        competition_index: entry.competition_index.unwrap_or(0),
        low_top_of_page_bid_micros: entry.low_top_of_page_bid_micros.unwrap_or(0),
        high_top_of_page_bid_micros: entry.high_top_of_page_bid_micros.unwrap_or(0),
        searches_last_month: windows.last_month,
        searches_last_year: windows.last_year,
        searches_first_month: windows.first_month,
    }
}

/// Flatten a keyword-idea result into the record shape. The idea response
/// carries no monthly series, so the windowed counts are always 0.
pub fn record_from_idea(idea: &IdeaResult) -> KeywordRecord {
    KeywordRecord {
        keyword: idea.text.clone(),
        avg_monthly_searches: idea.avg_monthly_searches.unwrap_or(0),
        competition_index: idea.competition.as_index(),
        low_top_of_page_bid_micros: idea.low_top_of_page_bid_micros.unwrap_or(0),
        high_top_of_page_bid_micros: idea.high_top_of_page_bid_micros.unwrap_or(0),
        searches_last_month: 0,
        searches_last_year: 0,
        searches_first_month: 0,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::keywords::ads_client::Competition;

    #[test]
    fn thirteen_month_series_reaches_back_a_full_year() {
        // Oldest to newest: 10, 20, ..., 130.
        let series: Vec<i64> = (1..=13).map(|n| n * 10).collect();
        let windows = monthly_windows(&series);

        assert_eq!(windows.last_month, 130);
        assert_eq!(windows.last_year, 10);
        assert_eq!(windows.first_month, 10);
    }

    #[test]
    fn long_series_picks_the_entry_twelve_months_back() {
        let series: Vec<i64> = (0..24).collect();
        let windows = monthly_windows(&series);

        assert_eq!(windows.last_month, 23);
        assert_eq!(windows.last_year, series[series.len() - 13]);
        assert_eq!(windows.first_month, 0);
    }

    #[test]
    fn short_series_reports_zero_for_last_year() {
        for len in 1..13 {
            let series: Vec<i64> = (1..=len).collect();
            let windows = monthly_windows(&series);

            assert_eq!(windows.last_year, 0, "series of length {len}");
            assert_eq!(windows.last_month, len);
            assert_eq!(windows.first_month, 1);
        }
    }

    #[test]
    fn single_entry_series_reports_same_first_and_last() {
        let windows = monthly_windows(&[42]);

        assert_eq!(windows.last_month, 42);
        assert_eq!(windows.first_month, 42);
        assert_eq!(windows.last_year, 0);
    }

    #[test]
    fn empty_series_reports_zero_everywhere() {
        assert_eq!(monthly_windows(&[]), MonthlyWindows::default());
    }

    #[test]
    fn historical_record_defaults_missing_summaries_to_zero() {
        let entry = HistoricalEntry {
            search_query: "rust jobs".to_string(),
            monthly_searches: vec![5, 6, 7],
            avg_monthly_searches: None,
            competition_index: Some(55),
            low_top_of_page_bid_micros: None,
            high_top_of_page_bid_micros: Some(2_500_000),
        };

        let record = record_from_historical(&entry);

        assert_eq!(record.keyword, "rust jobs");
        assert_eq!(record.avg_monthly_searches, 0);
        assert_eq!(record.competition_index, 55);
        assert_eq!(record.low_top_of_page_bid_micros, 0);
        assert_eq!(record.high_top_of_page_bid_micros, 2_500_000);
        assert_eq!(record.searches_last_month, 7);
        assert_eq!(record.searches_last_year, 0);
        assert_eq!(record.searches_first_month, 5);
    }

    #[test]
    fn idea_record_zeroes_the_windowed_counts() {
        let idea = IdeaResult {
            text: "rust jobs".to_string(),
            avg_monthly_searches: Some(900),
            competition: Competition::High,
            low_top_of_page_bid_micros: Some(100_000),
            high_top_of_page_bid_micros: Some(900_000),
        };

        let record = record_from_idea(&idea);

        assert_eq!(record.avg_monthly_searches, 900);
        assert_eq!(record.competition_index, Competition::High.as_index());
        assert_eq!(record.searches_last_month, 0);
        assert_eq!(record.searches_last_year, 0);
        assert_eq!(record.searches_first_month, 0);
    }
}
