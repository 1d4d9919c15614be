// This is the entry point of the keyword-planner tool.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (Google Ads REST, OAuth2)
// - `report/` = Spreadsheet rendering of query results
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Run the requested query path
// 4. Export the records to a spreadsheet

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;
#[path = "report/report_layer.rs"]
mod report;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use crate::core::keywords::{
    ConstantResolver, FailurePolicy, IdeaFilter, IdeaService, MetricsRequest, PlannerService,
};
use crate::infra::google_ads::{AdsConfig, GoogleAdsApiClient};

const USAGE: &str = "\
Usage: keyword-planner <historical|ideas> [options]

Options:
  --keywords <a,b,c>     Comma-separated keywords to query
  --location <id>        Geo location id or country code (required)
  --language <code>      Language code (idea path, defaults to en_US)
  --url <page url>       Seed page URL (idea path only)
  --out <file.xlsx>      Output file (default: keyword_report.xlsx)
  --legacy-idea-filter   Stop at the first non-matching idea result
                         instead of skipping it";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Historical,
    Ideas,
}

#[derive(Debug)]
struct CliArgs {
    command: Command,
    keywords: Vec<String>,
    location: String,
    language: Option<String>,
    url: Option<String>,
    out: PathBuf,
    legacy_idea_filter: bool,
}

impl CliArgs {
    fn parse<I>(args: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();

        let command = match args.next().as_deref() {
            Some("historical") => Command::Historical,
            Some("ideas") => Command::Ideas,
            Some(other) => return Err(format!("Unknown command '{}'", other)),
            None => return Err("Missing command".to_string()),
        };

        let mut keywords = Vec::new();
        let mut location = None;
        let mut language = None;
        let mut url = None;
        let mut out = PathBuf::from("keyword_report.xlsx");
        let mut legacy_idea_filter = false;

        while let Some(flag) = args.next() {
            match flag.as_str() {
                "--keywords" => {
                    let value = args
                        .next()
                        .ok_or_else(|| "--keywords needs a value".to_string())?;
                    keywords = value
                        .split(',')
                        .map(str::trim)
                        .filter(|k| !k.is_empty())
                        .map(str::to_string)
                        .collect();
                }
                "--location" => {
                    location = Some(
                        args.next()
                            .ok_or_else(|| "--location needs a value".to_string())?,
                    );
                }
                "--language" => {
                    language = Some(
                        args.next()
                            .ok_or_else(|| "--language needs a value".to_string())?,
                    );
                }
                "--url" => {
                    url = Some(
                        args.next()
                            .ok_or_else(|| "--url needs a value".to_string())?,
                    );
                }
                "--out" => {
                    out = PathBuf::from(
                        args.next()
                            .ok_or_else(|| "--out needs a value".to_string())?,
                    );
                }
                "--legacy-idea-filter" => legacy_idea_filter = true,
                other => return Err(format!("Unknown option '{}'", other)),
            }
        }

        Ok(Self {
            command,
            keywords,
            location: location.ok_or_else(|| "--location is required".to_string())?,
            language,
            url,
            out,
            legacy_idea_filter,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let args = match CliArgs::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}\n\n{}", message, USAGE);
            std::process::exit(2);
        }
    };

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Create our services with their dependencies.
    // This is the "composition root" where we wire everything together.

    let config = AdsConfig::from_env().context("Loading Google Ads configuration")?;
    let client = Arc::new(
        GoogleAdsApiClient::from_config(&config)
            .await
            .context("Building the Google Ads client")?,
    );
    let constants = Arc::new(ConstantResolver::new(Arc::clone(&client)));

    let request = MetricsRequest {
        keywords: args.keywords,
        language_code: args.language,
        page_url: args.url,
    };

    let records = match args.command {
        Command::Historical => {
            let planner = PlannerService::new(Arc::clone(&client), Arc::clone(&constants))
                .with_cleanup_policy(FailurePolicy::Retry {
                    attempts: 3,
                    base_delay: Duration::from_millis(500),
                });
            planner
                .historical_metrics(&request, &args.location)
                .await
                .context("Fetching historical keyword metrics")?
        }
        Command::Ideas => {
            let filter = if args.legacy_idea_filter {
                IdeaFilter::StopOnFirstMismatch
            } else {
                IdeaFilter::SkipMismatches
            };
            let ideas = IdeaService::new(Arc::clone(&client), Arc::clone(&constants))
                .with_filter(filter);
            ideas
                .idea_metrics(&request, &args.location)
                .await
                .context("Fetching keyword idea metrics")?
        }
    };

    tracing::info!("Fetched {} keyword records", records.len());

    report::write_report(&args.out, &records).context("Writing the report")?;
    println!("Report written to {}", args.out.display());

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliArgs, String> {
        CliArgs::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn parses_a_historical_query() {
        let args = parse(&[
            "historical",
            "--keywords",
            "rust jobs, rust careers",
            "--location",
            "2840",
            "--out",
            "report.xlsx",
        ])
        .unwrap();

        assert_eq!(args.command, Command::Historical);
        assert_eq!(args.keywords, vec!["rust jobs", "rust careers"]);
        assert_eq!(args.location, "2840");
        assert_eq!(args.out, PathBuf::from("report.xlsx"));
        assert!(!args.legacy_idea_filter);
    }

    #[test]
    fn parses_an_idea_query_with_url_seed() {
        let args = parse(&[
            "ideas",
            "--url",
            "https://example.com",
            "--location",
            "US",
            "--legacy-idea-filter",
        ])
        .unwrap();

        assert_eq!(args.command, Command::Ideas);
        assert!(args.keywords.is_empty());
        assert_eq!(args.url.as_deref(), Some("https://example.com"));
        assert!(args.legacy_idea_filter);
    }

    #[test]
    fn rejects_missing_location() {
        let result = parse(&["historical", "--keywords", "a"]);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_unknown_commands() {
        let result = parse(&["forecast"]);
        assert!(result.is_err());
    }
}
