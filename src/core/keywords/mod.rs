// Keyword research module - plan orchestration, idea queries and the
// constant cache, all behind the injected AdsClient trait.

pub mod ads_client;
pub mod constant_resolver;
pub mod idea_service;
pub mod keyword_models;
pub mod metric_transform;
pub mod planner_service;

pub use ads_client::{AdsClient, AdsError, Competition, IdeaQuery, IdeaSeed, PlanNetwork};
pub use constant_resolver::ConstantResolver;
pub use idea_service::IdeaService;
pub use keyword_models::{FailurePolicy, IdeaFilter, KeywordError, KeywordRecord, MetricsRequest};
pub use planner_service::PlannerService;
