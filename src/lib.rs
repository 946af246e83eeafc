pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{HttpRiskStore, LocalStorage};
pub use config::toml_config::TomlConfig;
pub use self::core::{engine::RiskEngine, pipeline::AssessmentPipeline};
pub use domain::model::{
    Condition, OverallRiskLevel, Relation, RelativeRecord, RiskAssessment, RiskLevel, RiskResult,
    ScoringRequest, Sex, Subject,
};
pub use domain::scorer::RiskScorer;
pub use domain::tables::ScoringTables;
pub use utils::error::{Result, RiskError};
