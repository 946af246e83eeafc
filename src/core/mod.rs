pub mod engine;
pub mod pipeline;
pub mod report;

pub use crate::domain::model::{ScoringRequest, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, RiskStore, Storage};
pub use crate::utils::error::Result;
