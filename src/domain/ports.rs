use crate::domain::model::{ScoringRequest, TransformResult};
use crate::domain::payload::SavePayload;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Removing a missing file is not an error.
    fn remove_file(&self, path: &str) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Where the scoring request comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    File,
    Api,
}

pub trait ConfigProvider: Send + Sync {
    fn source_kind(&self) -> SourceKind;
    /// File path relative to storage, or URL for `SourceKind::Api`.
    fn input_location(&self) -> &str;
    fn source_headers(&self) -> Option<&HashMap<String, String>> {
        None
    }
    fn request_timeout(&self) -> Option<Duration> {
        None
    }
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> &[String];
    /// ZIP bundle filename when compression is enabled.
    fn bundle_filename(&self) -> Option<&str> {
        None
    }
    fn tables_path(&self) -> Option<&str> {
        None
    }
}

/// External persistence collaborator. One attempt per call; no retry.
#[async_trait]
pub trait RiskStore: Send + Sync {
    async fn save(&self, payload: &SavePayload) -> Result<()>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<ScoringRequest>;
    async fn transform(&self, request: ScoringRequest) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
