use crate::adapters::http::fetch_scoring_request;
use crate::core::report::{self, CSV_REPORT, JSON_REPORT};
use crate::domain::model::{ScoringRequest, TransformResult};
use crate::domain::payload::SavePayload;
use crate::domain::ports::{ConfigProvider, Pipeline, RiskStore, SourceKind, Storage};
use crate::domain::scorer::RiskScorer;
use crate::domain::tables::ScoringTables;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use reqwest::Client;
use std::sync::Arc;

/// Payload kept on disk when the persistence service rejects a save.
pub const PENDING_SAVE: &str = "pending_save.json";

/// Builds a scorer from an optional tables override file.
pub fn load_scorer(tables_path: Option<&str>) -> Result<RiskScorer> {
    let tables = match tables_path {
        Some(path) => {
            tracing::info!("📚 Loading scoring tables from: {}", path);
            ScoringTables::from_file(path)?
        }
        None => ScoringTables::builtin(),
    };
    Ok(RiskScorer::new(Arc::new(tables)))
}

/// Re-POSTs a payload previously kept under [`PENDING_SAVE`].
pub async fn resend_pending<S: Storage>(storage: &S, store: &dyn RiskStore) -> Result<()> {
    let data = storage.read_file(PENDING_SAVE).await?;
    let payload: SavePayload = serde_json::from_slice(&data)?;
    tracing::info!(
        "🔁 Re-sending assessment calculated at {}",
        payload.calculated_at
    );
    store.save(&payload).await?;
    storage.remove_file(PENDING_SAVE).await?;
    tracing::info!("🧹 Removed {}", PENDING_SAVE);
    Ok(())
}

pub struct AssessmentPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    client: Client,
    scorer: RiskScorer,
    store: Option<Arc<dyn RiskStore>>,
}

impl<S: Storage, C: ConfigProvider> AssessmentPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self {
            storage,
            config,
            client: Client::new(),
            scorer: RiskScorer::default(),
            store: None,
        }
    }

    pub fn with_scorer(mut self, scorer: RiskScorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn RiskStore>) -> Self {
        self.store = Some(store);
        self
    }

    fn wants(&self, format: &str) -> bool {
        self.config.output_formats().iter().any(|f| f == format)
    }

    async fn persist(&self, result: &TransformResult, store: &dyn RiskStore) -> Result<()> {
        let payload = SavePayload::new(&result.request, &result.assessment, chrono::Utc::now());

        match store.save(&payload).await {
            Ok(()) => {
                // 舊的待送結果已被這次儲存取代
                if let Err(e) = self.storage.remove_file(PENDING_SAVE).await {
                    tracing::warn!("Could not remove stale {}: {}", PENDING_SAVE, e);
                }
                Ok(())
            }
            Err(e) => {
                // 保留計算結果，讓使用者之後重送
                match self.keep_pending(&payload).await {
                    Ok(()) => tracing::warn!(
                        "Save failed, payload kept at {}/{}",
                        self.config.output_path(),
                        PENDING_SAVE
                    ),
                    Err(write_err) => tracing::error!(
                        "Save failed and {} could not be written: {}",
                        PENDING_SAVE,
                        write_err
                    ),
                }
                Err(e)
            }
        }
    }

    async fn keep_pending(&self, payload: &SavePayload) -> Result<()> {
        let pending = serde_json::to_vec_pretty(payload)?;
        self.storage.write_file(PENDING_SAVE, &pending).await
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for AssessmentPipeline<S, C> {
    async fn extract(&self) -> Result<ScoringRequest> {
        let location = self.config.input_location();

        let request: ScoringRequest = match self.config.source_kind() {
            SourceKind::File => {
                tracing::debug!("Reading scoring request from file: {}", location);
                let data = self.storage.read_file(location).await?;
                serde_json::from_slice(&data)?
            }
            SourceKind::Api => {
                fetch_scoring_request(
                    &self.client,
                    location,
                    self.config.source_headers(),
                    self.config.request_timeout(),
                )
                .await?
            }
        };

        tracing::debug!(
            "Subject age {} ({}), {} relatives",
            request.subject.age,
            request.subject.sex,
            request.relatives.len()
        );
        Ok(request)
    }

    async fn transform(&self, request: ScoringRequest) -> Result<TransformResult> {
        request.validate()?;

        let assessment = self.scorer.assess(&request.subject, &request.relatives);
        for result in assessment.results.iter().filter(|r| r.risk_level.is_elevated()) {
            tracing::debug!(
                "{}: score {} ({}) from {:?}",
                result.condition,
                result.risk_score,
                result.risk_level.as_str(),
                result.contributing_factors
            );
        }

        let csv_output = report::render_csv(&assessment)?;
        let json_output = report::render_json(&assessment)?;

        Ok(TransformResult {
            request,
            assessment,
            csv_output,
            json_output,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let mut files: Vec<(&str, &str)> = Vec::new();
        if self.wants("json") {
            files.push((JSON_REPORT, result.json_output.as_str()));
        }
        if self.wants("csv") {
            files.push((CSV_REPORT, result.csv_output.as_str()));
        }

        let output_path = match self.config.bundle_filename() {
            Some(bundle_name) => {
                let zip_data = report::bundle(&files)?;
                tracing::debug!("Writing ZIP bundle ({} bytes)", zip_data.len());
                self.storage.write_file(bundle_name, &zip_data).await?;
                format!("{}/{}", self.config.output_path(), bundle_name)
            }
            None => {
                for (name, contents) in &files {
                    self.storage.write_file(name, contents.as_bytes()).await?;
                }
                self.config.output_path().to_string()
            }
        };

        if let Some(store) = &self.store {
            self.persist(&result, store.as_ref()).await?;
        }

        Ok(output_path)
    }
}
