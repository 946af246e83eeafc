use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::RunMonitor;

/// Runs extract → transform → load in order.
pub struct RiskEngine<P: Pipeline> {
    pipeline: P,
    monitor: RunMonitor,
}

impl<P: Pipeline> RiskEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: RunMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting risk assessment...");

        let request = self.pipeline.extract().await?;
        tracing::info!(
            "📥 Loaded subject with {} relative records",
            request.relatives.len()
        );
        self.monitor.log_phase("extract");

        let result = self.pipeline.transform(request).await?;
        tracing::info!(
            "🧮 Overall: {} ({}), {} elevated condition(s)",
            result.assessment.overall_risk_score,
            result.assessment.overall_risk_level.as_str(),
            result.assessment.high_risk_conditions.len()
        );
        self.monitor.log_phase("transform");

        let output_path = self.pipeline.load(result).await?;
        tracing::info!("📁 Output saved to: {}", output_path);
        self.monitor.log_phase("load");
        self.monitor.log_final_stats();

        Ok(output_path)
    }
}
