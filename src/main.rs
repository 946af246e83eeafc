use clap::Parser;
use health_risk::core::pipeline::load_scorer;
use health_risk::domain::ports::{ConfigProvider, SourceKind};
use health_risk::utils::error::{ErrorSeverity, RiskError};
use health_risk::utils::{logger, validation::Validate};
use health_risk::{AssessmentPipeline, CliConfig, LocalStorage, RiskEngine};
use std::sync::Arc;

fn exit_code(e: &RiskError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,   // 可重試
        ErrorSeverity::High => 1,     // 輸入/處理錯誤
        ErrorSeverity::Critical => 3, // 配置或系統錯誤
    }
}

fn report_failure(e: &RiskError) -> ! {
    tracing::error!(
        "❌ Risk assessment failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());
    std::process::exit(exit_code(e));
}

#[tokio::main]
async fn main() {
    let mut config = CliConfig::parse();

    logger::init_logger(config.verbose, config.json_logs);

    tracing::info!("Starting health-risk CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        report_failure(&e);
    }

    // 輸入檔以目前目錄為準，不隨輸出目錄解析
    if config.source_kind() == SourceKind::File {
        if let Ok(cwd) = std::env::current_dir() {
            config.input = cwd.join(&config.input).to_string_lossy().into_owned();
        }
    }

    let scorer = match load_scorer(config.tables_path()) {
        Ok(scorer) => scorer,
        Err(e) => report_failure(&e),
    };

    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(config.output_path.clone());
    let store = config.risk_store();
    let mut pipeline = AssessmentPipeline::new(storage, config).with_scorer(scorer);
    if let Some(store) = store {
        tracing::info!("💾 Assessment will be saved to {}", store.endpoint());
        pipeline = pipeline.with_store(Arc::new(store));
    }

    let engine = RiskEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Risk assessment completed successfully!");
            println!("✅ Risk assessment completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => report_failure(&e),
    }
}
