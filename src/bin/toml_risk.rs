use clap::Parser;
use health_risk::core::pipeline::{load_scorer, resend_pending, PENDING_SAVE};
use health_risk::domain::ports::{ConfigProvider, SourceKind};
use health_risk::utils::error::{ErrorSeverity, RiskError};
use health_risk::utils::{logger, validation::Validate};
use health_risk::{AssessmentPipeline, LocalStorage, RiskEngine, TomlConfig};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "toml-risk")]
#[command(about = "Genetic risk assessment driven by a TOML configuration")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "risk-config.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Skip the persistence step even if enabled in config
    #[arg(long)]
    no_save: bool,

    /// Re-send the payload kept from a failed save, then exit
    #[arg(long)]
    resend: bool,

    /// Dry run - show what would be processed without executing
    #[arg(long)]
    dry_run: bool,
}

fn fail(e: &RiskError) -> ! {
    tracing::error!(
        "❌ Risk assessment failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // 載入 TOML 配置
    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    logger::init_logger(args.verbose, config.json_logs());
    tracing::info!("🚀 Starting TOML-based risk assessment");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    if args.no_save {
        if let Some(persistence) = config.persistence.as_mut() {
            persistence.enabled = false;
            tracing::info!("🔧 Persistence disabled from command line");
        }
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        fail(&e);
    }
    tracing::info!("✅ Configuration loaded and validated successfully");

    // 相對路徑以設定檔所在目錄為準
    let config_dir = std::path::Path::new(&args.config)
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_default();
    let config_dir = std::env::current_dir()
        .map(|cwd| cwd.join(&config_dir))
        .unwrap_or(config_dir);
    config.resolve_paths(&config_dir);

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        perform_dry_run(&config);
        return;
    }

    let storage = LocalStorage::new(config.output_path().to_string());

    if args.resend {
        let Some(store) = config.risk_store() else {
            eprintln!("❌ [persistence] must be enabled to re-send a saved payload");
            std::process::exit(3);
        };
        match resend_pending(&storage, &store).await {
            Ok(()) => println!("✅ Pending assessment saved to {}", store.endpoint()),
            Err(e) => fail(&e),
        }
        return;
    }

    let scorer = match load_scorer(config.tables_path()) {
        Ok(scorer) => scorer,
        Err(e) => fail(&e),
    };

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let store = config.risk_store();
    let mut pipeline = AssessmentPipeline::new(storage, config).with_scorer(scorer);
    if let Some(store) = store {
        pipeline = pipeline.with_store(Arc::new(store));
    }

    let engine = RiskEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Risk assessment completed successfully!");
            println!("✅ Risk assessment completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            if e.is_retryable() {
                eprintln!(
                    "💾 Reports were written; re-run with --resend to retry saving {}",
                    PENDING_SAVE
                );
            }
            fail(&e);
        }
    }
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!(
        "  Pipeline: {} v{}",
        config.pipeline.name, config.pipeline.version
    );
    println!("  Source: {} ({})", config.input_location(), config.source.r#type);
    println!("  Output: {}", config.output_path());
    println!("  Formats: {}", config.load.output_formats.join(", "));
    if let Some(bundle) = config.bundle_filename() {
        println!("  Bundle: {}", bundle);
    }
    println!(
        "  Tables: {}",
        config.tables_path().unwrap_or("built-in")
    );
    println!(
        "  Persistence: {}",
        if config.persistence_enabled() { "enabled" } else { "disabled" }
    );

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(config: &TomlConfig) {
    println!("🔍 Dry Run Analysis:");
    println!();

    println!("📡 Scoring Request Source:");
    match config.source_kind() {
        SourceKind::File => println!("  File: {}", config.input_location()),
        SourceKind::Api => {
            println!("  Endpoint: {}", config.input_location());
            if let Some(headers) = config.source_headers() {
                println!("  Headers: {} custom headers", headers.len());
            }
        }
    }

    println!();
    println!("🧮 Scoring:");
    match load_scorer(config.tables_path()) {
        Ok(_) => println!("  Tables load and validate OK"),
        Err(e) => println!("  ⚠️ Tables would fail to load: {}", e),
    }

    println!();
    println!("💾 Output Configuration:");
    println!("  Path: {}", config.output_path());
    println!("  Formats: {}", config.output_formats().join(", "));

    if let Some(store) = config.risk_store() {
        println!();
        println!("🌐 Persistence:");
        println!("  POST {}", store.endpoint());
    }

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");
}
