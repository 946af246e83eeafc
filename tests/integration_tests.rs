use anyhow::Result;
use health_risk::core::pipeline::{resend_pending, PENDING_SAVE};
use health_risk::core::report::{CSV_REPORT, JSON_REPORT};
use health_risk::utils::validation::Validate;
use health_risk::{
    AssessmentPipeline, CliConfig, LocalStorage, RiskAssessment, RiskEngine,
    RiskError, TomlConfig,
};
use httpmock::prelude::*;
use std::sync::Arc;
use tempfile::TempDir;

const FAMILY: &str = r#"{
    "subject": {"age": 45, "sex": "female", "ancestry": "Ashkenazi Jewish"},
    "relatives": [
        {"relation": "Parent", "ageAtDiagnosisOrCurrent": 48, "conditions": ["Breast Cancer"], "notes": "diagnosed 1998"},
        {"relation": "Uncle", "ageAtDiagnosisOrCurrent": 71, "conditions": ["Heart Disease", "Diabetes"]}
    ]
}"#;

fn cli_config(input: String, output_path: &str) -> CliConfig {
    CliConfig {
        input,
        output_path: output_path.to_string(),
        formats: vec!["json".to_string(), "csv".to_string()],
        bundle: None,
        tables: None,
        save_endpoint: None,
        timeout_seconds: None,
        verbose: false,
        monitor: false,
        json_logs: false,
    }
}

#[tokio::test]
async fn test_end_to_end_file_source_with_persistence() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().to_str().unwrap().to_string();
    let input_path = temp_dir.path().join("family.json");
    std::fs::write(&input_path, FAMILY)?;

    let server = MockServer::start();
    let save_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/genetic-risk")
            .header("content-type", "application/json")
            .json_body_partial(
                r#"{
                    "overallRiskScore": 23,
                    "riskLevel": "Low Genetic Risk",
                    "highRiskConditions": ["Cancer (General)", "Breast Cancer"],
                    "age": 45,
                    "sex": "female",
                    "ancestry": "Ashkenazi Jewish"
                }"#,
            );
        then.status(201).json_body(serde_json::json!({"id": "risk-1"}));
    });

    let mut config = cli_config(input_path.to_str().unwrap().to_string(), &output_path);
    config.save_endpoint = Some(server.url("/api/genetic-risk"));
    config.validate()?;

    let storage = LocalStorage::new(output_path.clone());
    let store = config.risk_store().unwrap();
    let pipeline = AssessmentPipeline::new(storage, config).with_store(Arc::new(store));
    let engine = RiskEngine::new_with_monitoring(pipeline, true);

    let result = engine.run().await?;
    assert_eq!(result, output_path);
    save_mock.assert();

    let json = std::fs::read_to_string(temp_dir.path().join(JSON_REPORT))?;
    let assessment: RiskAssessment = serde_json::from_str(&json)?;
    assert_eq!(assessment.results.len(), 12);
    assert_eq!(assessment.results[3].risk_score, 135);

    let csv = std::fs::read_to_string(temp_dir.path().join(CSV_REPORT))?;
    assert!(csv.contains("Breast Cancer,135,very_high"));
    assert!(!temp_dir.path().join(PENDING_SAVE).exists());
    Ok(())
}

#[tokio::test]
async fn test_failed_save_then_resend() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().to_str().unwrap().to_string();
    let input_path = temp_dir.path().join("family.json");
    std::fs::write(&input_path, FAMILY)?;

    let server = MockServer::start();
    let mut down = server.mock(|when, then| {
        when.method(POST).path("/save");
        then.status(503).body("maintenance window");
    });

    let mut config = cli_config(input_path.to_str().unwrap().to_string(), &output_path);
    config.formats = vec!["json".to_string()];
    config.save_endpoint = Some(server.url("/save"));

    let store = Arc::new(config.risk_store().unwrap());
    let pipeline =
        AssessmentPipeline::new(LocalStorage::new(output_path.clone()), config).with_store(store.clone());
    let err = RiskEngine::new(pipeline).run().await.unwrap_err();

    down.assert_hits(1);
    assert!(matches!(err, RiskError::PersistenceError { status: 503, .. }));
    assert!(temp_dir.path().join(JSON_REPORT).exists());
    assert!(temp_dir.path().join(PENDING_SAVE).exists());

    down.delete();
    let up = server.mock(|when, then| {
        when.method(POST)
            .path("/save")
            .json_body_partial(r#"{"age": 45, "sex": "female"}"#);
        then.status(200);
    });

    let storage = LocalStorage::new(output_path);
    resend_pending(&storage, &*store).await?;
    up.assert();
    assert!(!temp_dir.path().join(PENDING_SAVE).exists());

    assert!(resend_pending(&storage, &*store).await.is_err());
    up.assert_hits(1);
    Ok(())
}

#[tokio::test]
async fn test_api_source_with_toml_config_and_bundle() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let normalized_path = temp_dir.path().to_str().unwrap().replace('\\', "/");

    let server = MockServer::start();
    let profile_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/profiles/42")
            .header("x-api-key", "k-123");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({
                "subject": {"age": 58, "sex": "male", "ancestry": "African American"},
                "relatives": [
                    {"relation": "Sibling", "ageAtDiagnosisOrCurrent": 47, "conditions": ["Prostate Cancer", "Colorectal Cancer"]}
                ]
            }));
    });

    let config_content = format!(
        r#"
[pipeline]
name = "api-risk"
version = "1.0.0"

[source]
type = "api"
endpoint = "{}"
timeout_seconds = 5
headers = {{ x-api-key = "k-123" }}

[load]
output_path = "{}"
output_formats = ["json", "csv"]

[load.compression]
enabled = true
filename = "assessment.zip"

[monitoring]
enabled = false
"#,
        server.url("/profiles/42"),
        normalized_path
    );
    let config_path = temp_dir.path().join("risk-config.toml");
    tokio::fs::write(&config_path, config_content).await?;

    let config = TomlConfig::from_file(&config_path)?;
    config.validate()?;

    let storage = LocalStorage::new(config.load.output_path.clone());
    let pipeline = AssessmentPipeline::new(storage, config);
    let output = RiskEngine::new(pipeline).run().await?;

    profile_mock.assert();
    assert!(output.ends_with("assessment.zip"));

    let zip_data = std::fs::read(temp_dir.path().join("assessment.zip"))?;
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data))?;
    assert_eq!(archive.len(), 2);

    let mut json = String::new();
    std::io::Read::read_to_string(&mut archive.by_name(JSON_REPORT)?, &mut json)?;
    let assessment: RiskAssessment = serde_json::from_str(&json)?;

    // min(58/15, 4) + 4 + 2 = 9.87
    let prostate = &assessment.results[5];
    assert_eq!(prostate.risk_score, 99);
    // 4 + 2 + 2 (African American)
    let colorectal = &assessment.results[4];
    assert_eq!(colorectal.risk_score, 80);
    assert!(assessment
        .screening_schedule
        .contains(&"Discuss PSA testing with your provider".to_string()));
    Ok(())
}

#[tokio::test]
async fn test_invalid_input_age_is_rejected_before_scoring() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().to_str().unwrap().to_string();
    let input_path = temp_dir.path().join("family.json");
    std::fs::write(
        &input_path,
        r#"{"subject": {"age": 212, "sex": "male"}, "relatives": []}"#,
    )?;

    let config = cli_config(input_path.to_str().unwrap().to_string(), &output_path);
    let pipeline = AssessmentPipeline::new(LocalStorage::new(output_path), config);
    let err = RiskEngine::new(pipeline).run().await.unwrap_err();

    assert!(matches!(err, RiskError::ValidationError { .. }));
    assert!(!temp_dir.path().join(JSON_REPORT).exists());
    Ok(())
}
