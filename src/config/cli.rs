use crate::adapters::HttpRiskStore;
use crate::config::validate_output_formats;
use crate::domain::ports::{ConfigProvider, SourceKind};
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "health-risk")]
#[command(about = "Score genetic risk from a family health history")]
pub struct CliConfig {
    #[arg(long, help = "Scoring request: a .json file or an http(s) URL")]
    pub input: String,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, value_delimiter = ',', default_values = ["json", "csv"])]
    pub formats: Vec<String>,

    #[arg(long, help = "Bundle the reports into this ZIP file")]
    pub bundle: Option<String>,

    #[arg(long, help = "Scoring tables override (.toml)")]
    pub tables: Option<String>,

    #[arg(long, help = "POST the assessment to this persistence endpoint")]
    pub save_endpoint: Option<String>,

    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log per-phase timing and memory")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

impl CliConfig {
    pub fn risk_store(&self) -> Option<HttpRiskStore> {
        self.save_endpoint.as_ref().map(|endpoint| {
            HttpRiskStore::new(endpoint.clone()).with_timeout(self.request_timeout())
        })
    }
}

impl ConfigProvider for CliConfig {
    fn source_kind(&self) -> SourceKind {
        if self.input.starts_with("http://") || self.input.starts_with("https://") {
            SourceKind::Api
        } else {
            SourceKind::File
        }
    }

    fn input_location(&self) -> &str {
        &self.input
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn output_formats(&self) -> &[String] {
        &self.formats
    }

    fn bundle_filename(&self) -> Option<&str> {
        self.bundle.as_deref()
    }

    fn tables_path(&self) -> Option<&str> {
        self.tables.as_deref()
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        match self.source_kind() {
            SourceKind::Api => validation::validate_url("input", &self.input)?,
            SourceKind::File => validation::validate_file_extension("input", &self.input, &["json"])?,
        }
        validation::validate_path("output_path", &self.output_path)?;
        validate_output_formats("formats", &self.formats)?;

        if let Some(bundle) = &self.bundle {
            validation::validate_file_extension("bundle", bundle, &["zip"])?;
        }
        if let Some(tables) = &self.tables {
            validation::validate_file_extension("tables", tables, &["toml"])?;
        }
        if let Some(endpoint) = &self.save_endpoint {
            validation::validate_url("save_endpoint", endpoint)?;
        }
        if let Some(timeout) = self.timeout_seconds {
            validation::validate_positive_number("timeout_seconds", timeout, 1)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliConfig {
        CliConfig::parse_from(std::iter::once("health-risk").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["--input", "family.json"]);
        assert_eq!(config.source_kind(), SourceKind::File);
        assert_eq!(config.output_path(), "./output");
        assert_eq!(config.output_formats(), &["json".to_string(), "csv".to_string()]);
        assert!(config.risk_store().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_url_input_is_api_source() {
        let config = parse(&[
            "--input",
            "https://health.example.com/profile/7",
            "--save-endpoint",
            "https://health.example.com/api/genetic-risk",
            "--timeout-seconds",
            "10",
        ]);
        assert_eq!(config.source_kind(), SourceKind::Api);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(10)));
        assert_eq!(
            config.risk_store().unwrap().endpoint(),
            "https://health.example.com/api/genetic-risk"
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(parse(&["--input", "family.csv"]).validate().is_err());
        assert!(parse(&["--input", "family.json", "--formats", "xml"])
            .validate()
            .is_err());
        assert!(parse(&["--input", "family.json", "--save-endpoint", "not-a-url"])
            .validate()
            .is_err());
        assert!(parse(&["--input", "family.json", "--timeout-seconds", "0"])
            .validate()
            .is_err());
    }
}
