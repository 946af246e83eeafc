use crate::adapters::HttpRiskStore;
use crate::config::validate_output_formats;
use crate::domain::ports::{ConfigProvider, SourceKind};
use crate::utils::error::{Result, RiskError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub pipeline: PipelineConfig,
    pub source: SourceConfig,
    pub scoring: Option<ScoringConfig>,
    pub load: LoadConfig,
    pub persistence: Option<PersistenceConfig>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    pub description: Option<String>,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub r#type: String,
    pub path: Option<String>,
    pub endpoint: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub headers: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub tables_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
    pub output_formats: Vec<String>,
    pub compression: Option<CompressionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    pub enabled: bool,
    pub filename: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    pub enabled: bool,
    pub endpoint: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub headers: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_format: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| RiskError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${API_TOKEN})，未設定的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").map_err(|e| {
            RiskError::ConfigError {
                message: format!("Invalid substitution pattern: {}", e),
            }
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("pipeline.name", &self.pipeline.name)?;

        match self.source.r#type.as_str() {
            "file" => {
                let path = validation::validate_required_field("source.path", &self.source.path)?;
                validation::validate_file_extension("source.path", path, &["json"])?;
            }
            "api" => {
                let endpoint =
                    validation::validate_required_field("source.endpoint", &self.source.endpoint)?;
                validation::validate_url("source.endpoint", endpoint)?;
            }
            other => {
                return Err(RiskError::InvalidConfigValueError {
                    field: "source.type".to_string(),
                    value: other.to_string(),
                    reason: "Source type must be 'file' or 'api'".to_string(),
                })
            }
        }
        if let Some(timeout) = self.source.timeout_seconds {
            validation::validate_positive_number("source.timeout_seconds", timeout, 1)?;
        }

        if let Some(tables) = self.tables_path() {
            validation::validate_file_extension("scoring.tables_path", tables, &["toml"])?;
        }

        validation::validate_path("load.output_path", &self.load.output_path)?;
        validate_output_formats("load.output_formats", &self.load.output_formats)?;
        if self.load.output_formats.is_empty() {
            return Err(RiskError::InvalidConfigValueError {
                field: "load.output_formats".to_string(),
                value: "[]".to_string(),
                reason: "At least one output format is required".to_string(),
            });
        }
        if let Some(compression) = &self.load.compression {
            if compression.enabled {
                validation::validate_file_extension(
                    "load.compression.filename",
                    &compression.filename,
                    &["zip"],
                )?;
            }
        }

        if let Some(persistence) = &self.persistence {
            if persistence.enabled {
                let endpoint = validation::validate_required_field(
                    "persistence.endpoint",
                    &persistence.endpoint,
                )?;
                validation::validate_url("persistence.endpoint", endpoint)?;
            }
            if let Some(timeout) = persistence.timeout_seconds {
                validation::validate_positive_number("persistence.timeout_seconds", timeout, 1)?;
            }
        }

        Ok(())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.log_format.as_deref())
            .map(|format| format == "json")
            .unwrap_or(false)
    }

    pub fn persistence_enabled(&self) -> bool {
        self.persistence.as_ref().map(|p| p.enabled).unwrap_or(false)
    }

    /// Resolves relative file paths (`source.path`, `scoring.tables_path`)
    /// against `base`, normally the config file's directory.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &mut String| {
            *path = base.join(&*path).to_string_lossy().into_owned();
        };

        if self.source_kind() == SourceKind::File {
            if let Some(path) = self.source.path.as_mut() {
                resolve(path);
            }
        }
        if let Some(tables) = self.scoring.as_mut().and_then(|s| s.tables_path.as_mut()) {
            resolve(tables);
        }
    }

    /// Persistence client when `[persistence]` is enabled and has an endpoint.
    pub fn risk_store(&self) -> Option<HttpRiskStore> {
        let persistence = self.persistence.as_ref().filter(|p| p.enabled)?;
        let endpoint = persistence.endpoint.as_ref()?;
        Some(
            HttpRiskStore::new(endpoint.clone())
                .with_headers(persistence.headers.clone().unwrap_or_default())
                .with_timeout(persistence.timeout_seconds.map(Duration::from_secs)),
        )
    }
}

impl ConfigProvider for TomlConfig {
    fn source_kind(&self) -> SourceKind {
        if self.source.r#type == "api" {
            SourceKind::Api
        } else {
            SourceKind::File
        }
    }

    fn input_location(&self) -> &str {
        let location = match self.source_kind() {
            SourceKind::Api => &self.source.endpoint,
            SourceKind::File => &self.source.path,
        };
        location.as_deref().unwrap_or_default()
    }

    fn source_headers(&self) -> Option<&HashMap<String, String>> {
        self.source.headers.as_ref()
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.source.timeout_seconds.map(Duration::from_secs)
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn output_formats(&self) -> &[String] {
        &self.load.output_formats
    }

    fn bundle_filename(&self) -> Option<&str> {
        self.load
            .compression
            .as_ref()
            .filter(|c| c.enabled)
            .map(|c| c.filename.as_str())
    }

    fn tables_path(&self) -> Option<&str> {
        self.scoring.as_ref().and_then(|s| s.tables_path.as_deref())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BASIC: &str = r#"
[pipeline]
name = "family-risk"
version = "1.0.0"

[source]
type = "file"
path = "family.json"

[load]
output_path = "./reports"
output_formats = ["json", "csv"]
"#;

    #[test]
    fn test_parse_basic_toml_config() {
        let config = TomlConfig::from_toml_str(BASIC).unwrap();

        assert_eq!(config.pipeline.name, "family-risk");
        assert_eq!(config.source_kind(), SourceKind::File);
        assert_eq!(config.input_location(), "family.json");
        assert!(config.bundle_filename().is_none());
        assert!(config.risk_store().is_none());
        assert!(!config.monitoring_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_relative_paths_resolve_against_config_dir() {
        let content = format!("{}\n[scoring]\ntables_path = \"tables/custom.toml\"\n", BASIC);
        let mut config = TomlConfig::from_toml_str(&content).unwrap();
        let base = Path::new("/srv/risk");

        config.resolve_paths(base);

        let input = base.join("family.json").to_string_lossy().into_owned();
        let tables = base.join("tables/custom.toml").to_string_lossy().into_owned();
        assert_eq!(config.input_location(), input);
        assert_eq!(config.tables_path(), Some(tables.as_str()));

        // 絕對路徑不變
        config.resolve_paths(Path::new("/elsewhere"));
        assert_eq!(config.input_location(), input);
        assert_eq!(config.tables_path(), Some(tables.as_str()));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("HEALTH_RISK_TEST_TOKEN", "Bearer t0k3n");

        let toml_content = r#"
[pipeline]
name = "api-risk"
version = "1.0"

[source]
type = "api"
endpoint = "https://health.example.com/profile"

[load]
output_path = "./reports"
output_formats = ["json"]

[persistence]
enabled = true
endpoint = "https://health.example.com/api/genetic-risk"
headers = { Authorization = "${HEALTH_RISK_TEST_TOKEN}", X-Missing = "${HEALTH_RISK_UNSET_VAR}" }
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        let headers = config.persistence.as_ref().unwrap().headers.as_ref().unwrap();
        assert_eq!(headers["Authorization"], "Bearer t0k3n");
        assert_eq!(headers["X-Missing"], "${HEALTH_RISK_UNSET_VAR}");
        assert!(config.risk_store().is_some());
        assert!(config.validate().is_ok());

        std::env::remove_var("HEALTH_RISK_TEST_TOKEN");
    }

    #[test]
    fn test_config_validation() {
        let bad_source = BASIC.replace("type = \"file\"", "type = \"ftp\"");
        assert!(TomlConfig::from_toml_str(&bad_source)
            .unwrap()
            .validate()
            .is_err());

        let missing_endpoint = format!("{}\n[persistence]\nenabled = true\n", BASIC);
        let err = TomlConfig::from_toml_str(&missing_endpoint)
            .unwrap()
            .validate()
            .unwrap_err();
        assert!(matches!(err, RiskError::MissingConfigError { .. }));

        let bad_format = BASIC.replace("[\"json\", \"csv\"]", "[\"pdf\"]");
        assert!(TomlConfig::from_toml_str(&bad_format)
            .unwrap()
            .validate()
            .is_err());
    }

    #[test]
    fn test_compression_enabled() {
        let content = format!(
            "{}\n[load.compression]\nenabled = true\nfilename = \"risk.zip\"\n",
            BASIC
        );
        let config = TomlConfig::from_toml_str(&content).unwrap();
        assert_eq!(config.bundle_filename(), Some("risk.zip"));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(BASIC.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.pipeline.name, "family-risk");
    }
}
