use thiserror::Error;

#[derive(Error, Debug)]
pub enum RiskError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration field '{field}' is invalid: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Failed to save assessment (status {status}): {message}")]
    PersistenceError { status: u16, message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

pub type Result<T> = std::result::Result<T, RiskError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Input,
    Output,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            RiskError::TomlError(_)
            | RiskError::ConfigError { .. }
            | RiskError::ConfigValidationError { .. }
            | RiskError::InvalidConfigValueError { .. }
            | RiskError::MissingConfigError { .. } => ErrorCategory::Configuration,
            RiskError::ApiError(_) | RiskError::PersistenceError { .. } => ErrorCategory::Network,
            RiskError::SerializationError(_) | RiskError::ValidationError { .. } => {
                ErrorCategory::Input
            }
            RiskError::ZipError(_) | RiskError::CsvError(_) | RiskError::IoError(_) => {
                ErrorCategory::Output
            }
            RiskError::ProcessingError { .. } => ErrorCategory::Processing,
        }
    }

    /// 決定錯誤嚴重程度，binaries 依此決定 exit code
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 報告已寫入本地，只是儲存失敗，可重試
            RiskError::PersistenceError { .. } | RiskError::ApiError(_) => ErrorSeverity::Medium,
            RiskError::ValidationError { .. }
            | RiskError::SerializationError(_)
            | RiskError::ProcessingError { .. }
            | RiskError::CsvError(_) => ErrorSeverity::High,
            RiskError::ZipError(_)
            | RiskError::IoError(_)
            | RiskError::TomlError(_)
            | RiskError::ConfigError { .. }
            | RiskError::ConfigValidationError { .. }
            | RiskError::InvalidConfigValueError { .. }
            | RiskError::MissingConfigError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::Network
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            RiskError::PersistenceError { .. } => {
                "The assessment was kept locally. Re-run the save once the persistence service is reachable"
            }
            RiskError::ApiError(_) => "Check the endpoint URL and network connectivity, then retry",
            RiskError::SerializationError(_) => {
                "Make sure the input is a JSON object with 'subject' and 'relatives' fields"
            }
            RiskError::ValidationError { .. } => {
                "Correct the subject or relative ages and run the assessment again"
            }
            RiskError::TomlError(_) | RiskError::ConfigError { .. } => {
                "Check the configuration file syntax"
            }
            RiskError::ConfigValidationError { .. }
            | RiskError::InvalidConfigValueError { .. }
            | RiskError::MissingConfigError { .. } => {
                "Fix the reported configuration field and try again"
            }
            RiskError::IoError(_) | RiskError::ZipError(_) | RiskError::CsvError(_) => {
                "Check that the input file exists and the output directory is writable"
            }
            RiskError::ProcessingError { .. } => "Re-run with --verbose to see the failing step",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Network => format!("Could not reach the remote service: {}", self),
            ErrorCategory::Input => format!("The scoring request is not usable: {}", self),
            ErrorCategory::Output => format!("Could not read or write files: {}", self),
            ErrorCategory::Processing => format!("Risk assessment failed: {}", self),
        }
    }
}
