use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("HTTP request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("HTTP status {status} from {url}")]
    HttpStatus {
        url: String,
        status: u16,
        retry_after: Option<u64>,
    },

    #[error("Zone archive decode failed: {message}")]
    DecodeError { message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid name pattern: {0}")]
    PatternError(#[from] regex::Error),

    #[error("Dataset schema mismatch: expected columns {expected:?}, found {found:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Decode,
    Storage,
    Schema,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// HTTP 狀態碼是否值得重試
pub fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUSES.contains(&status)
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ApiError(_) | EtlError::HttpStatus { .. } => ErrorCategory::Network,
            EtlError::DecodeError { .. } => ErrorCategory::Decode,
            EtlError::CsvError(_) | EtlError::IoError(_) => ErrorCategory::Storage,
            EtlError::SchemaMismatch { .. } => ErrorCategory::Schema,
            EtlError::PatternError(_)
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Decode | ErrorCategory::Schema => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    /// 暫時性的網路錯誤：逾時、連線失敗、可重試的狀態碼
    pub fn is_retryable(&self) -> bool {
        match self {
            EtlError::ApiError(e) => {
                if let Some(status) = e.status() {
                    return is_retryable_status(status.as_u16());
                }
                e.is_timeout() || e.is_connect() || e.is_request() || e.is_body()
            }
            EtlError::HttpStatus { status, .. } => is_retryable_status(*status),
            EtlError::IoError(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::UnexpectedEof
            ),
            _ => false,
        }
    }

    /// 錯誤類別名稱，用於每個來源的結果日誌
    pub fn class_name(&self) -> &'static str {
        match self {
            EtlError::ApiError(e) if e.is_timeout() => "Timeout",
            EtlError::ApiError(e) if e.is_connect() => "ConnectionError",
            EtlError::ApiError(_) => "RequestError",
            EtlError::HttpStatus { .. } => "HTTPError",
            EtlError::DecodeError { .. } => "DecodeError",
            EtlError::CsvError(_) => "CsvError",
            EtlError::IoError(_) => "IoError",
            EtlError::PatternError(_) => "PatternError",
            EtlError::SchemaMismatch { .. } => "SchemaMismatch",
            EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => "ConfigError",
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::ApiError(_) | EtlError::HttpStatus { .. } => {
                "Check network connectivity and whether the zone provider is reachable, then rerun"
            }
            EtlError::DecodeError { .. } => {
                "The provider served a corrupt or non-gzip archive; rerun later or disable that source"
            }
            EtlError::CsvError(_) | EtlError::IoError(_) => {
                "Check that the dataset/report paths are writable and the disk is not full"
            }
            EtlError::PatternError(_) => "Fix the --mask regular expression syntax",
            EtlError::SchemaMismatch { .. } => {
                "The dataset file is not a zone dataset; rebuild it with --force-update"
            }
            EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => {
                "Review the configuration file and command-line flags"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::SchemaMismatch { expected, found } => format!(
                "Dataset is missing required columns (need {}, got {})",
                expected.join(", "),
                found.join(", ")
            ),
            EtlError::PatternError(e) => format!("Search mask is not a valid regex: {}", e),
            EtlError::HttpStatus { url, status, .. } => {
                format!("Provider returned HTTP {} for {}", status, url)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_retry_classification() {
        for status in [429, 500, 502, 503, 504] {
            let err = EtlError::HttpStatus {
                url: "http://x".to_string(),
                status,
                retry_after: None,
            };
            assert!(err.is_retryable(), "status {} should retry", status);
        }
        let not_found = EtlError::HttpStatus {
            url: "http://x".to_string(),
            status: 404,
            retry_after: None,
        };
        assert!(!not_found.is_retryable());
    }

    #[test]
    fn test_schema_mismatch_is_high_severity() {
        let err = EtlError::SchemaMismatch {
            expected: vec!["domain".to_string()],
            found: vec!["foo".to_string()],
        };
        assert_eq!(err.category(), ErrorCategory::Schema);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.user_friendly_message().contains("domain"));
    }

    #[test]
    fn test_decode_error_not_retryable() {
        let err = EtlError::DecodeError {
            message: "invalid gzip header".to_string(),
        };
        assert!(!err.is_retryable());
        assert_eq!(err.class_name(), "DecodeError");
    }
}
